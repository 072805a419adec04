//! Strips fields from entity inputs, entity results, or both.

use super::{create_transformer, Clause, EntityTransform};
use crate::engine::context::RequestContext;
use crate::engine::resolvers::{Info, Operation, ResolverMap};
use crate::engine::value::{Map, Value};
use crate::Error;
use async_trait::async_trait;
use log::debug;

/// Deletes every field named in `fields` from an entity. Missing fields are ignored.
pub fn remove_fields(mut entity: Map, fields: &[String]) -> Map {
    for field in fields {
        entity.shift_remove(field);
    }
    entity
}

/// Applies [`remove_fields`] to `value` if it is a map, and returns any other value unchanged
///
/// [`remove_fields`]: ./fn.remove_fields.html
pub fn convert(value: Value, fields: &[String]) -> Value {
    match value {
        Value::Map(entity) => Value::Map(remove_fields(entity, fields)),
        v => v,
    }
}

struct Remove {
    input: Vec<String>,
    output: Vec<String>,
}

#[async_trait]
impl<RequestCtx> EntityTransform<RequestCtx> for Remove
where
    RequestCtx: RequestContext,
{
    fn name(&self) -> &'static str {
        "remove"
    }

    fn converts_output(&self) -> bool {
        !self.output.is_empty()
    }

    async fn convert_input(
        &self,
        entity: Map,
        _source: &Value,
        _context: &RequestCtx,
        _info: &Info,
    ) -> Result<Map, Error> {
        Ok(remove_fields(entity, &self.input))
    }

    async fn convert_output(
        &self,
        entity: Map,
        _source: &Value,
        _context: &RequestCtx,
        _info: &Info,
    ) -> Result<Map, Error> {
        Ok(remove_fields(entity, &self.output))
    }

    fn named_entry(&self, clause: Clause, field: &str) -> Result<Option<String>, Error> {
        if self.input.iter().any(|f| f == field) {
            Err(Error::FieldRemoved {
                field: field.to_string(),
                clause,
            })
        } else {
            Ok(None)
        }
    }
}

/// Wraps `resolvers` so that the fields in `remove_in` are stripped from entity inputs and the
/// fields in `remove_out` from results. With both lists empty the map is returned as it is.
///
/// A `list` call that filters or orders on a field in `remove_in` fails with
/// [`FieldRemoved`] before its inner resolver runs.
///
/// [`FieldRemoved`]: ../../../error/enum.Error.html#variant.FieldRemoved
pub fn create_remove_transformer<RequestCtx>(
    resolvers: ResolverMap<RequestCtx>,
    remove_in: Vec<String>,
    remove_out: Vec<String>,
    exclude: &[Operation],
) -> ResolverMap<RequestCtx>
where
    RequestCtx: RequestContext,
{
    debug!(
        "create_remove_transformer called -- remove_in: {:?}, remove_out: {:?}, exclude: {:?}",
        remove_in, remove_out, exclude
    );
    if remove_in.is_empty() && remove_out.is_empty() {
        return resolvers;
    }

    create_transformer(
        resolvers,
        Remove {
            input: remove_in,
            output: remove_out,
        },
        exclude,
    )
}
