//! Renames entity fields between the names a resolver's callers use and the names its backing
//! store uses.

use super::{create_transformer, Clause, EntityTransform};
use crate::engine::context::RequestContext;
use crate::engine::resolvers::{Info, Operation, ResolverMap};
use crate::engine::value::{Map, Value};
use crate::Error;
use async_trait::async_trait;
use indexmap::IndexMap;
use log::debug;

/// Mapping from an old field name to a new field name
pub type RenameRule = IndexMap<String, String>;

/// Applies `rule` to an entity. Each key present in the rule is moved to its new name; all other
/// keys are kept. Keys absent from the entity are not created.
///
/// If a renamed key lands on a name the entity already holds, the renamed value wins. An
/// identity entry such as `{a: "a"}` keeps the field and its value, moving it to the end.
pub fn rename_fields(mut entity: Map, rule: &RenameRule) -> Map {
    for (from, to) in rule {
        if let Some(v) = entity.shift_remove(from) {
            entity.insert(to.clone(), v);
        }
    }
    entity
}

/// Applies `rule` to `value` if it is a map, and returns any other value unchanged
///
/// # Examples
///
/// ```rust
/// # use resolver_transformers::engine::transformers::rename::{convert, RenameRule};
/// # use resolver_transformers::engine::value::Value;
/// # use serde_json::json;
/// # use std::convert::TryFrom;
///
/// let mut rule = RenameRule::new();
/// rule.insert("_id".to_string(), "id".to_string());
///
/// let entity = Value::try_from(json!({"_id": 1, "a": 2})).unwrap();
/// assert_eq!(Value::try_from(json!({"a": 2, "id": 1})).unwrap(), convert(entity, &rule));
/// assert_eq!(Value::Null, convert(Value::Null, &rule));
/// ```
pub fn convert(value: Value, rule: &RenameRule) -> Value {
    match value {
        Value::Map(entity) => Value::Map(rename_fields(entity, rule)),
        v => v,
    }
}

/// Returns the rule that undoes `rule`. If several keys share a new name, the last one wins.
pub fn invert(rule: &RenameRule) -> RenameRule {
    rule.iter().map(|(k, v)| (v.clone(), k.clone())).collect()
}

struct Rename {
    input: RenameRule,
    output: RenameRule,
}

#[async_trait]
impl<RequestCtx> EntityTransform<RequestCtx> for Rename
where
    RequestCtx: RequestContext,
{
    fn name(&self) -> &'static str {
        "rename"
    }

    async fn convert_input(
        &self,
        entity: Map,
        _source: &Value,
        _context: &RequestCtx,
        _info: &Info,
    ) -> Result<Map, Error> {
        Ok(rename_fields(entity, &self.input))
    }

    async fn convert_output(
        &self,
        entity: Map,
        _source: &Value,
        _context: &RequestCtx,
        _info: &Info,
    ) -> Result<Map, Error> {
        Ok(rename_fields(entity, &self.output))
    }

    fn named_entry(&self, _clause: Clause, field: &str) -> Result<Option<String>, Error> {
        Ok(self.input.get(field).cloned())
    }
}

/// Wraps `resolvers` so that results have their fields renamed according to `fields`, and inputs,
/// filters and orders are renamed back the other way before reaching the inner resolvers.
///
/// `fields` maps backing names to the names exposed to callers. Operations in `exclude` keep
/// their resolvers unchanged. An empty mapping returns `resolvers` as they are.
///
/// # Examples
///
/// ```rust
/// # use resolver_transformers::engine::resolvers::ResolverMap;
/// # use resolver_transformers::engine::transformers::rename::{
/// #     create_rename_transformer, RenameRule,
/// # };
///
/// let mut fields = RenameRule::new();
/// fields.insert("_id".to_string(), "id".to_string());
/// let resolvers = create_rename_transformer(ResolverMap::<()>::new(), fields, &[]);
/// ```
pub fn create_rename_transformer<RequestCtx>(
    resolvers: ResolverMap<RequestCtx>,
    fields: RenameRule,
    exclude: &[Operation],
) -> ResolverMap<RequestCtx>
where
    RequestCtx: RequestContext,
{
    debug!(
        "create_rename_transformer called -- fields: {:#?}, exclude: {:?}",
        fields, exclude
    );
    if fields.is_empty() {
        return resolvers;
    }

    let input = invert(&fields);
    create_transformer(
        resolvers,
        Rename {
            input,
            output: fields,
        },
        exclude,
    )
}
