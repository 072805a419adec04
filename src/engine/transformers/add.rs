//! Adds computed or constant fields to entity inputs, entity results, or both.

use super::{create_transformer, EntityTransform};
use crate::engine::context::RequestContext;
use crate::engine::resolvers::{Info, Operation, ResolverMap};
use crate::engine::value::{Map, Value};
use crate::Error;
use async_trait::async_trait;
use indexmap::IndexMap;
use log::debug;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Function deriving a field from the field's current value, if any, and the whole entity
pub type DeriveFn = dyn Fn(Option<&Value>, &Map) -> Value + Send + Sync;

/// The value an add rule sets a field to
#[derive(Clone)]
pub enum AddValue {
    /// Sets the field to a clone of the value
    Literal(Value),

    /// Sets the field to the function's return value
    Derived(Arc<DeriveFn>),
}

impl AddValue {
    /// Creates a derived value from a function
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use resolver_transformers::engine::transformers::add::AddValue;
    /// # use resolver_transformers::engine::value::Value;
    ///
    /// let counted = AddValue::derived(|_current, entity| Value::Int64(entity.len() as i64));
    /// ```
    pub fn derived<F>(f: F) -> AddValue
    where
        F: Fn(Option<&Value>, &Map) -> Value + Send + Sync + 'static,
    {
        AddValue::Derived(Arc::new(f))
    }
}

impl Debug for AddValue {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            AddValue::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            AddValue::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

impl From<Value> for AddValue {
    fn from(v: Value) -> Self {
        AddValue::Literal(v)
    }
}

/// Mapping from field name to the value it is set to
pub type AddRule = IndexMap<String, AddValue>;

/// Applies `rule` to an entity. Fields are set in rule order, so a derived field sees the fields
/// set by the entries before it. Existing fields are overwritten.
pub fn add_fields(mut entity: Map, rule: &AddRule) -> Map {
    for (name, add) in rule {
        let v = match add {
            AddValue::Literal(v) => v.clone(),
            AddValue::Derived(f) => (**f)(entity.get(name), &entity),
        };
        entity.insert(name.clone(), v);
    }
    entity
}

/// Applies `rule` to `value` if it is a map, and returns any other value unchanged
pub fn convert(value: Value, rule: &AddRule) -> Value {
    match value {
        Value::Map(entity) => Value::Map(add_fields(entity, rule)),
        v => v,
    }
}

struct Add {
    input: Option<AddRule>,
    output: Option<AddRule>,
}

#[async_trait]
impl<RequestCtx> EntityTransform<RequestCtx> for Add
where
    RequestCtx: RequestContext,
{
    fn name(&self) -> &'static str {
        "add"
    }

    fn converts_output(&self) -> bool {
        self.output.is_some()
    }

    async fn convert_input(
        &self,
        entity: Map,
        _source: &Value,
        _context: &RequestCtx,
        _info: &Info,
    ) -> Result<Map, Error> {
        Ok(match &self.input {
            Some(rule) => add_fields(entity, rule),
            None => entity,
        })
    }

    async fn convert_output(
        &self,
        entity: Map,
        _source: &Value,
        _context: &RequestCtx,
        _info: &Info,
    ) -> Result<Map, Error> {
        Ok(match &self.output {
            Some(rule) => add_fields(entity, rule),
            None => entity,
        })
    }
}

/// Wraps `resolvers` so that entity inputs get the fields of `add_in` and results get the fields
/// of `add_out`. Only the directions that are given are applied, and with neither given the map
/// is returned as it is.
///
/// A `list` call's input is never touched; its `filter` and `order` address fields of the stored
/// entities, which the input rule does not describe.
pub fn create_add_transformer<RequestCtx>(
    resolvers: ResolverMap<RequestCtx>,
    add_in: Option<AddRule>,
    add_out: Option<AddRule>,
    exclude: &[Operation],
) -> ResolverMap<RequestCtx>
where
    RequestCtx: RequestContext,
{
    debug!(
        "create_add_transformer called -- add_in: {:#?}, add_out: {:#?}, exclude: {:?}",
        add_in, add_out, exclude
    );
    if add_in.is_none() && add_out.is_none() {
        return resolvers;
    }

    create_transformer(
        resolvers,
        Add {
            input: add_in,
            output: add_out,
        },
        exclude,
    )
}
