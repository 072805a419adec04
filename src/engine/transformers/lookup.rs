//! Replaces entity fields with values produced by other resolvers, such as swapping a foreign
//! key for the record it points to.

use super::{create_transformer, Clause, EntityTransform};
use crate::engine::context::RequestContext;
use crate::engine::resolvers::{Arguments, Info, Operation, Resolver, ResolverMap};
use crate::engine::value::{Map, Value};
use crate::Error;
use async_trait::async_trait;
use futures::future::try_join_all;
use indexmap::IndexMap;
use log::{debug, trace};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// How a single field is looked up in each direction
///
/// Each resolver is called with `{input: {value}}`, where `value` is the field's current value,
/// and its result becomes the field's new value. The optional `field` alias is the name a `list`
/// filter or order entry on this field is rewritten to.
///
/// # Examples
///
/// ```rust
/// # use resolver_transformers::engine::resolvers::{resolver_fn, ResolverFacade};
/// # use resolver_transformers::engine::transformers::lookup::LookupField;
///
/// let owner = LookupField::<()>::new()
///     .with_output(resolver_fn(|facade: ResolverFacade<()>| async move {
///         facade.resolve_null()
///     }))
///     .with_field("ownerId".to_string());
/// ```
pub struct LookupField<RequestCtx>
where
    RequestCtx: RequestContext,
{
    input: Option<Arc<dyn Resolver<RequestCtx>>>,
    output: Option<Arc<dyn Resolver<RequestCtx>>>,
    field: Option<String>,
}

impl<RequestCtx> LookupField<RequestCtx>
where
    RequestCtx: RequestContext,
{
    pub fn new() -> LookupField<RequestCtx> {
        LookupField {
            input: None,
            output: None,
            field: None,
        }
    }

    /// Sets the resolver applied to the field of entity inputs
    pub fn with_input(mut self, resolver: Arc<dyn Resolver<RequestCtx>>) -> Self {
        self.input = Some(resolver);
        self
    }

    /// Sets the resolver applied to the field of results
    pub fn with_output(mut self, resolver: Arc<dyn Resolver<RequestCtx>>) -> Self {
        self.output = Some(resolver);
        self
    }

    pub fn with_field(mut self, field: String) -> Self {
        self.field = Some(field);
        self
    }

    pub fn input(&self) -> Option<&Arc<dyn Resolver<RequestCtx>>> {
        self.input.as_ref()
    }

    pub fn output(&self) -> Option<&Arc<dyn Resolver<RequestCtx>>> {
        self.output.as_ref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl<RequestCtx> Clone for LookupField<RequestCtx>
where
    RequestCtx: RequestContext,
{
    fn clone(&self) -> Self {
        LookupField {
            input: self.input.clone(),
            output: self.output.clone(),
            field: self.field.clone(),
        }
    }
}

impl<RequestCtx> Default for LookupField<RequestCtx>
where
    RequestCtx: RequestContext,
{
    fn default() -> Self {
        LookupField::new()
    }
}

impl<RequestCtx> Debug for LookupField<RequestCtx>
where
    RequestCtx: RequestContext,
{
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("LookupField")
            .field("input", &self.input.is_some())
            .field("output", &self.output.is_some())
            .field("field", &self.field)
            .finish()
    }
}

/// Mapping from field name to its lookup
pub type LookupRule<RequestCtx> = IndexMap<String, LookupField<RequestCtx>>;

type SelectFn<RequestCtx> =
    for<'a> fn(&'a LookupField<RequestCtx>) -> Option<&'a Arc<dyn Resolver<RequestCtx>>>;

/// Runs the selected resolver of every rule entry whose field is present in `entity`, all at
/// once, then writes each result back over its field. The first failure fails the whole
/// conversion.
async fn lookup_fields<RequestCtx>(
    mut entity: Map,
    rule: &LookupRule<RequestCtx>,
    select: SelectFn<RequestCtx>,
    source: &Value,
    context: &RequestCtx,
    info: &Info,
) -> Result<Map, Error>
where
    RequestCtx: RequestContext,
{
    let lookups = rule
        .iter()
        .filter_map(|(name, field)| select(field).map(|resolver| (name, resolver)))
        .filter_map(|(name, resolver)| {
            entity
                .get(name)
                .cloned()
                .map(|current| (name, resolver, current))
        })
        .map(|(name, resolver, current)| async move {
            trace!("lookup_fields -- field: {}, value: {:#?}", name, current);
            let mut input = Map::new();
            input.insert("value".to_string(), current);
            let looked_up = resolver
                .resolve(source, Arguments::with_input(Value::Map(input)), context, info)
                .await?;
            Ok::<_, Error>((name.clone(), looked_up))
        });

    for (name, looked_up) in try_join_all(lookups).await? {
        entity.insert(name, looked_up);
    }
    Ok(entity)
}

struct Lookup<RequestCtx>
where
    RequestCtx: RequestContext,
{
    fields: LookupRule<RequestCtx>,
}

#[async_trait]
impl<RequestCtx> EntityTransform<RequestCtx> for Lookup<RequestCtx>
where
    RequestCtx: RequestContext,
{
    fn name(&self) -> &'static str {
        "lookup"
    }

    fn converts_output(&self) -> bool {
        self.fields.values().any(|f| f.output().is_some())
    }

    async fn convert_input(
        &self,
        entity: Map,
        source: &Value,
        context: &RequestCtx,
        info: &Info,
    ) -> Result<Map, Error> {
        lookup_fields(
            entity,
            &self.fields,
            LookupField::input,
            source,
            context,
            info,
        )
        .await
    }

    async fn convert_output(
        &self,
        entity: Map,
        source: &Value,
        context: &RequestCtx,
        info: &Info,
    ) -> Result<Map, Error> {
        lookup_fields(
            entity,
            &self.fields,
            LookupField::output,
            source,
            context,
            info,
        )
        .await
    }

    fn named_entry(&self, _clause: Clause, field: &str) -> Result<Option<String>, Error> {
        Ok(self
            .fields
            .get(field)
            .and_then(|f| f.field().map(str::to_string)))
    }
}

/// Wraps `resolvers` so that each field in `fields` is replaced by its lookup: input resolvers
/// run on entity inputs, output resolvers on results and on every node of a `list` connection.
/// A `list` filter or order entry on a field with an alias is rewritten to the alias. An empty
/// rule returns the map as it is.
pub fn create_lookup_transformer<RequestCtx>(
    resolvers: ResolverMap<RequestCtx>,
    fields: LookupRule<RequestCtx>,
    exclude: &[Operation],
) -> ResolverMap<RequestCtx>
where
    RequestCtx: RequestContext,
{
    debug!(
        "create_lookup_transformer called -- fields: {:#?}, exclude: {:?}",
        fields, exclude
    );
    if fields.is_empty() {
        return resolvers;
    }

    create_transformer(resolvers, Lookup { fields }, exclude)
}
