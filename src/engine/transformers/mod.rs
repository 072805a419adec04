//! This module provides the generic entity transformer on which the rename, add, remove and
//! lookup transformers are built. A transformer wraps every non-excluded resolver of a
//! [`ResolverMap`] so that entity inputs are rewritten on the way in and entity results on the
//! way out. The `list` operation gets its own handling: its `filter` and `order` clauses have
//! their field names remapped, and each `edges[].node` of the returned connection is rewritten in
//! place of the whole result.
//!
//! [`ResolverMap`]: ../resolvers/struct.ResolverMap.html

use crate::engine::context::RequestContext;
use crate::engine::resolvers::{Arguments, Info, Operation, Resolver, ResolverMap};
use crate::engine::value::{Map, Value};
use crate::Error;
use async_trait::async_trait;
use futures::future::try_join_all;
use log::{debug, trace};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod add;
pub mod lookup;
pub mod remove;
pub mod rename;

/// The kind of `list` clause in which a field name was found
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Clause {
    Filter,
    Order,
}

impl Clause {
    fn key(&self) -> &'static str {
        match self {
            Clause::Filter => "filter",
            Clause::Order => "order",
        }
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A pair of entity rewrites, plus an optional rewrite of the field names referenced by `list`
/// clauses. Each method defaults to leaving its argument untouched, so a transform implements
/// only the directions it cares about.
///
/// Conversions are only ever handed maps. Inputs and results that are not maps, such as a null
/// result or a bare scalar, bypass the transform.
#[async_trait]
pub trait EntityTransform<RequestCtx>: Send + Sync
where
    RequestCtx: RequestContext,
{
    /// Short name of the transform, used in log output
    fn name(&self) -> &'static str;

    /// Whether results are rewritten at all. When false, results, including `list`
    /// connections, are passed back exactly as the inner resolver returned them.
    fn converts_output(&self) -> bool {
        true
    }

    async fn convert_input(
        &self,
        entity: Map,
        _source: &Value,
        _context: &RequestCtx,
        _info: &Info,
    ) -> Result<Map, Error> {
        Ok(entity)
    }

    async fn convert_output(
        &self,
        entity: Map,
        _source: &Value,
        _context: &RequestCtx,
        _info: &Info,
    ) -> Result<Map, Error> {
        Ok(entity)
    }

    /// Maps the `field` of a `list` filter or order entry. Returning `Ok(None)` leaves the entry
    /// as it is; returning an error fails the call before the inner resolver runs.
    fn named_entry(&self, _clause: Clause, _field: &str) -> Result<Option<String>, Error> {
        Ok(None)
    }
}

/// Wraps every resolver in `resolvers` whose operation is not in `exclude` with `transform`.
/// The returned map holds exactly the same operations as `resolvers`.
pub fn create_transformer<RequestCtx, T>(
    resolvers: ResolverMap<RequestCtx>,
    transform: T,
    exclude: &[Operation],
) -> ResolverMap<RequestCtx>
where
    RequestCtx: RequestContext,
    T: EntityTransform<RequestCtx> + 'static,
{
    debug!(
        "create_transformer called -- transform: {}, operations: {:?}, exclude: {:?}",
        transform.name(),
        resolvers,
        exclude
    );
    let transform: Arc<dyn EntityTransform<RequestCtx>> = Arc::new(transform);
    resolvers.wrap_each(exclude, |operation, inner| {
        Arc::new(TransformResolver {
            operation,
            inner,
            transform: transform.clone(),
        })
    })
}

struct TransformResolver<RequestCtx>
where
    RequestCtx: RequestContext,
{
    operation: Operation,
    inner: Arc<dyn Resolver<RequestCtx>>,
    transform: Arc<dyn EntityTransform<RequestCtx>>,
}

impl<RequestCtx> TransformResolver<RequestCtx>
where
    RequestCtx: RequestContext,
{
    async fn convert_input_args(
        &self,
        mut args: Arguments,
        source: &Value,
        context: &RequestCtx,
        info: &Info,
    ) -> Result<Arguments, Error> {
        if let Some(Value::Map(input)) = args.input_mut() {
            let entity = std::mem::take(input);
            *input = self
                .transform
                .convert_input(entity, source, context, info)
                .await?;
        }
        Ok(args)
    }

    async fn convert_edge(
        &self,
        edge: Value,
        source: &Value,
        context: &RequestCtx,
        info: &Info,
    ) -> Result<Value, Error> {
        let mut edge = match edge {
            Value::Map(edge) => edge,
            v => return Ok(v),
        };
        if let Some(Value::Map(node)) = edge.get_mut("node") {
            let entity = std::mem::take(node);
            *node = self
                .transform
                .convert_output(entity, source, context, info)
                .await?;
        }
        Ok(Value::Map(edge))
    }

    async fn convert_connection(
        &self,
        result: Value,
        source: &Value,
        context: &RequestCtx,
        info: &Info,
    ) -> Result<Value, Error> {
        let mut connection = match result {
            Value::Map(connection) => connection,
            _ => {
                return Err(Error::ResponseItemNotFound {
                    name: "edges".to_string(),
                })
            }
        };
        let edges = match connection.get_mut("edges") {
            Some(Value::Array(edges)) => std::mem::take(edges),
            _ => {
                return Err(Error::ResponseItemNotFound {
                    name: "edges".to_string(),
                })
            }
        };

        let edges = try_join_all(
            edges
                .into_iter()
                .map(|edge| self.convert_edge(edge, source, context, info)),
        )
        .await?;

        connection.insert("edges".to_string(), Value::Array(edges));
        Ok(Value::Map(connection))
    }
}

#[async_trait]
impl<RequestCtx> Resolver<RequestCtx> for TransformResolver<RequestCtx>
where
    RequestCtx: RequestContext,
{
    async fn resolve(
        &self,
        source: &Value,
        args: Arguments,
        context: &RequestCtx,
        info: &Info,
    ) -> Result<Value, Error> {
        trace!(
            "TransformResolver::resolve called -- transform: {}, operation: {}, args: {:#?}",
            self.transform.name(),
            self.operation,
            args
        );

        if self.operation.is_list() {
            let transform = &self.transform;
            let args = walk_named_entries(args, |clause, field| {
                transform.named_entry(clause, field)
            })?;
            let result = self.inner.resolve(source, args, context, info).await?;
            if !self.transform.converts_output() {
                return Ok(result);
            }
            self.convert_connection(result, source, context, info).await
        } else {
            let args = self.convert_input_args(args, source, context, info).await?;
            match self.inner.resolve(source, args, context, info).await? {
                Value::Map(entity) if self.transform.converts_output() => Ok(Value::Map(
                    self.transform
                        .convert_output(entity, source, context, info)
                        .await?,
                )),
                v => Ok(v),
            }
        }
    }
}

/// Visits every entry of `args.input.filter` and then every entry of `args.input.order`, in
/// order, replacing the entry's `field` with whatever `map_field` returns for it. Entries
/// without a string `field`, and absent or non-list clauses, are skipped.
pub(crate) fn walk_named_entries<F>(
    mut args: Arguments,
    mut map_field: F,
) -> Result<Arguments, Error>
where
    F: FnMut(Clause, &str) -> Result<Option<String>, Error>,
{
    if let Some(Value::Map(input)) = args.input_mut() {
        for &clause in [Clause::Filter, Clause::Order].iter() {
            if let Some(Value::Array(entries)) = input.get_mut(clause.key()) {
                for entry in entries.iter_mut() {
                    if let Value::Map(entry) = entry {
                        let mapped = match entry.get("field") {
                            Some(Value::String(field)) => map_field(clause, field)?,
                            _ => None,
                        };
                        if let Some(field) = mapped {
                            entry.insert("field".to_string(), Value::String(field));
                        }
                    }
                }
            }
        }
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::{create_transformer, walk_named_entries, Clause, EntityTransform};
    use crate::engine::resolvers::{
        resolver_fn, Arguments, Info, Operation, ResolverFacade, ResolverMap,
    };
    use crate::engine::value::{Map, Value};
    use crate::Error;
    use async_trait::async_trait;
    use serde_json::json;
    use std::convert::TryFrom;

    fn value(j: serde_json::Value) -> Value {
        Value::try_from(j).unwrap()
    }

    fn args(j: serde_json::Value) -> Arguments {
        Arguments::try_from(j).unwrap()
    }

    /// Marks every entity it sees with the direction it was converted in
    struct Marker;

    #[async_trait]
    impl EntityTransform<()> for Marker {
        fn name(&self) -> &'static str {
            "marker"
        }

        async fn convert_input(
            &self,
            mut entity: Map,
            _source: &Value,
            _context: &(),
            _info: &Info,
        ) -> Result<Map, Error> {
            entity.insert("in".to_string(), Value::Bool(true));
            Ok(entity)
        }

        async fn convert_output(
            &self,
            mut entity: Map,
            _source: &Value,
            _context: &(),
            _info: &Info,
        ) -> Result<Map, Error> {
            entity.insert("out".to_string(), Value::Bool(true));
            Ok(entity)
        }

        fn named_entry(&self, _clause: Clause, field: &str) -> Result<Option<String>, Error> {
            Ok(Some(field.to_uppercase()))
        }
    }

    fn echo_map() -> ResolverMap<()> {
        ResolverMap::new()
            .with(
                Operation::Find,
                resolver_fn(|facade: ResolverFacade<()>| async move {
                    Ok(facade.input().cloned().unwrap_or_default())
                }),
            )
            .with(
                Operation::List,
                resolver_fn(|facade: ResolverFacade<()>| async move {
                    let mut nodes = vec![Value::Map(facade.args().as_map().clone())];
                    nodes.push(Value::Int64(3));
                    facade.resolve_connection(nodes)
                }),
            )
    }

    /// Passes if filter entries are visited before order entries, and only string fields are
    /// mapped
    #[test]
    fn walk_visits_filter_then_order() {
        let a = args(json!({
            "input": {
                "order": [{"field": "b"}],
                "filter": [{"field": "a", "op": "EQ", "value": 1}, {"field": 5}, "junk"]
            }
        }));
        let mut seen = Vec::new();
        let walked = walk_named_entries(a, |clause, field| {
            seen.push((clause, field.to_string()));
            Ok(Some(format!("{}_{}", field, clause)))
        })
        .unwrap();

        assert_eq!(
            vec![
                (Clause::Filter, "a".to_string()),
                (Clause::Order, "b".to_string())
            ],
            seen
        );
        assert_eq!(
            &value(json!({
                "order": [{"field": "b_order"}],
                "filter": [{"field": "a_filter", "op": "EQ", "value": 1}, {"field": 5}, "junk"]
            })),
            walked.input().unwrap()
        );
    }

    /// Passes if an error from the field mapping stops the walk
    #[test]
    fn walk_propagates_errors() {
        let a = args(json!({"input": {"filter": [{"field": "a"}]}}));
        let result = walk_named_entries(a, |_, field| {
            Err(Error::InputItemNotExpected {
                name: field.to_string(),
            })
        });

        assert!(result.is_err());
    }

    /// Passes if entity operations convert input and output
    #[tokio::test]
    async fn entity_operation_round_trip() {
        let wrapped = create_transformer(echo_map(), Marker, &[]);
        let result = wrapped
            .resolve(
                Operation::Find,
                &Value::Null,
                args(json!({"input": {"a": 1}})),
                &(),
                &Info::default(),
            )
            .await
            .unwrap();

        assert_eq!(value(json!({"a": 1, "in": true, "out": true})), result);
    }

    /// Passes if a missing input reaches the inner resolver untouched
    #[tokio::test]
    async fn entity_operation_without_input() {
        let wrapped = create_transformer(echo_map(), Marker, &[]);
        let result = wrapped
            .resolve(
                Operation::Find,
                &Value::Null,
                Arguments::new(),
                &(),
                &Info::default(),
            )
            .await
            .unwrap();

        assert_eq!(Value::Null, result);
    }

    /// Passes if list converts filter fields and edge nodes, but not the rest of the input, and
    /// leaves non-map nodes alone
    #[tokio::test]
    async fn list_operation() {
        let wrapped = create_transformer(echo_map(), Marker, &[]);
        let result = wrapped
            .resolve(
                Operation::List,
                &Value::Null,
                args(json!({"input": {"filter": [{"field": "a"}]}})),
                &(),
                &Info::default(),
            )
            .await
            .unwrap();

        assert_eq!(
            value(json!({"edges": [
                {"node": {"input": {"filter": [{"field": "A"}]}, "out": true}},
                {"node": 3}
            ]})),
            result
        );
    }

    /// Passes if a list result without edges is rejected
    #[tokio::test]
    async fn list_without_edges() {
        let map = ResolverMap::new().with(
            Operation::List,
            resolver_fn(|_facade: ResolverFacade<()>| async move { Ok(Value::Null) }),
        );
        let wrapped = create_transformer(map, Marker, &[]);
        let result = wrapped
            .resolve(
                Operation::List,
                &Value::Null,
                Arguments::new(),
                &(),
                &Info::default(),
            )
            .await;

        assert!(matches!(result, Err(Error::ResponseItemNotFound { name }) if name == "edges"));
    }

    /// Passes if excluded operations are not wrapped
    #[tokio::test]
    async fn excluded_operation() {
        let wrapped = create_transformer(echo_map(), Marker, &[Operation::Find]);
        let result = wrapped
            .resolve(
                Operation::Find,
                &Value::Null,
                args(json!({"input": {"a": 1}})),
                &(),
                &Info::default(),
            )
            .await
            .unwrap();

        assert_eq!(value(json!({"a": 1})), result);
    }
}
