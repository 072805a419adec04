//! Contains the resolver contract: the six operations, the arguments and info handed to each
//! call, the [`Resolver`] trait, and the [`ResolverMap`] that transformers consume and produce.

use crate::engine::context::RequestContext;
use crate::engine::value::{Map, Value};
use crate::Error;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt::{Debug, Display, Formatter};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

/// The operations of the CRUD+list contract. Every resolver map is keyed by these.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Find,
    Create,
    Upsert,
    Update,
    Delete,
    /// Returns a connection of `edges`, each wrapping a `node`, rather than a bare entity
    List,
}

impl Operation {
    /// All six operations, in contract order
    pub const ALL: [Operation; 6] = [
        Operation::Find,
        Operation::Create,
        Operation::Upsert,
        Operation::Update,
        Operation::Delete,
        Operation::List,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Find => "find",
            Operation::Create => "create",
            Operation::Upsert => "upsert",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::List => "list",
        }
    }

    pub fn is_list(&self) -> bool {
        *self == Operation::List
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .find(|op| op.name() == s)
            .copied()
            .ok_or_else(|| Error::TypeConversionFailed {
                src: s.to_string(),
                dst: "Operation".to_string(),
            })
    }
}

/// Arguments passed to a resolver. The `input` argument carries the entity payload, or the
/// `filter` and `order` clauses for `list`; any other arguments are carried along untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    args: Map,
}

impl Arguments {
    pub fn new() -> Arguments {
        Arguments { args: Map::new() }
    }

    /// Creates arguments holding only the given `input`
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use resolver_transformers::engine::resolvers::Arguments;
    /// # use resolver_transformers::engine::value::Value;
    ///
    /// let args = Arguments::with_input(Value::Null);
    /// assert!(args.input().is_some());
    /// ```
    pub fn with_input(input: Value) -> Arguments {
        let mut args = Map::new();
        args.insert("input".to_string(), input);
        Arguments { args }
    }

    pub fn input(&self) -> Option<&Value> {
        self.args.get("input")
    }

    pub fn input_mut(&mut self) -> Option<&mut Value> {
        self.args.get_mut("input")
    }

    pub fn set_input(&mut self, input: Value) {
        self.args.insert("input".to_string(), input);
    }

    /// Takes the input out of the arguments, leaving a null in its place. Use [`set_input`] to
    /// put a rewritten input back in its original position.
    ///
    /// [`set_input`]: #method.set_input
    pub fn take_input(&mut self) -> Option<Value> {
        self.args.get_mut("input").map(|v| std::mem::replace(v, Value::Null))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    pub fn insert(&mut self, name: String, value: Value) -> Option<Value> {
        self.args.insert(name, value)
    }

    pub fn as_map(&self) -> &Map {
        &self.args
    }
}

impl From<Map> for Arguments {
    fn from(args: Map) -> Self {
        Arguments { args }
    }
}

impl TryFrom<serde_json::Value> for Arguments {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Arguments, Error> {
        match Value::try_from(value)? {
            Value::Map(args) => Ok(Arguments { args }),
            v => Err(Error::TypeConversionFailed {
                src: format!("{:#?}", v),
                dst: "Arguments".to_string(),
            }),
        }
    }
}

/// Opaque metadata about the call being resolved, supplied by the hosting framework. Every
/// transformer passes it through unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Info {
    name: String,
}

impl Info {
    pub fn new(name: String) -> Info {
        Info { name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The contract implemented by every resolver, whether a base data-access implementation or a
/// transformer wrapping one. Wrappers call their inner resolver with exactly this signature,
/// which keeps them transparent and stackable in any order.
#[async_trait]
pub trait Resolver<RequestCtx>: Send + Sync
where
    RequestCtx: RequestContext,
{
    async fn resolve(
        &self,
        source: &Value,
        args: Arguments,
        context: &RequestCtx,
        info: &Info,
    ) -> Result<Value, Error>;
}

/// Bundles the parameters of a single resolver call for resolvers written as plain functions.
/// See [`resolver_fn`].
///
/// [`resolver_fn`]: ./fn.resolver_fn.html
#[derive(Clone, Debug)]
pub struct ResolverFacade<RequestCtx>
where
    RequestCtx: RequestContext,
{
    source: Value,
    args: Arguments,
    context: RequestCtx,
    info: Info,
}

impl<RequestCtx> ResolverFacade<RequestCtx>
where
    RequestCtx: RequestContext,
{
    pub(crate) fn new(
        source: Value,
        args: Arguments,
        context: RequestCtx,
        info: Info,
    ) -> ResolverFacade<RequestCtx> {
        ResolverFacade {
            source,
            args,
            context,
            info,
        }
    }

    pub fn source(&self) -> &Value {
        &self.source
    }

    pub fn args(&self) -> &Arguments {
        &self.args
    }

    pub fn input(&self) -> Option<&Value> {
        self.args.input()
    }

    pub fn context(&self) -> &RequestCtx {
        &self.context
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    /// Returns a null result
    pub fn resolve_null(&self) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    /// Returns a `list` connection wrapping each of `nodes` in an edge, in order
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use resolver_transformers::engine::resolvers::{resolver_fn, ResolverFacade};
    /// # use resolver_transformers::engine::value::{Map, Value};
    ///
    /// let list = resolver_fn(|facade: ResolverFacade<()>| async move {
    ///     facade.resolve_connection(vec![Value::Map(Map::new())])
    /// });
    /// ```
    pub fn resolve_connection(&self, nodes: Vec<Value>) -> Result<Value, Error> {
        let edges = nodes
            .into_iter()
            .map(|node| {
                let mut edge = Map::new();
                edge.insert("node".to_string(), node);
                Value::Map(edge)
            })
            .collect();
        let mut connection = Map::new();
        connection.insert("edges".to_string(), Value::Array(edges));
        Ok(Value::Map(connection))
    }
}

struct FnResolver<F> {
    f: F,
}

#[async_trait]
impl<RequestCtx, F, Fut> Resolver<RequestCtx> for FnResolver<F>
where
    RequestCtx: RequestContext,
    F: Fn(ResolverFacade<RequestCtx>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, Error>> + Send,
{
    async fn resolve(
        &self,
        source: &Value,
        args: Arguments,
        context: &RequestCtx,
        info: &Info,
    ) -> Result<Value, Error> {
        let facade = ResolverFacade::new(source.clone(), args, context.clone(), info.clone());
        (self.f)(facade).await
    }
}

/// Turns an async function or closure over a [`ResolverFacade`] into a shareable [`Resolver`]
///
/// # Examples
///
/// ```rust
/// # use resolver_transformers::engine::resolvers::{resolver_fn, ResolverFacade};
///
/// let find = resolver_fn(|facade: ResolverFacade<()>| async move {
///     Ok(facade.input().cloned().unwrap_or_default())
/// });
/// ```
///
/// [`ResolverFacade`]: ./struct.ResolverFacade.html
/// [`Resolver`]: ./trait.Resolver.html
pub fn resolver_fn<RequestCtx, F, Fut>(f: F) -> Arc<dyn Resolver<RequestCtx>>
where
    RequestCtx: RequestContext,
    F: Fn(ResolverFacade<RequestCtx>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, Error>> + Send + 'static,
{
    Arc::new(FnResolver { f })
}

/// A set of resolvers keyed by [`Operation`]. Transformers take a map and return a new map with
/// exactly the same operations, substituting a wrapped resolver for each operation they are not
/// told to exclude.
///
/// # Examples
///
/// ```rust
/// # use resolver_transformers::engine::resolvers::{
/// #     resolver_fn, Operation, ResolverFacade, ResolverMap,
/// # };
///
/// let find = resolver_fn(|f: ResolverFacade<()>| async move { f.resolve_null() });
/// let resolvers = ResolverMap::<()>::new().with(Operation::Find, find);
/// assert!(resolvers.contains(Operation::Find));
/// ```
///
/// [`Operation`]: ./enum.Operation.html
pub struct ResolverMap<RequestCtx>
where
    RequestCtx: RequestContext,
{
    resolvers: BTreeMap<Operation, Arc<dyn Resolver<RequestCtx>>>,
}

impl<RequestCtx> ResolverMap<RequestCtx>
where
    RequestCtx: RequestContext,
{
    pub fn new() -> ResolverMap<RequestCtx> {
        ResolverMap {
            resolvers: BTreeMap::new(),
        }
    }

    /// Adds or replaces the resolver for `operation`, returning the map for chaining
    pub fn with(
        mut self,
        operation: Operation,
        resolver: Arc<dyn Resolver<RequestCtx>>,
    ) -> ResolverMap<RequestCtx> {
        self.resolvers.insert(operation, resolver);
        self
    }

    pub fn insert(&mut self, operation: Operation, resolver: Arc<dyn Resolver<RequestCtx>>) {
        self.resolvers.insert(operation, resolver);
    }

    pub fn get(&self, operation: Operation) -> Option<&Arc<dyn Resolver<RequestCtx>>> {
        self.resolvers.get(&operation)
    }

    pub fn contains(&self, operation: Operation) -> bool {
        self.resolvers.contains_key(&operation)
    }

    pub fn operations(&self) -> impl Iterator<Item = Operation> + '_ {
        self.resolvers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Returns true if the map holds a resolver for each of the six operations
    pub fn is_complete(&self) -> bool {
        Operation::ALL.iter().all(|op| self.resolvers.contains_key(op))
    }

    /// Invokes the resolver for `operation`
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] variant [`ResolverNotFound`] if the map has no resolver for the
    /// operation. Any error from the resolver itself is returned unchanged.
    ///
    /// [`Error`]: ../../error/enum.Error.html
    /// [`ResolverNotFound`]: ../../error/enum.Error.html#variant.ResolverNotFound
    pub async fn resolve(
        &self,
        operation: Operation,
        source: &Value,
        args: Arguments,
        context: &RequestCtx,
        info: &Info,
    ) -> Result<Value, Error> {
        let resolver = self
            .resolvers
            .get(&operation)
            .ok_or(Error::ResolverNotFound { operation })?;
        resolver.resolve(source, args, context, info).await
    }

    /// Builds a new map with the same operations, replacing the resolver of every operation not
    /// in `exclude` with the result of `wrap`. Excluded resolvers are carried over as they are.
    pub(crate) fn wrap_each<F>(self, exclude: &[Operation], mut wrap: F) -> ResolverMap<RequestCtx>
    where
        F: FnMut(Operation, Arc<dyn Resolver<RequestCtx>>) -> Arc<dyn Resolver<RequestCtx>>,
    {
        let resolvers = self
            .resolvers
            .into_iter()
            .map(|(op, resolver)| {
                if exclude.contains(&op) {
                    debug!("ResolverMap::wrap_each -- excluded operation: {}", op);
                    (op, resolver)
                } else {
                    (op, wrap(op, resolver))
                }
            })
            .collect();
        ResolverMap { resolvers }
    }
}

impl<RequestCtx> Clone for ResolverMap<RequestCtx>
where
    RequestCtx: RequestContext,
{
    fn clone(&self) -> Self {
        ResolverMap {
            resolvers: self.resolvers.clone(),
        }
    }
}

impl<RequestCtx> Default for ResolverMap<RequestCtx>
where
    RequestCtx: RequestContext,
{
    fn default() -> Self {
        ResolverMap::new()
    }
}

impl<RequestCtx> Debug for ResolverMap<RequestCtx>
where
    RequestCtx: RequestContext,
{
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_set().entries(self.resolvers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{resolver_fn, Arguments, Info, Operation, ResolverFacade, ResolverMap};
    use crate::engine::value::Value;
    use crate::Error;
    use serde_json::json;
    use std::convert::TryFrom;
    use std::sync::Arc;

    fn echo() -> Arc<dyn super::Resolver<()>> {
        resolver_fn(|facade: ResolverFacade<()>| async move {
            Ok(facade.input().cloned().unwrap_or_default())
        })
    }

    /// Passes if operation names parse and print symmetrically
    #[test]
    fn operation_names() {
        for op in Operation::ALL.iter() {
            assert_eq!(*op, op.to_string().parse::<Operation>().unwrap());
        }
        assert!("query".parse::<Operation>().is_err());
    }

    /// Passes if operations deserialize from lowercase names
    #[test]
    fn operation_deserialize() {
        let ops: Vec<Operation> = serde_json::from_str(r#"["find", "list"]"#).unwrap();
        assert_eq!(vec![Operation::Find, Operation::List], ops);
    }

    /// Passes if taking the input keeps its position for a later set
    #[test]
    fn take_and_set_input() {
        let mut args =
            Arguments::try_from(json!({"before": 1, "input": {"a": 1}, "after": 2})).unwrap();
        let input = args.take_input().unwrap();
        args.set_input(input);

        let keys: Vec<&str> = args.as_map().keys().map(String::as_str).collect();
        assert_eq!(vec!["before", "input", "after"], keys);
    }

    /// Passes if non-object JSON cannot become arguments
    #[test]
    fn arguments_from_scalar() {
        assert!(Arguments::try_from(json!(5)).is_err());
    }

    /// Passes if a function resolver receives the arguments it is called with
    #[tokio::test]
    async fn resolver_fn_receives_input() {
        let map = ResolverMap::new().with(Operation::Find, echo());
        let result = map
            .resolve(
                Operation::Find,
                &Value::Null,
                Arguments::with_input(Value::Int64(7)),
                &(),
                &Info::new("find".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(Value::Int64(7), result);
    }

    /// Passes if resolving a missing operation is an error
    #[tokio::test]
    async fn resolve_missing_operation() {
        let map: ResolverMap<()> = ResolverMap::new();
        let result = map
            .resolve(
                Operation::Delete,
                &Value::Null,
                Arguments::new(),
                &(),
                &Info::default(),
            )
            .await;

        assert!(matches!(
            result,
            Err(Error::ResolverNotFound {
                operation: Operation::Delete
            })
        ));
    }

    /// Passes if wrapping keeps the key set and skips excluded operations
    #[test]
    fn wrap_each_preserves_operations() {
        let map = ResolverMap::new()
            .with(Operation::Find, echo())
            .with(Operation::List, echo());
        let find = map.get(Operation::Find).unwrap().clone();

        let mut wrapped_ops = Vec::new();
        let wrapped = map.wrap_each(&[Operation::Find], |op, r| {
            wrapped_ops.push(op);
            r
        });

        assert_eq!(vec![Operation::List], wrapped_ops);
        assert_eq!(
            vec![Operation::Find, Operation::List],
            wrapped.operations().collect::<Vec<_>>()
        );
        assert!(Arc::ptr_eq(&find, wrapped.get(Operation::Find).unwrap()));
        assert!(!wrapped.is_complete());
    }

    /// Passes if the connection helper wraps nodes in edges in order
    #[test]
    fn resolve_connection_shape() {
        let facade = ResolverFacade::new(Value::Null, Arguments::new(), (), Info::default());
        let connection = facade
            .resolve_connection(vec![Value::Int64(1), Value::Int64(2)])
            .unwrap();

        assert_eq!(
            Value::try_from(json!({"edges": [{"node": 1}, {"node": 2}]})).unwrap(),
            connection
        );
    }
}
