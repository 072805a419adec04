//! Injects values carried by the request context into resolver arguments, so that callers
//! cannot read or write outside the scope the context grants them (a tenant or an owner, say).

use crate::engine::context::RequestContext;
use crate::engine::resolvers::{Arguments, Info, Operation, Resolver, ResolverMap};
use crate::engine::value::{Map, Value};
use crate::Error;
use async_trait::async_trait;
use log::{debug, trace};
use std::sync::Arc;

/// Wraps `resolvers` so that, whenever the request context carries args, they are injected into
/// each call. Entity operations get them merged under the caller's input; `list` gets one
/// equality filter per value. Only the context args named in `names` are injected, or all of
/// them if `names` is empty.
///
/// # Examples
///
/// ```rust
/// # use resolver_transformers::engine::context_args::create_context_args_transformer;
/// # use resolver_transformers::engine::resolvers::{Operation, ResolverMap};
///
/// let resolvers = create_context_args_transformer(
///     ResolverMap::<()>::new(),
///     vec!["tenant".to_string()],
///     &[Operation::Delete],
/// );
/// ```
pub fn create_context_args_transformer<RequestCtx>(
    resolvers: ResolverMap<RequestCtx>,
    names: Vec<String>,
    exclude: &[Operation],
) -> ResolverMap<RequestCtx>
where
    RequestCtx: RequestContext,
{
    debug!(
        "create_context_args_transformer called -- names: {:?}, exclude: {:?}",
        names, exclude
    );
    let names = Arc::new(names);
    resolvers.wrap_each(exclude, |operation, inner| {
        Arc::new(ContextArgsResolver {
            operation,
            inner,
            names: names.clone(),
        })
    })
}

struct ContextArgsResolver<RequestCtx>
where
    RequestCtx: RequestContext,
{
    operation: Operation,
    inner: Arc<dyn Resolver<RequestCtx>>,
    names: Arc<Vec<String>>,
}

impl<RequestCtx> ContextArgsResolver<RequestCtx>
where
    RequestCtx: RequestContext,
{
    fn selected(&self, context_args: &Map) -> Map {
        context_args
            .iter()
            .filter(|(name, _)| self.names.is_empty() || self.names.contains(*name))
            .map(|(name, v)| (name.clone(), v.clone()))
            .collect()
    }
}

#[async_trait]
impl<RequestCtx> Resolver<RequestCtx> for ContextArgsResolver<RequestCtx>
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
            "ContextArgsResolver::resolve called -- operation: {}, args: {:#?}",
            self.operation,
            args
        );

        let args = match context.args() {
            Some(context_args) => {
                let injected = self.selected(context_args);
                if self.operation.is_list() {
                    inject_filters(args, injected)?
                } else {
                    inject_input(args, injected)?
                }
            }
            None => args,
        };

        self.inner.resolve(source, args, context, info).await
    }
}

/// Merges the caller's input over `injected`, so caller keys win
fn inject_input(mut args: Arguments, injected: Map) -> Result<Arguments, Error> {
    let mut input = injected;
    match args.take_input() {
        None | Some(Value::Null) => (),
        Some(Value::Map(m)) => input.extend(m),
        Some(_) => {
            return Err(Error::InputItemNotExpected {
                name: "input".to_string(),
            })
        }
    }
    args.set_input(Value::Map(input));
    Ok(args)
}

/// Appends an `EQ` filter entry for each injected value
fn inject_filters(mut args: Arguments, injected: Map) -> Result<Arguments, Error> {
    match args.input() {
        Some(Value::Map(_)) => (),
        None | Some(Value::Null) => args.set_input(Value::Map(Map::new())),
        Some(_) => {
            return Err(Error::InputItemNotExpected {
                name: "input".to_string(),
            })
        }
    }

    let input = args
        .input_mut()
        .and_then(Value::as_map_mut)
        .ok_or_else(|| Error::InputItemNotExpected {
            name: "input".to_string(),
        })?;
    let filter = input
        .entry("filter".to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if filter.is_null() {
        *filter = Value::Array(Vec::new());
    }

    match filter {
        Value::Array(entries) => {
            for (field, value) in injected {
                let mut entry = Map::new();
                entry.insert("field".to_string(), Value::String(field));
                entry.insert("op".to_string(), Value::from("EQ"));
                entry.insert("value".to_string(), value);
                entries.push(Value::Map(entry));
            }
            Ok(args)
        }
        _ => Err(Error::InputItemNotExpected {
            name: "filter".to_string(),
        }),
    }
}
