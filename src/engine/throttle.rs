//! This module provides the throttle transformer. A throttled resolver groups its calls by a
//! canonical key built from `args.input`, and lets at most one call per key start an invocation
//! of the inner resolver within each wait window. Calls landing inside the window share the
//! outcome of that invocation, including its error.

use crate::engine::context::RequestContext;
use crate::engine::resolvers::{Arguments, Info, Operation, Resolver, ResolverMap};
use crate::engine::value::Value;
use crate::Error;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, trace};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::Span;
use tracing_futures::Instrument;

/// How long each throttle window lasts
#[derive(Clone, Debug, PartialEq)]
pub enum WaitSpec {
    /// The same window for every wrapped operation
    Every(Duration),

    /// A window per operation. Operations missing from the map are not throttled.
    PerOperation(BTreeMap<Operation, Duration>),
}

impl WaitSpec {
    /// Creates a wait applying the same number of milliseconds to every operation
    pub fn millis(ms: u64) -> WaitSpec {
        WaitSpec::Every(Duration::from_millis(ms))
    }

    /// Checks that every window is positive and that a per-operation map is not empty
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] variant [`WaitInvalid`] describing the first rejected window.
    ///
    /// [`Error`]: ../../error/enum.Error.html
    /// [`WaitInvalid`]: ../../error/enum.Error.html#variant.WaitInvalid
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            WaitSpec::Every(d) if d.as_nanos() == 0 => Err(Error::WaitInvalid {
                details: "wait is zero".to_string(),
            }),
            WaitSpec::Every(_) => Ok(()),
            WaitSpec::PerOperation(m) if m.is_empty() => Err(Error::WaitInvalid {
                details: "no operations given".to_string(),
            }),
            WaitSpec::PerOperation(m) => match m.iter().find(|(_, d)| d.as_nanos() == 0) {
                Some((op, _)) => Err(Error::WaitInvalid {
                    details: format!("wait for {} is zero", op),
                }),
                None => Ok(()),
            },
        }
    }

    fn wait_for(&self, operation: Operation) -> Option<Duration> {
        match self {
            WaitSpec::Every(d) => Some(*d),
            WaitSpec::PerOperation(m) => m.get(&operation).copied(),
        }
    }
}

/// Wraps `resolvers` so that calls with equivalent inputs are coalesced. The first call for a key
/// opens a window of the configured wait; every call for the same key until the window closes
/// gets that first call's result.
///
/// Per-key state is kept for the lifetime of the returned resolvers and never evicted.
///
/// # Errors
///
/// Returns an [`Error`] variant [`WaitInvalid`] if `wait` fails [`WaitSpec::validate`].
///
/// # Examples
///
/// ```rust
/// # use resolver_transformers::engine::resolvers::ResolverMap;
/// # use resolver_transformers::engine::throttle::{create_throttle_transformer, WaitSpec};
///
/// let resolvers =
///     create_throttle_transformer(ResolverMap::<()>::new(), WaitSpec::millis(100), &[]).unwrap();
/// assert!(create_throttle_transformer(resolvers, WaitSpec::millis(0), &[]).is_err());
/// ```
///
/// [`Error`]: ../../error/enum.Error.html
/// [`WaitInvalid`]: ../../error/enum.Error.html#variant.WaitInvalid
/// [`WaitSpec::validate`]: ./enum.WaitSpec.html#method.validate
pub fn create_throttle_transformer<RequestCtx>(
    resolvers: ResolverMap<RequestCtx>,
    wait: WaitSpec,
    exclude: &[Operation],
) -> Result<ResolverMap<RequestCtx>, Error>
where
    RequestCtx: RequestContext,
{
    debug!(
        "create_throttle_transformer called -- wait: {:?}, exclude: {:?}",
        wait, exclude
    );
    wait.validate()?;

    Ok(resolvers.wrap_each(exclude, |operation, inner| {
        match wait.wait_for(operation) {
            Some(wait) => {
                let throttled: Arc<dyn Resolver<RequestCtx>> =
                    Arc::new(ThrottleResolver::new(operation, wait, inner));
                throttled
            }
            None => inner,
        }
    }))
}

type SharedCall = Shared<BoxFuture<'static, Result<Value, Error>>>;

struct Window {
    opened: Instant,
    call: SharedCall,
}

struct ThrottleResolver<RequestCtx>
where
    RequestCtx: RequestContext,
{
    operation: Operation,
    wait: Duration,
    inner: Arc<dyn Resolver<RequestCtx>>,
    windows: Mutex<HashMap<String, Window>>,
}

impl<RequestCtx> ThrottleResolver<RequestCtx>
where
    RequestCtx: RequestContext,
{
    fn new(
        operation: Operation,
        wait: Duration,
        inner: Arc<dyn Resolver<RequestCtx>>,
    ) -> ThrottleResolver<RequestCtx> {
        ThrottleResolver {
            operation,
            wait,
            inner,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the call of the open window for `key`, or starts a new call and window
    fn call_for(
        &self,
        key: String,
        source: &Value,
        args: Arguments,
        context: &RequestCtx,
        info: &Info,
    ) -> SharedCall {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        match windows.get(&key) {
            Some(window) if now < window.opened + self.wait => {
                trace!(
                    "ThrottleResolver::call_for -- operation: {}, sharing call for key: {}",
                    self.operation,
                    key
                );
                return window.call.clone();
            }
            Some(_) => trace!(
                "ThrottleResolver::call_for -- operation: {}, window closed for key: {}",
                self.operation,
                key
            ),
            None => debug!(
                "ThrottleResolver::call_for -- operation: {}, first seen key: {}",
                self.operation, key
            ),
        }

        let inner = self.inner.clone();
        let source = source.clone();
        let context = context.clone();
        let info = info.clone();
        let call = async move { inner.resolve(&source, args, &context, &info).await }
            .instrument(Span::current())
            .boxed()
            .shared();

        windows.insert(
            key,
            Window {
                opened: now,
                call: call.clone(),
            },
        );
        call
    }
}

#[async_trait]
impl<RequestCtx> Resolver<RequestCtx> for ThrottleResolver<RequestCtx>
where
    RequestCtx: RequestContext,
{
    #[tracing::instrument(
        level = "debug",
        name = "throttle-resolve",
        skip(self, source, args, context, info)
    )]
    async fn resolve(
        &self,
        source: &Value,
        args: Arguments,
        context: &RequestCtx,
        info: &Info,
    ) -> Result<Value, Error> {
        trace!(
            "ThrottleResolver::resolve called -- operation: {}, args: {:#?}",
            self.operation,
            args
        );

        let key = match args.input() {
            Some(input) => input.canonical_key()?,
            None => "null".to_string(),
        };
        self.call_for(key, source, args, context, info).await
    }
}
