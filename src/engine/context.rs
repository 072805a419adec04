//! This module provides the request context contract shared by every resolver and transformer.
//! The context is owned by the hosting framework; transformers only ever read from it.

use crate::engine::value::Map;
use std::fmt::Debug;

/// Trait implemented by the per-request context passed to resolvers. Apart from the optional
/// `args` consumed by the context args transformer, the context is opaque to this crate and is
/// handed unchanged to every inner resolver.
///
/// # Examples
///
/// ```rust
/// # use resolver_transformers::engine::context::RequestContext;
/// # use resolver_transformers::engine::value::{Map, Value};
///
/// #[derive(Clone, Debug)]
/// pub struct TenantCtx {
///     args: Map,
/// }
///
/// impl RequestContext for TenantCtx {
///     fn args(&self) -> Option<&Map> {
///         Some(&self.args)
///     }
/// }
/// ```
pub trait RequestContext: 'static + Clone + Debug + Send + Sync {
    /// Values to be injected into resolver arguments, keyed by field name
    fn args(&self) -> Option<&Map> {
        None
    }
}

impl RequestContext for () {}

#[cfg(test)]
mod tests {
    use super::RequestContext;

    /// Passes if the unit context carries no args
    #[test]
    fn unit_context_has_no_args() {
        assert!(().args().is_none());
    }
}
