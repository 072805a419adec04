//! This module provides the resolver transformer engine, including supporting modules for the
//! resolver contract, the field rewriting and context injection transformers, throttling, and
//! pipeline configuration.

use crate::Error;
use config::Config;
use context::RequestContext;
use context_args::create_context_args_transformer;
use log::debug;
use resolvers::{Operation, ResolverMap};
use throttle::{create_throttle_transformer, WaitSpec};
use transformers::add::{create_add_transformer, AddRule};
use transformers::lookup::{create_lookup_transformer, LookupRule};
use transformers::remove::create_remove_transformer;
use transformers::rename::{create_rename_transformer, RenameRule};

pub mod config;
pub mod context;
pub mod context_args;
pub mod resolvers;
pub mod throttle;
pub mod transformers;
pub mod value;

/// Builder stacking transformers over a base [`ResolverMap`]. Each call wraps the map built so
/// far, so the first transformer added is the innermost: it sees inputs last and results first.
///
/// # Examples
///
/// ```rust
/// use resolver_transformers::engine::Pipeline;
/// use resolver_transformers::engine::resolvers::{Operation, ResolverMap};
/// use resolver_transformers::engine::throttle::WaitSpec;
///
/// let resolvers = Pipeline::new(ResolverMap::<()>::new())
///     .remove(vec![], vec!["password".to_string()], &[])
///     .context_args(vec!["tenant".to_string()], &[Operation::Delete])
///     .throttle(WaitSpec::millis(50), &[])
///     .unwrap()
///     .build();
/// ```
///
/// [`ResolverMap`]: ./resolvers/struct.ResolverMap.html
pub struct Pipeline<RequestCtx = ()>
where
    RequestCtx: RequestContext,
{
    resolvers: ResolverMap<RequestCtx>,
}

impl<RequestCtx> Pipeline<RequestCtx>
where
    RequestCtx: RequestContext,
{
    /// Starts a pipeline over the base resolvers
    pub fn new(resolvers: ResolverMap<RequestCtx>) -> Pipeline<RequestCtx> {
        Pipeline { resolvers }
    }

    /// Adds a rename transformer. See [`create_rename_transformer`].
    ///
    /// [`create_rename_transformer`]: ./transformers/rename/fn.create_rename_transformer.html
    pub fn rename(self, fields: RenameRule, exclude: &[Operation]) -> Pipeline<RequestCtx> {
        Pipeline {
            resolvers: create_rename_transformer(self.resolvers, fields, exclude),
        }
    }

    /// Adds an add transformer. See [`create_add_transformer`].
    ///
    /// [`create_add_transformer`]: ./transformers/add/fn.create_add_transformer.html
    pub fn add(
        self,
        add_in: Option<AddRule>,
        add_out: Option<AddRule>,
        exclude: &[Operation],
    ) -> Pipeline<RequestCtx> {
        Pipeline {
            resolvers: create_add_transformer(self.resolvers, add_in, add_out, exclude),
        }
    }

    /// Adds a remove transformer. See [`create_remove_transformer`].
    ///
    /// [`create_remove_transformer`]: ./transformers/remove/fn.create_remove_transformer.html
    pub fn remove(
        self,
        remove_in: Vec<String>,
        remove_out: Vec<String>,
        exclude: &[Operation],
    ) -> Pipeline<RequestCtx> {
        Pipeline {
            resolvers: create_remove_transformer(self.resolvers, remove_in, remove_out, exclude),
        }
    }

    /// Adds a lookup transformer. See [`create_lookup_transformer`].
    ///
    /// [`create_lookup_transformer`]: ./transformers/lookup/fn.create_lookup_transformer.html
    pub fn lookup(
        self,
        fields: LookupRule<RequestCtx>,
        exclude: &[Operation],
    ) -> Pipeline<RequestCtx> {
        Pipeline {
            resolvers: create_lookup_transformer(self.resolvers, fields, exclude),
        }
    }

    /// Adds a context args transformer. See [`create_context_args_transformer`].
    ///
    /// [`create_context_args_transformer`]: ./context_args/fn.create_context_args_transformer.html
    pub fn context_args(self, names: Vec<String>, exclude: &[Operation]) -> Pipeline<RequestCtx> {
        Pipeline {
            resolvers: create_context_args_transformer(self.resolvers, names, exclude),
        }
    }

    /// Adds a throttle transformer. See [`create_throttle_transformer`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] variant [`WaitInvalid`] if the wait is zero or empty.
    ///
    /// [`create_throttle_transformer`]: ./throttle/fn.create_throttle_transformer.html
    /// [`Error`]: ../error/enum.Error.html
    /// [`WaitInvalid`]: ../error/enum.Error.html#variant.WaitInvalid
    pub fn throttle(
        self,
        wait: WaitSpec,
        exclude: &[Operation],
    ) -> Result<Pipeline<RequestCtx>, Error> {
        Ok(Pipeline {
            resolvers: create_throttle_transformer(self.resolvers, wait, exclude)?,
        })
    }

    /// Adds every layer of a [`Config`], first layer innermost
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the configuration fails [`Config::validate`].
    ///
    /// [`Config`]: ./config/struct.Config.html
    /// [`Config::validate`]: ./config/struct.Config.html#method.validate
    /// [`Error`]: ../error/enum.Error.html
    pub fn with_config(self, config: &Config) -> Result<Pipeline<RequestCtx>, Error> {
        debug!("Pipeline::with_config called -- config: {:#?}", config);
        Ok(Pipeline {
            resolvers: config.apply(self.resolvers)?,
        })
    }

    /// Returns the fully wrapped resolvers
    pub fn build(self) -> ResolverMap<RequestCtx> {
        self.resolvers
    }
}
