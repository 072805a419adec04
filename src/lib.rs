//! Resolver transformers wrap the resolvers of a CRUD+list data service with reusable
//! middleware. Start from a [`ResolverMap`] holding the `find`, `create`, `upsert`, `update`,
//! `delete` and `list` resolvers of a data source, and stack transformers over it. Each
//! transformer returns a new map with the same operations, so transformers compose in any
//! order.
//!
//! The transformers rename, add, remove or look up entity fields, inject values from the
//! request context into arguments, and throttle repeated calls with equivalent inputs. A stack
//! of transformers can be built in code with a [`Pipeline`], or described in a YAML [`Config`].
//!
//! [`ResolverMap`]: ./engine/resolvers/struct.ResolverMap.html
//! [`Pipeline`]: ./engine/struct.Pipeline.html
//! [`Config`]: ./engine/config/struct.Config.html

pub use engine::config::Config;
pub use engine::context::RequestContext;
pub use engine::resolvers::{
    resolver_fn, Arguments, Info, Operation, Resolver, ResolverFacade, ResolverMap,
};
pub use engine::value::{Map, Value};
pub use engine::Pipeline;
pub use error::Error;

pub mod engine;
pub mod error;
