//! Provides the [`Error`] type for resolver transformers

use crate::engine::resolvers::Operation;
use crate::engine::transformers::Clause;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Error type for resolver transformers
///
/// Errors are cheap to clone, so that the outcome of a single throttled invocation can be
/// handed unchanged to every caller that shares it.
///
/// # Examples
///
/// ```rust
/// use resolver_transformers::Error;
///
/// let e = Error::ResponseItemNotFound { name: "edges".to_string() };
/// ```
#[derive(Clone, Debug)]
pub enum Error {
    /// Returned if a `Config` file cannot be opened, typically because the configuration file
    /// cannot be found on disk
    ///
    /// [`Config`]: ../engine/config/struct.Config.html
    ConfigOpenFailed { source: Arc<std::io::Error> },

    /// Returned if a `Config` declares a format version other than the one supported by this
    /// crate. The field `expected` contains the supported version, and `found` contains the
    /// version read from the configuration.
    ///
    /// [`Config`]: ../engine/config/struct.Config.html
    ConfigVersionMismatched { expected: i32, found: i32 },

    /// Returned if a `Config` fails to deserialize because the provided data does not match the
    /// expected data structure
    ///
    /// [`Config`]: ../engine/config/struct.Config.html
    DeserializationFailed { source: Arc<serde_yaml::Error> },

    /// Returned if a `list` call filters or orders on a field that a remove transformer strips
    /// from its input. The `field` is the offending field name and `clause` tells whether it
    /// was referenced by a filter or an order entry.
    FieldRemoved { field: String, clause: Clause },

    /// Returned if an argument has a shape that a transformer cannot work with, such as a
    /// `filter` that is not a list. The `name` field contains the name of the argument.
    InputItemNotExpected { name: String },

    /// Returned if a resolver map is asked to resolve an operation for which it holds no
    /// resolver.
    ResolverNotFound { operation: Operation },

    /// Returned if a resolver result is missing an item that a transformer requires, such as
    /// the `edges` of a `list` connection. The `name` field contains the missing item.
    ResponseItemNotFound { name: String },

    /// Returned if a value cannot be serialized, for example while building a throttle key
    SerializationFailed { source: Arc<serde_json::Error> },

    /// Returned if a value fails to convert between the transformer [`Value`] and another
    /// representation. The `src` field contains the source type name or value that could not
    /// be converted.
    ///
    /// [`Value`]: ./engine/value/enum.Value.html
    TypeConversionFailed { src: String, dst: String },

    /// Returned by user-supplied resolvers to report their own failures. Transformers never
    /// wrap or alter these errors.
    UserDefinedError {
        source: Arc<dyn std::error::Error + Sync + Send>,
    },

    /// Returned when a throttle transformer is built with a wait that is neither
    /// a positive duration nor a non-empty mapping of operations to positive durations. The
    /// `details` field describes the rejected value.
    WaitInvalid { details: String },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Error::ConfigOpenFailed { source } => {
                write!(f, "Config file could not be opened. Source error: {}", source)
            }
            Error::ConfigVersionMismatched { expected, found } => {
                write!(f, "Config version not supported: expected {} but found {}", expected, found)
            }
            Error::DeserializationFailed { source } => {
                write!(f, "Failed to deserialize configuration. Source error: {}", source)
            }
            Error::FieldRemoved { field, clause } => {
                write!(f, "Cannot {} on removed field \"{}\"", clause, field)
            }
            Error::InputItemNotExpected { name } => {
                write!(f, "The argument {} does not have the expected shape.", name)
            }
            Error::ResolverNotFound { operation } => {
                write!(f, "Could not find a resolver for the {} operation", operation)
            }
            Error::ResponseItemNotFound { name } => {
                write!(
                    f,
                    "Could not find an expected response item, {}, in the resolver result.",
                    name
                )
            }
            Error::SerializationFailed { source } => {
                write!(f, "Serialization of a value failed. Source error: {}", source)
            }
            Error::TypeConversionFailed { src, dst } => {
                write!(f, "The type or value {} could not be converted to type {}", src, dst)
            }
            Error::UserDefinedError { source } => {
                write!(f, "User defined error. Source error: {}", source)
            }
            Error::WaitInvalid { details } => {
                write!(
                    f,
                    "wait must either be a numeric value in ms to throttle to, or a map of \
                     operation names and wait times: {}",
                    details
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ConfigOpenFailed { source } => Some(source.as_ref()),
            Error::ConfigVersionMismatched {
                expected: _,
                found: _,
            } => None,
            Error::DeserializationFailed { source } => Some(source.as_ref()),
            Error::FieldRemoved {
                field: _,
                clause: _,
            } => None,
            Error::InputItemNotExpected { name: _ } => None,
            Error::ResolverNotFound { operation: _ } => None,
            Error::ResponseItemNotFound { name: _ } => None,
            Error::SerializationFailed { source } => Some(source.as_ref()),
            Error::TypeConversionFailed { src: _, dst: _ } => None,
            Error::UserDefinedError { source } => Some(source.as_ref()),
            Error::WaitInvalid { details: _ } => None,
        }
    }
}

impl From<Box<dyn std::error::Error + Sync + Send>> for Error {
    fn from(e: Box<dyn std::error::Error + Sync + Send>) -> Self {
        Error::UserDefinedError { source: e.into() }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::DeserializationFailed {
            source: Arc::new(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::ConfigOpenFailed {
            source: Arc::new(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationFailed {
            source: Arc::new(e),
        }
    }
}
