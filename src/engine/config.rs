//! This module provides types for describing a transformer pipeline in YAML. A configuration is
//! an ordered list of layers, each naming one transformer and its rules; applying it to a
//! resolver map wraps the map with each layer in turn.

use crate::engine::context::RequestContext;
use crate::engine::context_args::create_context_args_transformer;
use crate::engine::resolvers::{Operation, ResolverMap};
use crate::engine::throttle::{create_throttle_transformer, WaitSpec};
use crate::engine::transformers::add::{create_add_transformer, AddRule, AddValue};
use crate::engine::transformers::remove::create_remove_transformer;
use crate::engine::transformers::rename::{create_rename_transformer, RenameRule};
use crate::engine::value::Value;
use crate::Error;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::str::FromStr;
use std::time::Duration;

/// The configuration format version supported by this crate
pub const CONFIG_VERSION: i32 = 1;

/// Configuration of a transformer pipeline. The configuration contains the version of the
/// configuration format and a vector of [`Layer`] structures, applied first to last.
///
/// # Examples
///
/// ```rust
/// use resolver_transformers::engine::config::Config;
///
/// let c = Config::new(1, Vec::new());
/// ```
///
/// [`Layer`]: enum.Layer.html
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Version of the configuration format used
    pub version: i32,

    /// The layers, innermost first
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl Config {
    pub fn new(version: i32, layers: Vec<Layer>) -> Config {
        Config { version, layers }
    }

    /// Creates a new [`Config`] data structure from the contents of the specified config file.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] variant [`ConfigOpenFailed`] if the file cannot be opened, and
    /// [`DeserializationFailed`] if its contents are not a valid configuration.
    ///
    /// [`Config`]: struct.Config.html
    /// [`Error`]: ../../error/enum.Error.html
    /// [`ConfigOpenFailed`]: ../../error/enum.Error.html#variant.ConfigOpenFailed
    /// [`DeserializationFailed`]: ../../error/enum.Error.html#variant.DeserializationFailed
    pub fn from_file(path: String) -> Result<Config, Error> {
        let f = File::open(path)?;
        let r = BufReader::new(f);
        Ok(serde_yaml::from_reader(r)?)
    }

    /// Checks that the configuration uses the supported format version, and that every
    /// throttle layer carries a usable wait.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] variant [`ConfigVersionMismatched`] for an unsupported version, or
    /// [`WaitInvalid`] for a throttle layer with a zero or empty wait.
    ///
    /// [`Error`]: ../../error/enum.Error.html
    /// [`ConfigVersionMismatched`]: ../../error/enum.Error.html#variant.ConfigVersionMismatched
    /// [`WaitInvalid`]: ../../error/enum.Error.html#variant.WaitInvalid
    pub fn validate(&self) -> Result<(), Error> {
        if self.version != CONFIG_VERSION {
            return Err(Error::ConfigVersionMismatched {
                expected: CONFIG_VERSION,
                found: self.version,
            });
        }

        for layer in &self.layers {
            if let Layer::Throttle { wait, .. } = layer {
                wait.to_wait_spec().validate()?;
            }
        }

        Ok(())
    }

    /// Validates the configuration and wraps `resolvers` with each of its layers, first layer
    /// innermost
    pub fn apply<RequestCtx>(
        &self,
        resolvers: ResolverMap<RequestCtx>,
    ) -> Result<ResolverMap<RequestCtx>, Error>
    where
        RequestCtx: RequestContext,
    {
        debug!("Config::apply called -- layers: {}", self.layers.len());
        self.validate()?;
        self.layers
            .iter()
            .try_fold(resolvers, |resolvers, layer| layer.apply(resolvers))
    }
}

impl FromStr for Config {
    type Err = Error;

    /// Parses a [`Config`] from a YAML string
    ///
    /// [`Config`]: struct.Config.html
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_yaml::from_str(s)?)
    }
}

/// Concatenates the layers of several configurations, in order, into one configuration. All
/// configurations must share the same version.
///
/// # Errors
///
/// Returns an [`Error`] variant [`ConfigVersionMismatched`] if the versions differ.
///
/// [`Error`]: ../../error/enum.Error.html
/// [`ConfigVersionMismatched`]: ../../error/enum.Error.html#variant.ConfigVersionMismatched
pub fn compose(configs: Vec<Config>) -> Result<Config, Error> {
    let mut version: Option<i32> = None;
    let mut layers = Vec::new();

    for c in configs {
        match version {
            Some(v) if v != c.version => {
                return Err(Error::ConfigVersionMismatched {
                    expected: v,
                    found: c.version,
                })
            }
            Some(_) => (),
            None => version = Some(c.version),
        }
        layers.extend(c.layers);
    }

    Ok(Config::new(version.unwrap_or(CONFIG_VERSION), layers))
}

/// A single transformer with its rules. Lookups and derived add values hold resolvers and
/// functions, so they can only be composed in code.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Layer {
    Rename {
        fields: RenameRule,
        #[serde(default)]
        exclude: Vec<Operation>,
    },
    Add {
        #[serde(default)]
        input: Option<IndexMap<String, Value>>,
        #[serde(default)]
        output: Option<IndexMap<String, Value>>,
        #[serde(default)]
        exclude: Vec<Operation>,
    },
    Remove {
        #[serde(default)]
        input: Vec<String>,
        #[serde(default)]
        output: Vec<String>,
        #[serde(default)]
        exclude: Vec<Operation>,
    },
    ContextArgs {
        #[serde(default)]
        names: Vec<String>,
        #[serde(default)]
        exclude: Vec<Operation>,
    },
    Throttle {
        wait: Wait,
        #[serde(default)]
        exclude: Vec<Operation>,
    },
}

impl Layer {
    fn apply<RequestCtx>(
        &self,
        resolvers: ResolverMap<RequestCtx>,
    ) -> Result<ResolverMap<RequestCtx>, Error>
    where
        RequestCtx: RequestContext,
    {
        match self {
            Layer::Rename { fields, exclude } => Ok(create_rename_transformer(
                resolvers,
                fields.clone(),
                exclude,
            )),
            Layer::Add {
                input,
                output,
                exclude,
            } => Ok(create_add_transformer(
                resolvers,
                input.as_ref().map(literal_rule),
                output.as_ref().map(literal_rule),
                exclude,
            )),
            Layer::Remove {
                input,
                output,
                exclude,
            } => Ok(create_remove_transformer(
                resolvers,
                input.clone(),
                output.clone(),
                exclude,
            )),
            Layer::ContextArgs { names, exclude } => Ok(create_context_args_transformer(
                resolvers,
                names.clone(),
                exclude,
            )),
            Layer::Throttle { wait, exclude } => {
                create_throttle_transformer(resolvers, wait.to_wait_spec(), exclude)
            }
        }
    }
}

fn literal_rule(fields: &IndexMap<String, Value>) -> AddRule {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), AddValue::Literal(v.clone())))
        .collect()
}

/// A throttle wait in milliseconds, either for every operation or per operation
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Wait {
    Millis(u64),
    PerOperation(BTreeMap<Operation, u64>),
}

impl Wait {
    pub fn to_wait_spec(&self) -> WaitSpec {
        match self {
            Wait::Millis(ms) => WaitSpec::millis(*ms),
            Wait::PerOperation(m) => WaitSpec::PerOperation(
                m.iter()
                    .map(|(op, ms)| (*op, Duration::from_millis(*ms)))
                    .collect(),
            ),
        }
    }
}
