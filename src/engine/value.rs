//! Schema-agnostic value container used for arguments, entities and connections flowing through
//! the transformers.

use crate::Error;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::convert::{TryFrom, TryInto};

/// Ordered mapping from field name to [`Value`], the shape of every entity and argument object
pub type Map = IndexMap<String, Value>;

/// A dynamically typed value. Maps keep the insertion order of their keys, so rewriting an
/// entity never reorders the fields a resolver returned.
///
/// Cloning a `Value` produces a fully independent copy: arrays are rebuilt element-wise and maps
/// key-by-key.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    String(String),
    Array(Vec<Value>),
    Map(Map),
}

impl Value {
    /// Returns the inner map if this value is a [`Value::Map`]
    pub fn as_map(&self) -> Option<&Map> {
        if let Value::Map(m) = self {
            Some(m)
        } else {
            None
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        if let Value::Map(m) = self {
            Some(m)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns a copy of the value with the keys of every map, at every nesting level, sorted
    /// by code point. Array order is left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use resolver_transformers::engine::value::Value;
    /// # use serde_json::json;
    /// # use std::convert::TryFrom;
    ///
    /// let v = Value::try_from(json!({"b": [{"d": 1, "c": 2}], "a": 1})).unwrap();
    /// let sorted = v.canonicalize();
    ///
    /// let keys: Vec<&str> = sorted.as_map().unwrap().keys().map(String::as_str).collect();
    /// assert_eq!(vec!["a", "b"], keys);
    /// assert_eq!(v, sorted);
    /// ```
    pub fn canonicalize(&self) -> Value {
        match self {
            Value::Array(a) => Value::Array(a.iter().map(Value::canonicalize).collect()),
            Value::Map(m) => {
                let mut entries: Vec<(&String, &Value)> = m.iter().collect();
                entries.sort_by(|(a, _), (b, _)| a.cmp(b));
                Value::Map(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k.clone(), v.canonicalize()))
                        .collect(),
                )
            }
            v => v.clone(),
        }
    }

    /// Serializes the canonical form of the value to a JSON string suitable for use as a cache
    /// key. Values that differ only in the insertion order of their map keys produce the same
    /// key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use resolver_transformers::engine::value::Value;
    /// # use serde_json::json;
    /// # use std::convert::TryFrom;
    ///
    /// let a = Value::try_from(json!({"b": 2, "a": 1})).unwrap();
    /// let b = Value::try_from(json!({"a": 1, "b": 2})).unwrap();
    /// assert_eq!(a.canonical_key().unwrap(), b.canonical_key().unwrap());
    /// ```
    pub fn canonical_key(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.canonicalize())?)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int64(i)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(oa)) => a == oa,
            (Value::Bool(b), Value::Bool(ob)) => b == ob,
            (Value::Float64(f), Value::Float64(of)) => f == of,
            (Value::Int64(i), Value::Int64(oi)) => i == oi,
            (Value::Map(m), Value::Map(om)) => m == om,
            (Value::Null, Value::Null) => true,
            (Value::String(s), Value::String(os)) => s == os,
            (Value::UInt64(i), Value::UInt64(oi)) => i == oi,
            (_, _) => false,
        }
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Value, Error> {
        match value {
            serde_json::Value::Array(a) => {
                let mut v = Vec::new();
                for val in a {
                    v.push(val.try_into()?);
                }
                Ok(Value::Array(v))
            }
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int64(i))
                } else if let Some(i) = n.as_u64() {
                    Ok(Value::UInt64(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float64(f))
                } else {
                    Err(Error::TypeConversionFailed {
                        src: "serde_json::Value::Number".to_string(),
                        dst: "Value".to_string(),
                    })
                }
            }
            serde_json::Value::String(s) => Ok(Value::String(s)),
            serde_json::Value::Object(m) => {
                let mut hm = Map::new();
                for (k, v) in m.into_iter() {
                    hm.insert(k, v.try_into()?);
                }
                Ok(Value::Map(hm))
            }
        }
    }
}

impl TryFrom<Value> for serde_json::Value {
    type Error = Error;

    fn try_from(value: Value) -> Result<serde_json::Value, Error> {
        match value {
            Value::Array(a) => {
                let mut v = Vec::new();
                for val in a {
                    v.push(val.try_into()?)
                }
                Ok(serde_json::Value::Array(v))
            }
            Value::Bool(b) => Ok(serde_json::Value::Bool(b)),
            Value::Float64(f) => Ok(serde_json::Value::Number(
                serde_json::Number::from_f64(f).ok_or_else(|| Error::TypeConversionFailed {
                    src: "Value::Float64".to_string(),
                    dst: "serde_json::Number".to_string(),
                })?,
            )),
            Value::Int64(i) => Ok(serde_json::Value::Number(i.into())),
            Value::Map(hm) => {
                let mut m = serde_json::Map::new();
                for (k, v) in hm.into_iter() {
                    m.insert(k, v.try_into()?);
                }
                Ok(serde_json::Value::Object(m))
            }
            Value::Null => Ok(serde_json::Value::Null),
            Value::String(s) => Ok(serde_json::Value::String(s)),
            Value::UInt64(i) => Ok(serde_json::Value::Number(i.into())),
        }
    }
}
