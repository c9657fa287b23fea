//! Dynamically typed attribute values
//!
//! Rule files carry JSON scalars. They are converted once, at table build
//! time, into the closed [`Value`] sum type so the applier can match on it
//! exhaustively.

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar attribute value from a rule file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    /// Unsigned values too large for `Int`
    UInt(u64),
    Float(f64),
    String(String),
}

/// Ordered attribute name to value mapping carried by one rule
pub type ValueBag = IndexMap<String, Value>;

impl Value {
    /// Convert a JSON scalar
    ///
    /// Integers that fit `i64` become `Int`, larger non-negative ones become
    /// `UInt`, and every other number becomes `Float`. Arrays, objects and
    /// null are rejected.
    pub fn from_json(attribute: &str, json: &serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Bool(b) => Ok(Self::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(Self::UInt(u))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(unsupported(attribute, json))
                }
            }
            serde_json::Value::String(s) => Ok(Self::String(s.clone())),
            serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Err(unsupported(attribute, json))
            }
        }
    }

    /// Integer view of `Int` and `UInt` values
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the dynamic type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

fn unsupported(attribute: &str, json: &serde_json::Value) -> Error {
    Error::UnsupportedValue {
        attribute: attribute.to_string(),
        found: json.to_string(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Convert a JSON object into a value bag, dropping non-scalar entries
pub fn bag_from_json(map: &serde_json::Map<String, serde_json::Value>) -> ValueBag {
    let mut bag = ValueBag::with_capacity(map.len());
    for (name, json) in map {
        match Value::from_json(name, json) {
            Ok(value) => {
                bag.insert(name.clone(), value);
            }
            Err(e) => tracing::debug!("Dropping attribute: {}", e),
        }
    }
    bag
}
