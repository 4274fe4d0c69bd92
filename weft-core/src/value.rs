//! Dynamic port values and their type tags.
//!
//! Values flowing along data edges are dynamically typed. Each port
//! carries a [`ValueType`] tag; writing a non-conforming value emits a
//! diagnostic but never fails, so graphs can be typed gradually.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Dynamic value carried by a port.
///
/// Wraps `serde_json::Value` to provide typed constructors and
/// accessors for node implementations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(pub JsonValue);

impl Value {
    /// Create a null value.
    pub fn null() -> Self {
        Self(JsonValue::Null)
    }

    /// Create a boolean value.
    pub fn bool(v: bool) -> Self {
        Self(JsonValue::Bool(v))
    }

    /// Create an integer value.
    pub fn int(v: i64) -> Self {
        Self(JsonValue::Number(v.into()))
    }

    /// Create a floating-point value.
    pub fn float(v: f64) -> Self {
        Self(serde_json::Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number))
    }

    /// Create a string value.
    pub fn string(v: impl Into<String>) -> Self {
        Self(JsonValue::String(v.into()))
    }

    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Convert to i64 if the value is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.as_i64()
    }

    /// Convert to f64 if the value is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        self.0.as_f64()
    }

    /// Convert to bool if possible.
    ///
    /// Numbers are truthy when non-zero, null is false.
    pub fn as_bool(&self) -> Option<bool> {
        match &self.0 {
            JsonValue::Bool(b) => Some(*b),
            JsonValue::Number(n) => Some(n.as_f64().is_some_and(|v| v != 0.0)),
            JsonValue::Null => Some(false),
            _ => None,
        }
    }

    /// Convert to a string slice if the value is a string.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Truthiness used for control activations: anything except null,
    /// `false` and zero activates.
    pub fn is_truthy(&self) -> bool {
        match &self.0 {
            JsonValue::Null => false,
            JsonValue::Bool(b) => *b,
            JsonValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            JsonValue::String(s) => !s.is_empty(),
            JsonValue::Array(_) | JsonValue::Object(_) => true,
        }
    }

    /// Access the inner `serde_json::Value`.
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert into the inner `serde_json::Value`.
    pub fn into_inner(self) -> JsonValue {
        self.0
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::null()
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        Self(v)
    }
}

impl From<Value> for JsonValue {
    fn from(v: Value) -> Self {
        v.0
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::string(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::bool(v)
    }
}

/// Type tag consumed by the soft validator on `Port::set_value`.
///
/// `Any` matches anything. `Int` accepts integers only; `Float`
/// accepts any numeric value (integer promotion allowed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Matches any value.
    #[default]
    Any,
    /// Integer numbers.
    Int,
    /// Any numeric value.
    Float,
    /// Strings.
    String,
    /// Booleans.
    Bool,
    /// String-keyed maps.
    Dict,
    /// Ordered sequences.
    Array,
    /// Opaque structured values.
    Object,
    /// Numeric sequences.
    Vector,
    /// Nested numeric sequences.
    Matrix,
    /// Hex string or component sequence.
    Color,
    /// Base64 string payloads.
    Binary,
}

impl ValueType {
    /// Check whether `value` conforms to this type tag.
    ///
    /// Null always conforms; the type tag constrains what a port may
    /// hold, not whether it holds anything.
    pub fn validate(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            Self::Any | Self::Object => true,
            Self::Int => value.0.is_i64() || value.0.is_u64(),
            Self::Float => value.0.is_number(),
            Self::String => value.0.is_string(),
            Self::Bool => value.0.is_boolean(),
            Self::Dict => value.0.is_object(),
            Self::Array | Self::Vector | Self::Matrix => value.0.is_array(),
            Self::Color => value.0.is_string() || value.0.is_array(),
            Self::Binary => value.0.is_string(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Any => "any",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Dict => "dict",
            Self::Array => "array",
            Self::Object => "object",
            Self::Vector => "vector",
            Self::Matrix => "matrix",
            Self::Color => "color",
            Self::Binary => "binary",
        };
        write!(f, "{}", s)
    }
}
