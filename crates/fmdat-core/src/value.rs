//! Typed scalar values held by element fields and table cells.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A typed scalar read from a fixed-column field.
///
/// Equality is exact: floats compare as parsed, with no tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Float(f64),
    Int(i64),
    Text(String),
    /// An enumerated token such as `HOURS` or `LINEAR`.
    Choice(String),
    Flag(bool),
}

/// The declared type of a field or table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Float,
    Int,
    Text,
    Choice,
    Flag,
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Int(_) => ValueKind::Int,
            Value::Text(_) => ValueKind::Text,
            Value::Choice(_) => ValueKind::Choice,
            Value::Flag(_) => ValueKind::Flag,
        }
    }

    /// Returns the value as a float if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text of a `Text` or `Choice` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Choice(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Converts `self` into a value of `kind`, if the conversion is lossless.
    ///
    /// Integers widen to floats and text becomes a choice (and back); every
    /// other mismatch is rejected.
    pub fn coerce(self, kind: ValueKind) -> Option<Value> {
        match (self, kind) {
            (v, k) if v.kind() == k => Some(v),
            (Value::Int(v), ValueKind::Float) => Some(Value::Float(v as f64)),
            (Value::Text(s), ValueKind::Choice) => Some(Value::Choice(s)),
            (Value::Choice(s), ValueKind::Text) => Some(Value::Text(s)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(s) | Value::Choice(s) => write!(f, "{s:?}"),
            Value::Flag(b) => write!(f, "{b}"),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Float => "float",
            ValueKind::Int => "int",
            ValueKind::Text => "text",
            ValueKind::Choice => "choice",
            ValueKind::Flag => "flag",
        };
        f.write_str(name)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Flag(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}
