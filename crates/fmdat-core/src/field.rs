//! Case-insensitive, ordered field maps.
//!
//! A variant declares its field set once, at parse or creation time. After
//! that, [`Fields::set`] only accepts declared keys with a compatible value
//! kind, so the schema of an element never drifts at runtime.

use std::{borrow::Borrow, fmt};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::{Value, ValueKind};

/// A field name, normalised to lower case once at the mapping boundary.
///
/// # Examples
///
/// ```
/// use fmdat_core::field::FieldKey;
///
/// assert_eq!(FieldKey::new("Weir_Elevation"), FieldKey::new("weir_elevation"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldKey(String);

impl FieldKey {
    pub fn new(key: &str) -> Self {
        Self(key.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for FieldKey {
    fn from(key: String) -> Self {
        Self::new(&key)
    }
}

impl From<FieldKey> for String {
    fn from(key: FieldKey) -> Self {
        key.0
    }
}

impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Errors raised when editing fields or table cells.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("field `{0}` is not declared for this element")]
    Undeclared(String),

    #[error("field `{key}` expects a {expected} value, got {found}")]
    KindMismatch {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("row {row} is out of range (table has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("row has {found} cells, table has {expected} columns")]
    RowWidth { expected: usize, found: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Slot {
    kind: ValueKind,
    value: Value,
}

/// An ordered mapping of declared field name to typed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(IndexMap<FieldKey, Slot>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `key` with an initial value, fixing its kind.
    ///
    /// Declaring an existing key replaces its kind and value while keeping
    /// its position.
    pub fn declare(&mut self, key: &str, value: Value) {
        let kind = value.kind();
        self.0.insert(FieldKey::new(key), Slot { kind, value });
    }

    /// Builder form of [`Fields::declare`].
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.declare(key, value);
        self
    }

    /// Looks up a field by any casing.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0
            .get(FieldKey::new(key).as_str())
            .map(|slot| &slot.value)
    }

    /// Returns the declared kind of `key`.
    pub fn kind_of(&self, key: &str) -> Option<ValueKind> {
        self.0.get(FieldKey::new(key).as_str()).map(|slot| slot.kind)
    }

    /// Updates a declared field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Undeclared`] if `key` is not part of this
    /// element's field set, or [`FieldError::KindMismatch`] if `value`
    /// cannot be coerced to the declared kind.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), FieldError> {
        let normalized = FieldKey::new(key);
        let slot = self
            .0
            .get_mut(normalized.as_str())
            .ok_or_else(|| FieldError::Undeclared(normalized.to_string()))?;
        let found = value.kind();
        slot.value = value
            .coerce(slot.kind)
            .ok_or_else(|| FieldError::KindMismatch {
                key: normalized.to_string(),
                expected: slot.kind,
                found,
            })?;
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(FieldKey::new(key).as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &Value)> {
        self.0.iter().map(|(key, slot)| (key, &slot.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.0.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weir_fields() -> Fields {
        Fields::new()
            .with("weir_coefficient", Value::Float(1.0))
            .with("weir_elevation", Value::Float(21.0))
            .with("time_unit", Value::Choice("HOURS".to_string()))
    }

    #[test]
    fn test_get_any_case() {
        let fields = weir_fields();

        assert_eq!(fields.get("WEIR_ELEVATION"), Some(&Value::Float(21.0)));
        assert_eq!(fields.get("Weir_Elevation"), Some(&Value::Float(21.0)));
    }

    #[test]
    fn test_set_declared_field() {
        let mut fields = weir_fields();

        fields.set("Weir_Elevation", Value::Float(21.05)).unwrap();

        assert_eq!(fields.get("weir_elevation"), Some(&Value::Float(21.05)));
    }

    #[test]
    fn test_set_coerces_int_to_float() {
        let mut fields = weir_fields();

        fields.set("weir_coefficient", Value::Int(2)).unwrap();

        assert_eq!(fields.get("weir_coefficient"), Some(&Value::Float(2.0)));
    }

    #[test]
    fn test_set_undeclared_field_fails() {
        let mut fields = weir_fields();

        let err = fields.set("crest", Value::Float(1.0)).unwrap_err();

        assert_eq!(err, FieldError::Undeclared("crest".to_string()));
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_set_kind_mismatch_fails() {
        let mut fields = weir_fields();

        let err = fields.set("weir_elevation", Value::from("high")).unwrap_err();

        assert!(matches!(err, FieldError::KindMismatch { .. }));
        assert_eq!(fields.get("weir_elevation"), Some(&Value::Float(21.0)));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let fields = weir_fields();
        let keys: Vec<_> = fields.keys().map(FieldKey::as_str).collect();

        assert_eq!(keys, ["weir_coefficient", "weir_elevation", "time_unit"]);
    }
}
