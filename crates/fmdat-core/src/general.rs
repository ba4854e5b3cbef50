//! Whole-network settings from the file header.

use crate::{
    field::{FieldError, Fields},
    fixed::DEFAULT_LABEL_LENGTH,
    memo::LineMemo,
    span::Span,
    value::Value,
};

/// Field holding the label length declared by the header.
pub const LABEL_LENGTH: &str = "label_length";

/// The header parameters of a network.
///
/// Everything up to and including `END GENERAL` is represented here: the
/// title, the two fixed-column parameter lines, and the RAD file path. Like
/// [`Element`](crate::element::Element), a parsed header keeps its source
/// lines and is written back verbatim while unchanged.
#[derive(Debug, Clone)]
pub struct GeneralParameters {
    fields: Fields,
    extra: Vec<String>,
    origin: Option<HeaderOrigin>,
}

#[derive(Debug, Clone)]
struct HeaderOrigin {
    lines: Vec<String>,
    span: Span,
    parsed: Fields,
    memo: LineMemo,
}

impl GeneralParameters {
    /// Creates header parameters from a declared field set.
    ///
    /// `extra` holds any lines found between the RAD file line and
    /// `END GENERAL`, kept verbatim.
    pub fn new(fields: Fields, extra: Vec<String>) -> Self {
        Self {
            fields,
            extra,
            origin: None,
        }
    }

    pub fn with_origin(mut self, lines: Vec<String>, span: Span, memo: LineMemo) -> Self {
        self.origin = Some(HeaderOrigin {
            lines,
            span,
            parsed: self.fields.clone(),
            memo,
        });
        self
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Updates a header parameter.
    ///
    /// # Errors
    ///
    /// Fails for undeclared keys or mismatched value kinds.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        self.fields.set(key, value.into())
    }

    pub fn title(&self) -> &str {
        self.get("title").and_then(Value::as_str).unwrap_or_default()
    }

    /// The label column width declared by the header.
    pub fn label_length(&self) -> usize {
        self.get(LABEL_LENGTH)
            .and_then(Value::as_i64)
            .and_then(|len| usize::try_from(len).ok())
            .filter(|len| *len > 0)
            .unwrap_or(DEFAULT_LABEL_LENGTH)
    }

    pub fn extra_lines(&self) -> &[String] {
        &self.extra
    }

    pub fn span(&self) -> Option<Span> {
        self.origin.as_ref().map(|origin| origin.span)
    }

    /// The source lines, if no parameter changed since parsing.
    pub fn pristine_lines(&self) -> Option<&[String]> {
        self.origin
            .as_ref()
            .filter(|origin| origin.parsed == self.fields)
            .map(|origin| origin.lines.as_slice())
    }

    /// Pairs each rendered line with the source line it reproduces, if any.
    pub fn recall<'a>(&'a self, rendered: &[String]) -> Vec<Option<&'a str>> {
        match &self.origin {
            Some(origin) => origin.memo.recall(rendered),
            None => vec![None; rendered.len()],
        }
    }
}

impl PartialEq for GeneralParameters {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields && self.extra == other.extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> GeneralParameters {
        let fields = Fields::new()
            .with("title", Value::from("Model"))
            .with(LABEL_LENGTH, Value::Int(8));
        GeneralParameters::new(fields, Vec::new())
    }

    #[test]
    fn test_label_length() {
        assert_eq!(header().label_length(), 8);
    }

    #[test]
    fn test_label_length_defaults_when_zero() {
        let mut params = header();
        params.set(LABEL_LENGTH, 0_i64).unwrap();

        assert_eq!(params.label_length(), DEFAULT_LABEL_LENGTH);
    }

    #[test]
    fn test_pristine_tracks_edits() {
        let lines = vec!["Model\n".to_string()];
        let mut params = header().with_origin(lines.clone(), Span::new(0..6), LineMemo::default());

        assert_eq!(params.pristine_lines(), Some(lines.as_slice()));

        params.set("title", "Renamed").unwrap();
        assert!(params.pristine_lines().is_none());
        assert_eq!(params.title(), "Renamed");
    }
}
