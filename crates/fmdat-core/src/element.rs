//! Network elements.
//!
//! An [`Element`] is one parsed unit block: its keyword, subtype, class,
//! and [`Content`] (name, comment, declared fields, tables and verbatim
//! lines). Elements that came from a file also carry an [`Origin`]: the
//! exact source lines and a snapshot of the content parsed from them. While
//! the content still equals that snapshot the element is written back
//! byte for byte.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    field::{FieldError, FieldKey, Fields},
    keyword::Keyword,
    memo::LineMemo,
    span::Span,
    table::Table,
    value::Value,
};

/// The behavioural class of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementClass {
    Boundary,
    Section,
    Conduit,
    Structure,
    Loss,
    /// Junctions and lateral inflow distributors.
    Connector,
    /// Storage controls such as reservoirs.
    Control,
    Comment,
    Rule,
    Conditions,
    Unsupported,
}

impl ElementClass {
    /// Returns the named-lookup category of this class, if it has one.
    pub fn category(&self) -> Option<Category> {
        match self {
            ElementClass::Boundary => Some(Category::Boundaries),
            ElementClass::Section => Some(Category::Sections),
            ElementClass::Conduit => Some(Category::Conduits),
            ElementClass::Structure => Some(Category::Structures),
            ElementClass::Loss => Some(Category::Losses),
            ElementClass::Connector
            | ElementClass::Control
            | ElementClass::Comment
            | ElementClass::Rule
            | ElementClass::Conditions
            | ElementClass::Unsupported => None,
        }
    }

    /// Returns `true` for classes that make up a reach: sections, conduits
    /// and structures.
    pub fn is_reach(&self) -> bool {
        matches!(
            self,
            ElementClass::Section | ElementClass::Conduit | ElementClass::Structure
        )
    }
}

/// The fixed partition used for named lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Sections,
    Conduits,
    Structures,
    Boundaries,
    Losses,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Sections,
        Category::Conduits,
        Category::Structures,
        Category::Boundaries,
        Category::Losses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sections => "sections",
            Category::Conduits => "conduits",
            Category::Structures => "structures",
            Category::Boundaries => "boundaries",
            Category::Losses => "losses",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a category name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// The editable content of an element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    name: String,
    comment: String,
    fields: Fields,
    tables: IndexMap<FieldKey, Table>,
    raw: Vec<String>,
}

impl Content {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_table(mut self, name: &str, table: Table) -> Self {
        self.tables.insert(FieldKey::new(name), table);
        self
    }

    /// Attaches verbatim lines (no line endings).
    pub fn with_raw(mut self, raw: Vec<String>) -> Self {
        self.raw = raw;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn tables(&self) -> &IndexMap<FieldKey, Table> {
        &self.tables
    }

    pub fn raw(&self) -> &[String] {
        &self.raw
    }
}

/// Where a parsed element came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    lines: Vec<String>,
    span: Span,
    parsed: Content,
    memo: LineMemo,
}

impl Origin {
    /// The source lines, each with its original line ending.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Byte range of the block in the source text.
    pub fn span(&self) -> Span {
        self.span
    }

    /// The content as it was parsed.
    pub fn parsed(&self) -> &Content {
        &self.parsed
    }

    /// Pairs each rendered line with the source line (with ending) it
    /// reproduces, if any.
    pub fn recall<'a>(&'a self, rendered: &[String]) -> Vec<Option<&'a str>> {
        self.memo.recall(rendered)
    }
}

/// One unit of a network.
#[derive(Debug, Clone)]
pub struct Element {
    kind: Keyword,
    subtype: Option<Keyword>,
    class: ElementClass,
    content: Content,
    origin: Option<Origin>,
}

impl Element {
    pub fn new(
        kind: Keyword,
        subtype: Option<Keyword>,
        class: ElementClass,
        content: Content,
    ) -> Self {
        Self {
            kind,
            subtype,
            class,
            content,
            origin: None,
        }
    }

    /// Records the source of a freshly parsed element.
    ///
    /// `memo` pairs the canonical rendering of each source line with the
    /// line itself, so that unchanged lines of an edited element keep their
    /// original text.
    pub fn with_origin(mut self, lines: Vec<String>, span: Span, memo: LineMemo) -> Self {
        self.origin = Some(Origin {
            lines,
            span,
            parsed: self.content.clone(),
            memo,
        });
        self
    }

    pub fn kind(&self) -> Keyword {
        self.kind
    }

    pub fn subtype(&self) -> Option<Keyword> {
        self.subtype
    }

    pub fn class(&self) -> ElementClass {
        self.class
    }

    pub fn category(&self) -> Option<Category> {
        self.class.category()
    }

    pub fn name(&self) -> &str {
        &self.content.name
    }

    pub fn comment(&self) -> &str {
        &self.content.comment
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn fields(&self) -> &Fields {
        &self.content.fields
    }

    /// Looks up a declared field by any casing.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.content.fields.get(key)
    }

    /// Returns a label-like field as text, treating blank labels as absent.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.field(key)
            .and_then(Value::as_str)
            .filter(|label| !label.is_empty())
    }

    /// The primary table, if the variant has one.
    pub fn table(&self) -> Option<&Table> {
        self.content.tables.values().next()
    }

    pub fn table_named(&self, name: &str) -> Option<&Table> {
        self.content.tables.get(FieldKey::new(name).as_str())
    }

    pub fn tables(&self) -> impl Iterator<Item = (&FieldKey, &Table)> {
        self.content.tables.iter()
    }

    /// Verbatim lines: the whole block for unsupported elements, the
    /// unmodelled tail for partially modelled ones.
    pub fn raw_lines(&self) -> &[String] {
        &self.content.raw
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    /// Returns `true` if the element was not parsed, or was edited since.
    pub fn is_modified(&self) -> bool {
        self.pristine_lines().is_none()
    }

    /// The source lines, if the content is unchanged since parsing.
    pub fn pristine_lines(&self) -> Option<&[String]> {
        self.origin
            .as_ref()
            .filter(|origin| origin.parsed == self.content)
            .map(|origin| origin.lines.as_slice())
    }

    /// Sets the element name.
    ///
    /// Inside a network, use the network's rename operation so that the
    /// name index stays consistent.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.content.name = name.into();
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.content.comment = comment.into();
    }

    /// Updates a declared field.
    ///
    /// # Errors
    ///
    /// Fails if the field is not declared for this variant or the value
    /// kind does not match.
    pub fn set_field(&mut self, key: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        self.content.fields.set(key, value.into())
    }

    /// Replaces the verbatim lines (no line endings).
    pub fn set_raw_lines(&mut self, raw: Vec<String>) {
        self.content.raw = raw;
    }

    pub fn table_mut(&mut self) -> Option<&mut Table> {
        self.content.tables.values_mut().next()
    }

    pub fn table_named_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.content.tables.get_mut(FieldKey::new(name).as_str())
    }
}

impl PartialEq for Element {
    /// Structural equality: provenance is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.subtype == other.subtype
            && self.class == other.class
            && self.content == other.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weir() -> Element {
        let fields = Fields::new()
            .with("ds_label", Value::from("S5"))
            .with("weir_elevation", Value::Float(21.0));
        Element::new(
            Keyword::new("WEIR"),
            None,
            ElementClass::Structure,
            Content::new("S4").with_fields(fields),
        )
    }

    #[test]
    fn test_category_partition() {
        assert_eq!(ElementClass::Section.category(), Some(Category::Sections));
        assert_eq!(ElementClass::Loss.category(), Some(Category::Losses));
        assert_eq!(ElementClass::Comment.category(), None);
        assert_eq!(ElementClass::Connector.category(), None);
        assert_eq!(ElementClass::Unsupported.category(), None);
    }

    #[test]
    fn test_reach_classes() {
        assert!(ElementClass::Structure.is_reach());
        assert!(!ElementClass::Boundary.is_reach());
        assert!(!ElementClass::Loss.is_reach());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Structures".parse::<Category>(), Ok(Category::Structures));
        assert!("rivers".parse::<Category>().is_err());
    }

    #[test]
    fn test_new_element_is_modified() {
        assert!(weir().is_modified());
    }

    #[test]
    fn test_pristine_until_edited() {
        let lines = vec!["WEIR\n".to_string(), "S4          S5\n".to_string()];
        let mut element = weir().with_origin(lines.clone(), Span::new(0..20), LineMemo::default());

        assert_eq!(element.pristine_lines(), Some(lines.as_slice()));

        element.set_field("weir_elevation", 21.05).unwrap();
        assert!(element.is_modified());

        element.set_field("weir_elevation", 21.0).unwrap();
        assert_eq!(element.pristine_lines(), Some(lines.as_slice()));
    }

    #[test]
    fn test_label_blank_is_none() {
        let mut element = weir();
        assert_eq!(element.label("ds_label"), Some("S5"));

        element.set_field("ds_label", "").unwrap();
        assert_eq!(element.label("ds_label"), None);
    }

    #[test]
    fn test_equality_ignores_origin() {
        let parsed = weir().with_origin(vec!["WEIR\n".to_string()], Span::default(), LineMemo::default());

        assert_eq!(parsed, weir());
    }
}
