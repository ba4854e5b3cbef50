//! Unit variant registry.
//!
//! The registry maps a block's `(kind, subtype)` pair to the
//! [`UnitVariant`] that parses and writes it. Anything it cannot resolve is
//! handled by the [`Unsupported`] passthrough, which never fails. Adding a
//! unit kind means registering one more variant; nothing else changes.

use std::fmt;

use indexmap::IndexMap;
use log::{debug, trace, warn};

use fmdat_core::{
    element::{Content, Element, ElementClass},
    fixed::{self, DEFAULT_LABEL_LENGTH},
    keyword::Keyword,
    memo::LineMemo,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, Result},
    grammar::Grammar,
    scanner::RawBlock,
    variants,
};

/// Settings that affect how unit blocks are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseContext {
    label_length: usize,
    strict_row_counts: bool,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self {
            label_length: DEFAULT_LABEL_LENGTH,
            strict_row_counts: true,
        }
    }
}

impl ParseContext {
    pub fn new(label_length: usize) -> Self {
        Self {
            label_length,
            ..Self::default()
        }
    }

    /// With strict row counts disabled, blocks whose row counts do not add
    /// up are kept as unsupported blocks and reported as warnings.
    pub fn with_strict_row_counts(mut self, strict: bool) -> Self {
        self.strict_row_counts = strict;
        self
    }

    pub fn label_length(&self) -> usize {
        self.label_length
    }

    pub fn strict_row_counts(&self) -> bool {
        self.strict_row_counts
    }
}

/// A parser/writer pair for one unit kind.
///
/// `write(parse(block))` must reproduce every line of `block` the variant
/// models, modulo the fixed-column normalisation of values.
pub trait UnitVariant: fmt::Debug + Send + Sync {
    fn kind(&self) -> &'static str;

    fn subtype(&self) -> Option<&'static str>;

    fn class(&self) -> ElementClass;

    /// Parses a raw block into an element.
    ///
    /// # Errors
    ///
    /// Returns a fatal diagnostic when the block is structurally broken.
    fn parse(&self, block: &RawBlock<'_>, ctx: &ParseContext) -> Result<Element>;

    /// Writes an element as lines without line endings.
    fn write(&self, element: &Element, label_length: usize) -> Vec<String>;

    /// Builds a blank element with variant defaults.
    fn create(&self, name: &str) -> Element;
}

impl UnitVariant for Grammar {
    fn kind(&self) -> &'static str {
        self.kind
    }

    fn subtype(&self) -> Option<&'static str> {
        self.subtype
    }

    fn class(&self) -> ElementClass {
        self.class
    }

    fn parse(&self, block: &RawBlock<'_>, ctx: &ParseContext) -> Result<Element> {
        Grammar::parse(self, block, ctx)
    }

    fn write(&self, element: &Element, label_length: usize) -> Vec<String> {
        Grammar::write(self, element, label_length)
    }

    fn create(&self, name: &str) -> Element {
        Grammar::create(self, name)
    }
}

/// Verbatim passthrough for blocks no variant understands.
///
/// The element name is read from the label line (the third line for kinds
/// that carry a subtype, the second otherwise) so the block stays
/// addressable by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl Unsupported {
    /// Parses any block. Never fails.
    pub fn parse(&self, block: &RawBlock<'_>, ctx: &ParseContext) -> Element {
        let label_line = if block.subtype().is_some() { 2 } else { 1 };
        let name = block
            .lines()
            .get(label_line)
            .map(|line| fixed::column(line.text(), 0, ctx.label_length()).trim().to_string())
            .unwrap_or_default();
        let raw = block.lines().iter().map(|line| line.text().to_string()).collect();
        Element::new(
            block.kind(),
            block.subtype(),
            ElementClass::Unsupported,
            Content::new(name).with_raw(raw),
        )
    }

    pub fn write(&self, element: &Element) -> Vec<String> {
        element.raw_lines().to_vec()
    }
}

type VariantKey = (Keyword, Option<Keyword>);

/// The set of known unit variants.
#[derive(Debug, Default)]
pub struct Registry {
    variants: IndexMap<VariantKey, Box<dyn UnitVariant>>,
}

impl Registry {
    /// Creates an empty registry: every block parses as unsupported.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in variant.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for grammar in variants::GRAMMARS {
            registry.register(Box::new(**grammar));
        }
        registry.register(Box::new(variants::Comment));
        registry.register(Box::new(variants::Reservoir));
        debug!(variants = registry.variants.len(); "Registry initialised");
        registry
    }

    /// Registers a variant, replacing any previous one for the same kind
    /// and subtype.
    pub fn register(&mut self, variant: Box<dyn UnitVariant>) {
        let key = (
            Keyword::new(variant.kind()),
            variant.subtype().map(Keyword::new),
        );
        if self.variants.insert(key, variant).is_some() {
            debug!(kind = key.0.to_string(); "Replaced registered variant");
        }
    }

    /// Looks up the variant for a kind and subtype.
    ///
    /// Lookup is exact: kinds that distinguish by subtype only resolve for
    /// subtypes that have been registered.
    pub fn resolve(&self, kind: Keyword, subtype: Option<Keyword>) -> Option<&dyn UnitVariant> {
        self.variants.get(&(kind, subtype)).map(|variant| &**variant)
    }

    pub fn is_supported(&self, kind: Keyword, subtype: Option<Keyword>) -> bool {
        self.variants.contains_key(&(kind, subtype))
    }

    /// Iterates the registered variants in registration order.
    pub fn variants(&self) -> impl Iterator<Item = &dyn UnitVariant> {
        self.variants.values().map(|variant| &**variant)
    }

    /// Builds a blank element of a registered kind.
    pub fn create(&self, kind: &str, subtype: Option<&str>, name: &str) -> Option<Element> {
        self.resolve(Keyword::new(kind), subtype.map(Keyword::new))
            .map(|variant| variant.create(name))
    }

    /// Parses one raw block into an element and records where it came from.
    ///
    /// Fatal problems are emitted into `diagnostics`; the block is then
    /// returned as an unsupported element so that the remaining blocks can
    /// still be checked. A numeric column holding text is only a warning,
    /// and the block is kept verbatim. With strict row counts disabled,
    /// row-count and truncation errors are downgraded the same way.
    pub fn parse_block(
        &self,
        block: &RawBlock<'_>,
        ctx: &ParseContext,
        diagnostics: &mut DiagnosticCollector,
    ) -> Element {
        let parsed = match self.resolve(block.kind(), block.subtype()) {
            Some(variant) => match variant.parse(block, ctx) {
                Ok(element) => Some(element),
                Err(diag) if diag.code() == Some(ErrorCode::E203) => {
                    warn!(index = block.index(), kind = block.kind().to_string(); "Unreadable number, keeping block verbatim");
                    diagnostics.emit(diag.into_warning());
                    None
                }
                Err(diag) if !ctx.strict_row_counts() && is_recoverable(&diag) => {
                    warn!(index = block.index(), kind = block.kind().to_string(); "Keeping malformed block verbatim");
                    diagnostics.emit(diag.into_warning());
                    None
                }
                Err(diag) => {
                    diagnostics.emit(diag);
                    None
                }
            },
            None => {
                if block.subtype().is_some() && self.has_kind(block.kind()) {
                    warn!(
                        index = block.index(),
                        kind = block.kind().to_string(),
                        subtype = block.subtype().map(|s| s.to_string()).unwrap_or_default();
                        "Unknown subtype, keeping block verbatim"
                    );
                } else {
                    debug!(index = block.index(), kind = block.kind().to_string(); "Unsupported block");
                }
                None
            }
        };
        let element = parsed.unwrap_or_else(|| Unsupported.parse(block, ctx));
        trace!(element:?; "Parsed block");

        let rendered = self.write_lines(&element, ctx.label_length());
        let lines: Vec<String> = block.lines().iter().map(|line| line.full().to_string()).collect();
        let memo = LineMemo::new(rendered, lines.clone());
        element.with_origin(lines, block.span(), memo)
    }

    fn has_kind(&self, kind: Keyword) -> bool {
        self.variants.keys().any(|(k, _)| *k == kind)
    }

    /// Writes an element as canonical lines without line endings.
    pub fn write_lines(&self, element: &Element, label_length: usize) -> Vec<String> {
        if element.class() == ElementClass::Unsupported {
            return Unsupported.write(element);
        }
        match self.resolve(element.kind(), element.subtype()) {
            Some(variant) => variant.write(element, label_length),
            None => Unsupported.write(element),
        }
    }

    /// Renders an element as text.
    ///
    /// Unchanged elements are written exactly as read. Edited elements are
    /// re-rendered; each rendered line that lines up with the canonical form
    /// of a source line is replaced by that source line, and other lines end
    /// with `ending`.
    pub fn render(&self, element: &Element, label_length: usize, ending: &str) -> String {
        if let Some(lines) = element.pristine_lines() {
            return lines.concat();
        }
        let rendered = self.write_lines(element, label_length);
        let recalled = match element.origin() {
            Some(origin) => origin.recall(&rendered),
            None => vec![None; rendered.len()],
        };
        join_lines(&rendered, &recalled, ending)
    }
}

/// Joins rendered lines, using the recalled source line where there is one.
///
/// A recalled line without a trailing newline (the last line of a file) is
/// not reused, so that the caller decides the ending.
pub(crate) fn join_lines(rendered: &[String], recalled: &[Option<&str>], ending: &str) -> String {
    let mut out = String::new();
    for (line, original) in rendered.iter().zip(recalled) {
        match original {
            Some(original) if original.ends_with('\n') => out.push_str(original),
            _ => {
                out.push_str(line);
                out.push_str(ending);
            }
        }
    }
    out
}

fn is_recoverable(diag: &Diagnostic) -> bool {
    matches!(diag.code(), Some(ErrorCode::E200 | ErrorCode::E201))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;

    const HEADER: &str = "Model\n#REVISION#1\n         1     0.750     0.900     0.100     0.001        12SI\n    10.000     0.010     0.010     0.700     0.100     0.700     0.000\nRAD FILE\n\nEND GENERAL\n";

    fn parse_all(body: &str, ctx: &ParseContext) -> (Vec<Element>, DiagnosticCollector) {
        let source = format!("{HEADER}{body}");
        let scanned = scan(&source).unwrap();
        let registry = Registry::with_defaults();
        let mut diagnostics = DiagnosticCollector::new();
        let elements = scanned
            .blocks()
            .iter()
            .map(|block| registry.parse_block(block, ctx, &mut diagnostics))
            .collect();
        (elements, diagnostics)
    }

    #[test]
    fn test_resolve_exact_subtype() {
        let registry = Registry::with_defaults();

        assert!(registry.resolve(Keyword::new("RIVER"), Some(Keyword::new("SECTION"))).is_some());
        assert!(registry.resolve(Keyword::new("RIVER"), Some(Keyword::new("MUSKINGUM"))).is_none());
        assert!(registry.resolve(Keyword::new("WEIR"), None).is_some());
        assert!(registry.resolve(Keyword::new("LATERAL"), None).is_some());
        assert!(registry.resolve(Keyword::new("RESERVOIR"), None).is_some());
        assert!(registry.resolve(Keyword::new("BRIDGE"), Some(Keyword::new("PIERLOSS"))).is_some());
        assert!(registry.resolve(Keyword::new("ABSTRACTION"), None).is_none());
    }

    #[test]
    fn test_unknown_subtype_is_unsupported() {
        let body = "RIVER\nMUSKINGUM\nM1\n  anything\n";
        let (elements, diagnostics) = parse_all(body, &ParseContext::default());

        assert_eq!(elements[0].class(), ElementClass::Unsupported);
        assert_eq!(elements[0].name(), "M1");
        assert!(diagnostics.finish().unwrap().is_empty());
    }

    #[test]
    fn test_unsupported_renders_verbatim() {
        let body = "ABSTRACTION odd\r\nABS1\r\n   spacing   kept\r\n";
        let (elements, _) = parse_all(body, &ParseContext::default());
        let registry = Registry::new();

        assert_eq!(elements[0].name(), "ABS1");
        assert_eq!(registry.render(&elements[0], 12, "\n"), body);
    }

    #[test]
    fn test_row_count_error_is_fatal_when_strict() {
        let body = "QTBDY\nQ1\n         2     0.000\n     1.000     0.000\n";
        let (elements, diagnostics) = parse_all(body, &ParseContext::default());

        assert_eq!(elements[0].class(), ElementClass::Unsupported);
        let err = diagnostics.finish().unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E200));
    }

    #[test]
    fn test_row_count_error_degrades_when_lenient() {
        let body = "QTBDY\nQ1\n         2     0.000\n     1.000     0.000\n";
        let ctx = ParseContext::default().with_strict_row_counts(false);
        let (elements, diagnostics) = parse_all(body, &ctx);

        assert_eq!(elements[0].class(), ElementClass::Unsupported);
        let warnings = diagnostics.finish().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].severity().is_warning());
    }

    #[test]
    fn test_unreadable_number_keeps_block_verbatim() {
        let body = "WEIR\nS4          S5\n     1.500\n     1.000     1.000     5.000     n/a       0.700\n";
        let (elements, diagnostics) = parse_all(body, &ParseContext::default());
        let registry = Registry::with_defaults();

        assert_eq!(elements[0].class(), ElementClass::Unsupported);
        assert_eq!(elements[0].name(), "S4");
        assert_eq!(registry.render(&elements[0], 12, "\n"), body);
        let warnings = diagnostics.finish().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code(), Some(ErrorCode::E203));
        assert!(warnings[0].message().contains("`n/a` is not a number (field `weir_elevation`)"));
    }

    #[test]
    fn test_render_keeps_untouched_lines() {
        let body = "WEIR  main weir\nS4          S5\n     1.500\n     1.000     1.000     5.000    21.000      0.70\n";
        let (mut elements, _) = parse_all(body, &ParseContext::default());
        let registry = Registry::with_defaults();

        elements[0].set_comment("edited");
        let text = registry.render(&elements[0], 12, "\n");

        assert_eq!(
            text,
            "WEIR edited\nS4          S5\n     1.500\n     1.000     1.000     5.000    21.000      0.70\n"
        );
    }

    #[test]
    fn test_render_keeps_repeated_rows_apart() {
        let body = "QTBDY\nUPSTREAM\n         3     0.000     0.000     HOURS    EXTEND    LINEAR     0.000     0.000  OVERRIDE\n     5.000     0.000\n     6.000     1.000\n       5.0       0.0\n";
        let (mut elements, _) = parse_all(body, &ParseContext::default());
        let registry = Registry::with_defaults();

        elements[0].set_name("UP2");
        let text = registry.render(&elements[0], 12, "\n");

        assert_eq!(text, body.replace("UPSTREAM", "UP2"));
    }

    #[test]
    fn test_connectors_and_controls_are_typed() {
        let body = "JUNCTION\nOPEN\nJ1          J2          J3\nRESERVOIR\nRES1\n         0\n";
        let (elements, diagnostics) = parse_all(body, &ParseContext::default());

        assert_eq!(elements[0].class(), ElementClass::Connector);
        assert_eq!(elements[0].table_named("labels").map(|t| t.len()), Some(2));
        assert_eq!(elements[1].class(), ElementClass::Control);
        assert_eq!(elements[1].name(), "RES1");
        assert!(diagnostics.finish().unwrap().is_empty());
    }

    #[test]
    fn test_create_blank() {
        let registry = Registry::with_defaults();

        let weir = registry.create("weir", None, "W1").unwrap();
        assert_eq!(weir.name(), "W1");
        assert_eq!(weir.class(), ElementClass::Structure);

        let reservoir = registry.create("RESERVOIR", None, "R1").unwrap();
        assert_eq!(reservoir.class(), ElementClass::Control);

        assert!(registry.create("ABSTRACTION", None, "A1").is_none());
    }
}
