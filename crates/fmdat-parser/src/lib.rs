//! # fmdat Parser
//!
//! Parser for Flood Modeller network (`.dat`) files. This crate splits a
//! file into its header and unit blocks, and turns each block into an
//! [`Element`] through a [`Registry`] of unit variants.
//!
//! ## Usage
//!
//! ```
//! # use fmdat_parser::{parse, ParseOptions, Registry, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = "Model\n#REVISION#1\n         0     0.750     0.900     0.100     0.001        12SI\n    10.000     0.010     0.010     0.700     0.100     0.700     0.000\nRAD FILE\n\nEND GENERAL\n";
//!
//!     let file = parse(source, &Registry::with_defaults(), &ParseOptions::default())?;
//!     assert!(file.elements.is_empty());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod grammar;
pub mod header;
pub mod registry;
pub mod scanner;
pub mod variants;
pub mod vocabulary;

pub use fmdat_core::span;
pub use registry::{ParseContext, Registry, UnitVariant, Unsupported};
pub use span::Span;

use log::{debug, info};

use fmdat_core::{element::Element, general::GeneralParameters};

use error::{Diagnostic, DiagnosticCollector, ParseError};

/// Options controlling how a file is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Overrides the label length declared by the header.
    pub label_length: Option<usize>,
    /// Treat row-count mismatches and truncated blocks as fatal.
    pub strict_row_counts: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            label_length: None,
            strict_row_counts: true,
        }
    }
}

/// A parsed network file, before name indexing.
#[derive(Debug)]
pub struct ParsedFile {
    pub header: GeneralParameters,
    pub elements: Vec<Element>,
    /// Non-fatal diagnostics raised while parsing.
    pub warnings: Vec<Diagnostic>,
}

/// Parse a network file into its header and elements.
///
/// The pipeline has three steps:
///
/// 1. **Scan** - Split the text into the header and raw unit blocks
/// 2. **Header** - Read the general parameters and the label length
/// 3. **Units** - Parse each block with its registered variant
///
/// # Errors
///
/// Returns a [`ParseError`] holding every fatal diagnostic: scanner and
/// header errors stop the parse, while unit errors are collected across
/// all blocks.
pub fn parse(
    source: &str,
    registry: &Registry,
    options: &ParseOptions,
) -> Result<ParsedFile, ParseError> {
    // Step 1: Scan
    let scanned = scanner::scan(source)?;

    // Step 2: Header
    let header = header::parse(scanned.header())?;
    let label_length = options.label_length.unwrap_or_else(|| header.label_length());
    let ctx = ParseContext::new(label_length).with_strict_row_counts(options.strict_row_counts);
    debug!(label_length, strict = options.strict_row_counts; "Header parsed");

    // Step 3: Units
    let mut diagnostics = DiagnosticCollector::new();
    let elements: Vec<Element> = scanned
        .blocks()
        .iter()
        .map(|block| registry.parse_block(block, &ctx, &mut diagnostics))
        .collect();
    let warnings = diagnostics.finish()?;

    info!(elements = elements.len(), warnings = warnings.len(); "Parsed network file");
    Ok(ParsedFile {
        header,
        elements,
        warnings,
    })
}
