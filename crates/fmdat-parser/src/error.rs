//! Error and diagnostic system for the fmdat parser.
//!
//! This module provides:
//! - Error codes for documentation and searchability
//! - Labeled byte spans pointing into the network file
//! - Severity levels
//! - A collector for accumulating diagnostics across blocks
//!
//! A fatal [`Diagnostic`] (row count mismatch, truncated block,
//! unterminated section, ...) aborts the parse; all diagnostics of a failed
//! parse are returned together in a [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use fmdat_parser::error::{Diagnostic, ErrorCode};
//! # use fmdat_parser::Span;
//!
//! let diag = Diagnostic::error("duplicate section name `S3`")
//!     .with_code(ErrorCode::E300)
//!     .with_label(Span::new(100..120), "duplicate definition")
//!     .with_secondary_label(Span::new(50..70), "first defined here")
//!     .with_help("rename one of the units");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub use collector::DiagnosticCollector;
pub(crate) use parse_error::Result;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
