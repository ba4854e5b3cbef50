//! Error types for network operations.
//!
//! This module provides the main error type [`FmdatError`] which wraps
//! the failures of parsing, editing and persisting a network.

use std::io;

use thiserror::Error;

use fmdat_core::{element::Category, field::FieldError};
use fmdat_parser::error::ParseError;

/// The main error type for network operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant contains structured diagnostics with byte spans into
/// the source text, which is kept alongside for rich error reporting.
///
/// Edit operations validate before mutating: when they return an error the
/// network is unchanged.
#[derive(Debug, Error)]
pub enum FmdatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("name `{name}` already exists in {category}")]
    NameCollision { category: Category, name: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid position: {0}")]
    InvalidPosition(String),

    #[error("invalid name `{0}`")]
    InvalidName(String),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("interchange error: {0}")]
    Interchange(String),
}

impl From<serde_json::Error> for FmdatError {
    fn from(error: serde_json::Error) -> Self {
        Self::Interchange(error.to_string())
    }
}

impl FmdatError {
    /// Create a new `Parse` error with the associated source text.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
