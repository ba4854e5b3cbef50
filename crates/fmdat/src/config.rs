use serde::Deserialize;

use fmdat_parser::ParseOptions;

/// Application configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Parse configuration section
    #[serde(default)]
    pub parse: ParseConfig,

    /// Write configuration section
    #[serde(default)]
    pub write: WriteConfig,

    /// Diff configuration section
    #[serde(default)]
    pub diff: DiffConfig,
}

/// Parse configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ParseConfig {
    /// Label column width to use instead of the one declared in the header
    #[serde(default)]
    pub label_length: Option<usize>,

    /// Abort on row count mismatches instead of keeping the block verbatim
    #[serde(default = "default_true")]
    pub strict_row_counts: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            label_length: None,
            strict_row_counts: true,
        }
    }
}

impl ParseConfig {
    pub fn options(&self) -> ParseOptions {
        ParseOptions {
            label_length: self.label_length,
            strict_row_counts: self.strict_row_counts,
        }
    }
}

/// Line ending used for re-rendered lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// Use the first line ending found in the source text.
    #[default]
    Auto,
    Lf,
    Crlf,
}

/// Write configuration section
///
/// Only affects edited or new blocks. Untouched blocks keep their
/// original text and line endings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WriteConfig {
    #[serde(default)]
    pub line_ending: LineEnding,

    /// End a re-rendered final block with a line ending
    #[serde(default = "default_true")]
    pub final_newline: bool,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            line_ending: LineEnding::Auto,
            final_newline: true,
        }
    }
}

/// Diff configuration section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiffConfig {
    /// Maximum number of differences to report
    #[serde(default)]
    pub max_reported: Option<usize>,
}

fn default_true() -> bool {
    true
}
