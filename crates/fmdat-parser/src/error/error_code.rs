//! Error codes for the fmdat diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Block scanner errors
//! - `E1xx` - Header errors
//! - `E2xx` - Unit grammar errors
//! - `E3xx` - Network assembly errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Scanner Errors (E0xx)
    // =========================================================================
    /// Unterminated block.
    ///
    /// A block that ends with a sentinel line (such as `END VARIABLES`)
    /// reached the end of the file without it.
    E001,

    /// Invalid line count.
    ///
    /// The line following `COMMENT` must hold the number of comment lines.
    E002,

    /// Truncated counted block.
    ///
    /// The file ended before all the lines announced by a line count.
    E003,

    // =========================================================================
    // Header Errors (E1xx)
    // =========================================================================
    /// Missing `END GENERAL`.
    ///
    /// The header section must be closed before the first unit block.
    E100,

    /// Invalid label length.
    ///
    /// The label length declared in the header is not a positive integer.
    E101,

    /// Truncated header.
    ///
    /// The header has fewer lines than its fixed layout requires.
    E102,

    // =========================================================================
    // Unit Grammar Errors (E2xx)
    // =========================================================================
    /// Row count mismatch.
    ///
    /// A declared row count does not match the number of rows present.
    E200,

    /// Truncated unit block.
    ///
    /// A unit block ended before one of its required lines.
    E201,

    /// Invalid row count.
    ///
    /// A row count field does not hold a non-negative integer.
    E202,

    /// Unreadable number.
    ///
    /// A numeric column holds text that is not a number. The block is kept
    /// verbatim so that the text survives a write.
    E203,

    // =========================================================================
    // Assembly Errors (E3xx)
    // =========================================================================
    /// Duplicate name.
    ///
    /// Two units of the same category share a name.
    E300,

    /// Duplicate unsupported unit.
    ///
    /// Two unsupported units share both name and keyword; only the first is
    /// reachable by name.
    E301,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated block",
            ErrorCode::E002 => "invalid line count",
            ErrorCode::E003 => "truncated counted block",
            ErrorCode::E100 => "missing END GENERAL",
            ErrorCode::E101 => "invalid label length",
            ErrorCode::E102 => "truncated header",
            ErrorCode::E200 => "row count mismatch",
            ErrorCode::E201 => "truncated unit block",
            ErrorCode::E202 => "invalid row count",
            ErrorCode::E203 => "unreadable number",
            ErrorCode::E300 => "duplicate name",
            ErrorCode::E301 => "duplicate unsupported unit",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E102.to_string(), "E102");
        assert_eq!(ErrorCode::E200.to_string(), "E200");
        assert_eq!(ErrorCode::E300.to_string(), "E300");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E001.description(), "unterminated block");
        assert_eq!(ErrorCode::E200.description(), "row count mismatch");
        assert_eq!(ErrorCode::E300.description(), "duplicate name");
    }
}
