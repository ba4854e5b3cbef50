//! Fixed-column text helpers.
//!
//! Network files lay most data out in 10-character columns, with labels in
//! columns of the header-declared label length. Slicing is done on
//! characters rather than bytes so that a stray non-ASCII character in a
//! comment never splits a code point.

/// Width of a numeric data column.
pub const COLUMN_WIDTH: usize = 10;

/// Label length used when the header does not declare one.
pub const DEFAULT_LABEL_LENGTH: usize = 12;

/// Default number of decimal places written for floats.
pub const DEFAULT_PRECISION: usize = 3;

/// Column alignment on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    Left,
    #[default]
    Right,
}

fn byte_offset(line: &str, chars: usize) -> usize {
    line.char_indices()
        .nth(chars)
        .map_or(line.len(), |(offset, _)| offset)
}

/// Returns the untrimmed slice of `width` characters starting at character
/// `start`, clipped to the end of the line.
pub fn column(line: &str, start: usize, width: usize) -> &str {
    let from = byte_offset(line, start);
    let to = from + byte_offset(&line[from..], width);
    &line[from..to]
}

/// Returns everything from character `start` to the end of the line.
pub fn rest(line: &str, start: usize) -> &str {
    &line[byte_offset(line, start)..]
}

/// Splits a line into trimmed `width`-character columns.
///
/// # Examples
///
/// ```
/// use fmdat_core::fixed::split_columns;
///
/// assert_eq!(split_columns("     1.000     2.500", 10), ["1.000", "2.500"]);
/// ```
pub fn split_columns(line: &str, width: usize) -> Vec<&str> {
    if width == 0 {
        return vec![line.trim()];
    }
    let mut out = Vec::new();
    let mut remaining = line;
    while !remaining.is_empty() {
        let cut = byte_offset(remaining, width);
        out.push(remaining[..cut].trim());
        remaining = &remaining[cut..];
    }
    out
}

/// Truncates `text` to `width` characters and pads it to exactly `width`.
pub fn fit(text: &str, width: usize, justify: Justify) -> String {
    let clipped = column(text, 0, width);
    match justify {
        Justify::Left => format!("{clipped:<width$}"),
        Justify::Right => format!("{clipped:>width$}"),
    }
}

/// Formats a float with `precision` decimal places, switching to
/// scientific notation when the fixed form would not fit a column.
///
/// # Examples
///
/// ```
/// use fmdat_core::fixed::format_float;
///
/// assert_eq!(format_float(21.05, 3), "21.050");
/// assert_eq!(format_float(123456789.0, 3), "1.235e+08");
/// ```
pub fn format_float(value: f64, precision: usize) -> String {
    let fixed = format!("{value:.precision$}");
    if fixed.chars().count() <= COLUMN_WIDTH {
        return fixed;
    }
    let scientific = format!("{value:.precision$e}");
    match scientific.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => scientific,
    }
}

/// Parses a trimmed column as a finite float.
pub fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a trimmed column as an integer.
///
/// Whole numbers written with a decimal point, such as `3.000`, are
/// accepted.
pub fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>().ok().or_else(|| {
        parse_float(text)
            .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
            .map(|v| v as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_clips_to_line() {
        let line = "     1.000     2.5";

        assert_eq!(column(line, 0, 10), "     1.000");
        assert_eq!(column(line, 10, 10), "     2.5");
        assert_eq!(column(line, 20, 10), "");
    }

    #[test]
    fn test_column_non_ascii() {
        let line = "Pont-Évêque  next";

        assert_eq!(column(line, 0, 12), "Pont-Évêque ");
        assert_eq!(rest(line, 13), "next");
    }

    #[test]
    fn test_split_columns_keeps_blank_slots() {
        assert_eq!(
            split_columns("     1.000               3.000", 10),
            ["1.000", "", "3.000"]
        );
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("HOURS", 10, Justify::Right), "     HOURS");
        assert_eq!(fit("S4", 12, Justify::Left), "S4          ");
        assert_eq!(fit("ABCDEFGHIJKL", 10, Justify::Right), "ABCDEFGHIJ");
    }

    #[test]
    fn test_format_float_fixed() {
        assert_eq!(format_float(0.0, 3), "0.000");
        assert_eq!(format_float(-1.5, 3), "-1.500");
        assert_eq!(format_float(0.0001, 6), "0.000100");
    }

    #[test]
    fn test_format_float_scientific() {
        assert_eq!(format_float(12345678.9, 3), "1.235e+07");
        assert_eq!(format_float(-123456789.0, 2), "-1.23e+08");
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("  21.050 "), Some(21.05));
        assert_eq!(parse_float("1.5e+02"), Some(150.0));
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("nan"), None);
        assert_eq!(parse_float("HOURS"), None);
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("        12"), Some(12));
        assert_eq!(parse_int("12.000"), Some(12));
        assert_eq!(parse_int("12.5"), None);
        assert_eq!(parse_int("SI"), None);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn millis_strategy() -> impl Strategy<Value = f64> {
        (-9_999_999i64..9_999_999).prop_map(|millis| millis as f64 / 1000.0)
    }

    /// Values with three decimals survive a format and parse unchanged.
    fn check_three_decimals_survive(value: f64) -> Result<(), TestCaseError> {
        let text = format_float(value, 3);

        prop_assert!(text.chars().count() <= COLUMN_WIDTH, "`{text}` overflows a column");
        prop_assert_eq!(parse_float(&text), Some(value));
        Ok(())
    }

    /// `fit` always produces exactly the requested width.
    fn check_fit_width(text: &str, width: usize) -> Result<(), TestCaseError> {
        prop_assert_eq!(fit(text, width, Justify::Left).chars().count(), width);
        prop_assert_eq!(fit(text, width, Justify::Right).chars().count(), width);
        Ok(())
    }

    proptest! {
        #[test]
        fn three_decimals_survive(value in millis_strategy()) {
            check_three_decimals_survive(value)?;
        }

        #[test]
        fn fit_width(text in "\\PC{0,30}", width in 1usize..20) {
            check_fit_width(&text, width)?;
        }
    }
}
