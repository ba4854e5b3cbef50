//! The header section of a network file.
//!
//! ```text
//! Model title
//! #REVISION#1
//!          5     0.750     0.900     0.100     0.001        12SI
//!     10.000     0.010     0.010     0.700     0.100     0.700     0.000
//! RAD FILE
//! path/to/file.rad
//! END GENERAL
//! ```
//!
//! Lines after the RAD file path, through `END GENERAL` and up to the first
//! unit block, are kept verbatim.

use log::debug;

use fmdat_core::{
    field::Fields,
    fixed::{self, DEFAULT_LABEL_LENGTH},
    general::{GeneralParameters, LABEL_LENGTH},
    memo::LineMemo,
    span::Span,
    value::Value,
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    grammar::{Slot, declare_defaults, float, int, read_cells, revision_tag, write_cells},
    registry::join_lines,
    scanner::SourceLine,
    vocabulary::END_GENERAL,
};

const TITLE: &str = "title";
const REVISION: &str = "revision";
/// Holds line 2 as written when it is not a `#REVISION#N` tag.
const REVISION_LINE: &str = "revision_line";
const UNITS: &str = "units";
const RAD_FILE: &str = "rad_file";

/// Column where the units token starts on the first parameter line.
const UNITS_COLUMN: usize = 60;

const RAD_FILE_MARKER: &str = "RAD FILE";

static PARAMS_1: &[Slot] = &[
    int("node_count", 0),
    float("lower_froude", 0.75),
    float("upper_froude", 0.9),
    float("min_depth", 0.1),
    float("convergence_direct", 0.001),
    int(LABEL_LENGTH, DEFAULT_LABEL_LENGTH as i64),
];

static PARAMS_2: &[Slot] = &[
    float("water_temperature", 10.0),
    float("convergence_flow", 0.01),
    float("convergence_head", 0.01),
    float("mathematical_damping", 0.7),
    float("pivotal_choice", 0.1),
    float("under_relaxation", 0.7),
    float("matrix_dummy", 0.0),
];

/// Number of modelled header lines: title to RAD file path.
const MODELLED_LINES: usize = 6;

fn span_of(lines: &[SourceLine<'_>]) -> Span {
    match (lines.first(), lines.last()) {
        (Some(first), Some(last)) => first.span().union(last.span()),
        _ => Span::default(),
    }
}

/// Parses the header lines returned by the scanner.
///
/// # Errors
///
/// Returns `E102` when the header is shorter than its fixed layout and
/// `E101` when the label length is not a positive integer.
pub fn parse(lines: &[SourceLine<'_>]) -> Result<GeneralParameters> {
    let end_general = lines
        .iter()
        .position(|line| line.text().trim().eq_ignore_ascii_case(END_GENERAL))
        .unwrap_or(lines.len());
    if end_general < MODELLED_LINES {
        return Err(Diagnostic::error(format!(
            "header has {end_general} lines before `{END_GENERAL}`, expected at least {MODELLED_LINES}"
        ))
        .with_code(ErrorCode::E102)
        .with_label(span_of(lines), "header"));
    }

    let mut fields = Fields::new();
    fields.declare(TITLE, Value::Text(lines[0].text().to_string()));

    let mut revision = lines[1].text().trim();
    match revision_tag(&mut revision) {
        Ok(tag) if revision.trim().is_empty() => fields.declare(REVISION, Value::Int(tag)),
        _ => fields.declare(REVISION_LINE, Value::Text(lines[1].text().to_string())),
    }

    let params_1 = lines[2];
    let label_text = fixed::column(params_1.text(), 50, 10).trim();
    match fixed::parse_int(label_text) {
        Some(len) if len > 0 => {}
        _ => {
            return Err(Diagnostic::error(format!("invalid label length `{label_text}`"))
                .with_code(ErrorCode::E101)
                .with_label(params_1.span(), "label length is the sixth column")
                .with_help("the label length must be a positive integer"));
        }
    }
    read_cells(PARAMS_1, params_1.text(), DEFAULT_LABEL_LENGTH, &mut fields);
    let units = fixed::rest(params_1.text(), UNITS_COLUMN).trim();
    let units = if units.is_empty() { "DEFAULT" } else { units };
    fields.declare(UNITS, Value::Text(units.to_string()));

    read_cells(PARAMS_2, lines[3].text(), DEFAULT_LABEL_LENGTH, &mut fields);
    fields.declare(RAD_FILE, Value::Text(lines[5].text().to_string()));

    let extra = lines[MODELLED_LINES..]
        .iter()
        .map(|line| line.text().to_string())
        .collect();
    let params = GeneralParameters::new(fields, extra);

    let span = span_of(lines);
    let source: Vec<String> = lines.iter().map(|line| line.full().to_string()).collect();
    let memo = LineMemo::new(write(&params), source.clone());
    debug!(label_length = params.label_length(), extra_lines = params.extra_lines().len(); "Parsed header");
    Ok(params.with_origin(source, span, memo))
}

/// Writes header parameters as lines without line endings.
pub fn write(params: &GeneralParameters) -> Vec<String> {
    let fields = params.fields();
    let text = |key: &str| fields.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
    let revision = match fields.get(REVISION_LINE).and_then(Value::as_str) {
        Some(line) => line.to_string(),
        None => {
            let tag = fields.get(REVISION).and_then(Value::as_i64).unwrap_or(1);
            format!("#REVISION#{tag}")
        }
    };

    let mut out = vec![
        text(TITLE),
        revision,
        format!("{}{}", write_cells(PARAMS_1, fields, DEFAULT_LABEL_LENGTH), text(UNITS))
            .trim_end()
            .to_string(),
        write_cells(PARAMS_2, fields, DEFAULT_LABEL_LENGTH)
            .trim_end()
            .to_string(),
        RAD_FILE_MARKER.to_string(),
        text(RAD_FILE),
    ];
    out.extend(params.extra_lines().iter().cloned());
    out
}

/// Renders the header as text, keeping unchanged lines exactly as read.
pub fn render(params: &GeneralParameters, ending: &str) -> String {
    if let Some(lines) = params.pristine_lines() {
        return lines.concat();
    }
    let rendered = write(params);
    join_lines(&rendered, &params.recall(&rendered), ending)
}

/// Header parameters of a new, empty network.
pub fn blank() -> GeneralParameters {
    let mut fields = Fields::new()
        .with(TITLE, Value::Text(String::new()))
        .with(REVISION, Value::Int(1));
    declare_defaults(PARAMS_1, &mut fields);
    fields.declare(UNITS, Value::Text("SI".to_string()));
    declare_defaults(PARAMS_2, &mut fields);
    fields.declare(RAD_FILE, Value::Text(String::new()));
    GeneralParameters::new(fields, vec![END_GENERAL.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::split_lines;

    const HEADER: &str = "Model\n#REVISION#1\n         5     0.750     0.900     0.100     0.001        12SI\n    10.000     0.010     0.010     0.700     0.100     0.700     0.000\nRAD FILE\n\nEND GENERAL\n";

    #[test]
    fn test_parse_header() {
        let lines = split_lines(HEADER);

        let params = parse(&lines).unwrap();

        assert_eq!(params.title(), "Model");
        assert_eq!(params.get("node_count"), Some(&Value::Int(5)));
        assert_eq!(params.get("units"), Some(&Value::Text("SI".to_string())));
        assert_eq!(params.get("mathematical_damping"), Some(&Value::Float(0.7)));
        assert_eq!(params.label_length(), 12);
        assert_eq!(params.extra_lines(), [END_GENERAL]);
    }

    #[test]
    fn test_write_matches_source() {
        let params = parse(&split_lines(HEADER)).unwrap();

        assert_eq!(write(&params).join("\n") + "\n", HEADER);
    }

    #[test]
    fn test_render_edit_keeps_other_lines() {
        let source = HEADER.replace("     0.750", "      0.75");
        let mut params = parse(&split_lines(&source)).unwrap();

        params.set("title", "Renamed").unwrap();
        let text = render(&params, "\n");

        assert!(text.starts_with("Renamed\n"));
        assert!(text.contains("      0.75"));
    }

    #[test]
    fn test_untagged_revision_line_survives_edits() {
        let source = HEADER.replace("#REVISION#1\n", "written by hand\n");
        let mut params = parse(&split_lines(&source)).unwrap();

        assert_eq!(params.get("revision"), None);
        params.set("node_count", 6_i64).unwrap();
        let text = render(&params, "\n");

        assert!(text.starts_with("Model\nwritten by hand\n         6     0.750"));
    }

    #[test]
    fn test_revision_tag_is_typed() {
        let params = parse(&split_lines(HEADER)).unwrap();

        assert_eq!(params.get("revision"), Some(&Value::Int(1)));
        assert_eq!(params.get("revision_line"), None);
    }

    #[test]
    fn test_invalid_label_length() {
        let source = HEADER.replace("        12SI", "         0SI");

        let err = parse(&split_lines(&source)).unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::E101));
    }

    #[test]
    fn test_truncated_header() {
        let err = parse(&split_lines("Model\n#REVISION#1\nEND GENERAL\n")).unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::E102));
    }

    #[test]
    fn test_blank_header_round_trips() {
        let text = write(&blank()).join("\n") + "\n";

        let params = parse(&split_lines(&text)).unwrap();

        assert_eq!(params, blank());
    }
}
