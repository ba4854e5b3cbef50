//! Rendering of library errors and parse diagnostics through miette.
//!
//! A parse error carrying several diagnostics becomes one [`Reportable`]
//! per diagnostic. Warnings kept on a parsed network go through
//! [`Reportable::from_diagnostic`] as well.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use fmdat::FmdatError;
use fmdat_parser::error::{Diagnostic, Severity};

/// One error or warning, ready for miette's report handler.
#[derive(Debug)]
pub struct Reportable<'a> {
    message: String,
    code: Option<String>,
    severity: miette::Severity,
    help: Option<String>,
    labels: Vec<LabeledSpan>,
    /// Network text the labels point into.
    src: Option<&'a str>,
}

impl<'a> Reportable<'a> {
    pub fn from_diagnostic(diag: &Diagnostic, src: &'a str) -> Self {
        let labels = diag
            .labels()
            .iter()
            .map(|label| {
                let span = SourceSpan::new(label.span().start().into(), label.span().len());
                let message = Some(label.message().to_string());
                if label.is_primary() {
                    LabeledSpan::new_primary_with_span(message, span)
                } else {
                    LabeledSpan::new_with_span(message, span)
                }
            })
            .collect();
        Self {
            message: diag.message().to_string(),
            code: diag.code().map(|code| code.to_string()),
            severity: match diag.severity() {
                Severity::Error => miette::Severity::Error,
                Severity::Warning => miette::Severity::Warning,
            },
            help: diag.help().map(str::to_string),
            labels,
            src: Some(src),
        }
    }

    /// Errors other than parse errors have no source location.
    pub fn from_error(err: &FmdatError) -> Self {
        let code = match err {
            FmdatError::Io(_) => Some("fmdat::io"),
            FmdatError::Parse { .. } => None,
            FmdatError::NameCollision { .. } => Some("fmdat::name_collision"),
            FmdatError::NotFound(_) => Some("fmdat::not_found"),
            FmdatError::InvalidPosition(_) => Some("fmdat::invalid_position"),
            FmdatError::InvalidName(_) => Some("fmdat::invalid_name"),
            FmdatError::Field(_) => Some("fmdat::field"),
            FmdatError::Interchange(_) => Some("fmdat::interchange"),
        };
        let help = match err {
            FmdatError::NameCollision { category, .. } => {
                Some(format!("unit names must be unique within {category}"))
            }
            FmdatError::InvalidName(_) => {
                Some("names are non-empty, without spaces and no longer than the label length".to_string())
            }
            _ => None,
        };
        Self {
            message: err.to_string(),
            code: code.map(str::to_string),
            severity: miette::Severity::Error,
            help,
            labels: Vec::new(),
            src: None,
        }
    }
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Reportable<'_> {}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        self.code
            .as_ref()
            .map(|code| Box::new(code) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(self.severity)
    }

    fn help<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        self.help
            .as_ref()
            .map(|help| Box::new(help) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.src.as_ref().map(|src| src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.labels.is_empty() {
            return None;
        }
        Some(Box::new(self.labels.iter().cloned()))
    }
}

/// Converts an error into the reportables miette renders.
pub fn to_reportables(err: &FmdatError) -> Vec<Reportable<'_>> {
    match err {
        FmdatError::Parse { err: parse_err, src } => parse_err
            .diagnostics()
            .iter()
            .map(|diag| Reportable::from_diagnostic(diag, src))
            .collect(),
        _ => vec![Reportable::from_error(err)],
    }
}

/// Renders reportables with miette's graphical handler.
pub fn render(reportables: &[Reportable<'_>]) -> String {
    let reporter = miette::GraphicalReportHandler::new();
    let mut writer = String::new();
    for reportable in reportables {
        if reporter.render_report(&mut writer, reportable).is_err() {
            writer.push_str(&reportable.message);
            writer.push('\n');
        }
    }
    writer
}
