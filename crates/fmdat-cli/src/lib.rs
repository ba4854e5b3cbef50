//! fmdat CLI library
//!
//! This module contains the core CLI logic for the fmdat network tool.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};
pub use error_adapter::{Reportable, to_reportables};

use std::{fs, io::Write};

use log::{info, warn};

use fmdat::{FmdatError, NetworkReader, element::Category, io};

/// Run the fmdat CLI application
///
/// Command output is written to `out`; logging goes through the `log`
/// facade.
///
/// # Errors
///
/// Returns `FmdatError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
/// - Failed edits
/// - A network that does not write back unchanged (`check`)
pub fn run(args: &Args, out: &mut impl Write) -> Result<(), FmdatError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let reader = NetworkReader::new(app_config);

    match &args.command {
        Command::Check { input } => check(&reader, input, out),
        Command::List { input, category } => {
            let category = category.as_deref().map(parse_category).transpose()?;
            let file = reader.open(input)?;
            for (index, (_, element)) in file.network.iter().enumerate() {
                if category.is_some() && element.category() != category {
                    continue;
                }
                let kind = match element.subtype() {
                    Some(subtype) => format!("{} {subtype}", element.kind()),
                    None => element.kind().to_string(),
                };
                writeln!(out, "{index:>5}  {kind:<24} {}", element.name())?;
            }
            Ok(())
        }
        Command::Diff { left, right, json } => {
            let left = reader.open(left)?;
            let right = reader.open(right)?;
            let differences = reader.diff(&left.network, &right.network);
            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(&differences)?)?;
            } else if differences.is_empty() {
                writeln!(out, "networks are equal")?;
            } else {
                for difference in &differences {
                    writeln!(out, "{difference}")?;
                }
            }
            info!(count = differences.len(); "Diff reported");
            Ok(())
        }
        Command::Json { input, output } => {
            let file = reader.open(input)?;
            let json = file.network.to_interchange().to_json()?;
            match output {
                Some(path) => {
                    fs::write(path, json)?;
                    info!(output_file = path; "Interchange record exported");
                }
                None => writeln!(out, "{json}")?,
            }
            Ok(())
        }
        Command::Rename {
            input,
            category,
            from,
            to,
            output,
        } => {
            let category = parse_category(category)?;
            let mut file = reader.open(input)?;
            let id = file
                .network
                .find(category, from)
                .ok_or_else(|| FmdatError::NotFound(format!("{category} unit `{from}`")))?;
            file.network.rename(id, to)?;
            match output {
                Some(path) => file.save_as(path)?,
                None => file.save()?,
            }
            writeln!(out, "renamed {category} `{from}` to `{to}` in {}", file.path.display())?;
            Ok(())
        }
    }
}

fn check(reader: &NetworkReader, input: &str, out: &mut impl Write) -> Result<(), FmdatError> {
    info!(input_path = input; "Checking network");
    let (text, _) = io::read_text(input)?;
    let network = reader.parse(&text)?;

    if !network.warnings().is_empty() {
        warn!(count = network.warnings().len(); "Network parsed with warnings");
        let reportables: Vec<_> = network
            .warnings()
            .iter()
            .map(|d| Reportable::from_diagnostic(d, &text))
            .collect();
        write!(out, "{}", error_adapter::render(&reportables))?;
    }

    let written = network.write();
    if written != text {
        let line = written
            .lines()
            .zip(text.lines())
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| written.lines().count().min(text.lines().count()));
        return Err(FmdatError::Io(std::io::Error::other(format!(
            "{input}: network does not write back unchanged (first difference at line {})",
            line + 1
        ))));
    }

    writeln!(
        out,
        "{input}: {} units, {} warnings, round trip ok",
        network.len(),
        network.warnings().len()
    )?;
    Ok(())
}

fn parse_category(name: &str) -> Result<Category, FmdatError> {
    name.parse()
        .map_err(|err: fmdat::element::UnknownCategory| FmdatError::NotFound(err.to_string()))
}
