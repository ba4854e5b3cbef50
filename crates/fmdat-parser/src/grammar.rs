//! Declarative unit grammars.
//!
//! Most unit kinds differ only in their line layout: which labels appear on
//! the label line, which fixed-width parameters follow, and whether a table
//! of rows closes the block. A [`Grammar`] describes that layout as static
//! data, and one interpreter parses and writes every kind described this
//! way.
//!
//! Write is the inverse of parse for every modelled value. Lines that a
//! grammar does not describe are kept verbatim as the element's raw tail.

use std::collections::VecDeque;

use winnow::{
    Parser as _,
    ascii::{Caseless, digit1, space0},
    combinator::{opt, preceded, repeat},
    error::ModalResult,
    token::take_while,
};

use fmdat_core::{
    element::{Content, Element, ElementClass},
    field::Fields,
    fixed::{self, COLUMN_WIDTH, DEFAULT_PRECISION, Justify},
    keyword::Keyword,
    table::{Column, Table},
    value::{Value, ValueKind},
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    registry::ParseContext,
    scanner::{RawBlock, SourceLine},
};

/// How a value is read from and written to its column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Format {
    /// A float written with the given number of decimal places.
    Float(usize),
    Int,
    Text,
    Choice,
    /// A boolean written as `token` when set and blank otherwise.
    Flag(&'static str),
    /// A `dd/mm/yyyy hh:mm` string spread over two columns.
    DateTime,
}

impl Format {
    fn kind(&self) -> ValueKind {
        match self {
            Format::Float(_) => ValueKind::Float,
            Format::Int => ValueKind::Int,
            Format::Text | Format::DateTime => ValueKind::Text,
            Format::Choice => ValueKind::Choice,
            Format::Flag(_) => ValueKind::Flag,
        }
    }
}

/// The value a field takes when its column is blank or unreadable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    Float(f64),
    Int(i64),
    Text(&'static str),
    Flag(bool),
}

/// Column width of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Fixed(usize),
    /// The label length declared by the file header.
    Label,
}

/// A single named value on a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub key: &'static str,
    pub width: Width,
    pub format: Format,
    pub fallback: Fallback,
    pub justify: Justify,
}

impl Cell {
    fn width(&self, label_length: usize) -> usize {
        match self.width {
            Width::Fixed(width) => width,
            Width::Label => label_length,
        }
    }

    fn default_value(&self) -> Value {
        match (self.format, self.fallback) {
            (Format::Float(_), Fallback::Float(v)) => Value::Float(v),
            (Format::Float(_), Fallback::Int(v)) => Value::Float(v as f64),
            (Format::Int, Fallback::Int(v)) => Value::Int(v),
            (Format::Flag(_), Fallback::Flag(v)) => Value::Flag(v),
            (Format::Choice, Fallback::Text(s)) => Value::Choice(s.to_string()),
            (Format::Float(_), _) => Value::Float(0.0),
            (Format::Int, _) => Value::Int(0),
            (Format::Flag(_), _) => Value::Flag(false),
            (Format::Choice, _) => Value::Choice(String::new()),
            (Format::Text | Format::DateTime, Fallback::Text(s)) => Value::Text(s.to_string()),
            (Format::Text | Format::DateTime, _) => Value::Text(String::new()),
        }
    }

    /// Reads the cell from its columns. Blank numeric columns take the
    /// fallback; numeric columns holding anything else are unreadable.
    fn read(&self, line: &str, start: usize, label_length: usize) -> std::result::Result<Value, Unreadable> {
        let width = self.width(label_length);
        let text = fixed::column(line, start, width).trim();
        let unreadable = || Unreadable {
            key: self.key,
            text: text.to_string(),
        };
        let value = match self.format {
            Format::Float(_) | Format::Int if text.is_empty() => self.default_value(),
            Format::Float(_) => Value::Float(fixed::parse_float(text).ok_or_else(unreadable)?),
            Format::Int => Value::Int(fixed::parse_int(text).ok_or_else(unreadable)?),
            Format::Text => Value::Text(text.to_string()),
            Format::Choice if text.is_empty() => self.default_value(),
            Format::Choice => Value::Choice(text.to_string()),
            Format::Flag(token) => Value::Flag(text.eq_ignore_ascii_case(token)),
            Format::DateTime => {
                let half = width / 2;
                let date = fixed::column(line, start, half).trim();
                let time = fixed::column(line, start + half, width - half).trim();
                Value::Text(format!("{date} {time}").trim().to_string())
            }
        };
        Ok(value)
    }

    fn render(&self, value: &Value, label_length: usize) -> String {
        let width = self.width(label_length);
        let text = match (self.format, value) {
            (Format::Float(precision), _) => value
                .as_f64()
                .map(|v| fixed::format_float(v, precision))
                .unwrap_or_default(),
            (Format::Flag(token), Value::Flag(true)) => token.to_string(),
            (Format::Flag(_), _) => String::new(),
            (Format::DateTime, _) => {
                let half = width / 2;
                let text = value.as_str().unwrap_or_default();
                let (date, time) = text.split_once(' ').unwrap_or((text, ""));
                return format!(
                    "{}{}",
                    fixed::fit(date.trim(), half, self.justify),
                    fixed::fit(time.trim(), width - half, self.justify)
                );
            }
            (_, Value::Int(v)) => v.to_string(),
            (_, Value::Float(v)) => fixed::format_float(*v, DEFAULT_PRECISION),
            (_, Value::Text(s) | Value::Choice(s)) => s.clone(),
            (_, Value::Flag(b)) => b.to_string(),
        };
        fixed::fit(&text, width, self.justify)
    }
}

/// A numeric column whose text is not a number.
#[derive(Debug, Clone, PartialEq)]
struct Unreadable {
    key: &'static str,
    text: String,
}

/// One slot of a fixed-column line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot {
    Cell(Cell),
    /// Unused columns, written as blanks.
    Skip(usize),
    /// The row count of the next table whose count is [`Count::Declared`].
    Count,
}

impl Slot {
    fn width(&self, label_length: usize) -> usize {
        match self {
            Slot::Cell(cell) => cell.width(label_length),
            Slot::Skip(width) => *width,
            Slot::Count => COLUMN_WIDTH,
        }
    }
}

const fn cell(key: &'static str, width: Width, format: Format, fallback: Fallback, justify: Justify) -> Slot {
    Slot::Cell(Cell {
        key,
        width,
        format,
        fallback,
        justify,
    })
}

/// A 10-column float written to 3 decimal places.
pub const fn float(key: &'static str, fallback: f64) -> Slot {
    cell(key, Width::Fixed(COLUMN_WIDTH), Format::Float(DEFAULT_PRECISION), Fallback::Float(fallback), Justify::Right)
}

/// A 10-column float written to `precision` decimal places.
pub const fn float_dp(key: &'static str, fallback: f64, precision: usize) -> Slot {
    cell(key, Width::Fixed(COLUMN_WIDTH), Format::Float(precision), Fallback::Float(fallback), Justify::Right)
}

/// A 10-column float written to 3 decimal places, left-justified.
pub const fn float_left(key: &'static str, fallback: f64) -> Slot {
    cell(key, Width::Fixed(COLUMN_WIDTH), Format::Float(DEFAULT_PRECISION), Fallback::Float(fallback), Justify::Left)
}

pub const fn float_w(key: &'static str, fallback: f64, width: usize) -> Slot {
    cell(key, Width::Fixed(width), Format::Float(DEFAULT_PRECISION), Fallback::Float(fallback), Justify::Right)
}

pub const fn int(key: &'static str, fallback: i64) -> Slot {
    cell(key, Width::Fixed(COLUMN_WIDTH), Format::Int, Fallback::Int(fallback), Justify::Right)
}

pub const fn choice(key: &'static str, fallback: &'static str) -> Slot {
    cell(key, Width::Fixed(COLUMN_WIDTH), Format::Choice, Fallback::Text(fallback), Justify::Right)
}

pub const fn choice_left(key: &'static str, fallback: &'static str) -> Slot {
    cell(key, Width::Fixed(COLUMN_WIDTH), Format::Choice, Fallback::Text(fallback), Justify::Left)
}

pub const fn text(key: &'static str) -> Slot {
    cell(key, Width::Fixed(COLUMN_WIDTH), Format::Text, Fallback::Text(""), Justify::Right)
}

pub const fn text_w(key: &'static str, width: usize, justify: Justify) -> Slot {
    cell(key, Width::Fixed(width), Format::Text, Fallback::Text(""), justify)
}

pub const fn flag(key: &'static str, token: &'static str) -> Slot {
    cell(key, Width::Fixed(COLUMN_WIDTH), Format::Flag(token), Fallback::Flag(false), Justify::Right)
}

pub const fn flag_left(key: &'static str, token: &'static str) -> Slot {
    cell(key, Width::Fixed(COLUMN_WIDTH), Format::Flag(token), Fallback::Flag(false), Justify::Left)
}

pub const fn flag_w(key: &'static str, token: &'static str, width: usize) -> Slot {
    cell(key, Width::Fixed(width), Format::Flag(token), Fallback::Flag(false), Justify::Right)
}

/// A date-time spread over two 10-character columns.
pub const fn datetime(key: &'static str) -> Slot {
    cell(key, Width::Fixed(2 * COLUMN_WIDTH), Format::DateTime, Fallback::Text(""), Justify::Right)
}

/// A label in a label-length column.
pub const fn label(key: &'static str) -> Slot {
    cell(key, Width::Label, Format::Text, Fallback::Text(""), Justify::Left)
}

pub const fn skip(width: usize) -> Slot {
    Slot::Skip(width)
}

/// Where a table finds its row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    /// A line of its own directly before the rows.
    OwnLine,
    /// A [`Slot::Count`] on an earlier parameter line.
    Declared,
    /// Every remaining line of the block is a row.
    Remaining,
    /// Rows run up to a closing line with this text.
    Until(&'static str),
}

/// Alternative row layout used when a time-unit field reads `DATES`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dates {
    pub field: &'static str,
    pub columns: &'static [Slot],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableSpec {
    pub key: &'static str,
    pub count: Count,
    pub columns: &'static [Slot],
    pub dates: Option<Dates>,
}

impl TableSpec {
    fn layout(&self, fields: &Fields) -> &'static [Slot] {
        match self.dates {
            Some(dates) if is_dates(fields.get(dates.field)) => dates.columns,
            _ => self.columns,
        }
    }
}

fn is_dates(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|unit| unit.eq_ignore_ascii_case("DATES") || unit.eq_ignore_ascii_case("DATE"))
}

/// One line (or run of lines) of a block layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Line {
    /// The keyword line: keyword, optional `#revision#N` tag, comment.
    Header { revision: bool },
    /// The subtype line of kinds that carry one.
    Subtype,
    /// Labels in label-length columns; the first label is the unit name.
    Labels(&'static [&'static str]),
    /// Any number of labels on one line. The first is the unit name; the
    /// rest fill a one-column table named `key`.
    LabelList { key: &'static str },
    /// Fixed-width parameters.
    Params(&'static [Slot]),
    /// A whole line of free text.
    Text { key: &'static str, fallback: &'static str },
    Table(TableSpec),
    /// A fixed closing line such as `END VARIABLES`.
    Literal(&'static str),
    /// All remaining lines, kept verbatim.
    Tail,
}

/// The layout of one unit kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grammar {
    pub kind: &'static str,
    pub subtype: Option<&'static str>,
    pub class: ElementClass,
    pub lines: &'static [Line],
}

/// Field holding the `#revision#` number of headers that carry one.
pub const REVISION: &str = "revision";

/// Skips `count` whitespace-separated words.
fn skip_words<'a>(input: &mut &'a str, count: usize) -> ModalResult<()> {
    repeat(
        count,
        (space0, take_while(1.., |c: char| !c.is_whitespace())),
    )
    .map(|()| ())
    .parse_next(input)
}

/// Parses a `#revision#N` tag.
pub(crate) fn revision_tag(input: &mut &str) -> ModalResult<i64> {
    preceded((space0, Caseless("#revision#")), digit1)
        .try_map(str::parse::<i64>)
        .parse_next(input)
}

/// The `#revision#` tag on a header line, if any.
pub(crate) fn header_revision(text: &str, kind: &str) -> Option<i64> {
    split_header(text, kind, true).0
}

/// Splits a header line into revision and comment.
fn split_header(text: &str, kind: &str, revision: bool) -> (Option<i64>, String) {
    let mut input = text;
    let words = kind.split_whitespace().count();
    if skip_words(&mut input, words).is_err() {
        return (None, String::new());
    }
    let tag = if revision {
        opt(revision_tag).parse_next(&mut input).ok().flatten()
    } else {
        None
    };
    (tag, input.trim().to_string())
}

impl Grammar {
    fn block_label(&self, block: &RawBlock<'_>) -> String {
        match self.subtype {
            Some(subtype) => format!("block #{} ({} {subtype})", block.index(), self.kind),
            None => format!("block #{} ({})", block.index(), self.kind),
        }
    }

    fn required<'b, 'src>(
        &self,
        block: &'b RawBlock<'src>,
        cursor: usize,
        what: &str,
    ) -> Result<&'b SourceLine<'src>> {
        block.lines().get(cursor).ok_or_else(|| {
            Diagnostic::error(format!("{}: missing {what} line", self.block_label(block)))
                .with_code(ErrorCode::E201)
                .with_label(block.span(), "block ends here")
        })
    }

    /// Builds a blank element of this kind with every field at its default.
    pub fn create(&self, name: &str) -> Element {
        let mut fields = Fields::new();
        let mut content_tables = Vec::new();
        let mut label_tables = Vec::new();
        for line in self.lines {
            match line {
                Line::Header { revision: true } => fields.declare(REVISION, Value::Int(1)),
                Line::Header { .. } | Line::Subtype | Line::Literal(_) | Line::Tail => {}
                Line::Labels(keys) => {
                    for key in keys.iter().skip(1) {
                        fields.declare(key, Value::Text(String::new()));
                    }
                }
                Line::Params(slots) => declare_defaults(slots, &mut fields),
                Line::Text { key, fallback } => fields.declare(key, Value::Text(fallback.to_string())),
                Line::Table(spec) => content_tables.push(*spec),
                Line::LabelList { key } => label_tables.push(*key),
            }
        }
        let mut content = Content::new(name);
        for key in label_tables {
            content = content.with_table(key, label_table());
        }
        for spec in content_tables {
            content = content.with_table(spec.key, empty_table(spec.layout(&fields)));
        }
        let content = content.with_fields(fields);
        Element::new(
            Keyword::new(self.kind),
            self.subtype.map(Keyword::new),
            self.class,
            content,
        )
    }

    /// Parses a raw block according to this layout.
    ///
    /// # Errors
    ///
    /// Returns an `E201` diagnostic for missing lines, `E202` for an
    /// unreadable row count, `E203` for a numeric column that holds text
    /// and `E200` when a row count does not match the rows present.
    pub fn parse(&self, block: &RawBlock<'_>, ctx: &ParseContext) -> Result<Element> {
        let label_length = ctx.label_length();
        let lines = block.lines();
        let mut cursor = 0;
        let mut name = String::new();
        let mut comment = String::new();
        let mut fields = Fields::new();
        let mut tables = Vec::new();
        let mut raw = None;
        let mut declared: VecDeque<(usize, SourceLine<'_>)> = VecDeque::new();

        for (position, spec) in self.lines.iter().enumerate() {
            match spec {
                Line::Header { revision } => {
                    let line = self.required(block, cursor, "keyword")?;
                    let (tag, text) = split_header(line.text(), self.kind, *revision);
                    if *revision {
                        fields.declare(REVISION, Value::Int(tag.unwrap_or(1)));
                    }
                    comment = text;
                    cursor += 1;
                }
                Line::Subtype => {
                    self.required(block, cursor, "subtype")?;
                    cursor += 1;
                }
                Line::Labels(keys) => {
                    let line = self.required(block, cursor, "label")?;
                    for (i, key) in keys.iter().enumerate() {
                        let value = fixed::column(line.text(), i * label_length, label_length).trim();
                        if i == 0 {
                            name = value.to_string();
                        } else {
                            fields.declare(key, Value::Text(value.to_string()));
                        }
                    }
                    cursor += 1;
                }
                Line::LabelList { key } => {
                    let line = self.required(block, cursor, "label")?;
                    let mut labels = fixed::split_columns(line.text(), label_length).into_iter();
                    name = labels.next().unwrap_or_default().to_string();
                    let mut rest: Vec<&str> = labels.collect();
                    while rest.last().is_some_and(|label| label.is_empty()) {
                        rest.pop();
                    }
                    let mut table = label_table();
                    for label in rest {
                        if let Err(err) = table.push(vec![Value::Text(label.to_string())]) {
                            return Err(Diagnostic::error(format!("{}: {err}", self.block_label(block)))
                                .with_code(ErrorCode::E201)
                                .with_label(line.span(), "unreadable label"));
                        }
                    }
                    tables.push((*key, table));
                    cursor += 1;
                }
                Line::Params(slots) => {
                    let line = self.required(block, cursor, "parameter")?;
                    let mut start = 0;
                    for slot in *slots {
                        match slot {
                            Slot::Cell(cell) => {
                                let value = cell
                                    .read(line.text(), start, label_length)
                                    .map_err(|err| self.unreadable(block, line, err))?;
                                fields.declare(cell.key, value);
                            }
                            Slot::Count => {
                                let count = self.read_count(block, line, start)?;
                                declared.push_back((count, *line));
                            }
                            Slot::Skip(_) => {}
                        }
                        start += slot.width(label_length);
                    }
                    cursor += 1;
                }
                Line::Text { key, .. } => {
                    let line = self.required(block, cursor, "text")?;
                    fields.declare(key, Value::Text(line.text().trim_end().to_string()));
                    cursor += 1;
                }
                Line::Table(spec) => {
                    let (count, count_line) = match spec.count {
                        Count::OwnLine => {
                            let line = self.required(block, cursor, "row count")?;
                            cursor += 1;
                            (Some(self.read_count(block, line, 0)?), Some(*line))
                        }
                        Count::Declared => match declared.pop_front() {
                            Some((count, line)) => (Some(count), Some(line)),
                            None => (None, None),
                        },
                        Count::Remaining => (None, None),
                        Count::Until(sentinel) => {
                            let rows = lines[cursor..]
                                .iter()
                                .position(|line| line.text().trim().eq_ignore_ascii_case(sentinel))
                                .unwrap_or(lines.len() - cursor);
                            (Some(rows), None)
                        }
                    };
                    let available = match spec.count {
                        Count::Until(_) => count.unwrap_or_default(),
                        _ => lines.len() - cursor,
                    };
                    let is_last = position + 1 == self.lines.len();
                    let rows = match count {
                        None => available,
                        Some(count) if is_last && count != available => {
                            return Err(self.count_mismatch(block, count, available, count_line));
                        }
                        Some(count) if count > available => {
                            return Err(self.count_mismatch(block, count, available, count_line));
                        }
                        Some(count) => count,
                    };
                    let layout = spec.layout(&fields);
                    let mut table = empty_table(layout);
                    for line in &lines[cursor..cursor + rows] {
                        let row = read_row(layout, line.text(), label_length)
                            .map_err(|err| self.unreadable(block, line, err))?;
                        // Cells are read with their column kinds, so the row always fits.
                        if let Err(err) = table.push(row) {
                            return Err(Diagnostic::error(format!("{}: {err}", self.block_label(block)))
                                .with_code(ErrorCode::E201)
                                .with_label(line.span(), "unreadable row"));
                        }
                    }
                    cursor += rows;
                    tables.push((spec.key, table));
                }
                Line::Literal(text) => {
                    self.required(block, cursor, text)?;
                    cursor += 1;
                }
                Line::Tail => {
                    raw = Some(lines[cursor..].iter().map(|l| l.text().to_string()).collect::<Vec<_>>());
                    cursor = lines.len();
                }
            }
        }

        // Lines beyond the modelled layout are kept verbatim.
        let raw = raw.unwrap_or_else(|| lines[cursor.min(lines.len())..].iter().map(|l| l.text().to_string()).collect());

        let mut content = Content::new(name)
            .with_comment(comment)
            .with_fields(fields)
            .with_raw(raw);
        for (key, table) in tables {
            content = content.with_table(key, table);
        }
        Ok(Element::new(
            block.kind(),
            block.subtype(),
            self.class,
            content,
        ))
    }

    fn read_count(&self, block: &RawBlock<'_>, line: &SourceLine<'_>, start: usize) -> Result<usize> {
        let text = fixed::column(line.text(), start, COLUMN_WIDTH).trim();
        fixed::parse_int(text)
            .and_then(|count| usize::try_from(count).ok())
            .ok_or_else(|| {
                Diagnostic::error(format!(
                    "{}: invalid row count `{text}`",
                    self.block_label(block)
                ))
                .with_code(ErrorCode::E202)
                .with_label(line.span(), "expected a non-negative integer")
            })
    }

    fn unreadable(&self, block: &RawBlock<'_>, line: &SourceLine<'_>, err: Unreadable) -> Diagnostic {
        Diagnostic::error(format!(
            "{}: `{}` is not a number (field `{}`)",
            self.block_label(block),
            err.text,
            err.key
        ))
        .with_code(ErrorCode::E203)
        .with_label(line.span(), "unreadable number")
        .with_help("the block is kept exactly as written")
    }

    fn count_mismatch(
        &self,
        block: &RawBlock<'_>,
        expected: usize,
        found: usize,
        count_line: Option<SourceLine<'_>>,
    ) -> Diagnostic {
        let diag = Diagnostic::error(format!(
            "{}: row count {expected} does not match {found} rows",
            self.block_label(block)
        ))
        .with_code(ErrorCode::E200)
        .with_help("update the row count or add the missing rows");
        match count_line {
            Some(line) => diag
                .with_label(line.span(), "row count declared here")
                .with_secondary_label(block.span(), "in this block"),
            None => diag.with_label(block.span(), "in this block"),
        }
    }

    /// Writes an element as lines without line endings.
    pub fn write(&self, element: &Element, label_length: usize) -> Vec<String> {
        let fields = element.fields();
        let mut out = Vec::new();
        let mut has_tail = false;

        for (position, spec) in self.lines.iter().enumerate() {
            match spec {
                Line::Header { revision } => {
                    let mut line = element.kind().to_string();
                    if *revision {
                        let tag = fields.get(REVISION).and_then(Value::as_i64).unwrap_or(1);
                        line.push_str(&format!(" #revision#{tag}"));
                    }
                    if !element.comment().is_empty() {
                        line.push(' ');
                        line.push_str(element.comment());
                    }
                    out.push(line);
                }
                Line::Subtype => {
                    let subtype = element
                        .subtype()
                        .map(|s| s.to_string())
                        .or_else(|| self.subtype.map(str::to_string))
                        .unwrap_or_default();
                    out.push(subtype);
                }
                Line::Labels(keys) => {
                    let line: String = keys
                        .iter()
                        .enumerate()
                        .map(|(i, key)| {
                            let value = if i == 0 {
                                element.name()
                            } else {
                                fields.get(key).and_then(Value::as_str).unwrap_or_default()
                            };
                            fixed::fit(value, label_length, Justify::Left)
                        })
                        .collect();
                    out.push(line.trim_end().to_string());
                }
                Line::LabelList { key } => {
                    let mut line = fixed::fit(element.name(), label_length, Justify::Left);
                    if let Some(table) = element.table_named(key) {
                        for row in table.rows() {
                            let label = row.first().and_then(Value::as_str).unwrap_or_default();
                            line.push_str(&fixed::fit(label, label_length, Justify::Left));
                        }
                    }
                    out.push(line.trim_end().to_string());
                }
                Line::Params(slots) => {
                    let mut line = String::new();
                    for slot in *slots {
                        match slot {
                            Slot::Cell(cell) => {
                                let value = fields.get(cell.key).cloned().unwrap_or_else(|| cell.default_value());
                                line.push_str(&cell.render(&value, label_length));
                            }
                            Slot::Skip(width) => line.push_str(&" ".repeat(*width)),
                            Slot::Count => {
                                let rows = self.declared_table_after(position, element).map_or(0, Table::len);
                                line.push_str(&fixed::fit(&rows.to_string(), COLUMN_WIDTH, Justify::Right));
                            }
                        }
                    }
                    out.push(line.trim_end().to_string());
                }
                Line::Text { key, fallback } => {
                    let text = fields.get(key).and_then(Value::as_str).unwrap_or(fallback);
                    out.push(text.trim_end().to_string());
                }
                Line::Table(spec) => {
                    let table = element.table_named(spec.key);
                    let rows = table.map_or(0, Table::len);
                    if spec.count == Count::OwnLine {
                        out.push(fixed::fit(&rows.to_string(), COLUMN_WIDTH, Justify::Right));
                    }
                    if let Some(table) = table {
                        let layout = spec.layout(fields);
                        for row in table.rows() {
                            out.push(write_row(layout, row, label_length));
                        }
                    }
                }
                Line::Literal(text) => out.push(text.to_string()),
                Line::Tail => {
                    has_tail = true;
                    out.extend(element.raw_lines().iter().cloned());
                }
            }
        }
        if !has_tail {
            out.extend(element.raw_lines().iter().cloned());
        }
        out
    }

    fn declared_table_after<'e>(&self, position: usize, element: &'e Element) -> Option<&'e Table> {
        self.lines[position + 1..].iter().find_map(|line| match line {
            Line::Table(spec) if spec.count == Count::Declared => element.table_named(spec.key),
            _ => None,
        })
    }
}

/// Reads the cells of one fixed-column line into `fields`. Unreadable
/// numbers take their fallback.
pub(crate) fn read_cells(slots: &[Slot], text: &str, label_length: usize, fields: &mut Fields) {
    let mut start = 0;
    for slot in slots {
        if let Slot::Cell(cell) = slot {
            let value = cell
                .read(text, start, label_length)
                .unwrap_or_else(|_| cell.default_value());
            fields.declare(cell.key, value);
        }
        start += slot.width(label_length);
    }
}

/// Writes the cells of one fixed-column line from `fields`, untrimmed.
pub(crate) fn write_cells(slots: &[Slot], fields: &Fields, label_length: usize) -> String {
    slots
        .iter()
        .map(|slot| match slot {
            Slot::Cell(cell) => {
                let value = fields.get(cell.key).cloned().unwrap_or_else(|| cell.default_value());
                cell.render(&value, label_length)
            }
            other => " ".repeat(other.width(label_length)),
        })
        .collect()
}

/// Declares every cell of `slots` with its default value.
pub(crate) fn declare_defaults(slots: &[Slot], fields: &mut Fields) {
    for slot in slots {
        if let Slot::Cell(cell) = slot {
            fields.declare(cell.key, cell.default_value());
        }
    }
}

fn empty_table(layout: &[Slot]) -> Table {
    Table::new(
        layout
            .iter()
            .filter_map(|slot| match slot {
                Slot::Cell(cell) => Some(Column::new(cell.key, cell.format.kind())),
                _ => None,
            })
            .collect(),
    )
}

/// Column of the table filled by [`Line::LabelList`].
pub const LABEL: &str = "label";

fn label_table() -> Table {
    Table::new(vec![Column::new(LABEL, ValueKind::Text)])
}

fn read_row(layout: &[Slot], text: &str, label_length: usize) -> std::result::Result<Vec<Value>, Unreadable> {
    let mut start = 0;
    let mut row = Vec::new();
    for slot in layout {
        if let Slot::Cell(cell) = slot {
            row.push(cell.read(text, start, label_length)?);
        }
        start += slot.width(label_length);
    }
    Ok(row)
}

fn write_row(layout: &[Slot], row: &[Value], label_length: usize) -> String {
    let mut cells = row.iter();
    let mut line = String::new();
    for slot in layout {
        match slot {
            Slot::Cell(cell) => {
                let value = cells.next().cloned().unwrap_or_else(|| cell.default_value());
                line.push_str(&cell.render(&value, label_length));
            }
            Slot::Skip(width) => line.push_str(&" ".repeat(*width)),
            Slot::Count => line.push_str(&" ".repeat(COLUMN_WIDTH)),
        }
    }
    line.trim_end().to_string()
}
