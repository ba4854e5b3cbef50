//! Block scanner for network files.
//!
//! The scanner splits the file into lines (keeping each line's ending and
//! byte span), peels off the header, then groups the remaining lines into
//! raw blocks, one per keyword line. It never interprets field values: the
//! only counts it reads are the line counts of `COMMENT` blocks, and the
//! only sentinels it looks for are `END GENERAL` and `END VARIABLES`.

use log::{debug, trace};
use winnow::{
    Parser as _,
    ascii::{digit1, space0, space1},
    combinator::{delimited, eof, opt, preceded, terminated},
    error::ModalResult,
    token::take_while,
};

use fmdat_core::keyword::Keyword;

use crate::{
    error::{Diagnostic, ErrorCode, ParseError},
    span::Span,
    vocabulary::{self, END_GENERAL, KeywordInfo, Terminator},
};

/// One line of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine<'src> {
    text: &'src str,
    full: &'src str,
    span: Span,
}

impl<'src> SourceLine<'src> {
    /// The line without its line ending.
    pub fn text(&self) -> &'src str {
        self.text
    }

    /// The line including its line ending, exactly as in the source.
    pub fn full(&self) -> &'src str {
        self.full
    }

    /// The line ending (`"\n"`, `"\r\n"` or `""` on a final unterminated line).
    pub fn ending(&self) -> &'src str {
        &self.full[self.text.len()..]
    }

    /// Byte span of the line text, excluding the ending.
    pub fn span(&self) -> Span {
        self.span
    }
}

/// A contiguous run of lines starting at a keyword line.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock<'src> {
    index: usize,
    kind: Keyword,
    subtype: Option<Keyword>,
    lines: Vec<SourceLine<'src>>,
}

impl<'src> RawBlock<'src> {
    /// Position of the block among all blocks of the file, from zero.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> Keyword {
        self.kind
    }

    /// The subtype token, for kinds that carry one on their second line.
    pub fn subtype(&self) -> Option<Keyword> {
        self.subtype
    }

    pub fn lines(&self) -> &[SourceLine<'src>] {
        &self.lines
    }

    /// Byte span of the whole block.
    pub fn span(&self) -> Span {
        match (self.lines.first(), self.lines.last()) {
            (Some(first), Some(last)) => first.span.union(last.span),
            _ => Span::default(),
        }
    }

    /// The block text with original line endings.
    pub fn to_text(&self) -> String {
        self.lines.iter().map(|line| line.full).collect()
    }
}

/// The scanner output: header lines followed by raw unit blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedFile<'src> {
    header: Vec<SourceLine<'src>>,
    blocks: Vec<RawBlock<'src>>,
}

impl<'src> ScannedFile<'src> {
    /// Lines up to the first unit block, including `END GENERAL`.
    pub fn header(&self) -> &[SourceLine<'src>] {
        &self.header
    }

    pub fn blocks(&self) -> &[RawBlock<'src>] {
        &self.blocks
    }

    pub fn into_parts(self) -> (Vec<SourceLine<'src>>, Vec<RawBlock<'src>>) {
        (self.header, self.blocks)
    }
}

/// Splits `source` into lines, keeping endings and byte spans.
pub fn split_lines(source: &str) -> Vec<SourceLine<'_>> {
    let mut offset = 0;
    source
        .split_inclusive('\n')
        .map(|full| {
            let text = full
                .strip_suffix('\n')
                .map(|s| s.strip_suffix('\r').unwrap_or(s))
                .unwrap_or(full);
            let line = SourceLine {
                text,
                full,
                span: Span::new(offset..offset + text.len()),
            };
            offset += full.len();
            line
        })
        .collect()
}

fn word<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| !c.is_whitespace()).parse_next(input)
}

/// Parses the first one or two words of a line.
fn leading_words<'a>(input: &mut &'a str) -> ModalResult<(&'a str, Option<&'a str>)> {
    (word, opt(preceded(space1, word))).parse_next(input)
}

/// Parses a line holding a single non-negative integer.
fn count_line(input: &mut &str) -> ModalResult<usize> {
    terminated(delimited(space0, digit1, space0), eof)
        .try_map(str::parse::<usize>)
        .parse_next(input)
}

/// Returns the keyword a line starts with, if any.
///
/// Keywords must start in the first column. Single-word keywords are tried
/// before two-word ones.
pub fn match_keyword(line: &str) -> Option<&'static KeywordInfo> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    let mut input = line;
    let (first, second) = leading_words.parse_next(&mut input).ok()?;
    vocabulary::lookup(first).or_else(|| {
        second.and_then(|second| vocabulary::lookup(&format!("{first} {second}")))
    })
}

/// Returns the first word of a line, used as a subtype token.
fn subtype_token(line: &str) -> Option<Keyword> {
    let mut input = line.trim_start();
    word.parse_next(&mut input).ok().map(Keyword::new)
}

fn is_sentinel(line: &SourceLine<'_>, sentinel: &str) -> bool {
    line.text.trim().eq_ignore_ascii_case(sentinel)
}

/// Scans a network file into header lines and raw blocks.
///
/// # Errors
///
/// Returns a [`ParseError`] when the header has no `END GENERAL`, when a
/// `COMMENT` line count is invalid or runs past the end of the file, or
/// when a sentinel-terminated block is never closed.
pub fn scan(source: &str) -> Result<ScannedFile<'_>, ParseError> {
    let lines = split_lines(source);

    let header_end = lines
        .iter()
        .position(|line| is_sentinel(line, END_GENERAL))
        .ok_or_else(|| {
            let span = lines.first().map(|line| line.span).unwrap_or_default();
            Diagnostic::error("missing END GENERAL")
                .with_code(ErrorCode::E100)
                .with_label(span, "header starts here")
                .with_help("close the header section with an `END GENERAL` line")
        })?;

    // Lines between END GENERAL and the first keyword stay with the header.
    let first_block = (header_end + 1..lines.len())
        .find(|&i| match_keyword(lines[i].text).is_some())
        .unwrap_or(lines.len());

    let mut blocks = Vec::new();
    let mut start = first_block;
    while start < lines.len() {
        let Some(info) = match_keyword(lines[start].text) else {
            // Unreachable by construction: every block end stops at a keyword.
            start += 1;
            continue;
        };
        let end = block_end(&lines, start, info, blocks.len())?;
        let subtype = if info.has_subtype {
            lines.get(start + 1).and_then(|line| subtype_token(line.text))
        } else {
            None
        };
        let block = RawBlock {
            index: blocks.len(),
            kind: Keyword::new(info.token),
            subtype,
            lines: lines[start..end].to_vec(),
        };
        trace!(index = block.index, kind = info.token, lines = end - start; "Scanned block");
        blocks.push(block);
        start = end;
    }

    debug!(header_lines = first_block, blocks = blocks.len(); "Scan complete");

    Ok(ScannedFile {
        header: lines[..first_block].to_vec(),
        blocks,
    })
}

/// Finds the exclusive end line of the block starting at `start`.
fn block_end(
    lines: &[SourceLine<'_>],
    start: usize,
    info: &KeywordInfo,
    index: usize,
) -> Result<usize, ParseError> {
    let keyword_span = lines[start].span;
    match info.terminator {
        Terminator::NextKeyword => Ok((start + 1..lines.len())
            .find(|&i| match_keyword(lines[i].text).is_some())
            .unwrap_or(lines.len())),
        Terminator::EndOfFile => Ok(lines.len()),
        Terminator::Sentinel(sentinel) => (start + 1..lines.len())
            .find(|&i| is_sentinel(&lines[i], sentinel))
            .map(|i| i + 1)
            .ok_or_else(|| {
                Diagnostic::error(format!(
                    "block #{index} ({}): missing `{sentinel}`",
                    info.token
                ))
                .with_code(ErrorCode::E001)
                .with_label(keyword_span, "block starts here")
                .with_help(format!("close the block with an `{sentinel}` line"))
                .into()
            }),
        Terminator::Counted => {
            let count_line_ref = lines.get(start + 1).ok_or_else(|| {
                Diagnostic::error(format!(
                    "block #{index} ({}): missing line count",
                    info.token
                ))
                .with_code(ErrorCode::E003)
                .with_label(keyword_span, "block starts here")
            })?;
            let mut input = count_line_ref.text;
            let count = count_line.parse_next(&mut input).map_err(|_| {
                Diagnostic::error(format!(
                    "block #{index} ({}): invalid line count `{}`",
                    info.token,
                    count_line_ref.text.trim()
                ))
                .with_code(ErrorCode::E002)
                .with_label(count_line_ref.span, "expected a number of lines")
            })?;
            let end = start + 2 + count;
            if end > lines.len() {
                return Err(Diagnostic::error(format!(
                    "block #{index} ({}): expected {count} lines, found {}",
                    info.token,
                    lines.len() - start - 2
                ))
                .with_code(ErrorCode::E003)
                .with_label(count_line_ref.span, "line count declared here")
                .into());
            }
            Ok(end)
        }
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    const HEADER: &str = "Model\n#REVISION#1\n         1     0.750     0.900     0.100     0.001        12SI\n    10.000     0.010     0.010     0.700     0.100     0.700     0.000\nRAD FILE\n\nEND GENERAL\n";

    /// Data lines that can never be taken for a keyword.
    fn data_lines_strategy() -> impl Strategy<Value = Vec<(String, &'static str)>> {
        prop::collection::vec(
            ("[ 0-9.]{0,30}", prop::sample::select(vec!["\n", "\r\n"])),
            0..12,
        )
    }

    /// Header and block text together reproduce the source.
    fn check_scan_is_lossless(lines: &[(String, &'static str)]) -> Result<(), TestCaseError> {
        let body: String = lines
            .iter()
            .map(|(text, ending)| format!("{text}{ending}"))
            .collect();
        let source = format!("{HEADER}ABSTRACTION\n{body}");

        let scanned = scan(&source).map_err(|err| TestCaseError::fail(err.to_string()))?;

        let header: String = scanned.header().iter().map(SourceLine::full).collect();
        let blocks: String = scanned.blocks().iter().map(RawBlock::to_text).collect();
        prop_assert_eq!(scanned.blocks().len(), 1);
        prop_assert_eq!(header + &blocks, source);
        Ok(())
    }

    proptest! {
        #[test]
        fn scan_is_lossless(lines in data_lines_strategy()) {
            check_scan_is_lossless(&lines)?;
        }
    }
}
