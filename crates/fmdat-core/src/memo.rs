//! Source line recall for re-rendered blocks.
//!
//! When a parsed block is edited it is written again from its fields. Lines
//! whose canonical rendering did not change should still come out exactly
//! as they were read. A [`LineMemo`] pairs every source line with its
//! canonical rendering, in source order, and matches a fresh rendering
//! against those pairs by position.

/// Canonical renderings of a block's source lines, paired with the lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMemo {
    entries: Vec<(String, String)>,
}

impl LineMemo {
    /// Pairs canonical lines with source lines.
    ///
    /// The memo stays empty unless both sides have the same number of
    /// lines, since the pairing is positional.
    pub fn new(canonical: Vec<String>, source: Vec<String>) -> Self {
        if canonical.len() != source.len() {
            return Self::default();
        }
        Self {
            entries: canonical.into_iter().zip(source).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the source line for each rendered line.
    ///
    /// Matching walks both sides in order: a rendered line is paired with
    /// the source line at the same index when their canonical forms agree,
    /// and otherwise with the next unused source line after the last match
    /// that has the same canonical form. Each source line is used at most
    /// once, so repeated rows keep their own text and rows shifted by an
    /// insertion or removal still find their originals.
    pub fn recall<'a>(&'a self, rendered: &[String]) -> Vec<Option<&'a str>> {
        let mut cursor = 0;
        let mut out = Vec::with_capacity(rendered.len());
        for (index, line) in rendered.iter().enumerate() {
            let same_position = self
                .entries
                .get(index)
                .filter(|(canonical, _)| index >= cursor && canonical == line)
                .map(|_| index);
            let found = same_position.or_else(|| {
                self.entries
                    .get(cursor..)
                    .and_then(|rest| rest.iter().position(|(canonical, _)| canonical == line))
                    .map(|offset| cursor + offset)
            });
            out.push(found.map(|at| {
                cursor = at + 1;
                self.entries[at].1.as_str()
            }));
        }
        out
    }
}
