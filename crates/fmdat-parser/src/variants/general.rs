//! General-purpose blocks: comments, logical rule variables and initial
//! conditions.

use fmdat_core::{
    element::{Content, Element, ElementClass},
    field::Fields,
    fixed::{self, COLUMN_WIDTH, Justify},
    keyword::Keyword,
    value::Value,
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    grammar::{Count, Grammar, Line, TableSpec, float, label, text, text_w},
    registry::{ParseContext, UnitVariant},
    scanner::RawBlock,
    vocabulary::END_VARIABLES,
};

/// Field holding the text of a comment block, lines joined with `\n`.
pub const COMMENT_TEXT: &str = "text";

/// Column of the initial conditions table holding unit labels.
pub const CONDITIONS_LABEL: &str = "label";

/// Free-text comment block: a line count followed by that many lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct Comment;

impl UnitVariant for Comment {
    fn kind(&self) -> &'static str {
        "COMMENT"
    }

    fn subtype(&self) -> Option<&'static str> {
        None
    }

    fn class(&self) -> ElementClass {
        ElementClass::Comment
    }

    fn parse(&self, block: &RawBlock<'_>, _ctx: &ParseContext) -> Result<Element> {
        let lines = block.lines();
        let header = lines.first().map(|line| line.text()).unwrap_or_default();
        let comment = header
            .get(self.kind().len()..)
            .unwrap_or_default()
            .trim()
            .to_string();
        if lines.len() < 2 {
            return Err(Diagnostic::error(format!(
                "block #{} (COMMENT): missing line count",
                block.index()
            ))
            .with_code(ErrorCode::E201)
            .with_label(block.span(), "block ends here"));
        }
        let text: Vec<&str> = lines[2..].iter().map(|line| line.text()).collect();
        let fields = Fields::new().with(COMMENT_TEXT, Value::Text(text.join("\n")));
        Ok(Element::new(
            block.kind(),
            None,
            ElementClass::Comment,
            Content::new("").with_comment(comment).with_fields(fields),
        ))
    }

    fn write(&self, element: &Element, _label_length: usize) -> Vec<String> {
        let mut header = self.kind().to_string();
        if !element.comment().is_empty() {
            header.push(' ');
            header.push_str(element.comment());
        }
        let text = element
            .field(COMMENT_TEXT)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let body: Vec<String> = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        let mut out = vec![header, fixed::fit(&body.len().to_string(), COLUMN_WIDTH, Justify::Right)];
        out.extend(body);
        out
    }

    fn create(&self, name: &str) -> Element {
        let fields = Fields::new().with(COMMENT_TEXT, Value::Text(String::new()));
        Element::new(
            Keyword::new(self.kind()),
            None,
            ElementClass::Comment,
            Content::new(name).with_fields(fields),
        )
    }
}

/// Logical rule variables, closed by `END VARIABLES`.
pub static VARIABLES: Grammar = Grammar {
    kind: "VARIABLES",
    subtype: None,
    class: ElementClass::Rule,
    lines: &[
        Line::Header { revision: false },
        Line::Table(TableSpec {
            key: "data",
            count: Count::Until(END_VARIABLES),
            columns: &[
                text_w("name", 20, Justify::Left),
                text("type"),
                text("initial_value"),
                text("initial_status"),
            ],
            dates: None,
        }),
        Line::Literal(END_VARIABLES),
    ],
};

/// Default column header line of an initial conditions block.
pub const CONDITIONS_COLUMNS: &str =
    " label   ?      flow     stage froude no  velocity     umode    ustate         z";

pub static INITIAL_CONDITIONS: Grammar = Grammar {
    kind: "INITIAL CONDITIONS",
    subtype: None,
    class: ElementClass::Conditions,
    lines: &[
        Line::Header { revision: false },
        Line::Text {
            key: "columns",
            fallback: CONDITIONS_COLUMNS,
        },
        Line::Table(TableSpec {
            key: "data",
            count: Count::Remaining,
            columns: &[
                label(CONDITIONS_LABEL),
                text_w("included", 2, Justify::Right),
                float("flow", 0.0),
                float("stage", 0.0),
                float("froude_no", 0.0),
                float("velocity", 0.0),
                float("umode", 0.0),
                float("ustate", 0.0),
                float("z", 0.0),
            ],
            dates: None,
        }),
    ],
};
