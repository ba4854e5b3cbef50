//! Connectors: junctions joining reaches and lateral inflow distributors.

use fmdat_core::element::ElementClass;

use crate::grammar::{Grammar, Line, int};

/// Table holding every junction label after the first.
pub const JUNCTION_LABELS: &str = "labels";

const JUNCTION_LINES: &[Line] = &[
    Line::Header { revision: false },
    Line::Subtype,
    Line::LabelList { key: JUNCTION_LABELS },
];

pub static JUNCTION_OPEN: Grammar = Grammar {
    kind: "JUNCTION",
    subtype: Some("OPEN"),
    class: ElementClass::Connector,
    lines: JUNCTION_LINES,
};

pub static JUNCTION_ENERGY: Grammar = Grammar {
    kind: "JUNCTION",
    subtype: Some("ENERGY"),
    class: ElementClass::Connector,
    lines: JUNCTION_LINES,
};

/// Lateral inflow: the unit rows after the count line stay verbatim.
pub static LATERAL: Grammar = Grammar {
    kind: "LATERAL",
    subtype: None,
    class: ElementClass::Connector,
    lines: &[
        Line::Header { revision: true },
        Line::Labels(&["name"]),
        Line::Text {
            key: "weight_factor",
            fallback: "",
        },
        Line::Params(&[int("unit_count", 0)]),
        Line::Tail,
    ],
};
