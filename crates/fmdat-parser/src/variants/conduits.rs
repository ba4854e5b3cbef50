//! Closed conduits.

use fmdat_core::element::ElementClass;

use crate::grammar::{Grammar, Line, choice, float, float_dp};

pub static CONDUIT_CIRCULAR: Grammar = Grammar {
    kind: "CONDUIT",
    subtype: Some("CIRCULAR"),
    class: ElementClass::Conduit,
    lines: &[
        Line::Header { revision: false },
        Line::Subtype,
        Line::Labels(&["name", "spill"]),
        Line::Params(&[float("dist_to_next", 0.0)]),
        Line::Text {
            key: "friction_eq",
            fallback: "MANNING",
        },
        Line::Params(&[
            float("invert", 0.0),
            float("diameter", 0.0),
            choice("use_bottom_slot", "GLOBAL"),
            float("bottom_slot_dist", 0.0),
            float("bottom_slot_depth", 0.0),
            choice("use_top_slot", "GLOBAL"),
            float("top_slot_dist", 0.0),
            float("top_slot_depth", 0.0),
        ]),
        Line::Params(&[
            float_dp("friction_below_axis", 0.0, 4),
            float_dp("friction_above_axis", 0.0, 4),
        ]),
    ],
};

pub static CONDUIT_RECTANGULAR: Grammar = Grammar {
    kind: "CONDUIT",
    subtype: Some("RECTANGULAR"),
    class: ElementClass::Conduit,
    lines: &[
        Line::Header { revision: false },
        Line::Subtype,
        Line::Labels(&["name", "spill"]),
        Line::Params(&[float("dist_to_next", 0.0)]),
        Line::Text {
            key: "friction_eq",
            fallback: "MANNING",
        },
        Line::Params(&[
            float("invert", 0.0),
            float("width", 0.0),
            float("height", 0.0),
            choice("use_bottom_slot", "GLOBAL"),
            float("bottom_slot_dist", 0.0),
            float("bottom_slot_depth", 0.0),
            choice("use_top_slot", "GLOBAL"),
            float("top_slot_dist", 0.0),
            float("top_slot_depth", 0.0),
        ]),
        Line::Params(&[
            float_dp("friction_on_invert", 0.0, 4),
            float_dp("friction_on_walls", 0.0, 4),
            float_dp("friction_on_soffit", 0.0, 4),
        ]),
    ],
};
