//! Head-loss units: culvert inlets and outlets, and time-varying blockages.

use fmdat_core::{element::ElementClass, fixed::Justify};

use crate::grammar::{
    Count, Dates, Grammar, Line, Slot, TableSpec, choice, float, float_dp, text_w,
};

const CULVERT_LABELS: Line = Line::Labels(&["name", "ds_label", "us_remote_label", "ds_remote_label"]);

pub static CULVERT_INLET: Grammar = Grammar {
    kind: "CULVERT",
    subtype: Some("INLET"),
    class: ElementClass::Loss,
    lines: &[
        Line::Header { revision: false },
        Line::Subtype,
        CULVERT_LABELS,
        Line::Params(&[
            float_dp("k", 0.0, 4),
            float_dp("m", 0.0, 4),
            float_dp("c", 0.0, 4),
            float_dp("y", 0.0, 4),
            float_dp("ki", 0.0, 4),
            choice("type_code", "A"),
        ]),
        Line::Params(&[
            float("screen_width", 0.0),
            float("bar_proportion", 0.0),
            float("debris_proportion", 0.0),
            float("loss_coefficient", 0.0),
            choice("reverse_flow_mode", "CALCULATED"),
            choice("headloss_type", "TOTAL"),
            float("max_screen_height", 0.0),
        ]),
    ],
};

pub static CULVERT_OUTLET: Grammar = Grammar {
    kind: "CULVERT",
    subtype: Some("OUTLET"),
    class: ElementClass::Loss,
    lines: &[
        Line::Header { revision: false },
        Line::Subtype,
        CULVERT_LABELS,
        Line::Params(&[
            float("loss_coefficient", 1.0),
            choice("reverse_flow_mode", "CALCULATED"),
            choice("headloss_type", "TOTAL"),
        ]),
    ],
};

pub static BLOCKAGE: Grammar = Grammar {
    kind: "BLOCKAGE",
    subtype: None,
    class: ElementClass::Loss,
    lines: &[
        Line::Header { revision: true },
        Line::Labels(&["name", "ds_label", "us_reference_label", "ds_reference_label", "constriction_label"]),
        Line::Params(&[float("inlet_loss", 1.5), float("outlet_loss", 1.0)]),
        Line::Params(&[
            Slot::Count,
            float("time_offset", 0.0),
            choice("time_unit", "HOURS"),
            choice("extend_method", "NOEXTEND"),
        ]),
        Line::Table(TableSpec {
            key: "data",
            count: Count::Declared,
            columns: &[float("time", 0.0), float("blockage", 0.0)],
            dates: Some(Dates {
                field: "time_unit",
                columns: &[text_w("time", 20, Justify::Left), float("blockage", 0.0)],
            }),
        }),
    ],
};
