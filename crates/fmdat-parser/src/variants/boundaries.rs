//! Boundary units: flow-time, stage-time and flow-stage hydrographs, and
//! the ReFH rainfall-runoff boundary.

use fmdat_core::element::ElementClass;

use crate::grammar::{
    Count, Dates, Grammar, Line, Slot, TableSpec, choice, choice_left, datetime, float, float_dp,
    int, text,
};

pub static QTBDY: Grammar = Grammar {
    kind: "QTBDY",
    subtype: None,
    class: ElementClass::Boundary,
    lines: &[
        Line::Header { revision: false },
        Line::Labels(&["name"]),
        Line::Params(&[
            Slot::Count,
            float("time_offset", 0.0),
            float("reserved", 0.0),
            choice("time_unit", "HOURS"),
            choice("extend_method", "EXTEND"),
            choice("interp_method", "LINEAR"),
            float("flow_multiplier", 0.0),
            float("min_flow", 0.0),
            choice("allow_override", "OVERRIDE"),
        ]),
        Line::Table(TableSpec {
            key: "data",
            count: Count::Declared,
            columns: &[float("flow", 0.0), float("time", 0.0)],
            dates: Some(Dates {
                field: "time_unit",
                columns: &[float("flow", 0.0), datetime("time")],
            }),
        }),
    ],
};

pub static HTBDY: Grammar = Grammar {
    kind: "HTBDY",
    subtype: None,
    class: ElementClass::Boundary,
    lines: &[
        Line::Header { revision: false },
        Line::Labels(&["name"]),
        Line::Params(&[
            Slot::Count,
            text("reserved"),
            choice("time_unit", "HOURS"),
            choice("extend_method", "EXTEND"),
            choice("interp_method", "LINEAR"),
        ]),
        Line::Table(TableSpec {
            key: "data",
            count: Count::Declared,
            columns: &[float("stage", 0.0), float("time", 0.0)],
            dates: Some(Dates {
                field: "time_unit",
                columns: &[float("stage", 0.0), datetime("time")],
            }),
        }),
    ],
};

pub static QHBDY: Grammar = Grammar {
    kind: "QHBDY",
    subtype: None,
    class: ElementClass::Boundary,
    lines: &[
        Line::Header { revision: false },
        Line::Labels(&["name"]),
        Line::Params(&[
            Slot::Count,
            float("reserved", 0.0),
            choice("interp_method", "LINEAR"),
        ]),
        Line::Table(TableSpec {
            key: "data",
            count: Count::Declared,
            columns: &[float("flow", 0.0), float("stage", 0.0)],
            dates: None,
        }),
    ],
};

/// ReFH boundary: catchment and storm options are modelled; the rainfall
/// and loss parameter lines that follow are kept verbatim.
pub static REFHBDY: Grammar = Grammar {
    kind: "REFHBDY",
    subtype: None,
    class: ElementClass::Boundary,
    lines: &[
        Line::Header { revision: true },
        Line::Labels(&["name"]),
        Line::Params(&[float("reserved", 0.0), int("easting", 0), int("northing", 0)]),
        Line::Params(&[
            float("time_delay", 0.0),
            float("timestep", 0.0),
            choice("sim_type", ""),
            choice_left("scale_method", "SCALEFACT"),
            float("scale_value", 1.0),
            choice_left("boundary_type", "HYDROGRAPH"),
            choice("scale_type", "FULL"),
            float("min_flow", 0.0),
            choice("allow_override", ""),
        ]),
        Line::Params(&[
            float("area", 0.0),
            float("saar", 0.0),
            float_dp("urbext", 0.0, 4),
            choice("season", "DEFAULT"),
            choice("calc_source", "DLL"),
            choice("urban", ""),
        ]),
        Line::Tail,
    ],
};
