//! Hydraulic structures: weirs, spills, orifices, bridges and sluices.

use fmdat_core::{element::ElementClass, fixed::Justify};

use crate::grammar::{
    Count, Grammar, Line, Slot, TableSpec, choice, choice_left, flag, flag_left, float, int,
    skip, text_w,
};

pub static WEIR: Grammar = Grammar {
    kind: "WEIR",
    subtype: None,
    class: ElementClass::Structure,
    lines: &[
        Line::Header { revision: false },
        Line::Labels(&["name", "ds_label"]),
        Line::Params(&[float("exponent", 1.5)]),
        Line::Params(&[
            float("weir_coefficient", 1.0),
            float("velocity_coefficient", 1.0),
            float("weir_breadth", 0.0),
            float("weir_elevation", 0.0),
            float("modular_limit", 0.7),
        ]),
    ],
};

pub static RNWEIR: Grammar = Grammar {
    kind: "RNWEIR",
    subtype: None,
    class: ElementClass::Structure,
    lines: &[
        Line::Header { revision: false },
        Line::Labels(&["name", "ds_label"]),
        Line::Params(&[
            float("weir_length", 0.0),
            float("weir_breadth", 0.0),
            float("upstream_crest_height", 0.0),
            float("downstream_crest_height", 0.0),
            float("weir_elevation", 0.0),
        ]),
        Line::Params(&[float("modular_limit", 0.7)]),
    ],
};

pub static CRUMP: Grammar = Grammar {
    kind: "CRUMP",
    subtype: None,
    class: ElementClass::Structure,
    lines: &[
        Line::Header { revision: false },
        Line::Labels(&["name", "ds_label", "us_remote_label", "ds_remote_label"]),
        Line::Params(&[
            float("calibration_coefficient", 1.0),
            float("modular_limit", 0.7),
        ]),
        Line::Params(&[float("weir_breadth", 0.0), float("crest_elevation", 0.0)]),
    ],
};

pub static FLAT_V_WEIR: Grammar = Grammar {
    kind: "FLAT-V WEIR",
    subtype: None,
    class: ElementClass::Structure,
    lines: &[
        Line::Header { revision: false },
        Line::Labels(&["name", "ds_label", "us_remote_label", "ds_remote_label"]),
        Line::Params(&[
            float("calibration_coefficient", 1.0),
            float("modular_limit", 0.7),
        ]),
        Line::Params(&[
            float("weir_breadth", 0.0),
            float("crest_elevation", 0.0),
            float("left_bank_height", 0.0),
            float("right_bank_height", 0.0),
            float("slope", 0.0),
        ]),
    ],
};

pub static SPILL: Grammar = Grammar {
    kind: "SPILL",
    subtype: None,
    class: ElementClass::Structure,
    lines: &[
        Line::Header { revision: false },
        Line::Labels(&["name", "ds_label"]),
        Line::Params(&[
            float("weir_coefficient", 1.2),
            float("modular_limit", 0.9),
        ]),
        Line::Table(TableSpec {
            key: "data",
            count: Count::OwnLine,
            columns: &[
                float("x", 0.0),
                float("y", 0.0),
                float("easting", 0.0),
                float("northing", 0.0),
            ],
            dates: None,
        }),
    ],
};

const ORIFICE_LINES: &[Line] = &[
    Line::Header { revision: false },
    Line::Subtype,
    Line::Labels(&["name", "ds_label"]),
    Line::Params(&[
        float("invert", 0.0),
        float("soffit", 0.0),
        float("bore_area", 0.0),
        float("upstream_sill", 0.0),
        float("downstream_sill", 0.0),
        choice("shape", "RECTANGLE"),
    ]),
    Line::Params(&[
        float("weir_flow", 1.0),
        float("surcharged_flow", 1.0),
        float("modular_limit", 0.7),
    ]),
];

pub static ORIFICE_OPEN: Grammar = Grammar {
    kind: "ORIFICE",
    subtype: Some("OPEN"),
    class: ElementClass::Structure,
    lines: ORIFICE_LINES,
};

pub static ORIFICE_FLAPPED: Grammar = Grammar {
    kind: "ORIFICE",
    subtype: Some("FLAPPED"),
    class: ElementClass::Structure,
    lines: ORIFICE_LINES,
};

pub static OUTFALL_OPEN: Grammar = Grammar {
    kind: "OUTFALL",
    subtype: Some("OPEN"),
    class: ElementClass::Structure,
    lines: ORIFICE_LINES,
};

pub static OUTFALL_FLAPPED: Grammar = Grammar {
    kind: "OUTFALL",
    subtype: Some("FLAPPED"),
    class: ElementClass::Structure,
    lines: ORIFICE_LINES,
};

const BRIDGE_LABELS: Line = Line::Labels(&["name", "ds_label", "us_remote_label", "ds_remote_label"]);

const BRIDGE_SECTION: TableSpec = TableSpec {
    key: "section",
    count: Count::OwnLine,
    columns: &[
        float("x", 0.0),
        float("y", 0.0),
        float("mannings_n", 0.0),
        skip(10),
        text_w("embankment", 10, Justify::Left),
    ],
    dates: None,
};

const BRIDGE_OPENING: TableSpec = TableSpec {
    key: "opening",
    count: Count::OwnLine,
    columns: &[
        float("start", 0.0),
        float("finish", 0.0),
        float("springing_level", 0.0),
        float("soffit_level", 0.0),
    ],
    dates: None,
};

/// Arch bridge with its section and arch opening tables.
pub static BRIDGE_ARCH: Grammar = Grammar {
    kind: "BRIDGE",
    subtype: Some("ARCH"),
    class: ElementClass::Structure,
    lines: &[
        Line::Header { revision: false },
        Line::Subtype,
        BRIDGE_LABELS,
        Line::Text {
            key: "friction_eq",
            fallback: "MANNING",
        },
        Line::Params(&[
            float("calibration_coefficient", 1.0),
            float("skew", 0.0),
            float("bridge_width_dual", 0.0),
            float("bridge_dist_dual", 0.0),
            skip(10),
            flag("orifice_flow", "ORIFICE"),
            float("orifice_lower_transition_dist", 0.0),
            float("orifice_upper_transition_dist", 0.0),
            float("orifice_discharge_coefficient", 1.0),
        ]),
        Line::Table(BRIDGE_SECTION),
        Line::Table(BRIDGE_OPENING),
    ],
};

/// USBPR 1978 bridge with section, opening and flood relief culvert tables.
///
/// With `npiers` at zero the pier shape column holds the soffit shape.
pub static BRIDGE_USBPR1978: Grammar = Grammar {
    kind: "BRIDGE",
    subtype: Some("USBPR1978"),
    class: ElementClass::Structure,
    lines: &[
        Line::Header { revision: false },
        Line::Subtype,
        BRIDGE_LABELS,
        Line::Text {
            key: "friction_eq",
            fallback: "MANNING",
        },
        Line::Params(&[
            float("calibration_coefficient", 1.0),
            float("skew", 0.0),
            float("bridge_width_dual", 0.0),
            float("bridge_dist_dual", 0.0),
            float("total_pier_width", 0.0),
            flag("orifice_flow", "ORIFICE"),
            float("orifice_lower_transition_dist", 0.0),
            float("orifice_upper_transition_dist", 0.0),
            float("orifice_discharge_coefficient", 1.0),
        ]),
        Line::Params(&[choice("abutment_type", "3")]),
        Line::Params(&[
            int("npiers", 0),
            choice_left("pier_shape", "FLAT"),
            choice_left("pier_faces", ""),
            float("pier_calibration_coefficient", 0.0),
        ]),
        Line::Text {
            key: "abutment_alignment",
            fallback: "ALIGNED",
        },
        Line::Table(BRIDGE_SECTION),
        Line::Table(BRIDGE_OPENING),
        Line::Table(TableSpec {
            key: "culvert",
            count: Count::OwnLine,
            columns: &[
                float("invert", 0.0),
                float("soffit", 0.0),
                float("section_area", 0.0),
                float("cd_part_full", 0.0),
                float("cd_full", 0.0),
                float("drowning_coefficient", 0.0),
            ],
            dates: None,
        }),
    ],
};

const PIERLOSS_SECTION: &[Slot] = &[
    float("x", 0.0),
    float("y", 0.0),
    float("mannings_n", 0.0),
    skip(10),
    text_w("embankment", 10, Justify::Left),
    text_w("top_level", 10, Justify::Right),
];

/// Pier loss bridge with upstream and downstream sections and pier
/// locations.
pub static BRIDGE_PIERLOSS: Grammar = Grammar {
    kind: "BRIDGE",
    subtype: Some("PIERLOSS"),
    class: ElementClass::Structure,
    lines: &[
        Line::Header { revision: false },
        Line::Subtype,
        BRIDGE_LABELS,
        Line::Text {
            key: "pier_loss_method",
            fallback: "YARNELL",
        },
        Line::Params(&[
            float("calibration_coefficient", 1.0),
            flag("orifice_flow", "ORIFICE"),
            float("orifice_discharge_coefficient", 1.0),
            float("orifice_lower_transition_dist", 0.0),
            float("orifice_upper_transition_dist", 0.0),
        ]),
        Line::Params(&[float("pier_coefficient", 0.9), float("bridge_width", 0.0)]),
        Line::Table(TableSpec {
            key: "us_section",
            count: Count::OwnLine,
            columns: PIERLOSS_SECTION,
            dates: None,
        }),
        Line::Table(TableSpec {
            key: "ds_section",
            count: Count::OwnLine,
            columns: PIERLOSS_SECTION,
            dates: None,
        }),
        Line::Table(TableSpec {
            key: "pier_locations",
            count: Count::OwnLine,
            columns: &[
                float("left_x", 0.0),
                float("left_top_level", 0.0),
                float("right_x", 0.0),
                float("right_top_level", 0.0),
            ],
            dates: None,
        }),
    ],
};

/// Vertical sluice gate. The gate operation and control lines are kept
/// verbatim.
pub static SLUICE_VERTICAL: Grammar = Grammar {
    kind: "SLUICE",
    subtype: Some("VERTICAL"),
    class: ElementClass::Structure,
    lines: &[
        Line::Header { revision: false },
        Line::Subtype,
        Line::Labels(&["name", "ds_label", "remote_label"]),
        Line::Params(&[
            float("weir_flow_coefficient", 1.0),
            float("under_gate_flow", 1.0),
            float("weir_breadth", 0.0),
            float("crest_elevation", 0.0),
            float("gate_height", 0.0),
            float("weir_length", 0.0),
        ]),
        Line::Params(&[
            float("us_weir_height", 0.0),
            float("ds_weir_height", 0.0),
            float("bias_factor", 1.0),
            float("over_gate_flow", 1.0),
            float("modular_limit_weir_flow", 0.0),
            float("modular_limit_under_gate_flow", 1.0),
            float("modular_limit_over_gate_flow", 1.0),
        ]),
        Line::Params(&[
            int("ngates", 0),
            choice_left("time_unit", "SECONDS"),
            choice_left("extend_method", "EXTEND"),
        ]),
        Line::Tail,
    ],
};

/// Radial sluice gate. The gate operation and control lines are kept
/// verbatim.
pub static SLUICE_RADIAL: Grammar = Grammar {
    kind: "SLUICE",
    subtype: Some("RADIAL"),
    class: ElementClass::Structure,
    lines: &[
        Line::Header { revision: false },
        Line::Subtype,
        Line::Labels(&["name", "ds_label", "remote_label"]),
        Line::Params(&[
            float("weir_flow_coefficient", 1.0),
            float("under_gate_flow", 1.0),
            float("weir_breadth", 0.0),
            float("crest_elevation", 0.0),
            float("gate_chord", 0.0),
            float("weir_length", 0.0),
            flag_left("use_degrees", "DEGREES"),
            flag_left("allow_free_flow_under", "FREESLUICE"),
        ]),
        Line::Params(&[
            float("us_weir_height", 0.0),
            float("ds_weir_height", 0.0),
            float("bias_factor", 1.0),
            float("over_gate_flow", 1.0),
            float("pivot_height", 0.7),
            float("gate_radius", 0.7),
        ]),
        Line::Params(&[
            int("ngates", 0),
            float("modular_limit_weir_flow", 0.0),
            float("modular_limit_under_gate_flow", 1.0),
            float("modular_limit_over_gate_flow", 1.0),
            choice_left("time_unit", "SECONDS"),
            choice_left("extend_method", "EXTEND"),
        ]),
        Line::Tail,
    ],
};

#[cfg(test)]
mod tests {
    use fmdat_core::{element::Element, value::Value};

    use super::*;
    use crate::{registry::ParseContext, scanner::scan};

    const HEADER: &str = "Model\n#REVISION#1\n         1     0.750     0.900     0.100     0.001        12SI\n    10.000     0.010     0.010     0.700     0.100     0.700     0.000\nRAD FILE\n\nEND GENERAL\n";

    fn parse(grammar: &Grammar, body: &str) -> Element {
        let source = format!("{HEADER}{body}");
        let scanned = scan(&source).unwrap();
        grammar
            .parse(&scanned.blocks()[0], &ParseContext::default())
            .unwrap()
    }

    fn round_trip(grammar: &Grammar, body: &str) {
        let element = parse(grammar, body);
        assert_eq!(grammar.write(&element, 12).join("\n") + "\n", body);
    }

    #[test]
    fn test_weir_fields() {
        let element = parse(
            &WEIR,
            "WEIR\nS4          S5\n     1.500\n     1.000     1.000     5.000    21.000     0.700\n",
        );

        assert_eq!(element.field("weir_elevation"), Some(&Value::Float(21.0)));
        assert_eq!(element.label("ds_label"), Some("S5"));
    }

    #[test]
    fn test_spill_round_trip() {
        round_trip(
            &SPILL,
            "SPILL bank\nSP1         SP1_DS\n     1.200     0.900\n         2\n     0.000    15.000     0.000     0.000\n    20.000    15.200     0.000     0.000\n",
        );
    }

    #[test]
    fn test_orifice_subtypes_share_layout() {
        let body = "ORIFICE\nFLAPPED\nO1          O2\n     5.000     6.000     1.000     5.000     5.000 RECTANGLE\n     1.000     1.000     0.700\n";
        let element = parse(&ORIFICE_FLAPPED, body);

        assert_eq!(element.subtype().map(|s| s.to_string()), Some("FLAPPED".to_string()));
        assert_eq!(element.field("shape"), Some(&Value::Choice("RECTANGLE".to_string())));
        round_trip(&ORIFICE_FLAPPED, body);
    }

    #[test]
    fn test_bridge_arch_two_tables() {
        let body = "BRIDGE\nARCH\nB1          B2\nMANNING\n     1.000     0.000     0.000     0.000             ORIFICE     0.000     0.000     1.000\n         2\n     0.000    10.000     0.030          L\n    10.000    10.000     0.030\n         1\n     1.000     9.000    11.000    12.000\n";
        let element = parse(&BRIDGE_ARCH, body);

        assert_eq!(element.field("orifice_flow"), Some(&Value::Flag(true)));
        assert_eq!(element.table_named("section").unwrap().len(), 2);
        assert_eq!(element.table_named("opening").unwrap().len(), 1);
        assert_eq!(
            element.table_named("section").unwrap().rows()[0][3],
            Value::Text("L".to_string())
        );
        round_trip(&BRIDGE_ARCH, body);
    }

    #[test]
    fn test_bridge_arch_short_opening_table() {
        let body = "BRIDGE\nARCH\nB1\nMANNING\n     1.000\n         0\n         2\n     1.000     9.000    11.000    12.000\n";
        let source = format!("{HEADER}{body}");
        let scanned = scan(&source).unwrap();

        let err = BRIDGE_ARCH
            .parse(&scanned.blocks()[0], &ParseContext::default())
            .unwrap_err();

        assert_eq!(err.code(), Some(crate::error::ErrorCode::E200));
    }

    #[test]
    fn test_bridge_usbpr_three_tables() {
        let body = "BRIDGE\nUSBPR1978\nB1          B2\nMANNING\n     1.000     0.000     0.000     0.000     1.200               0.000     0.000     1.000\n         3\n         2COEF                     0.900\nALIGNED\n         2\n     0.000    10.000     0.030          L\n    10.000    10.000     0.030          R\n         1\n     1.000     9.000    11.000    12.000\n         1\n     8.000     9.000     1.500     0.600     0.800     0.500\n";
        let element = parse(&BRIDGE_USBPR1978, body);

        assert_eq!(element.field("total_pier_width"), Some(&Value::Float(1.2)));
        assert_eq!(element.field("orifice_flow"), Some(&Value::Flag(false)));
        assert_eq!(element.field("npiers"), Some(&Value::Int(2)));
        assert_eq!(element.field("pier_shape"), Some(&Value::Choice("COEF".to_string())));
        assert_eq!(element.field("pier_calibration_coefficient"), Some(&Value::Float(0.9)));
        assert_eq!(element.field("abutment_alignment"), Some(&Value::from("ALIGNED")));
        assert_eq!(element.table_named("culvert").unwrap().rows()[0][2], Value::Float(1.5));
        round_trip(&BRIDGE_USBPR1978, body);
    }

    #[test]
    fn test_bridge_usbpr_without_piers_keeps_soffit_shape() {
        let body = "BRIDGE\nUSBPR1978\nB1\nMANNING\n     1.000\n         1\n         0ARCH\nSKEW\n         0\n         0\n         0\n";
        let element = parse(&BRIDGE_USBPR1978, body);

        assert_eq!(element.field("npiers"), Some(&Value::Int(0)));
        assert_eq!(element.field("pier_shape"), Some(&Value::Choice("ARCH".to_string())));
        assert_eq!(
            BRIDGE_USBPR1978.write(&element, 12)[6],
            "         0ARCH                     0.000"
        );
    }

    #[test]
    fn test_bridge_pierloss_sections_and_piers() {
        let body = "BRIDGE\nPIERLOSS\nP1          P2\nYARNELL\n     1.000   ORIFICE     1.000     0.100     0.200\n     0.900     6.000\n         2\n     0.000    10.000     0.030          L             12.000\n    10.000    10.000     0.030\n         1\n     0.000    10.000     0.030\n         1\n     4.000    11.000     5.000    11.000\n";
        let element = parse(&BRIDGE_PIERLOSS, body);

        assert_eq!(element.field("orifice_flow"), Some(&Value::Flag(true)));
        assert_eq!(element.field("orifice_lower_transition_dist"), Some(&Value::Float(0.1)));
        assert_eq!(element.field("bridge_width"), Some(&Value::Float(6.0)));
        let upstream = element.table_named("us_section").unwrap();
        assert_eq!(upstream.rows()[0][4], Value::from("12.000"));
        assert_eq!(upstream.rows()[1][4], Value::from(""));
        assert_eq!(element.table_named("pier_locations").unwrap().len(), 1);
        round_trip(&BRIDGE_PIERLOSS, body);
    }

    #[test]
    fn test_sluice_radial_flags_and_tail() {
        let body = "SLUICE\nRADIAL\nG1          G2\n     1.000     1.000     4.000    10.000     1.500     2.000DEGREES   FREESLUICE\n     0.000     0.000     1.000     1.000     0.700     0.700\n         1     0.000     1.000     1.000SECONDS   EXTEND\nTIME\n         2\n     0.000     0.500\n    10.000     1.000\n";
        let element = parse(&SLUICE_RADIAL, body);

        assert_eq!(element.field("use_degrees"), Some(&Value::Flag(true)));
        assert_eq!(element.field("allow_free_flow_under"), Some(&Value::Flag(true)));
        assert_eq!(element.field("ngates"), Some(&Value::Int(1)));
        assert_eq!(element.raw_lines().len(), 4);
        round_trip(&SLUICE_RADIAL, body);
    }
}
