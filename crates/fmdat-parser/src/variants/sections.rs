//! River cross-sections and the interpolated/replicated sections derived
//! from them.

use std::ops::Range;

use fmdat_core::{element::{Element, ElementClass}, fixed::Justify, value::Value};

use crate::grammar::{
    Count, Grammar, Line, TableSpec, flag_w, float, float_dp, float_w, int, skip, text, text_w,
};

/// Column holding the `LEFT`/`RIGHT` bank deactivation markers.
pub const DEACTIVATION: &str = "deactivation";

pub static RIVER_SECTION: Grammar = Grammar {
    kind: "RIVER",
    subtype: Some("SECTION"),
    class: ElementClass::Section,
    lines: &[
        Line::Header { revision: false },
        Line::Subtype,
        Line::Labels(&["name", "spill1", "spill2", "lat1", "lat2", "lat3", "lat4"]),
        Line::Params(&[
            float("dist_to_next", 0.0),
            skip(10),
            float_dp("slope", 0.0001, 6),
            float("density", 1000.0),
        ]),
        Line::Table(TableSpec {
            key: "data",
            count: Count::OwnLine,
            columns: &[
                float("x", 0.0),
                float("y", 0.0),
                float("mannings_n", 0.0),
                flag_w("panel", "*", 1),
                float_w("rpl", 0.0, 9),
                text("marker"),
                float("easting", 0.0),
                float("northing", 0.0),
                text_w(DEACTIVATION, 10, Justify::Right),
                int("sp_marker", 0),
            ],
            dates: None,
        }),
    ],
};

pub static INTERPOLATE: Grammar = Grammar {
    kind: "INTERPOLATE",
    subtype: None,
    class: ElementClass::Section,
    lines: &[
        Line::Header { revision: false },
        Line::Labels(&["name", "first_spill", "second_spill", "lat1", "lat2", "lat3", "lat4"]),
        Line::Params(&[
            float("dist_to_next", 0.0),
            float("easting", 0.0),
            float("northing", 0.0),
        ]),
    ],
};

pub static REPLICATE: Grammar = Grammar {
    kind: "REPLICATE",
    subtype: None,
    class: ElementClass::Section,
    lines: &[
        Line::Header { revision: false },
        Line::Labels(&["name", "first_spill", "second_spill", "lat1", "lat2", "lat3", "lat4"]),
        Line::Params(&[
            float("dist_to_next", 0.0),
            float_dp("bed_level_drop", 0.0, 4),
            float("easting", 0.0),
            float("northing", 0.0),
        ]),
    ],
};

/// Returns the rows of a river section between its bank markers.
///
/// The active part of a section starts at the last row marked `LEFT` (or
/// the first row) and ends at the first row marked `RIGHT` (or the last
/// row), inclusive. Returns `None` for elements without a section table.
pub fn active_range(element: &Element) -> Option<Range<usize>> {
    let table = element.table_named("data")?;
    let markers = table.column_values(DEACTIVATION)?;
    let is_marker = |value: &Value, marker: &str| {
        value
            .as_str()
            .is_some_and(|text| text.trim().eq_ignore_ascii_case(marker))
    };
    if markers.is_empty() {
        return Some(0..0);
    }
    let left = markers
        .iter()
        .rposition(|value| is_marker(value, "LEFT"))
        .unwrap_or(0);
    let right = markers
        .iter()
        .position(|value| is_marker(value, "RIGHT"))
        .unwrap_or(markers.len() - 1);
    Some(left..right.max(left) + 1)
}
