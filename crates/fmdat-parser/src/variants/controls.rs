//! Storage controls.
//!
//! A reservoir written with a `#revision#` tag carries a lateral inflow
//! label line before its table and a reference point line after it. Older
//! files have neither, so [`Reservoir`] picks the layout from the header.

use fmdat_core::element::{Element, ElementClass};

use crate::{
    error::Result,
    grammar::{Count, Grammar, Line, REVISION, TableSpec, float, float_left, header_revision, label},
    registry::{ParseContext, UnitVariant},
    scanner::RawBlock,
};

/// Table holding every reservoir label after the first.
pub const RESERVOIR_LABELS: &str = "labels";

const STORAGE: TableSpec = TableSpec {
    key: "data",
    count: Count::OwnLine,
    columns: &[float_left("elevation", 0.0), float_left("plan_area", 0.0)],
    dates: None,
};

static REVISED: Grammar = Grammar {
    kind: "RESERVOIR",
    subtype: None,
    class: ElementClass::Control,
    lines: &[
        Line::Header { revision: true },
        Line::LabelList { key: RESERVOIR_LABELS },
        Line::Params(&[
            label("lateral_inflow_1"),
            label("lateral_inflow_2"),
            label("lateral_inflow_3"),
            label("lateral_inflow_4"),
        ]),
        Line::Table(STORAGE),
        Line::Params(&[float("easting", 0.0), float("northing", 0.0), float("runoff_factor", 0.0)]),
    ],
};

static LEGACY: Grammar = Grammar {
    kind: "RESERVOIR",
    subtype: None,
    class: ElementClass::Control,
    lines: &[
        Line::Header { revision: false },
        Line::LabelList { key: RESERVOIR_LABELS },
        Line::Table(STORAGE),
    ],
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Reservoir;

impl UnitVariant for Reservoir {
    fn kind(&self) -> &'static str {
        "RESERVOIR"
    }

    fn subtype(&self) -> Option<&'static str> {
        None
    }

    fn class(&self) -> ElementClass {
        ElementClass::Control
    }

    fn parse(&self, block: &RawBlock<'_>, ctx: &ParseContext) -> Result<Element> {
        let revised = block
            .lines()
            .first()
            .and_then(|line| header_revision(line.text(), self.kind()))
            .is_some();
        if revised {
            REVISED.parse(block, ctx)
        } else {
            LEGACY.parse(block, ctx)
        }
    }

    fn write(&self, element: &Element, label_length: usize) -> Vec<String> {
        if element.field(REVISION).is_some() {
            REVISED.write(element, label_length)
        } else {
            LEGACY.write(element, label_length)
        }
    }

    fn create(&self, name: &str) -> Element {
        REVISED.create(name)
    }
}

#[cfg(test)]
mod tests {
    use fmdat_core::value::Value;

    use super::*;
    use crate::scanner::scan;

    const HEADER: &str = "Model\n#REVISION#1\n         1     0.750     0.900     0.100     0.001        12SI\n    10.000     0.010     0.010     0.700     0.100     0.700     0.000\nRAD FILE\n\nEND GENERAL\n";

    fn parse(body: &str) -> Element {
        let source = format!("{HEADER}{body}");
        let scanned = scan(&source).unwrap();
        Reservoir.parse(&scanned.blocks()[0], &ParseContext::default()).unwrap()
    }

    #[test]
    fn test_revised_reservoir() {
        let body = "RESERVOIR #revision#1 pond\nRES1        IN1\nLAT1        LAT2\n         2\n5.000     100.000\n6.000     250.000\n   412.500   318.000     0.500\n";
        let element = parse(body);

        assert_eq!(element.name(), "RES1");
        assert_eq!(element.field("lateral_inflow_2"), Some(&Value::from("LAT2")));
        assert_eq!(element.field("easting"), Some(&Value::Float(412.5)));
        let storage = element.table_named("data").unwrap();
        assert_eq!(storage.rows()[1], [Value::Float(6.0), Value::Float(250.0)]);
        assert_eq!(Reservoir.write(&element, 12).join("\n") + "\n", body);
    }

    #[test]
    fn test_legacy_reservoir_has_no_extra_lines() {
        let body = "RESERVOIR\nRES1\n         1\n5.000     100.000\n";
        let element = parse(body);

        assert_eq!(element.field(REVISION), None);
        assert_eq!(element.field("easting"), None);
        assert_eq!(element.table_named("data").unwrap().len(), 1);
        assert_eq!(Reservoir.write(&element, 12).join("\n") + "\n", body);
    }

    #[test]
    fn test_revised_reservoir_needs_reference_line() {
        let source = format!("{HEADER}RESERVOIR #revision#1\nRES1\n\n         0\n");
        let scanned = scan(&source).unwrap();

        let err = Reservoir.parse(&scanned.blocks()[0], &ParseContext::default()).unwrap_err();

        assert_eq!(err.code(), Some(crate::error::ErrorCode::E201));
    }

    #[test]
    fn test_create_uses_revised_layout() {
        let element = Reservoir.create("R9");

        assert_eq!(element.field(REVISION), Some(&Value::Int(1)));
        assert_eq!(
            Reservoir.write(&element, 12),
            ["RESERVOIR #revision#1", "R9", "", "         0", "     0.000     0.000     0.000"]
        );
    }
}
