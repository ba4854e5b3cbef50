use fmdat::{
    Difference, FmdatError, Group, Network, NetworkReader, Position,
    element::{Category, ElementClass},
    interchange::NetworkRecord,
    value::Value,
};

const HEADER: &str = "Sample network\n#REVISION#1\n         3     0.750     0.900     0.100     0.001        12SI\n    10.000     0.010     0.010     0.700     0.100     0.700     0.000\nRAD FILE\n\nEND GENERAL\n";

const BOUNDARY: &str = "QTBDY\nUPSTREAM\n         2     0.000     0.000     HOURS    EXTEND    LINEAR     0.000     0.000  OVERRIDE\n    10.000     0.000\n    12.000     1.000\n";

const SECTION: &str = "RIVER upstream\nSECTION\nS3\n   150.000            0.000100  1000.000\n         2\n     0.000    12.000     0.035     1.000               0.000     0.000      LEFT         0\n    15.000    12.500     0.035     1.000               0.000     0.000     RIGHT         0\n";

const WEIR: &str = "WEIR\nS4          S5\n     1.500\n     1.000     1.000     5.000    21.000     0.700\n";

const TAIL: &str = "ABSTRACTION\nA1\n  kept as is\nGISINFO\nRIVER SECTION S3 0 0 0 0\n";

fn source() -> String {
    format!("{HEADER}{BOUNDARY}{SECTION}{WEIR}{TAIL}")
}

fn network() -> Network {
    Network::parse(&source()).expect("Failed to parse")
}

#[test]
fn test_unedited_network_writes_source() {
    assert_eq!(network().write(), source());
}

#[test]
fn test_reparse_is_equal() {
    let mut network = network();
    network
        .get_mut(Category::Sections, "S3")
        .unwrap()
        .set_field("dist_to_next", 175.5)
        .unwrap();

    let reparsed = Network::parse(&network.write()).unwrap();

    assert_eq!(reparsed, network);
    assert_eq!(
        reparsed.get(Category::Sections, "S3").unwrap().field("dist_to_next"),
        Some(&Value::Float(175.5))
    );
}

#[test]
fn test_remove_section_keeps_reach_walk() {
    let mut network = network();
    let boundary = network.find(Category::Boundaries, "UPSTREAM").unwrap();
    let section = network.find(Category::Sections, "S3").unwrap();
    let after_section = network.next(section).unwrap();
    let weir_before = network.get(Category::Structures, "S4").unwrap().clone();

    network.remove(section).unwrap();

    assert_eq!(network.next(boundary).unwrap(), after_section);
    assert_eq!(network.get(Category::Structures, "S4").unwrap(), &weir_before);
    assert!(matches!(
        network.get(Category::Sections, "S3"),
        Err(FmdatError::NotFound(_))
    ));
}

#[test]
fn test_remove_then_insert_restores_network() {
    let original = network();
    let mut network = original.clone();
    let section = network.find(Category::Sections, "S3").unwrap();
    let weir = network.find(Category::Structures, "S4").unwrap();

    let removed = network.remove(section).unwrap();
    network.insert(removed, Position::Before(weir)).unwrap();

    assert_eq!(network, original);
    assert_eq!(network.write(), source());
}

#[test]
fn test_names_stay_unique_per_category() {
    let mut network = network();
    let weir = network.get(Category::Structures, "S4").unwrap().clone();

    let err = network.insert(weir, Position::End).unwrap_err();

    assert!(matches!(
        err,
        FmdatError::NameCollision { category: Category::Structures, .. }
    ));
    assert_eq!(network.write(), source());
}

#[test]
fn test_same_name_in_other_category_is_allowed() {
    let mut network = network();
    let weir = network.create("WEIR", None, "S3").unwrap();

    network.insert(weir, Position::End).unwrap();

    assert_eq!(network.get(Category::Structures, "S3").unwrap().class(), ElementClass::Structure);
    assert_eq!(network.get(Category::Sections, "S3").unwrap().class(), ElementClass::Section);
}

#[test]
fn test_weir_elevation_single_difference() {
    let left = network();
    let mut right = left.clone();
    right
        .get_mut(Category::Structures, "S4")
        .unwrap()
        .set_field("weir_elevation", 21.05)
        .unwrap();

    let differences = fmdat::diff::diff(&left, &right);

    assert_eq!(
        differences,
        [Difference::Changed {
            group: Group::Category(Category::Structures),
            name: "S4".to_string(),
            field: "weir_elevation".to_string(),
            left: Some(Value::Float(21.0)),
            right: Some(Value::Float(21.05)),
        }]
    );
    assert!(!fmdat::diff::equal(&left, &right));
    assert_eq!(
        fmdat::diff::diff(&right, &left),
        differences.into_iter().map(Difference::reversed).collect::<Vec<_>>()
    );
}

#[test]
fn test_unsupported_blocks_pass_through_edits() {
    let mut network = network();
    network
        .get_mut(Category::Structures, "S4")
        .unwrap()
        .set_field("modular_limit", 0.8)
        .unwrap();

    let written = network.write();

    assert!(written.ends_with(TAIL));
    assert!(written.contains("     0.800\n"));
    assert_eq!(network.unsupported().count(), 2);
}

#[test]
fn test_downstream_follows_label() {
    let mut network = network();
    let weir = network.find(Category::Structures, "S4").unwrap();
    assert!(network.downstream(weir).is_err());

    let target = network.create("RIVER", Some("SECTION"), "S5").unwrap();
    let target = network.insert(target, Position::After(weir)).unwrap();

    assert_eq!(network.downstream(weir).unwrap(), target);
}

#[test]
fn test_json_interchange_round_trip() {
    let network = network();

    let json = network.to_interchange().to_json().unwrap();
    let rebuilt = Network::from_interchange(NetworkRecord::from_json(&json).unwrap()).unwrap();

    assert!(fmdat::diff::diff(&network, &rebuilt).is_empty());
}

#[test]
fn test_parse_error_keeps_source() {
    let broken = source().replace("         2\n     0.000    12.000", "         3\n     0.000    12.000");

    let err = Network::parse(&broken).unwrap_err();

    let FmdatError::Parse { err, src } = err else {
        panic!("expected a parse error, got {err:?}");
    };
    assert_eq!(src, broken);
    assert!(!err.diagnostics().is_empty());
}

#[test]
fn test_open_rename_save_updates_gxy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.dat");
    std::fs::write(&path, source()).unwrap();
    std::fs::write(dir.path().join("model.gxy"), "[RIVER_SECTION_S3]\nx=1.0\n").unwrap();

    let mut file = NetworkReader::default().open(&path).unwrap();
    let section = file.network.find(Category::Sections, "S3").unwrap();
    file.network.rename(section, "S3A").unwrap();
    file.save().unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("model.gxy")).unwrap(),
        "[RIVER_SECTION_S3A]\nx=1.0\n"
    );
}

#[test]
fn test_junction_reached_by_class() {
    let source = format!("{HEADER}{WEIR}JUNCTION\nOPEN\nJ1          S4          S5\n");
    let network = Network::parse(&source).unwrap();

    let junctions: Vec<_> = network.by_class(ElementClass::Connector).map(|(_, element)| element.name()).collect();

    assert_eq!(junctions, ["J1"]);
    assert!(Category::ALL.iter().all(|category| network.find(*category, "J1").is_none()));
    assert_eq!(network.write(), source);
}
