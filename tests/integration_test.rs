/// End-to-end integration tests for the archetl pipeline.
///
/// Tests the complete flow:
///   Config → Mappings file → CSV source → RowMapper → Sink
use std::collections::HashMap;
use std::fs;

use archetl::config::Config;
use archetl::mapping::{ETLValue, Mapping, Mappings, NodePath, Reference, RowMapper};
use archetl::pipeline::{self, Pipeline};
use archetl::sink::{CsvSink, JsonLinesSink};
use archetl::source::{self, ReadOptions};
use tempfile::tempdir;

const MAPPINGS_YAML: &str = r#"
idColumn: LEGACY_ID
mappings:
  - source: FIRST_NAME
    target: <party.customerperson>firstName
  - source: LAST_NAME
    target: <party.customerperson>lastName
  - source: ADDRESS
    target: <party.customerperson>contacts[0]<contact.location>address
  - source: SUBURB
    target: <party.customerperson>contacts[0]<contact.location>suburb
  - source: PHONE
    target: <party.customerperson>contacts[1]<contact.phoneNumber>telephoneNumber
    excludeNull: true
  - source: ACCOUNT_TYPE
    target: <party.customerperson>type[0]
    value: <lookup.customerAccountType>code=$value
    isReference: true
"#;

const CUSTOMERS_CSV: &str = "\
LEGACY_ID,FIRST_NAME,LAST_NAME,ADDRESS,SUBURB,PHONE,ACCOUNT_TYPE
ID1,Foo,Bar,49 Foo St Bar,Coburg,,GOLD
ID2,Jane,Smith,1 Main Rd,Brunswick,5551234,SILVER
,No,Id,Nowhere,Nowhere,,NONE
";

fn row(cells: &[(&str, &str)]) -> HashMap<String, String> {
    cells
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Full pipeline: write config files → load → read → map → JSON lines
#[test]
fn test_full_pipeline() {
    // 1. Setup temp dir with mappings and input
    let temp_dir = tempdir().unwrap();
    let mappings_path = temp_dir.path().join("customers.yaml");
    fs::write(&mappings_path, MAPPINGS_YAML).unwrap();
    let input_dir = temp_dir.path().join("input");
    fs::create_dir_all(&input_dir).unwrap();
    fs::write(input_dir.join("customers.csv"), CUSTOMERS_CSV).unwrap();

    // 2. Config pointing at them
    let config_path = temp_dir.path().join("archetl.json");
    let config = Config {
        mappings_path: mappings_path.to_string_lossy().to_string(),
        input_patterns: vec![input_dir.to_string_lossy().to_string()],
        progress: false,
        ..Config::default()
    };
    config.save(config_path.to_str().unwrap()).unwrap();
    let config = Config::load(config_path.to_str().unwrap()).unwrap();
    config.validate().unwrap();

    // 3. Load mappings and inputs
    let mappings = config.load_mappings().unwrap();
    assert_eq!(mappings.len(), 6);
    let files = config.get_input_files().unwrap();
    assert_eq!(files.len(), 1);
    let table = source::read_table(&files[0], &config.read_options()).unwrap();
    assert_eq!(table.len(), 3);
    assert!(mappings.check(&table.columns).iter().all(|r| !r.is_error()));

    // 4. Map into a JSON lines sink
    let mut pipeline = Pipeline::new(RowMapper::new(&mappings), JsonLinesSink::new(Vec::new()));
    let result = pipeline.run(&table).unwrap();
    assert_eq!(result.rows, 3);
    assert_eq!(result.mapped, 2);
    assert_eq!(result.failed, 1, "row without a legacy id should fail");

    // 5. Decode output
    let output = pipeline.finish().unwrap().into_inner();
    let values: Vec<ETLValue> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(values.len(), result.values);

    let id1: Vec<&ETLValue> = values.iter().filter(|v| v.legacy_id == "ID1").collect();
    let summary: Vec<(&str, &str, i32, &str)> = id1
        .iter()
        .map(|v| (v.object_id.as_str(), v.name.as_str(), v.index, v.value.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("ID1.1", "firstName", -1, "Foo"),
            ("ID1.1", "lastName", -1, "Bar"),
            ("ID1.1", "contacts", 0, "ID1.2"),
            ("ID1.2", "address", -1, "49 Foo St Bar"),
            ("ID1.2", "suburb", -1, "Coburg"),
            ("ID1.1", "type", 0, "<lookup.customerAccountType>code=GOLD"),
        ]
    );

    // ID2 has a phone number, so a second contact is synthesized
    let phone: Vec<&ETLValue> = values
        .iter()
        .filter(|v| v.legacy_id == "ID2" && v.archetype == "contact.phoneNumber")
        .collect();
    assert_eq!(phone.len(), 1);
    assert_eq!(phone[0].object_id, "ID2.3");
    assert_eq!(phone[0].value, "5551234");

    // Every reference value either names an object of the row or parses
    for value in values.iter().filter(|v| v.is_reference) {
        assert!(
            value.value.starts_with(&format!("{}.", value.legacy_id))
                || Reference::parse(&value.value).is_some(),
            "unexpected reference {value:?}"
        );
    }
}

/// The same rows produce the same output through the CSV sink.
#[test]
fn test_csv_output() {
    let table = source::delimited::read(CUSTOMERS_CSV.as_bytes(), b',').unwrap();
    let spec = serde_yaml::from_str(MAPPINGS_YAML).unwrap();
    let mappings = Mappings::from_spec(&spec).unwrap();

    let mut pipeline = Pipeline::new(RowMapper::new(&mappings), CsvSink::new(Vec::new()));
    pipeline.run(&table).unwrap();
    let output = String::from_utf8(pipeline.finish().unwrap().into_inner().unwrap()).unwrap();

    let mut lines = output.lines();
    assert_eq!(
        lines.next(),
        Some("objectId,archetype,legacyId,name,index,value,isReference")
    );
    assert_eq!(
        lines.next(),
        Some("ID1.1,party.customerperson,ID1,firstName,-1,Foo,false")
    );
}

/// An input lacking a mapped non-id column still loads; the field maps as "".
#[test]
fn test_missing_column_maps_empty() {
    let temp_dir = tempdir().unwrap();
    let mappings_path = temp_dir.path().join("m.yaml");
    fs::write(
        &mappings_path,
        "idColumn: LEGACY_ID\nmappings:\n  - source: FIRST_NAME\n    target: <party.customerperson>firstName\n  - source: PHONE\n    target: <party.customerperson>contacts[0]<contact.phoneNumber>telephoneNumber\n",
    )
    .unwrap();
    let input = temp_dir.path().join("rows.csv");
    fs::write(&input, "LEGACY_ID,FIRST_NAME\nID1,Foo\n").unwrap();

    let mappings = archetl::config::load_mappings(&mappings_path).unwrap();
    let table = source::read_table(&input, &ReadOptions::default()).unwrap();
    pipeline::ensure_columns(&mappings, &table.columns, &input).unwrap();

    let mut pipeline = Pipeline::new(RowMapper::new(&mappings), JsonLinesSink::new(Vec::new()));
    let result = pipeline.run(&table).unwrap();
    assert_eq!(result.mapped, 1);
    assert_eq!(result.failed, 0);

    let output = String::from_utf8(pipeline.finish().unwrap().into_inner()).unwrap();
    let values: Vec<ETLValue> = output
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let summary: Vec<(&str, &str, &str)> = values
        .iter()
        .map(|v| (v.object_id.as_str(), v.name.as_str(), v.value.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("ID1.1", "firstName", "Foo"),
            ("ID1.1", "contacts", "ID1.2"),
            ("ID1.2", "telephoneNumber", ""),
        ]
    );

    // Without the id column the input is refused
    fs::write(&input, "FIRST_NAME\nFoo\n").unwrap();
    let table = source::read_table(&input, &ReadOptions::default()).unwrap();
    assert!(pipeline::ensure_columns(&mappings, &table.columns, &input).is_err());
}

/// Collection slots beyond the output index range are rejected, never merged.
#[test]
fn test_oversized_index_rejected() {
    assert!(Mapping::new("X", "<a>c[3000000000]<x>y").is_err());
    assert!(Mapping::new("X", "<a>c[3000000001]<x>y").is_err());

    let mappings = Mappings::new("ID")
        .unwrap()
        .with(Mapping::new("X", "<a>c[2147483646]<x>y").unwrap())
        .with(Mapping::new("Y", "<a>c[2147483647]<x>y").unwrap());
    let values = RowMapper::new(&mappings)
        .map(&row(&[("ID", "R"), ("X", "1"), ("Y", "2")]))
        .unwrap();
    let links: Vec<(i32, &str)> = values
        .iter()
        .filter(|v| v.name == "c")
        .map(|v| (v.index, v.value.as_str()))
        .collect();
    assert_eq!(links, vec![(2147483646, "R.2"), (2147483647, "R.3")]);
}

#[test]
fn test_path_rejections() {
    for text in [
        "",
        "<party.customerPerson>",
        "<party.customerPerson>[0]",
        "<party.customerPerson>xnode[0]ynode",
    ] {
        assert!(NodePath::parse(text).is_none(), "{text:?} should not parse");
    }
}

#[test]
fn test_reference_forms() {
    assert_eq!(
        Reference::parse("1234.1"),
        Some(Reference::ById {
            id: "1234.1".into()
        })
    );
    assert_eq!(
        Reference::parse("<party.customerperson>1234.1"),
        Some(Reference::ByLegacyId {
            archetype: "party.customerperson".into(),
            legacy_id: "1234.1".into(),
        })
    );
    assert_eq!(
        Reference::parse("<lookup.contactPurpose>code=MAILING"),
        Some(Reference::ByNameValue {
            archetype: "lookup.contactPurpose".into(),
            name: "code".into(),
            value: "MAILING".into(),
        })
    );
}

#[test]
fn test_default_reference_expansion() {
    let mappings = Mappings::new("ID").unwrap().with(
        Mapping::new("INVOICE", "<act.customerAccountChargesInvoice>customer")
            .unwrap()
            .with_reference(true),
    );
    let values = RowMapper::new(&mappings)
        .map(&row(&[("ID", "R1"), ("INVOICE", "INVOICE1")]))
        .unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].value, "<act.customerAccountChargesInvoice>INVOICE1");
    assert!(values[0].is_reference);
}

#[test]
fn test_identity_is_per_call() {
    let spec = serde_yaml::from_str(MAPPINGS_YAML).unwrap();
    let mappings = Mappings::from_spec(&spec).unwrap();
    let mapper = RowMapper::new(&mappings);
    let row = row(&[
        ("LEGACY_ID", "ID1"),
        ("ADDRESS", "49 Foo St Bar"),
        ("SUBURB", "Coburg"),
        ("PHONE", "5551234"),
    ]);

    let first = mapper.map(&row).unwrap();
    let second = mapper.map(&row).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_read_options_for_tsv() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("rows.tsv");
    fs::write(&path, "ID\tNAME\nC1\tSmith\n").unwrap();

    let table = source::read_table(&path, &ReadOptions::default()).unwrap();
    assert_eq!(table.columns, vec!["ID", "NAME"]);
    assert_eq!(table.len(), 1);
}
