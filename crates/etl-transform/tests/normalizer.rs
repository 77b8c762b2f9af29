use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use etl_model::{CellValue, ColumnSpec, DataType, RawRecord, RawValue, ResolvedColumn};
use etl_transform::{Normalizer, normalize};
use proptest::prelude::*;

fn column(key: &str, name: &str, dtype: DataType) -> ResolvedColumn {
    ResolvedColumn {
        key: key.to_string(),
        name: name.to_string(),
        dtype,
        required: false,
        decimals: None,
        length: None,
        aliases: Vec::new(),
        rules: Vec::new(),
    }
}

fn waste_spec() -> ColumnSpec {
    let mut id = column("TapahtumaId", "TapahtumaId", DataType::Id);
    id.aliases.push("Tapahtuma nro".to_string());
    ColumnSpec::new(
        "kuljetus",
        vec![
            id,
            column("Paino", "Paino (kg)", DataType::Float),
            column("Kpl", "Kpl", DataType::Int),
            column("Pvm", "Päivämäärä", DataType::Date),
            column("Asiakas", "Asiakas", DataType::String),
        ],
    )
}

#[test]
fn maps_by_key_display_name_and_alias() {
    let raw = RawRecord::new(7)
        .with("\u{feff}TAPAHTUMA NRO", "1234.0")
        .with(" paino (kg) ", "12,5")
        .with("kpl", "3")
        .with("päivämäärä", "31.01.2024")
        .with("Extra", "dropped");
    let record = normalize(&raw, &waste_spec());

    assert_eq!(record.line, 7);
    assert_eq!(
        record.keys().collect::<Vec<_>>(),
        vec!["TapahtumaId", "Paino", "Kpl", "Pvm", "Asiakas"]
    );
    assert_eq!(
        record.get("TapahtumaId"),
        Some(&CellValue::Text("1234".to_string()))
    );
    assert_eq!(record.get("Paino"), Some(&CellValue::Float(12.5)));
    assert_eq!(record.get("Kpl"), Some(&CellValue::Int(3)));
    assert_eq!(
        record.get("Pvm"),
        Some(&CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()))
    );
    assert_eq!(record.get("Asiakas"), Some(&CellValue::Null));
    assert_eq!(record.get("Extra"), None);
}

#[test]
fn prefers_non_blank_source_over_blank_one() {
    let raw = RawRecord::new(2)
        .with("TapahtumaId", RawValue::Null)
        .with("Tapahtuma nro", "A-1");
    let record = normalize(&raw, &waste_spec());
    assert_eq!(
        record.get("TapahtumaId"),
        Some(&CellValue::Text("A-1".to_string()))
    );
}

#[test]
fn coercion_failures_are_reported_per_cell() {
    let raw = RawRecord::new(3)
        .with("Paino", "heavy")
        .with("Kpl", "2.5")
        .with("Pvm", "2024-13-01");
    let record = normalize(&raw, &waste_spec());
    let failed: Vec<&str> = record.coercion_failures().map(|(key, _)| key).collect();
    assert_eq!(failed, vec!["Paino", "Kpl", "Pvm"]);
}

#[test]
fn unmapped_headers_are_listed() {
    let spec = waste_spec();
    let normalizer = Normalizer::new(&spec);
    let headers = vec![
        "TapahtumaId".to_string(),
        "Paino (KG)".to_string(),
        "Huom".to_string(),
    ];
    assert_eq!(normalizer.unmapped_headers(&headers), vec!["Huom"]);
}

#[test]
fn konserni_rule_is_carried_untouched() {
    let mut col = column("Konserni", "PARConcern", DataType::String);
    col.rules.push(etl_model::ColumnRule::Konserni(Arc::new(BTreeSet::from([
        "1001".to_string(),
    ]))));
    let spec = ColumnSpec::new("acme", vec![col]);
    let record = normalize(&RawRecord::new(2).with("parconcern", " 1001 "), &spec);
    assert_eq!(
        record.get("Konserni"),
        Some(&CellValue::Text("1001".to_string()))
    );
}

fn raw_value() -> impl Strategy<Value = RawValue> {
    prop_oneof![
        Just(RawValue::Null),
        any::<f64>().prop_map(RawValue::Number),
        ".{0,12}".prop_map(RawValue::Text),
        "[0-9]{1,4}[,.][0-9]{1,3}".prop_map(RawValue::Text),
    ]
}

proptest! {
    #[test]
    fn output_always_has_exactly_the_spec_keys(
        fields in proptest::collection::vec(
            (prop_oneof![
                Just("TapahtumaId".to_string()),
                Just("paino".to_string()),
                Just("KPL".to_string()),
                Just("Pvm".to_string()),
                "[a-z]{1,8}",
            ], raw_value()),
            0..10,
        )
    ) {
        let spec = waste_spec();
        let mut raw = RawRecord::new(1);
        for (name, value) in fields {
            raw.push(name, value);
        }
        let record = normalize(&raw, &spec);
        let keys: Vec<&str> = record.keys().collect();
        let expected: Vec<&str> = spec.keys().collect();
        prop_assert_eq!(keys, expected);
    }
}
