use chrono::NaiveDate;
use encoding_rs::{UTF_8, WINDOWS_1252};
use etl_model::{Cell, CellValue, ColumnSpec, DataType, FileFormat, NormalizedRecord, ResolvedColumn};
use etl_output::{ExportOptions, OutputError, artifact_name, build, build_csv, build_json};

fn column(key: &str, name: &str, dtype: DataType, decimals: Option<u8>) -> ResolvedColumn {
    ResolvedColumn {
        key: key.to_string(),
        name: name.to_string(),
        dtype,
        required: false,
        decimals,
        length: None,
        aliases: Vec::new(),
        rules: Vec::new(),
    }
}

fn spec() -> ColumnSpec {
    ColumnSpec::new(
        "acme",
        vec![
            column("name", "Name", DataType::String, None),
            column("email", "Email", DataType::String, None),
            column("vat", "VAT ID", DataType::String, None),
            column("amount", "Amount", DataType::Float, Some(2)),
            column("weight", "Weight", DataType::Float, None),
            column("qty", "Qty", DataType::Int, None),
            column("date", "Date", DataType::Date, None),
        ],
    )
}

fn record(line: u64, cells: Vec<(&str, CellValue)>) -> NormalizedRecord {
    NormalizedRecord {
        line,
        cells: cells
            .into_iter()
            .map(|(key, value)| Cell {
                key: key.to_string(),
                value,
            })
            .collect(),
    }
}

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

fn records() -> Vec<NormalizedRecord> {
    vec![
        record(
            2,
            vec![
                ("name", text("ACME OY")),
                ("email", text("info@acme.fi")),
                ("vat", text("FI123")),
                ("amount", CellValue::Float(12.5)),
                ("weight", CellValue::Float(1.0 / 3.0)),
                ("qty", CellValue::Int(3)),
                (
                    "date",
                    CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
                ),
            ],
        ),
        record(
            3,
            vec![
                ("name", text("Beta; \"Ab\"")),
                ("email", CellValue::Null),
                ("vat", CellValue::Null),
                ("amount", CellValue::Float(-0.001)),
                ("weight", CellValue::Float(f64::NAN)),
                ("qty", CellValue::Null),
                ("date", CellValue::Null),
            ],
        ),
    ]
}

#[test]
fn csv_export_snapshot() {
    let bytes = build_csv(&records(), &spec(), b';', UTF_8).expect("build csv");
    let csv = String::from_utf8(bytes).expect("utf-8");
    assert!(csv.ends_with('\n'));
    assert!(!csv.contains('\r'));
    insta::assert_snapshot!(csv.trim_end(), @r#"
    Name;Email;VAT ID;Amount;Weight;Qty;Date
    ACME OY;info@acme.fi;FI123;12.50;0.333;3;2024-01-31
    "Beta; ""Ab""";;;0.00;;;
    "#);
}

#[test]
fn csv_is_encoded_in_target_encoding() {
    let spec = ColumnSpec::new("acme", vec![column("name", "Nimi", DataType::String, None)]);
    let rows = vec![record(2, vec![("name", text("Jäte Oy"))])];
    let bytes = build_csv(&rows, &spec, b';', WINDOWS_1252).expect("build csv");
    assert_eq!(bytes, b"Nimi\nJ\xe4te Oy\n".to_vec());

    let rows = vec![record(9, vec![("name", text("日本"))])];
    let err = build_csv(&rows, &spec, b';', WINDOWS_1252).unwrap_err();
    assert!(matches!(err, OutputError::Unmappable { line: 9, .. }));
}

#[test]
fn json_export_has_one_object_per_line_and_round_trips() {
    let bytes = build_json(&records(), &spec()).expect("build json");
    let body = String::from_utf8(bytes).expect("utf-8");
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "[");
    assert_eq!(lines[3], "]");
    assert!(lines[1].contains(r#""Amount":12.50"#));

    let parsed: serde_json::Value = serde_json::from_str(&body).expect("valid json");
    let rows = parsed.as_array().expect("array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["Name"], "ACME OY");
    assert_eq!(rows[0]["VAT ID"], "FI123");
    assert_eq!(rows[0]["Amount"].as_f64(), Some(12.5));
    assert_eq!(rows[0]["Weight"].as_f64(), Some(0.333));
    assert_eq!(rows[0]["Qty"].as_i64(), Some(3));
    assert_eq!(rows[0]["Date"], "2024-01-31");
    assert_eq!(rows[1]["Name"], "Beta; \"Ab\"");
    assert!(rows[1]["Email"].is_null());
    assert!(rows[1]["Weight"].is_null());
    let keys: Vec<&String> = rows[0].as_object().expect("object").keys().collect();
    assert_eq!(keys.len(), 7);
}

#[test]
fn empty_json_export_is_an_empty_array() {
    let bytes = build_json(&[], &spec()).expect("build json");
    assert_eq!(bytes, b"[]\n".to_vec());
}

#[test]
fn builds_are_deterministic() {
    for format in [FileFormat::Csv, FileFormat::Json] {
        let options = ExportOptions::new(format, "utf-8", ';').expect("options");
        let first = build(&records(), &spec(), &options, "a").expect("build");
        let second = build(&records(), &spec(), &options, "a").expect("build");
        assert_eq!(first, second);
    }
}

#[test]
fn options_and_names() {
    let options = ExportOptions::new(FileFormat::Csv, "ISO-8859-1", ',').expect("options");
    assert_eq!(options.content_type(), "text/csv; charset=windows-1252");
    assert_eq!(options.delimiter, b',');
    assert!(matches!(
        ExportOptions::new(FileFormat::Csv, "utf-16le", ';'),
        Err(OutputError::UnsupportedEncoding { .. })
    ));
    assert!(matches!(
        ExportOptions::new(FileFormat::Json, "nope", ';'),
        Err(OutputError::UnknownEncoding { .. })
    ));

    let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|d| d.and_hms_opt(6, 5, 4))
        .unwrap();
    assert_eq!(
        artifact_name("tapahtumat", "Acme Oy", ts, FileFormat::Json),
        "tapahtumat_Acme_Oy_2024-05-01_06-05-04.json"
    );
}

#[test]
fn delimiter_must_be_plain_ascii() {
    for delimiter in ['§', '"', '\n'] {
        assert!(matches!(
            ExportOptions::new(FileFormat::Csv, "utf-8", delimiter),
            Err(OutputError::InvalidDelimiter { delimiter: d }) if d == delimiter
        ));
    }
    let options = ExportOptions::new(FileFormat::Csv, "utf-8", '\t').expect("options");
    assert_eq!(options.delimiter, b'\t');
}

#[test]
fn json_objects_keep_column_order() {
    let bytes = build_json(&records(), &spec()).expect("build json");
    let body = String::from_utf8(bytes).expect("utf-8");
    let first = body.lines().nth(1).expect("first row");
    let positions: Vec<usize> = ["\"Name\"", "\"Email\"", "\"VAT ID\"", "\"Amount\"", "\"Date\""]
        .iter()
        .map(|key| first.find(key).expect("key present"))
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(first.contains(r#""Weight":0.333"#));
}
