use std::time::Duration;

use chrono::NaiveDate;
use etl_model::{Cell, CellValue, ColumnSpec, DataType, NormalizedRecord, ResolvedColumn};
use etl_persist::{PersistError, RelationalStore, SqliteStore, table_name};
use rusqlite::Connection;

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

fn spec() -> ColumnSpec {
    ColumnSpec::new(
        "Acme Oy",
        vec![
            column("id", "TapahtumaId", DataType::Id),
            column("amount", "Amount", DataType::Float),
            column("qty", "Qty", DataType::Int),
            column("date", "Date", DataType::Date),
        ],
    )
}

fn record(id: &str, amount: f64, qty: i64) -> NormalizedRecord {
    NormalizedRecord {
        line: 2,
        cells: vec![
            Cell {
                key: "id".to_string(),
                value: CellValue::Text(id.to_string()),
            },
            Cell {
                key: "amount".to_string(),
                value: CellValue::Float(amount),
            },
            Cell {
                key: "qty".to_string(),
                value: CellValue::Int(qty),
            },
            Cell {
                key: "date".to_string(),
                value: CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).expect("date")),
            },
        ],
    }
}

#[test]
fn table_names_are_sanitized() {
    assert_eq!(table_name("Acme Oy"), "acme_oy");
    assert_eq!(table_name("2024-kuljetus"), "customer_2024_kuljetus");
    assert_eq!(table_name(""), "customer_");
}

#[test]
fn creates_table_and_upserts_on_primary_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("db").join("etl.sqlite");
    let store = SqliteStore::open(&path, Duration::from_secs(1), "TapahtumaId").expect("open");

    let summary = store
        .upsert_records("Acme Oy", &spec(), &[record("A1", 1.5, 2), record("A2", 3.0, 1)])
        .expect("first upsert");
    assert_eq!(summary.table, "acme_oy");
    assert_eq!(summary.rows, 2);
    assert_eq!(
        store.columns("Acme Oy").expect("columns"),
        vec!["TapahtumaId", "Amount", "Qty", "Date"]
    );

    store
        .upsert_records("Acme Oy", &spec(), &[record("A1", 9.25, 7)])
        .expect("second upsert");
    assert_eq!(store.count_rows("Acme Oy").expect("count"), 2);

    let conn = Connection::open(&path).expect("reopen");
    let (amount, qty, date): (f64, i64, String) = conn
        .query_row(
            "SELECT Amount, Qty, Date FROM acme_oy WHERE TapahtumaId = 'A1'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .expect("row");
    assert_eq!(amount, 9.25);
    assert_eq!(qty, 7);
    assert_eq!(date, "2024-01-31");
}

#[test]
fn adds_missing_columns_to_existing_table() {
    let store = SqliteStore::in_memory("TapahtumaId").expect("open");
    let narrow = ColumnSpec::new(
        "acme",
        vec![
            column("id", "TapahtumaId", DataType::Id),
            column("amount", "Amount", DataType::Float),
        ],
    );
    store
        .upsert_records("acme", &narrow, &[record("A1", 1.0, 1)])
        .expect("narrow upsert");
    store
        .upsert_records("acme", &spec(), &[record("A2", 2.0, 2)])
        .expect("wide upsert");
    assert_eq!(
        store.columns("acme").expect("columns"),
        vec!["TapahtumaId", "Amount", "Qty", "Date"]
    );
    assert_eq!(store.count_rows("acme").expect("count"), 2);
}

#[test]
fn appends_when_primary_key_is_not_in_the_columns() {
    let store = SqliteStore::in_memory("TapahtumaId").expect("open");
    let spec = ColumnSpec::new("acme", vec![column("amount", "Amount", DataType::Float)]);
    let row = NormalizedRecord {
        line: 2,
        cells: vec![Cell {
            key: "amount".to_string(),
            value: CellValue::Float(f64::NAN),
        }],
    };
    store
        .upsert_records("acme", &spec, &[row.clone(), row])
        .expect("insert");
    assert_eq!(store.count_rows("acme").expect("count"), 2);
    assert_eq!(store.count_rows("unknown").expect("count"), 0);
}

#[test]
fn upserts_into_table_created_without_key_constraint() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("etl.sqlite");
    {
        let conn = Connection::open(&path).expect("open");
        conn.execute_batch(
            "CREATE TABLE acme (TapahtumaId TEXT, Amount REAL);
             INSERT INTO acme VALUES ('A1', 1.0);",
        )
        .expect("seed");
    }
    let store = SqliteStore::open(&path, Duration::from_millis(100), "TapahtumaId").expect("open");
    let spec = ColumnSpec::new(
        "acme",
        vec![
            column("id", "TapahtumaId", DataType::Id),
            column("amount", "Amount", DataType::Float),
        ],
    );
    store
        .upsert_records("acme", &spec, &[record("A1", 5.0, 1), record("A2", 2.0, 2)])
        .expect("upsert");
    assert_eq!(store.count_rows("acme").expect("count"), 2);

    let conn = Connection::open(&path).expect("reopen");
    let amount: f64 = conn
        .query_row("SELECT Amount FROM acme WHERE TapahtumaId = 'A1'", [], |row| row.get(0))
        .expect("row");
    assert_eq!(amount, 5.0);
}

#[test]
fn key_column_added_later_still_upserts() {
    let store = SqliteStore::in_memory("TapahtumaId").expect("open");
    let amount_only = ColumnSpec::new("acme", vec![column("amount", "Amount", DataType::Float)]);
    let amount_row = NormalizedRecord {
        line: 2,
        cells: vec![Cell {
            key: "amount".to_string(),
            value: CellValue::Float(1.0),
        }],
    };
    store
        .upsert_records("acme", &amount_only, &[amount_row])
        .expect("first run");

    let keyed = ColumnSpec::new(
        "acme",
        vec![
            column("id", "TapahtumaId", DataType::Id),
            column("amount", "Amount", DataType::Float),
        ],
    );
    store
        .upsert_records("acme", &keyed, &[record("A1", 2.0, 2)])
        .expect("second run");
    store
        .upsert_records("acme", &keyed, &[record("A1", 3.0, 2)])
        .expect("third run");
    assert_eq!(store.count_rows("acme").expect("count"), 2);
}

#[test]
fn duplicate_keys_in_existing_rows_fail_and_roll_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("etl.sqlite");
    {
        let conn = Connection::open(&path).expect("open");
        conn.execute_batch(
            "CREATE TABLE acme (TapahtumaId TEXT, Amount REAL);
             INSERT INTO acme VALUES ('A1', 1.0);
             INSERT INTO acme VALUES ('A1', 2.0);",
        )
        .expect("seed");
    }
    let store = SqliteStore::open(&path, Duration::from_millis(100), "TapahtumaId").expect("open");
    let spec = ColumnSpec::new(
        "acme",
        vec![
            column("id", "TapahtumaId", DataType::Id),
            column("amount", "Amount", DataType::Float),
        ],
    );
    let err = store
        .upsert_records("acme", &spec, &[record("A2", 2.0, 1)])
        .expect_err("existing duplicates block the unique index");
    assert!(
        matches!(err, PersistError::Constraint { .. } | PersistError::Sqlite { .. }),
        "{err:?}"
    );
    assert_eq!(store.count_rows("acme").expect("count"), 2);
}
