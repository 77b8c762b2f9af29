//! SQLite relational store: one table per customer.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use etl_model::{CellValue, ColumnSpec, DataType, NormalizedRecord};
use rusqlite::types::Value;
use rusqlite::{Connection, Transaction, params_from_iter};

use crate::error::PersistError;
use crate::store::{PersistSummary, RelationalStore};

pub const DEFAULT_PRIMARY_KEY: &str = "TapahtumaId";

/// Table name for a customer: lowercase ASCII alphanumerics and `_`.
pub fn table_name(customer: &str) -> String {
    let mut name: String = customer
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() || name.starts_with(|ch: char| ch.is_ascii_digit()) {
        name.insert_str(0, "customer_");
    }
    name
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn sql_type(dtype: DataType) -> &'static str {
    match dtype {
        DataType::Int => "INTEGER",
        DataType::Float => "REAL",
        DataType::String | DataType::Date | DataType::Id => "TEXT",
    }
}

fn sql_value(value: Option<&CellValue>) -> Value {
    match value {
        Some(CellValue::Text(text)) => Value::Text(text.clone()),
        Some(CellValue::Int(number)) => Value::Integer(*number),
        Some(CellValue::Float(number)) if number.is_finite() => Value::Real(*number),
        Some(CellValue::Date(date)) => Value::Text(date.format("%Y-%m-%d").to_string()),
        _ => Value::Null,
    }
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    primary_key: String,
}

impl SqliteStore {
    pub fn open(
        path: &Path,
        busy_timeout: Duration,
        primary_key: impl Into<String>,
    ) -> Result<Self, PersistError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| PersistError::Unavailable {
                message: format!("cannot create {}: {e}", parent.display()),
            })?;
        }
        let connection_error = |source| PersistError::Connection {
            path: path.to_path_buf(),
            source,
        };
        let conn = Connection::open(path).map_err(connection_error)?;
        conn.busy_timeout(busy_timeout).map_err(connection_error)?;
        Ok(Self::with_connection(conn, primary_key))
    }

    pub fn in_memory(primary_key: impl Into<String>) -> Result<Self, PersistError> {
        let conn = Connection::open_in_memory().map_err(|source| PersistError::Connection {
            path: ":memory:".into(),
            source,
        })?;
        Ok(Self::with_connection(conn, primary_key))
    }

    fn with_connection(conn: Connection, primary_key: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(conn),
            primary_key: primary_key.into(),
        }
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, PersistError> {
        self.conn.lock().map_err(|_| PersistError::Unavailable {
            message: "connection lock poisoned".to_string(),
        })
    }

    /// Number of rows in a customer's table (0 when the table does not exist).
    pub fn count_rows(&self, customer: &str) -> Result<u64, PersistError> {
        let table = table_name(customer);
        let conn = self.lock()?;
        if existing_columns(&conn, &table)?.is_empty() {
            return Ok(0);
        }
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", quote(&table)), [], |row| {
                row.get(0)
            })
            .map_err(|e| PersistError::classify(&table, e))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Column names of a customer's table, in table order.
    pub fn columns(&self, customer: &str) -> Result<Vec<String>, PersistError> {
        let table = table_name(customer);
        let conn = self.lock()?;
        existing_columns(&conn, &table)
    }
}

fn existing_columns(conn: &Connection, table: &str) -> Result<Vec<String>, PersistError> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", quote(table)))
        .map_err(|e| PersistError::classify(table, e))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(|e| PersistError::classify(table, e))?;
    Ok(names)
}

/// Create the table, or add the columns it is missing.
fn ensure_table(
    tx: &Transaction<'_>,
    table: &str,
    spec: &ColumnSpec,
    primary_key: Option<&str>,
) -> Result<(), PersistError> {
    let existing = existing_columns(tx, table)?;
    if existing.is_empty() {
        let columns: Vec<String> = spec
            .columns()
            .iter()
            .map(|column| {
                let mut definition = format!("{} {}", quote(&column.name), sql_type(column.dtype));
                if Some(column.name.as_str()) == primary_key {
                    definition.push_str(" PRIMARY KEY");
                }
                definition
            })
            .collect();
        let sql = format!("CREATE TABLE {} ({})", quote(table), columns.join(", "));
        tx.execute(&sql, [])
            .map_err(|e| PersistError::classify(table, e))?;
        tracing::info!(table, columns = columns.len(), "created table");
        return Ok(());
    }

    for column in spec.columns() {
        let present = existing
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&column.name));
        if present {
            continue;
        }
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            quote(table),
            quote(&column.name),
            sql_type(column.dtype)
        );
        tx.execute(&sql, [])
            .map_err(|e| PersistError::classify(table, e))?;
        tracing::info!(table, column = %column.name, "added column");
    }
    if let Some(key) = primary_key {
        ensure_unique_key(tx, table, key)?;
    }
    Ok(())
}

/// Tables created before the key column existed have no constraint for
/// `ON CONFLICT`; a unique index provides one.
fn ensure_unique_key(tx: &Transaction<'_>, table: &str, key: &str) -> Result<(), PersistError> {
    let sql = format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
        quote(&format!("{table}_pk")),
        quote(table),
        quote(key)
    );
    tx.execute(&sql, [])
        .map_err(|e| PersistError::classify(table, e))?;
    Ok(())
}

fn insert_sql(table: &str, spec: &ColumnSpec, primary_key: Option<&str>) -> String {
    let names: Vec<String> = spec.display_names().map(quote).collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|idx| format!("?{idx}")).collect();
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(table),
        names.join(", "),
        placeholders.join(", ")
    );
    if let Some(key) = primary_key {
        let updates: Vec<String> = spec
            .display_names()
            .filter(|name| *name != key)
            .map(|name| format!("{0} = excluded.{0}", quote(name)))
            .collect();
        if updates.is_empty() {
            sql.push_str(&format!(" ON CONFLICT({}) DO NOTHING", quote(key)));
        } else {
            sql.push_str(&format!(
                " ON CONFLICT({}) DO UPDATE SET {}",
                quote(key),
                updates.join(", ")
            ));
        }
    }
    sql
}

impl RelationalStore for SqliteStore {
    fn upsert_records(
        &self,
        customer: &str,
        spec: &ColumnSpec,
        records: &[NormalizedRecord],
    ) -> Result<PersistSummary, PersistError> {
        let table = table_name(customer);
        let primary_key = spec
            .display_names()
            .find(|name| *name == self.primary_key);

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| PersistError::classify(&table, e))?;
        ensure_table(&tx, &table, spec, primary_key)?;
        {
            let mut stmt = tx
                .prepare(&insert_sql(&table, spec, primary_key))
                .map_err(|e| PersistError::classify(&table, e))?;
            for record in records {
                let values: Vec<Value> = spec
                    .columns()
                    .iter()
                    .map(|column| sql_value(record.get(&column.key)))
                    .collect();
                stmt.execute(params_from_iter(values.iter()))
                    .map_err(|e| PersistError::classify(&table, e))?;
            }
        }
        tx.commit()
            .map_err(|e| PersistError::classify(&table, e))?;

        tracing::debug!(
            table = %table,
            rows = records.len(),
            upsert = primary_key.is_some(),
            "persisted records"
        );
        Ok(PersistSummary {
            table,
            rows: records.len(),
        })
    }
}
