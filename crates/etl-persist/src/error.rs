use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to open database {path}: {source}")]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database connection is unusable: {message}")]
    Unavailable { message: String },

    #[error("schema mismatch on table {table}: {message}")]
    Schema { table: String, message: String },

    #[error("constraint violation on table {table}: {message}")]
    Constraint { table: String, message: String },

    #[error("database error on table {table}: {source}")]
    Sqlite {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl PersistError {
    /// Sort a SQLite error into the persistence taxonomy.
    pub(crate) fn classify(table: &str, source: rusqlite::Error) -> Self {
        let table = table.to_string();
        if let rusqlite::Error::SqliteFailure(error, message) = &source {
            if error.code == rusqlite::ErrorCode::ConstraintViolation {
                return Self::Constraint {
                    table,
                    message: source.to_string(),
                };
            }
            if let Some(message) = message
                && (message.contains("no such column")
                    || message.contains("has no column")
                    || message.contains("ON CONFLICT"))
            {
                return Self::Schema {
                    table,
                    message: message.clone(),
                };
            }
        }
        Self::Sqlite { table, source }
    }
}
