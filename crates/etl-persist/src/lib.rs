//! Relational persistence of validated records.

pub mod error;
pub mod sqlite;
pub mod store;

pub use error::PersistError;
pub use sqlite::{DEFAULT_PRIMARY_KEY, SqliteStore, table_name};
pub use store::{PersistSummary, RelationalStore};
