use etl_model::{ColumnSpec, NormalizedRecord};

use crate::error::PersistError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistSummary {
    pub table: String,
    pub rows: usize,
}

/// Destination for validated records.
pub trait RelationalStore: Send + Sync {
    /// Write `records` for `customer` in one transaction. On error nothing
    /// from this call is kept.
    fn upsert_records(
        &self,
        customer: &str,
        spec: &ColumnSpec,
        records: &[NormalizedRecord],
    ) -> Result<PersistSummary, PersistError>;
}
