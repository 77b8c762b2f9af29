//! Per-record validation against a column spec.

use etl_model::{
    CellValue, ColumnSpec, FailureKind, FieldFailure, NormalizedRecord, ValidationOutcome,
    ValidationReport,
};

use crate::checks::{check_rule, datatype, required};

#[derive(Debug, Clone, Copy)]
pub struct ValidationEngine<'a> {
    spec: &'a ColumnSpec,
}

impl<'a> ValidationEngine<'a> {
    pub fn new(spec: &'a ColumnSpec) -> Self {
        Self { spec }
    }

    /// Validate one record. Every failure of every column is collected.
    pub fn validate_row(&self, row: usize, record: &NormalizedRecord) -> ValidationOutcome {
        let mut failures = Vec::new();
        for column in self.spec.columns() {
            let value = record.get(&column.key).unwrap_or(&CellValue::Null);

            // 1. Required presence
            if let Some(failure) = required::check(column, value) {
                failures.push(failure);
                continue;
            }

            // 2. Type well-formedness
            if let Some(failure) = datatype::check(column, value) {
                failures.push(failure);
                continue;
            }

            // 3. Domain rules
            for rule in &column.rules {
                if let Some(message) = check_rule(rule, value) {
                    failures.push(FieldFailure {
                        column: column.key.clone(),
                        kind: FailureKind::Rule,
                        rule: Some(rule.name().to_string()),
                        message,
                    });
                }
            }
        }
        ValidationOutcome::from_failures(row, record.line, failures)
    }

    /// Validate every record, in order. One outcome per input record.
    pub fn validate_all(&self, records: &[NormalizedRecord]) -> ValidationReport {
        let outcomes: Vec<ValidationOutcome> = records
            .iter()
            .enumerate()
            .map(|(row, record)| self.validate_row(row, record))
            .collect();
        let report = ValidationReport { outcomes };
        tracing::debug!(
            customer = self.spec.customer(),
            total = report.total(),
            accepted = report.accepted_count(),
            rejected = report.rejected_count(),
            "validated records"
        );
        report
    }
}

/// Validate a single record against `spec`.
pub fn validate(record: &NormalizedRecord, spec: &ColumnSpec) -> ValidationOutcome {
    ValidationEngine::new(spec).validate_row(0, record)
}
