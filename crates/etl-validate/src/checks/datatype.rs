use etl_model::{CellValue, FailureKind, FieldFailure, ResolvedColumn};

/// Surface the normalizer's coercion failures as field failures.
pub(crate) fn check(column: &ResolvedColumn, value: &CellValue) -> Option<FieldFailure> {
    match value {
        CellValue::Invalid(failure) => Some(FieldFailure {
            column: column.key.clone(),
            kind: FailureKind::Coercion,
            rule: None,
            message: failure.to_string(),
        }),
        _ => None,
    }
}
