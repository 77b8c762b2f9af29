use etl_model::{CellValue, FailureKind, FieldFailure, ResolvedColumn};

/// A required column must hold a value. Invalid cells count as present; the
/// type check reports them.
pub(crate) fn check(column: &ResolvedColumn, value: &CellValue) -> Option<FieldFailure> {
    (column.required && value.is_null()).then(|| FieldFailure {
        column: column.key.clone(),
        kind: FailureKind::Missing,
        rule: None,
        message: format!("{} is required", column.name),
    })
}
