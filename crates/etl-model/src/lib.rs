pub mod artifact;
pub mod column;
pub mod config;
pub mod error;
pub mod outcome;
pub mod record;
pub mod run;

pub use artifact::{Artifact, ArtifactRef};
pub use column::{ColumnDef, ColumnMap, ColumnRule, ColumnSpec, DataType, ResolvedColumn, RuleDef};
pub use config::{CustomerConfig, FileFormat, MainConfig};
pub use error::{ErrorKind, ModelError};
pub use outcome::{
    FailureKind, FieldFailure, FileVerdict, ValidationOutcome, ValidationReport, Verdict,
};
pub use record::{Cell, CellValue, CoercionFailure, NormalizedRecord, RawRecord, RawValue};
pub use run::{PipelineStage, RejectedSample, RunFailure, RunResult, RunStatus};

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(column: &str) -> FieldFailure {
        FieldFailure {
            column: column.to_string(),
            kind: FailureKind::Rule,
            rule: Some("email".to_string()),
            message: "not a valid email address".to_string(),
        }
    }

    #[test]
    fn validation_report_counts() {
        let report = ValidationReport {
            outcomes: vec![
                ValidationOutcome::from_failures(0, 2, vec![]),
                ValidationOutcome::from_failures(1, 3, vec![failure("email"), failure("email")]),
                ValidationOutcome::from_failures(2, 4, vec![failure("vat")]),
            ],
        };
        assert_eq!(report.total(), 3);
        assert_eq!(report.accepted_count(), 1);
        assert_eq!(report.rejected_count(), 2);
        assert_eq!(report.file_verdict(), FileVerdict::Partial);
        let histogram = report.failure_histogram();
        assert_eq!(histogram.get("email"), Some(&2));
        assert_eq!(histogram.get("vat"), Some(&1));
        assert_eq!(histogram.keys().collect::<Vec<_>>(), vec!["email", "vat"]);
    }

    #[test]
    fn empty_report_fails() {
        assert_eq!(ValidationReport::default().file_verdict(), FileVerdict::Fail);
    }

    #[test]
    fn stage_machine_is_sequential() {
        let mut stage = PipelineStage::Pending;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            visited.push(next);
            stage = next;
        }
        assert_eq!(
            visited,
            vec![
                PipelineStage::Pending,
                PipelineStage::Fetching,
                PipelineStage::Normalizing,
                PipelineStage::Validating,
                PipelineStage::Persisting,
                PipelineStage::Building,
                PipelineStage::Uploading,
                PipelineStage::Done,
            ]
        );
        assert!(PipelineStage::Failed.is_terminal());
        assert!(PipelineStage::Skipped.next().is_none());
    }

    #[test]
    fn run_result_serializes() {
        let timestamp = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(6, 30, 0))
            .expect("valid timestamp");
        let result = RunResult::failed(
            "acme",
            timestamp,
            RunFailure {
                stage: PipelineStage::Fetching,
                kind: ErrorKind::NotFound,
                message: "no source file".to_string(),
            },
        );
        let json = serde_json::to_string(&result).expect("serialize result");
        let round: RunResult = serde_json::from_str(&json).expect("deserialize result");
        assert_eq!(round, result);
        assert!(json.contains(r#""status":"failed""#));
        assert!(json.contains(r#""kind":"NotFound""#));
    }
}
