//! The per-run compliance report.

use std::collections::BTreeMap;

use etl_model::{Artifact, RejectedSample, RunResult, RunStatus, ValidationReport};
use etl_output::artifact_stem;
use serde::{Deserialize, Serialize};

use crate::esrs::EsrsReport;

/// Rejected-row samples kept per report unless configured otherwise.
pub const DEFAULT_SAMPLE_LIMIT: usize = 20;

pub const REPORT_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fixed report schema. Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub customer: String,
    pub run_timestamp: String,
    pub total: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub status: RunStatus,
    pub failures: BTreeMap<String, u64>,
    pub rejected_samples: Vec<RejectedSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esrs: Option<EsrsReport>,
}

impl ComplianceReport {
    pub fn from_run(result: &RunResult, esrs: Option<EsrsReport>) -> Self {
        Self {
            customer: result.customer.clone(),
            run_timestamp: result.run_timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            total: result.total,
            accepted: result.accepted,
            rejected: result.rejected,
            status: result.status,
            failures: result.failures.clone(),
            rejected_samples: result.rejected_samples.clone(),
            esrs,
        }
    }
}

/// The first `limit` rejected rows, each with its failure reasons.
pub fn collect_samples(report: &ValidationReport, limit: usize) -> Vec<RejectedSample> {
    report
        .rejected()
        .take(limit)
        .map(|outcome| RejectedSample {
            row: outcome.row,
            line: outcome.line,
            reasons: outcome.failures.iter().map(ToString::to_string).collect(),
        })
        .collect()
}

/// `<prefix>_<customer>_<timestamp>_report.json`.
pub fn report_name(prefix: &str, result: &RunResult) -> String {
    format!(
        "{}_report.json",
        artifact_stem(prefix, &result.customer, result.run_timestamp)
    )
}

/// Render the report artifact for a run.
pub fn build(
    result: &RunResult,
    esrs: Option<EsrsReport>,
    prefix: &str,
) -> Result<Artifact, ReportError> {
    let report = ComplianceReport::from_run(result, esrs);
    let mut bytes = serde_json::to_vec_pretty(&report)?;
    bytes.push(b'\n');
    Ok(Artifact::new(
        report_name(prefix, result),
        REPORT_CONTENT_TYPE,
        bytes,
    ))
}
