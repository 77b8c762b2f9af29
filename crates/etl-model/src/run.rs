//! Per-customer run results and the pipeline stage machine.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactRef;
use crate::error::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    PartialSuccess,
    Failed,
    Skipped,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::PartialSuccess => "partial_success",
            RunStatus::Failed => "failed",
            RunStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// States of one customer's pipeline.
///
/// The happy path is strictly sequential; `Failed` and `Skipped` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    Pending,
    Fetching,
    Normalizing,
    Validating,
    Persisting,
    Building,
    Uploading,
    Done,
    Failed,
    Skipped,
}

impl PipelineStage {
    /// The next stage on the happy path, `None` for terminal states.
    pub fn next(self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Pending => Some(PipelineStage::Fetching),
            PipelineStage::Fetching => Some(PipelineStage::Normalizing),
            PipelineStage::Normalizing => Some(PipelineStage::Validating),
            PipelineStage::Validating => Some(PipelineStage::Persisting),
            PipelineStage::Persisting => Some(PipelineStage::Building),
            PipelineStage::Building => Some(PipelineStage::Uploading),
            PipelineStage::Uploading => Some(PipelineStage::Done),
            PipelineStage::Done | PipelineStage::Failed | PipelineStage::Skipped => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineStage::Done | PipelineStage::Failed | PipelineStage::Skipped
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Pending => "pending",
            PipelineStage::Fetching => "fetching",
            PipelineStage::Normalizing => "normalizing",
            PipelineStage::Validating => "validating",
            PipelineStage::Persisting => "persisting",
            PipelineStage::Building => "building",
            PipelineStage::Uploading => "uploading",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
            PipelineStage::Skipped => "skipped",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error that ended a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    /// Stage that was active when the error occurred.
    pub stage: PipelineStage,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedSample {
    pub row: usize,
    pub line: u64,
    pub reasons: Vec<String>,
}

/// Aggregate outcome for one customer in one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub customer: String,
    pub run_timestamp: NaiveDateTime,
    pub status: RunStatus,
    /// Terminal pipeline state: `Done`, `Failed` or `Skipped`.
    pub state: PipelineStage,
    pub total: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub failures: BTreeMap<String, u64>,
    pub rejected_samples: Vec<RejectedSample>,
    pub artifacts: Vec<ArtifactRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunFailure>,
}

impl RunResult {
    fn empty(customer: impl Into<String>, run_timestamp: NaiveDateTime) -> Self {
        Self {
            customer: customer.into(),
            run_timestamp,
            status: RunStatus::Skipped,
            state: PipelineStage::Skipped,
            total: 0,
            accepted: 0,
            rejected: 0,
            failures: BTreeMap::new(),
            rejected_samples: Vec::new(),
            artifacts: Vec::new(),
            source: None,
            encoding: None,
            error: None,
        }
    }

    /// Result for a disabled customer.
    pub fn skipped(customer: impl Into<String>, run_timestamp: NaiveDateTime) -> Self {
        Self::empty(customer, run_timestamp)
    }

    /// Result for a customer whose pipeline stopped with an error.
    pub fn failed(
        customer: impl Into<String>,
        run_timestamp: NaiveDateTime,
        failure: RunFailure,
    ) -> Self {
        Self {
            status: RunStatus::Failed,
            state: PipelineStage::Failed,
            error: Some(failure),
            ..Self::empty(customer, run_timestamp)
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == RunStatus::Failed
    }
}
