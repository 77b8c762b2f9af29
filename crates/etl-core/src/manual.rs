//! Manual runs for a list of customer names.
//!
//! The request is `200` when every name is a configured customer and `400`
//! with `invalid_name` when the list is empty or any name is unknown. Known
//! customers in a `400` request are still run and reported.

use chrono::{Local, NaiveDateTime};
use etl_model::{RunResult, RunStatus};
use serde::Serialize;
use serde_json::json;

use crate::error::OrchestratorError;
use crate::orchestrator::Orchestrator;

pub const INVALID_NAME: &str = "invalid_name";

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_FAILED: u16 = 500;

/// Split a `names` parameter on commas, lowercased and trimmed, blanks dropped.
pub fn parse_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Normalize names that arrived as a list.
pub fn clean_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .flat_map(|name| parse_names(name.as_ref()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryResponse {
    pub status: u16,
    /// `success`, `partial_success`, `failed`, `skipped` or `invalid_name`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<RunResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManualRunEntry {
    /// 1-based position in the request.
    pub run: usize,
    pub customer: String,
    pub response: EntryResponse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManualRunResponse {
    pub status: u16,
    pub entries: Vec<ManualRunEntry>,
    pub unknown: Vec<String>,
}

impl ManualRunResponse {
    fn invalid(entries: Vec<ManualRunEntry>, unknown: Vec<String>) -> Self {
        Self {
            status: STATUS_BAD_REQUEST,
            entries,
            unknown,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Results of the customers that actually ran.
    pub fn results(&self) -> impl Iterator<Item = &RunResult> {
        self.entries
            .iter()
            .filter_map(|entry| entry.response.detail.as_ref())
    }

    /// Response body and its content type. A `400` is a JSON envelope unless
    /// `plain_text` asks for the bare `invalid_name` text.
    pub fn body(&self, plain_text: bool) -> serde_json::Result<(&'static str, String)> {
        if self.is_ok() {
            return Ok(("application/json", serde_json::to_string(&self.entries)?));
        }
        if plain_text {
            return Ok(("text/plain; charset=utf-8", INVALID_NAME.to_string()));
        }
        let envelope = json!({
            "error": INVALID_NAME,
            "unknown": self.unknown,
            "entries": self.entries,
        });
        Ok(("application/json", serde_json::to_string(&envelope)?))
    }
}

fn entry_for(result: RunResult) -> EntryResponse {
    let status = match result.status {
        RunStatus::Failed => STATUS_FAILED,
        RunStatus::Success | RunStatus::PartialSuccess | RunStatus::Skipped => STATUS_OK,
    };
    let outcome = serde_json::to_value(result.status)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default();
    EntryResponse {
        status,
        outcome,
        detail: Some(result),
    }
}

fn invalid_entry() -> EntryResponse {
    EntryResponse {
        status: STATUS_BAD_REQUEST,
        outcome: INVALID_NAME.to_string(),
        detail: None,
    }
}

pub fn manual_run(
    orchestrator: &Orchestrator,
    names: &[String],
) -> Result<ManualRunResponse, OrchestratorError> {
    manual_run_at(orchestrator, names, Local::now().naive_local())
}

pub fn manual_run_at(
    orchestrator: &Orchestrator,
    names: &[String],
    run_timestamp: NaiveDateTime,
) -> Result<ManualRunResponse, OrchestratorError> {
    let names = clean_names(names);
    if names.is_empty() {
        tracing::warn!("manual run without customer names");
        return Ok(ManualRunResponse::invalid(Vec::new(), Vec::new()));
    }

    let runs = orchestrator.run_selected(&names, run_timestamp)?;
    let mut unknown = Vec::new();
    let entries: Vec<ManualRunEntry> = runs
        .into_iter()
        .enumerate()
        .map(|(idx, run)| {
            let response = match run.result {
                Some(result) => entry_for(result),
                None => {
                    unknown.push(run.requested.clone());
                    invalid_entry()
                }
            };
            ManualRunEntry {
                run: idx + 1,
                customer: run.requested,
                response,
            }
        })
        .collect();

    if unknown.is_empty() {
        Ok(ManualRunResponse {
            status: STATUS_OK,
            entries,
            unknown,
        })
    } else {
        Ok(ManualRunResponse::invalid(entries, unknown))
    }
}
