//! Fan customers out over a bounded worker pool.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDateTime};
use etl_model::{CustomerConfig, ErrorKind, PipelineStage, RunFailure, RunResult};
use etl_registry::{ConfigSnapshot, RejectedConfig};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{info, info_span, warn};

use crate::error::OrchestratorError;
use crate::pipeline::run_customer;
use crate::settings::{Collaborators, PipelineSettings};

/// A requested customer name and its outcome, `None` when the name is not
/// configured.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedRun {
    pub requested: String,
    pub result: Option<RunResult>,
}

pub struct Orchestrator {
    collaborators: Collaborators,
    settings: PipelineSettings,
    pool: ThreadPool,
}

impl Orchestrator {
    pub fn new(
        collaborators: Collaborators,
        settings: PipelineSettings,
    ) -> Result<Self, OrchestratorError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(settings.workers.max(1))
            .thread_name(|idx| format!("etl-worker-{idx}"))
            .build()?;
        Ok(Self {
            collaborators,
            settings,
            pool,
        })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Load the configuration snapshot this invocation will use throughout.
    pub fn snapshot(&self) -> Result<ConfigSnapshot, OrchestratorError> {
        Ok(self.collaborators.config.snapshot()?)
    }

    /// Process every configured customer. Disabled ones come back `Skipped`,
    /// unloadable configurations come back `Failed` after the rest.
    pub fn run_scheduled(&self) -> Result<Vec<RunResult>, OrchestratorError> {
        self.run_scheduled_at(Local::now().naive_local())
    }

    pub fn run_scheduled_at(
        &self,
        run_timestamp: NaiveDateTime,
    ) -> Result<Vec<RunResult>, OrchestratorError> {
        let span = info_span!("scheduled_run", timestamp = %run_timestamp);
        let _guard = span.enter();
        let start = Instant::now();

        let snapshot = self.snapshot()?;
        let mut results = self.run_many(&snapshot, snapshot.customers(), run_timestamp);
        results.extend(
            snapshot
                .rejected()
                .iter()
                .map(|rejected| rejected_result(rejected, run_timestamp)),
        );

        info!(
            customers = results.len(),
            failed = results.iter().filter(|r| r.is_failed()).count(),
            duration_ms = start.elapsed().as_millis(),
            "scheduled run complete"
        );
        Ok(results)
    }

    /// Process the named customers, in request order. Names are matched
    /// ignoring case; repeated names run once.
    pub fn run_selected(
        &self,
        names: &[String],
        run_timestamp: NaiveDateTime,
    ) -> Result<Vec<SelectedRun>, OrchestratorError> {
        let span = info_span!("manual_run", timestamp = %run_timestamp, names = names.len());
        let _guard = span.enter();

        let snapshot = self.snapshot()?;
        let mut requested: Vec<&str> = Vec::with_capacity(names.len());
        for name in names {
            if !requested.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
                requested.push(name);
            }
        }

        let configs: Vec<Arc<CustomerConfig>> = requested
            .iter()
            .filter_map(|name| snapshot.find(name).cloned())
            .collect();
        let mut completed = self.run_many(&snapshot, &configs, run_timestamp).into_iter();

        let runs = requested
            .into_iter()
            .map(|name| {
                let result = if snapshot.find(name).is_some() {
                    completed.next()
                } else if let Some(rejected) = snapshot.find_rejected(name) {
                    Some(rejected_result(rejected, run_timestamp))
                } else {
                    warn!(customer = name, "unknown customer requested");
                    None
                };
                SelectedRun {
                    requested: name.to_string(),
                    result,
                }
            })
            .collect();
        Ok(runs)
    }

    /// Results come back in the order of `configs`, whatever the completion
    /// order was.
    fn run_many(
        &self,
        snapshot: &ConfigSnapshot,
        configs: &[Arc<CustomerConfig>],
        run_timestamp: NaiveDateTime,
    ) -> Vec<RunResult> {
        let base_columns = snapshot.base_columns();
        self.pool.install(|| {
            configs
                .par_iter()
                .map(|config| {
                    run_customer(
                        &self.collaborators,
                        &self.settings,
                        base_columns,
                        config,
                        run_timestamp,
                    )
                })
                .collect()
        })
    }
}

fn rejected_result(rejected: &RejectedConfig, run_timestamp: NaiveDateTime) -> RunResult {
    warn!(customer = %rejected.name, reason = %rejected.reason, "configuration rejected");
    RunResult::failed(
        &rejected.name,
        run_timestamp,
        RunFailure {
            stage: PipelineStage::Pending,
            kind: ErrorKind::ConfigError,
            message: rejected.reason.clone(),
        },
    )
}
