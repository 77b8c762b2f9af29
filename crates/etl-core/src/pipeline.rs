//! One customer's pipeline.
//!
//! Stages run strictly in order:
//! 1. **Pending**: resolve the ColumnSpec and export options
//! 2. **Fetching**: locate and decode the newest source file
//! 3. **Normalizing**: map headers to spec keys and coerce values
//! 4. **Validating**: classify rows as accepted or rejected
//! 5. **Persisting**: upsert accepted rows in one transaction
//! 6. **Building**: export artifact and report
//! 7. **Uploading**: store both artifacts, or neither
//!
//! Any stage error ends the run as `Failed` with the stage and error kind.

use std::time::Instant;

use chrono::NaiveDateTime;
use etl_model::{
    ColumnMap, ColumnSpec, CustomerConfig, ErrorKind, FileFormat, FileVerdict, ModelError,
    NormalizedRecord, PipelineStage, RunResult, RunStatus,
};
use etl_output::ExportOptions;
use etl_registry::resolve;
use etl_report::collect_samples;
use etl_transform::Normalizer;
use etl_validate::ValidationEngine;
use tracing::{debug, info, info_span, warn};

use crate::error::PipelineError;
use crate::settings::{Collaborators, PipelineSettings};
use crate::stage::StageTracker;

/// Run the full pipeline for one customer. Failures are captured in the
/// returned result, never propagated.
pub fn run_customer(
    collaborators: &Collaborators,
    settings: &PipelineSettings,
    base_columns: &ColumnMap,
    config: &CustomerConfig,
    run_timestamp: NaiveDateTime,
) -> RunResult {
    let span = info_span!("customer", customer = %config.name);
    let _guard = span.enter();

    if !config.enabled {
        info!("customer disabled, skipping");
        return RunResult::skipped(&config.name, run_timestamp);
    }

    let start = Instant::now();
    let mut result = RunResult {
        status: RunStatus::Failed,
        state: PipelineStage::Pending,
        ..RunResult::skipped(&config.name, run_timestamp)
    };
    let mut tracker = StageTracker::new();

    match execute(
        collaborators,
        settings,
        base_columns,
        config,
        &mut tracker,
        &mut result,
    ) {
        Ok(()) => {
            result.state = PipelineStage::Done;
            info!(
                status = ?result.status,
                total = result.total,
                accepted = result.accepted,
                rejected = result.rejected,
                duration_ms = start.elapsed().as_millis(),
                "customer run complete"
            );
        }
        Err(error) => {
            warn!(
                stage = %error.stage,
                kind = %error.kind,
                error = %error.message,
                duration_ms = start.elapsed().as_millis(),
                "customer run failed"
            );
            result.status = RunStatus::Failed;
            result.state = PipelineStage::Failed;
            result.artifacts.clear();
            result.error = Some(error.into());
        }
    }
    result
}

fn execute(
    collaborators: &Collaborators,
    settings: &PipelineSettings,
    base_columns: &ColumnMap,
    config: &CustomerConfig,
    tracker: &mut StageTracker,
    result: &mut RunResult,
) -> Result<(), PipelineError> {
    // 1. Pending
    let (spec, export) = info_span!("stage", stage = %tracker.current())
        .in_scope(|| prepare(base_columns, config))?;

    // 2. Fetching
    let source = tracker.advance().in_scope(|| {
        collaborators
            .source
            .fetch_latest(&config.source_container)
            .map_err(|e| PipelineError::ingest(&e))
    })?;
    info!(
        file = %source.name,
        encoding = %source.encoding,
        rows = source.records.len(),
        "fetched source file"
    );
    result.source = Some(source.name.clone());
    result.encoding = Some(source.encoding.clone());

    // 3. Normalizing
    let records = tracker.advance().in_scope(|| {
        let normalizer = Normalizer::new(&spec);
        let unmapped = normalizer.unmapped_headers(&source.headers);
        if !unmapped.is_empty() {
            debug!(headers = ?unmapped, "source headers outside the column spec");
        }
        normalizer.normalize_all(&source.records)
    });

    // 4. Validating
    let report = tracker
        .advance()
        .in_scope(|| ValidationEngine::new(&spec).validate_all(&records));
    result.total = report.total() as u64;
    result.accepted = report.accepted_count() as u64;
    result.rejected = report.rejected_count() as u64;
    result.failures = report.failure_histogram();
    result.rejected_samples = collect_samples(&report, settings.sample_limit);
    if report.file_verdict() == FileVerdict::Fail {
        return Err(PipelineError::new(
            PipelineStage::Validating,
            ErrorKind::ValidationFailure,
            format!("no accepted rows out of {}", report.total()),
        ));
    }
    result.status = if report.rejected_count() == 0 {
        RunStatus::Success
    } else {
        RunStatus::PartialSuccess
    };
    let accepted: Vec<NormalizedRecord> = records
        .into_iter()
        .zip(&report.outcomes)
        .filter(|(_, outcome)| outcome.is_accepted())
        .map(|(record, _)| record)
        .collect();

    // 5. Persisting
    let persisted = tracker.advance().in_scope(|| {
        collaborators
            .database
            .upsert_records(&config.name, &spec, &accepted)
            .map_err(|e| PipelineError::persist(&e))
    })?;
    info!(table = %persisted.table, rows = persisted.rows, "persisted accepted rows");

    // 6. Building
    let artifacts = tracker.advance().in_scope(|| {
        let name = etl_output::artifact_name(
            &settings.file_prefix,
            &config.name,
            result.run_timestamp,
            export.format,
        );
        let export_artifact = etl_output::build(&accepted, &spec, &export, name)
            .map_err(|e| PipelineError::build(&e))?;
        let esrs = settings.esrs.as_ref().and_then(|columns| {
            let esrs = etl_report::compute_esrs(&accepted, &spec, columns);
            if esrs.is_none() {
                debug!("waste columns missing, report has no ESRS section");
            }
            esrs
        });
        let report_artifact = etl_report::build(&*result, esrs, &settings.file_prefix)
            .map_err(|e| PipelineError::report(&e))?;
        Ok::<_, PipelineError>([export_artifact, report_artifact])
    })?;

    // 7. Uploading
    let stored = tracker.advance().in_scope(|| {
        collaborators
            .artifacts
            .upload_all(&config.destination_container, &artifacts)
            .map_err(|e| PipelineError::upload(&e))
    })?;
    for artifact in &stored {
        info!(artifact = %artifact.name, bytes = artifact.bytes, "uploaded artifact");
    }
    result.artifacts = stored;

    let _done = tracker.advance();
    if let Err(error) = collaborators.source.archive(&source) {
        warn!(file = %source.name, %error, "failed to archive source file");
    }
    Ok(())
}

/// Configuration checks that fail the customer before anything is fetched.
fn prepare(
    base_columns: &ColumnMap,
    config: &CustomerConfig,
) -> Result<(ColumnSpec, ExportOptions), PipelineError> {
    let spec = resolve(base_columns, config).map_err(|e| PipelineError::config(&e))?;
    let format: FileFormat = config.file_format.parse().map_err(|e: ModelError| {
        PipelineError::new(PipelineStage::Pending, ErrorKind::ConfigError, e.to_string())
    })?;
    let export = ExportOptions::new(format, &config.file_encoding, config.delimiter())
        .map_err(|e| PipelineError::export_options(&e))?;
    debug!(columns = spec.len(), format = %format, "resolved column spec");
    Ok((spec, export))
}
