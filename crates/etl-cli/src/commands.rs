use anyhow::{Context, Result};
use etl_cli::config::AppConfig;
use etl_cli::logging::{log_data_enabled, redact_value};
use etl_cli::server::{self, AppState};
use etl_core::{clean_names, manual_run};
use etl_model::RunResult;
use etl_registry::{ConfigStore, describe, resolve};
use tracing::{info_span, trace};

use crate::cli::{CustomersArgs, RunArgs, ServeArgs};
use crate::summary::{print_columns, print_manual, print_summary};

/// Returns true when every customer that ran succeeded.
pub fn run(config: &AppConfig, args: &RunArgs) -> Result<bool> {
    let orchestrator = config.orchestrator()?;

    if let Some(names) = &args.names {
        let response = manual_run(&orchestrator, &clean_names([names]))
            .context("manual run")?;
        response.results().for_each(trace_rejected);
        if args.json {
            let (_, body) = response.body(false).context("render manual run")?;
            println!("{body}");
        } else {
            print_manual(&response);
        }
        return Ok(response.is_ok() && !response.results().any(RunResult::is_failed));
    }

    let results = orchestrator.run_scheduled().context("scheduled run")?;
    results.iter().for_each(trace_rejected);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&results).context("render results")?
        );
    } else {
        print_summary(&results);
    }
    Ok(!results.iter().any(RunResult::is_failed))
}

pub fn customers(config: &AppConfig, args: &CustomersArgs) -> Result<bool> {
    let snapshot = config
        .config_store()
        .snapshot()
        .context("load customer configuration")?;

    if args.json {
        let summary = describe(&snapshot);
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("render customers")?
        );
        return Ok(snapshot.rejected().is_empty());
    }

    let mut ok = snapshot.rejected().is_empty();
    for customer in snapshot.customers() {
        println!(
            "{} ({}, {}, {}{})",
            customer.name,
            customer.file_format,
            customer.file_encoding,
            customer.source_container,
            if customer.enabled { "" } else { ", disabled" }
        );
        match resolve(snapshot.base_columns(), customer) {
            Ok(spec) => print_columns(&spec),
            Err(error) => {
                ok = false;
                eprintln!("  error: {error}");
            }
        }
    }
    for rejected in snapshot.rejected() {
        eprintln!("{}: rejected: {}", rejected.name, rejected.reason);
    }
    Ok(ok)
}

pub fn serve(config: &AppConfig, args: &ServeArgs) -> Result<bool> {
    let mut config = config.clone();
    if let Some(bind) = &args.bind {
        config.server.bind.clone_from(bind);
    }
    let addr = config.bind_addr()?;
    let plain_text = args.plain_text_errors || config.server.plain_text_errors;
    let state = AppState::new(config.orchestrator()?, plain_text);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    runtime.block_on(server::serve(state, addr))?;
    Ok(true)
}

/// Rejected rows at trace level; reasons quote raw values, so they are
/// redacted unless `--log-data` was given.
fn trace_rejected(result: &RunResult) {
    if result.rejected_samples.is_empty() {
        return;
    }
    let span = info_span!("rejected", customer = %result.customer);
    let _guard = span.enter();
    if !log_data_enabled() {
        trace!(samples = result.rejected_samples.len(), "rejected row values redacted");
    }
    for sample in &result.rejected_samples {
        for reason in &sample.reasons {
            trace!(line = sample.line, reason = redact_value(reason), "rejected row");
        }
    }
}
