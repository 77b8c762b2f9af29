//! HTTP entry point for manual runs.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use etl_core::{ManualRunResponse, Orchestrator, manual_run, parse_names};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub plain_text_errors: bool,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, plain_text_errors: bool) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            plain_text_errors,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct NamesQuery {
    #[serde(default)]
    names: String,
}

#[derive(Debug, Default, Deserialize)]
struct NamesBody {
    #[serde(default)]
    names: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/manual-run", get(manual_run_query).post(manual_run_body))
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown requested");
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"ok": true, "service": "customer-etl"})),
    )
}

async fn manual_run_query(
    State(state): State<AppState>,
    Query(query): Query<NamesQuery>,
) -> Response {
    dispatch(state, parse_names(&query.names)).await
}

async fn manual_run_body(State(state): State<AppState>, Json(body): Json<NamesBody>) -> Response {
    dispatch(state, body.names).await
}

/// Pipeline work is blocking, so it runs off the async workers.
async fn dispatch(state: AppState, names: Vec<String>) -> Response {
    info!(names = ?names, "manual run requested");
    let orchestrator = Arc::clone(&state.orchestrator);
    let outcome = tokio::task::spawn_blocking(move || manual_run(&orchestrator, &names)).await;
    match outcome {
        Ok(Ok(response)) => render(&response, state.plain_text_errors),
        Ok(Err(err)) => {
            error!(error = %err, "manual run could not start");
            internal_error(&err.to_string())
        }
        Err(err) => {
            error!(error = %err, "manual run task aborted");
            internal_error("manual run task aborted")
        }
    }
}

fn render(response: &ManualRunResponse, plain_text: bool) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match response.body(plain_text) {
        Ok((content_type, body)) => (status, [(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(err) => internal_error(&err.to_string()),
    }
}

fn internal_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "run_failed", "message": message})),
    )
        .into_response()
}
