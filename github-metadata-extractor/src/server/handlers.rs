//! HTTP route handlers.

use super::models::{RunStatus, StartExtractionRequest, StartExtractionResponse};
use super::AppState;
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::secrets::CredentialSource;
use crate::sink::SinkKind;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::{error, info, Instrument};

type StartResult = (StatusCode, Json<StartExtractionResponse>);

fn failed(status: StatusCode, error: impl Into<String>) -> StartResult {
    (
        status,
        Json(StartExtractionResponse::Failed {
            error: error.into(),
        }),
    )
}

/// GET `/health`
pub async fn health() -> &'static str {
    "ok"
}

/// POST `/api/start_extraction` - Starts a run in the background.
pub async fn start_extraction(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StartExtractionRequest>, JsonRejection>,
) -> StartResult {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return failed(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let identifier = request.identifier.trim().to_string();
    if identifier.is_empty() {
        return failed(StatusCode::BAD_REQUEST, "identifier is required");
    }

    let credential = credential_source(request.token, request.credential_reference);
    let config = PipelineConfig::from_settings(identifier, &state.settings)
        .with_sink(request.sink.unwrap_or(SinkKind::Files))
        .with_analysis(request.analyze.unwrap_or(true));
    let pipeline = match Pipeline::from_settings(
        config,
        credential,
        &state.settings,
        Arc::clone(&state.secrets),
    ) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "Failed to start workflow");
            return failed(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    let workflow_id = pipeline.workflow_id();
    if !state.registry.try_begin(&workflow_id).await {
        return failed(
            StatusCode::CONFLICT,
            format!("workflow '{workflow_id}' is already running"),
        );
    }

    info!(workflow_id = %workflow_id, "Started workflow");
    let registry = state.registry.clone();
    let id = workflow_id.clone();
    tokio::spawn(
        async move {
            let status = match pipeline.run().await {
                Ok(report) => RunStatus::Completed {
                    repositories: report.repositories.len(),
                    metrics: report.metrics,
                    sink: report.sink,
                    steps: report.steps,
                },
                Err(e) => {
                    error!(error = %e, "Workflow failed");
                    RunStatus::Failed {
                        step: e.failed_step().map(str::to_string),
                        error: e.to_string(),
                    }
                }
            };
            registry.finish(&id, status).await;
        }
        .in_current_span(),
    );

    (
        StatusCode::ACCEPTED,
        Json(StartExtractionResponse::Started { workflow_id }),
    )
}

/// GET `/api/workflows/{workflow_id}` - Status of a run.
pub async fn workflow_status(
    State(state): State<Arc<AppState>>,
    Path(workflow_id): Path<String>,
) -> Result<Json<RunStatus>, (StatusCode, Json<StartExtractionResponse>)> {
    match state.registry.get(&workflow_id).await {
        Some(status) => Ok(Json(status)),
        None => Err(failed(
            StatusCode::NOT_FOUND,
            format!("unknown workflow '{workflow_id}'"),
        )),
    }
}

/// Inline tokens take precedence over secret references.
fn credential_source(token: Option<String>, reference: Option<String>) -> CredentialSource {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    match (non_empty(token), non_empty(reference)) {
        (Some(token), _) => CredentialSource::Token(token),
        (None, Some(reference)) => CredentialSource::Reference(reference),
        (None, None) => CredentialSource::None,
    }
}
