//! HTTP trigger.
//!
//! | Route                              | Purpose                        |
//! |------------------------------------|--------------------------------|
//! | `POST /api/start_extraction`       | start a run in the background  |
//! | `GET /api/workflows/{workflow_id}` | status of a started run        |
//! | `GET /health`                      | liveness probe                 |

mod error;
mod handlers;
mod models;
mod registry;

pub use error::ServerError;
pub use models::{RunStatus, StartExtractionRequest, StartExtractionResponse};
pub use registry::RunRegistry;

use crate::config::Settings;
use crate::secrets::SecretStore;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state of the HTTP trigger.
pub struct AppState {
    pub settings: Settings,
    pub secrets: Arc<dyn SecretStore>,
    pub registry: RunRegistry,
}

impl AppState {
    pub fn new(settings: Settings, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            settings,
            secrets,
            registry: RunRegistry::new(),
        }
    }
}

/// Builds the router of the HTTP trigger.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/start_extraction", post(handlers::start_extraction))
        .route("/api/workflows/{workflow_id}", get(handlers::workflow_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the HTTP trigger on `addr` until Ctrl+C is received.
///
/// # Errors
///
/// Returns [`ServerError`] if the socket cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "Listening for extraction requests");

    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::StaticSecretStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn state_with(settings: Settings) -> Arc<AppState> {
        let secrets = StaticSecretStore::new().with_token("guid-1", "stored_pat");
        Arc::new(AppState::new(settings, Arc::new(secrets)))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let response = router(state_with(Settings::default()))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn rejects_missing_identifier() {
        let response = router(state_with(Settings::default()))
            .oneshot(post_json("/api/start_extraction", json!({"identifier": " "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["status"], "failed");
    }

    #[tokio::test]
    async fn rejects_identifier_outside_login_grammar() {
        let temp = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.output.dir = temp.path().join("out");
        let state = state_with(settings);

        for identifier in ["../escaped", "octo cat", "user?page=2"] {
            let response = router(Arc::clone(&state))
                .oneshot(post_json(
                    "/api/start_extraction",
                    json!({"identifier": identifier}),
                ))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{identifier}");
            assert_eq!(body_json(response).await["status"], "failed");
        }
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
        assert!(state.registry.get("github_extraction_../escaped").await.is_none());
    }

    #[tokio::test]
    async fn rejects_malformed_body() {
        let response = router(state_with(Settings::default()))
            .oneshot(post_json("/api/start_extraction", json!({"credential_guid": "x"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["status"], "failed");
    }

    #[tokio::test]
    async fn rejects_duplicate_start() {
        let state = state_with(Settings::default());
        assert!(state.registry.try_begin("github_extraction_octocat").await);

        let response = router(Arc::clone(&state))
            .oneshot(post_json("/api/start_extraction", json!({"username": "octocat"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_workflow_is_not_found() {
        let response = router(state_with(Settings::default()))
            .oneshot(
                Request::get("/api/workflows/github_extraction_nobody")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn started_run_completes_in_background() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/octocat")
            .match_header("authorization", "token stored_pat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"login": "octocat", "name": "The Octocat", "followers": 3}"#)
            .expect(2)
            .create_async()
            .await;
        server
            .mock("GET", "/users/octocat/repos")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name": "hello-world", "description": "First repository"}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/users/octocat/repos")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let output = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.github.api_base_url = server.url();
        settings.output.dir = output.path().to_path_buf();
        let state = state_with(settings);

        let response = router(Arc::clone(&state))
            .oneshot(post_json(
                "/api/start_extraction",
                json!({"username": "octocat", "credential_guid": "guid-1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(
            body_json(response).await,
            json!({"status": "started", "workflow_id": "github_extraction_octocat"})
        );

        let mut status = None;
        for _ in 0..100 {
            match state.registry.get("github_extraction_octocat").await {
                Some(RunStatus::Running) | None => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                finished => {
                    status = finished;
                    break;
                }
            }
        }

        match status {
            Some(RunStatus::Completed { repositories, .. }) => assert_eq!(repositories, 1),
            other => panic!("run did not complete: {other:?}"),
        }
        assert!(output.path().join("octocat_quality_metrics.json").is_file());

        let response = router(state)
            .oneshot(
                Request::get("/api/workflows/github_extraction_octocat")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(response).await["status"], "completed");
    }
}
