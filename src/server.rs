//! HTTP server for report requests.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/request-report` | Process a report request |
//! | `GET`  | `/` | Liveness message |
//! | `GET`  | `/health` | Health check including store connectivity |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "report not found: r1" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `store_error` (502).
//! AI or search outages never produce an error response; those requests
//! complete with the fallback report.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the browser frontend
//! can call the API directly.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use smehub_report_core::models::{ReportRequest, ReportStatus};
use smehub_report_core::store::DocumentStore;

use crate::config::Config;
use crate::generator::ReportGenerator;
use crate::handler::{HandlerError, ReportHandler, ReportSource};
use crate::store::create_store;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    handler: Arc<ReportHandler>,
}

impl AppState {
    pub fn new(handler: Arc<ReportHandler>) -> Self {
        Self { handler }
    }

    fn store(&self) -> &Arc<dyn DocumentStore> {
        self.handler.store()
    }
}

/// Build the router with all routes and the CORS layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/api/request-report", post(handle_request_report))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind`.
///
/// Builds the store and generator from configuration once; every request
/// shares them. Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = create_store(&config.store)?;
    let generator = ReportGenerator::from_config(config)?;
    let state = AppState::new(Arc::new(ReportHandler::new(store, generator)));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(
        bind = %config.server.bind,
        store = state.store().name(),
        completion = %config.completion.provider,
        search = %config.search.provider,
        "report server listening"
    );
    println!("SmeHub report server listening on http://{}", config.server.bind);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

impl From<HandlerError> for AppError {
    fn from(err: HandlerError) -> Self {
        let message = err.to_string();
        let (status, code) = match err {
            HandlerError::Validation(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            HandlerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            HandlerError::Store(_) => (StatusCode::BAD_GATEWAY, "store_error"),
        };
        AppError {
            status,
            code: code.to_string(),
            message,
        }
    }
}

// ============ GET / ============

#[derive(Serialize)]
struct RootResponse {
    message: String,
    status: String,
}

async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "SmeHub Report API is running".to_string(),
        status: "healthy".to_string(),
    })
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    /// Whether the document store answered a ping.
    store_connected: bool,
    /// Same value under the name existing frontends read.
    firebase_connected: bool,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_connected = match state.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            let error = format!("{:#}", e);
            error!(error = %error, "store ping failed");
            false
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store_connected,
        firebase_connected: store_connected,
    })
}

// ============ POST /api/request-report ============

/// JSON response body for a handled report request.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportResponse {
    success: bool,
    message: String,
    report_id: String,
    source: ReportSource,
    status: ReportStatus,
}

async fn handle_request_report(
    State(state): State<AppState>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<ReportResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;
    info!(report_id = %request.report_id, "received report request");

    let outcome = state.handler.handle(&request).await.map_err(|e| {
        let error = e.to_string();
        error!(report_id = %request.report_id, error = %error, "report request failed");
        AppError::from(e)
    })?;

    let message = match outcome.source {
        ReportSource::Generated => "Report generated successfully",
        ReportSource::Fallback => "Report generated successfully from template",
    };

    Ok(Json(ReportResponse {
        success: true,
        message: message.to_string(),
        report_id: outcome.report_id,
        source: outcome.source,
        status: outcome.status,
    }))
}
