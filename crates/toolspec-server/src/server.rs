// toolspec-server/src/server.rs
// ============================================================================
// Module: HTTP Transport
// Description: axum routing and encoding for the registry service.
// Purpose: Decode requests, supply timestamps, and encode structured errors.
// Dependencies: axum, tokio, serde_json, toolspec-config
// ============================================================================

//! ## Overview
//! The transport layer owns only HTTP concerns: routing, body limits, JSON
//! decoding, status-code mapping, and audit emission. Every registry decision
//! is delegated to [`RegistryService`] with a caller-supplied timestamp.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use toolspec_config::ToolSpecConfig;
use toolspec_core::InstallId;
use toolspec_core::Timestamp;
use toolspec_store_sqlite::SqliteRegistryStore;

use crate::audit::AuditSink;
use crate::audit::RegistryAuditEvent;
use crate::audit::RegistryAuditEventParams;
use crate::audit::StderrAuditSink;
use crate::reviews::ReviewCatalog;
use crate::service::RegistryService;
use crate::service::ServiceError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server startup and transport errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration was invalid for serving.
    #[error("server config error: {0}")]
    Config(String),
    /// Storage backend failed to open.
    #[error("server store error: {0}")]
    Store(String),
    /// Transport-level failure.
    #[error("server transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared server state for HTTP handlers.
#[derive(Clone)]
struct ServerState {
    /// Transport-free registry operations.
    service: RegistryService,
    /// Audit sink for request events.
    audit: Arc<dyn AuditSink>,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
}

/// Query parameters carrying an optional install id.
#[derive(Debug, Deserialize)]
struct InstallIdQuery {
    /// Install identifier, when the caller has one.
    install_id: Option<String>,
}

impl InstallIdQuery {
    /// Returns the trimmed install id, discarding empty values.
    fn to_install_id(&self) -> Option<InstallId> {
        self.install_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(InstallId::from)
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Builds the registry router over an explicit service and audit sink.
#[must_use]
pub fn build_router(
    service: RegistryService,
    audit: Arc<dyn AuditSink>,
    max_body_bytes: usize,
) -> Router {
    let state = Arc::new(ServerState {
        service,
        audit,
        max_body_bytes,
    });
    Router::new()
        .route("/", get(handle_index))
        .route("/installs", post(handle_register))
        .route("/installs/{install_id}/revoke", post(handle_revoke))
        .route("/access-status", get(handle_access_status))
        .route("/submissions", post(handle_submit))
        .route("/reviews", get(handle_reviews_list))
        .route("/reviews/{tool_slug}", get(handle_review_detail))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Runs the registry server until the listener fails.
///
/// # Errors
///
/// Returns [`ServerError`] when the store cannot be opened, the bind address
/// is invalid, or the transport fails.
pub async fn run_server(config: &ToolSpecConfig) -> Result<(), ServerError> {
    let store: toolspec_core::SharedRegistryStore = match &config.store.sqlite {
        Some(sqlite) => Arc::new(
            SqliteRegistryStore::new(sqlite).map_err(|err| ServerError::Store(err.to_string()))?,
        ),
        None => Arc::new(toolspec_core::InMemoryRegistryStore::new()),
    };
    let service = RegistryService::new(store, ReviewCatalog::seeded());
    let addr = config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
    let app = build_router(service, Arc::new(StderrAuditSink), config.server.max_body_bytes);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
    axum::serve(listener, app)
        .await
        .map_err(|_| ServerError::Transport("http server failed".to_string()))
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Handles `GET /`.
async fn handle_index(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let payload = state.service.service_index();
    record(&state, "index", StatusCode::OK, None, None, None, 0);
    (StatusCode::OK, axum::Json(payload))
}

/// Handles `POST /installs`.
async fn handle_register(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    match state.service.register_install(now()) {
        Ok(created) => {
            record(
                &state,
                "register",
                StatusCode::CREATED,
                Some(created.install_id.as_str().to_string()),
                None,
                None,
                0,
            );
            (StatusCode::CREATED, axum::Json(to_value(&created)))
        }
        Err(error) => encode_error(&state, "register", None, &error, 0),
    }
}

/// Handles `POST /installs/{install_id}/revoke`.
async fn handle_revoke(
    State(state): State<Arc<ServerState>>,
    Path(install_id): Path<String>,
) -> impl IntoResponse {
    let install_id = InstallId::from(install_id.trim());
    match state.service.revoke_install(&install_id, now()) {
        Ok(outcome) => {
            record(
                &state,
                "revoke",
                StatusCode::OK,
                Some(install_id.as_str().to_string()),
                None,
                None,
                0,
            );
            (StatusCode::OK, axum::Json(to_value(&outcome)))
        }
        Err(error) => {
            encode_error(&state, "revoke", Some(install_id.as_str().to_string()), &error, 0)
        }
    }
}

/// Handles `GET /access-status`.
async fn handle_access_status(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<InstallIdQuery>,
) -> impl IntoResponse {
    let install_id = query.to_install_id();
    match state.service.access_status(install_id.as_ref()) {
        Ok(report) => {
            record(
                &state,
                "access_status",
                StatusCode::OK,
                install_id.map(|id| id.as_str().to_string()),
                report.deny_reason.clone(),
                None,
                0,
            );
            (StatusCode::OK, axum::Json(to_value(&report)))
        }
        Err(error) => encode_error(
            &state,
            "access_status",
            install_id.map(|id| id.as_str().to_string()),
            &error,
            0,
        ),
    }
}

/// Handles `POST /submissions`.
async fn handle_submit(State(state): State<Arc<ServerState>>, bytes: Bytes) -> impl IntoResponse {
    let request_bytes = bytes.len();
    if request_bytes > state.max_body_bytes {
        let payload = json!({
            "error": "payload_too_large",
            "errors": [{"field": "body", "message": "request body exceeds size limit"}],
        });
        record(&state, "submit", StatusCode::PAYLOAD_TOO_LARGE, None, None, None, request_bytes);
        return (StatusCode::PAYLOAD_TOO_LARGE, axum::Json(payload));
    }
    let Ok(body) = serde_json::from_slice::<Value>(&bytes) else {
        let payload = json!({
            "error": "invalid_json",
            "errors": [{"field": "body", "message": "must be valid JSON"}],
        });
        record(&state, "submit", StatusCode::BAD_REQUEST, None, None, None, request_bytes);
        return (StatusCode::BAD_REQUEST, axum::Json(payload));
    };
    let install_id = body
        .get("install_id")
        .and_then(Value::as_str)
        .map(ToString::to_string);
    match state.service.submit(&body, now()) {
        Ok(accepted) => {
            record(
                &state,
                "submit",
                StatusCode::ACCEPTED,
                install_id,
                None,
                Some(accepted.status == "duplicate"),
                request_bytes,
            );
            (StatusCode::ACCEPTED, axum::Json(to_value(&accepted)))
        }
        Err(error) => encode_error(&state, "submit", install_id, &error, request_bytes),
    }
}

/// Handles `GET /reviews`.
async fn handle_reviews_list(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<InstallIdQuery>,
) -> impl IntoResponse {
    let install_id = query.to_install_id();
    match state.service.reviews_list(install_id.as_ref(), now()) {
        Ok(summaries) => {
            record(
                &state,
                "reviews",
                StatusCode::OK,
                install_id.map(|id| id.as_str().to_string()),
                None,
                None,
                0,
            );
            let payload = json!({"toolspec": "v1", "reviews": summaries});
            (StatusCode::OK, axum::Json(payload))
        }
        Err(error) => encode_error(
            &state,
            "reviews",
            install_id.map(|id| id.as_str().to_string()),
            &error,
            0,
        ),
    }
}

/// Handles `GET /reviews/{tool_slug}`.
async fn handle_review_detail(
    State(state): State<Arc<ServerState>>,
    Path(tool_slug): Path<String>,
    Query(query): Query<InstallIdQuery>,
) -> impl IntoResponse {
    let install_id = query.to_install_id();
    match state.service.review_detail(install_id.as_ref(), tool_slug.trim()) {
        Ok(review) => {
            record(
                &state,
                "review_detail",
                StatusCode::OK,
                install_id.map(|id| id.as_str().to_string()),
                None,
                None,
                0,
            );
            (StatusCode::OK, axum::Json(to_value(&review)))
        }
        Err(error) => encode_error(
            &state,
            "review_detail",
            install_id.map(|id| id.as_str().to_string()),
            &error,
            0,
        ),
    }
}

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Serializes a response payload, failing closed to an empty object.
fn to_value<T: serde::Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or_else(|_| json!({}))
}

/// Encodes a service error as a structured HTTP response.
fn encode_error(
    state: &ServerState,
    route: &'static str,
    install_id: Option<String>,
    error: &ServiceError,
    request_bytes: usize,
) -> (StatusCode, axum::Json<Value>) {
    let (status, payload) = match error {
        ServiceError::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            json!({"error": "validation_failed", "errors": errors}),
        ),
        ServiceError::Forbidden(message) => {
            (StatusCode::FORBIDDEN, json!({"error": "forbidden", "message": message}))
        }
        ServiceError::NotFound(message) => {
            (StatusCode::NOT_FOUND, json!({"error": "not_found", "message": message}))
        }
        ServiceError::Store(store_error) => match store_error {
            toolspec_core::StoreError::Unavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({"error": "unavailable", "message": "store temporarily unavailable"}),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "internal", "message": "storage failure"}),
            ),
        },
    };
    record(state, route, status, install_id, None, None, request_bytes);
    (status, axum::Json(payload))
}

/// Emits one audit event for a handled request.
fn record(
    state: &ServerState,
    route: &'static str,
    status: StatusCode,
    install_id: Option<String>,
    deny_reason: Option<String>,
    duplicate: Option<bool>,
    request_bytes: usize,
) {
    state.audit.record(&RegistryAuditEvent::new(RegistryAuditEventParams {
        route,
        status: status.as_u16(),
        install_id,
        deny_reason,
        duplicate,
        request_bytes,
    }));
}

/// Returns the current wall-clock time as a registry timestamp.
fn now() -> Timestamp {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    Timestamp::from_unix_millis(i64::try_from(millis).unwrap_or(i64::MAX))
}
