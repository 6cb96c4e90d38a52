//! REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::types::{
    ErrorResponse, InboundRequest, InboundResponse, ListSessionsResponse, SessionSummary,
};
use crate::error::SupportDeskError;
use crate::service::{SessionService, SweepReport};
use crate::session::{now_millis, SessionStore};
use crate::transport::{BroadcastTransport, InboundEvent};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SessionService>,
    pub transport: BroadcastTransport,
}

impl AppState {
    /// In-memory store with default timeout, broadcasting replies.
    pub fn new() -> Self {
        let transport = BroadcastTransport::default();
        let service = SessionService::new(SessionStore::in_memory(), Arc::new(transport.clone()));
        Self::with_service(Arc::new(service), transport)
    }

    /// Wrap an existing service. `transport` must be the one the service sends through.
    pub fn with_service(service: Arc<SessionService>, transport: BroadcastTransport) -> Self {
        Self { service, transport }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

fn api_error(err: SupportDeskError) -> ApiError {
    let status = match err {
        SupportDeskError::StorageUnavailable(_)
        | SupportDeskError::Io(_)
        | SupportDeskError::Serialization(_) => StatusCode::SERVICE_UNAVAILABLE,
        SupportDeskError::UnknownSession(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::from(&err)))
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// API information endpoint.
pub async fn api_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sweeper = state.service.sweeper();
    Json(serde_json::json!({
        "name": "support-desk",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "timeout_secs": sweeper.timeout().as_secs(),
        "sweep_interval_secs": sweeper.interval().as_secs(),
        "adapters": state.transport.subscriber_count(),
        "support": state.service.catalog().contacts(),
    }))
}

/// Deliver one inbound message.
pub async fn post_message(
    State(state): State<AppState>,
    Json(req): Json<InboundRequest>,
) -> Result<Json<InboundResponse>, ApiError> {
    if req.identity.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("identity must not be empty")),
        ));
    }

    let event = InboundEvent::new(req.identity, req.body);
    let outcome = state
        .service
        .handle_inbound(&event)
        .await
        .map_err(api_error)?;

    Ok(Json(outcome.into()))
}

/// Transport is connected: start a fresh session collection.
pub async fn ready(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.service.reset().await.map_err(api_error)?;
    tracing::info!("transport ready; sessions reset");
    Ok(StatusCode::NO_CONTENT)
}

/// Run a timeout sweep now.
pub async fn sweep(State(state): State<AppState>) -> Result<Json<SweepReport>, ApiError> {
    let report = state.service.sweep().await.map_err(api_error)?;
    Ok(Json(report))
}

/// List all sessions.
pub async fn list_sessions(State(state): State<AppState>) -> Json<ListSessionsResponse> {
    let now = now_millis();
    let sessions: Vec<SessionSummary> = state
        .service
        .sessions()
        .iter()
        .map(|s| SessionSummary::from_session(s, now))
        .collect();

    Json(ListSessionsResponse {
        count: sessions.len(),
        active: sessions.iter().filter(|s| s.state.is_open()).count(),
        sessions,
    })
}

/// Get one session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<SessionSummary>, ApiError> {
    let session = state.service.session(&identity).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::session_not_found(&identity)),
        )
    })?;

    Ok(Json(SessionSummary::from_session(&session, now_millis())))
}
