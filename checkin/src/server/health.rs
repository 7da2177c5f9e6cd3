//! Readiness endpoint.
//!
//! Liveness (`/health`) is the shared handler from `echopass-web`.

use super::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use echopass_runtime::HealthStatus;
use serde::Serialize;

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,
    /// Store accepting actions
    pub store: bool,
    /// Ledger readable
    pub ledger: bool,
    /// Scans currently being validated
    pub pending_validations: usize,
}

/// Readiness check endpoint.
///
/// 503 while the store is shutting down or the ledger cannot be read.
///
/// ```bash
/// curl http://localhost:8080/ready
/// # {"ready":true,"store":true,"ledger":true,"pending_validations":0}
/// ```
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let health = state.checkin.store().health();
    let store = health.status == HealthStatus::Healthy;
    let ledger = state.tickets.ticket_count().await.is_ok();
    let ready = store && ledger;

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready,
            store,
            ledger,
            pending_validations: health.pending_effects,
        }),
    )
}
