//! Router configuration for the check-in service.

use super::health::readiness_check;
use super::state::AppState;
use crate::api::{checkin, feed, tickets};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use echopass_web::{correlation_id, handlers::health_check, require_passphrase};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// - `/health`, `/ready`: probes, never gated
/// - `/api/checkin/*`: kiosk routes, behind the passphrase gate when one is configured
/// - `/api/tickets/*`: ticket reads and display payloads are open, issuance is gated
pub fn build_router(state: AppState) -> Router {
    let kiosk_routes = Router::new()
        .route("/qr", post(checkin::submit_scan))
        .route("/feed", get(feed::get_feed))
        .route("/stats", get(feed::get_stats))
        .layer(from_fn_with_state(state.gate.clone(), require_passphrase));

    // Holders read their ticket and code; only operators issue
    let issuance = Router::new()
        .route("/", post(tickets::issue_ticket))
        .route_layer(from_fn_with_state(state.gate.clone(), require_passphrase));

    let ticket_routes = Router::new()
        .route("/:id", get(tickets::get_ticket))
        .route("/:id/qr", get(tickets::get_ticket_qr))
        .merge(issuance);

    let api_routes = Router::new()
        .nest("/checkin", kiosk_routes)
        .nest("/tickets", ticket_routes);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn(correlation_id))
        .with_state(state)
}
