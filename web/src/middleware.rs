//! Axum middleware for the check-in HTTP surface.
//!
//! - **Correlation IDs**: every request gets an id (taken from
//!   `X-Correlation-ID` when it is a valid UUID), stored in request extensions,
//!   attached to the request span and echoed on the response.
//! - **Kiosk passphrase gate**: operator routes can require a shared
//!   passphrase header.
//!
//! ```ignore
//! let app = Router::new()
//!     .nest("/api/checkin", checkin_routes.layer(from_fn_with_state(gate, require_passphrase)))
//!     .layer(from_fn(correlation_id));
//! ```

use crate::error::AppError;
use crate::extractors::CorrelationId;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Header carrying the kiosk passphrase.
pub const PASSPHRASE_HEADER: &str = "X-Kiosk-Passphrase";

/// Correlation ID middleware, install with `axum::middleware::from_fn`.
pub async fn correlation_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    req.extensions_mut().insert(CorrelationId(id));

    let span = tracing::info_span!(
        "http_request",
        correlation_id = %id,
        method = %req.method(),
        uri = %req.uri(),
    );

    let mut response = next.run(req).instrument(span).await;

    if let Ok(header_value) = HeaderValue::from_str(&id.to_string()) {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header_value);
    }

    response
}

/// Shared-passphrase gate for operator (kiosk) routes.
///
/// An unconfigured gate lets every request through.
#[derive(Clone, Debug, Default)]
pub struct PassphraseGate {
    passphrase: Option<Arc<str>>,
}

impl PassphraseGate {
    /// Gate requiring `passphrase`, or an open gate for `None`.
    #[must_use]
    pub fn new(passphrase: Option<String>) -> Self {
        Self {
            passphrase: passphrase.filter(|p| !p.is_empty()).map(Arc::from),
        }
    }

    /// Whether a passphrase is required at all.
    #[must_use]
    pub const fn is_enforced(&self) -> bool {
        self.passphrase.is_some()
    }

    /// Check a candidate passphrase.
    #[must_use]
    pub fn allows(&self, candidate: Option<&str>) -> bool {
        match (&self.passphrase, candidate) {
            (None, _) => true,
            (Some(expected), Some(candidate)) => {
                constant_time_eq::constant_time_eq(expected.as_bytes(), candidate.as_bytes())
            },
            (Some(_), None) => false,
        }
    }
}

/// Passphrase middleware, install with `axum::middleware::from_fn_with_state`.
pub async fn require_passphrase(
    State(gate): State<PassphraseGate>,
    req: Request,
    next: Next,
) -> Response {
    let candidate = req
        .headers()
        .get(PASSPHRASE_HEADER)
        .and_then(|v| v.to_str().ok());

    if gate.allows(candidate) {
        next.run(req).await
    } else {
        tracing::warn!(uri = %req.uri(), "Rejected request without valid kiosk passphrase");
        AppError::unauthorized("Invalid kiosk passphrase").into_response()
    }
}
