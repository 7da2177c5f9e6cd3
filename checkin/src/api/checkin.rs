//! Scan submission endpoint.

use crate::error::CheckInError;
use crate::server::state::AppState;
use crate::types::ScanPayload;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use echopass_web::CorrelationId;
use serde::{Deserialize, Serialize};

/// Message returned with every successful check-in
pub const CHECK_IN_SUCCESSFUL: &str = "Check-in successful";

/// Body of `POST /api/checkin/qr`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    /// Decoded scan payload
    pub ticket_data: ScanPayload,
    /// Client submission time, epoch milliseconds
    #[serde(default, deserialize_with = "crate::types::epoch_millis::deserialize")]
    pub timestamp: Option<i64>,
}

/// Response of `POST /api/checkin/qr`, success or failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    /// Whether the ticket was admitted
    pub success: bool,
    /// Success message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Admitted ticket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    /// Check-in time, epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckInResponse {
    /// Successful check-in
    #[must_use]
    pub fn success(ticket_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            success: true,
            message: Some(CHECK_IN_SUCCESSFUL.to_string()),
            ticket_id: Some(ticket_id.into()),
            timestamp: Some(timestamp),
            error: None,
        }
    }

    /// Refused or failed check-in
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            ticket_id: None,
            timestamp: None,
            error: Some(error.into()),
        }
    }
}

/// Validate a scanned payload and check the ticket in.
///
/// A body that is not a check-in request still counts as an attempt: it is
/// validated as an empty payload, so it fails with "Invalid ticket data" and
/// shows up in the feed.
///
/// # Errors
///
/// 400 with the refusal reason, or 500 "Check-in failed".
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/checkin/qr \
///   -H 'Content-Type: application/json' \
///   -d '{"ticketData":{"ticketId":"T1","eventId":"E1","owner":"0xabc","timestamp":1735689600000},"timestamp":1735689600500}'
/// ```
pub async fn submit_scan(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    body: Result<Json<CheckInRequest>, JsonRejection>,
) -> Result<Json<CheckInResponse>, CheckInError> {
    let (payload, submitted_at) = match body {
        Ok(Json(request)) => (request.ticket_data, request.timestamp),
        Err(rejection) => {
            tracing::debug!(
                correlation_id = %correlation_id.0,
                error = %rejection.body_text(),
                "Unreadable check-in request"
            );
            (ScanPayload::default(), None)
        },
    };

    let success = state.checkin.validate(payload, submitted_at).await?;

    Ok(Json(CheckInResponse::success(
        success.ticket_id.as_str(),
        success.timestamp,
    )))
}
