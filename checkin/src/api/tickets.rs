//! Ticket endpoints: issuance, status and display payloads.

use crate::app::TicketServiceError;
use crate::ledger::LedgerError;
use crate::server::state::AppState;
use crate::types::{Salt, ScanPayload, TicketId, TicketIdentity};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use echopass_web::AppError;
use serde::{Deserialize, Serialize};

impl From<TicketServiceError> for AppError {
    fn from(err: TicketServiceError) -> Self {
        match err {
            TicketServiceError::InvalidTicket => Self::bad_request(err.to_string()),
            TicketServiceError::NotFound(id) => Self::not_found("Ticket", id),
            TicketServiceError::Ledger(LedgerError::AlreadyIssued(_)) => {
                Self::conflict(err.to_string())
            },
            TicketServiceError::Ledger(_) | TicketServiceError::Encode(_) => {
                Self::internal("Ticket operation failed").with_source(err.into())
            },
        }
    }
}

/// Register a ticket.
///
/// # Errors
///
/// 400 for a malformed body or blank identity, 409 if the id is taken.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/tickets -H 'Content-Type: application/json' \
///   -d '{"ticketId":"TKT-001","eventId":"E1","tokenId":1,"owner":"0xabc","eventName":"Web3 Developer Conference"}'
/// ```
pub async fn issue_ticket(
    State(state): State<AppState>,
    body: Result<Json<TicketIdentity>, JsonRejection>,
) -> Result<(StatusCode, Json<TicketIdentity>), AppError> {
    let Json(ticket) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let issued = state.tickets.issue(ticket).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

/// Ticket status, including whether it has been checked in.
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<TicketIdentity>, AppError> {
    let ticket = state.tickets.get(&TicketId::new(ticket_id)).await?;
    Ok(Json(ticket))
}

/// Query of `GET /api/tickets/:id/qr`
#[derive(Debug, Deserialize)]
pub struct QrQuery {
    /// Salt to embed; a fresh one when absent
    pub salt: Option<i64>,
}

/// Response of `GET /api/tickets/:id/qr`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponse {
    /// Structured payload
    pub payload: ScanPayload,
    /// Text to render into the QR code
    pub qr_data: String,
    /// Seconds until the display should fetch a new code
    pub refresh_in_secs: u64,
}

/// Current scan payload of a ticket.
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn get_ticket_qr(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
    Query(query): Query<QrQuery>,
) -> Result<Json<QrCodeResponse>, AppError> {
    let code = state
        .tickets
        .display_code(&TicketId::new(ticket_id), query.salt.map(Salt::from_millis))
        .await?;

    Ok(Json(QrCodeResponse {
        payload: code.payload,
        qr_data: code.text,
        refresh_in_secs: state.tickets.rotation_interval().as_secs(),
    }))
}
