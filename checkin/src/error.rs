//! Check-in failures and their HTTP mapping.
//!
//! The public strings are part of the wire contract; internal detail (which
//! ledger check refused, why a request failed) stays in the variant and goes
//! to logs and metrics only.

use crate::api::checkin::CheckInResponse;
use crate::ledger::LedgerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Public message for malformed payloads
pub const INVALID_TICKET_DATA: &str = "Invalid ticket data";
/// Public message for stale payloads
pub const QR_CODE_EXPIRED: &str = "QR code expired";
/// Public message for ledger refusals
pub const ALREADY_CHECKED_IN_OR_INVALID: &str = "Ticket already checked in or invalid";
/// Public message for everything unexpected
pub const CHECK_IN_FAILED: &str = "Check-in failed";

/// Why the ledger refused a structurally valid, fresh scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// Ticket id unknown
    NotIssued,
    /// Ticket belongs to another event
    EventMismatch,
    /// Scan names another holder
    OwnerMismatch,
    /// Ticket used before
    AlreadyCheckedIn,
}

impl Refusal {
    /// Metric/log label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotIssued => "not_issued",
            Self::EventMismatch => "event_mismatch",
            Self::OwnerMismatch => "owner_mismatch",
            Self::AlreadyCheckedIn => "already_checked_in",
        }
    }
}

/// A failed check-in attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckInError {
    /// Payload lacks ticket id, event id or owner, or is not a payload at all
    #[error("Invalid ticket data")]
    InvalidTicketData,

    /// Payload timestamp is outside the freshness window
    #[error("QR code expired")]
    Expired {
        /// Distance between validation time and payload timestamp
        skew_ms: i64,
    },

    /// Ownership/duplicate check failed
    #[error("Ticket already checked in or invalid")]
    Refused(Refusal),

    /// Anything unexpected; the detail is never sent to clients
    #[error("Check-in failed")]
    Failed(String),
}

impl CheckInError {
    /// HTTP status: 400 for business-rule failures, 500 otherwise
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidTicketData | Self::Expired { .. } | Self::Refused(_) => {
                StatusCode::BAD_REQUEST
            },
            Self::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metric/log label
    #[must_use]
    pub const fn reason_label(&self) -> &'static str {
        match self {
            Self::InvalidTicketData => "invalid_ticket_data",
            Self::Expired { .. } => "expired",
            Self::Refused(refusal) => refusal.label(),
            Self::Failed(_) => "failed",
        }
    }
}

impl From<LedgerError> for CheckInError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotIssued(_) => Self::Refused(Refusal::NotIssued),
            LedgerError::EventMismatch { .. } => Self::Refused(Refusal::EventMismatch),
            LedgerError::OwnerMismatch(_) => Self::Refused(Refusal::OwnerMismatch),
            LedgerError::AlreadyCheckedIn { .. } => Self::Refused(Refusal::AlreadyCheckedIn),
            LedgerError::AlreadyIssued(_) | LedgerError::Unavailable(_) => {
                Self::Failed(err.to_string())
            },
        }
    }
}

impl IntoResponse for CheckInError {
    fn into_response(self) -> Response {
        if let Self::Failed(detail) = &self {
            tracing::error!(error = %detail, "Check-in failed unexpectedly");
        }

        (
            self.status_code(),
            Json(CheckInResponse::failure(self.to_string())),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TicketId;

    #[test]
    fn test_public_messages() {
        assert_eq!(CheckInError::InvalidTicketData.to_string(), "Invalid ticket data");
        assert_eq!(CheckInError::Expired { skew_ms: 600_000 }.to_string(), "QR code expired");
        assert_eq!(
            CheckInError::Refused(Refusal::OwnerMismatch).to_string(),
            "Ticket already checked in or invalid"
        );
        assert_eq!(
            CheckInError::Failed("ledger lock poisoned".into()).to_string(),
            "Check-in failed"
        );
    }

    #[test]
    fn test_messages_match_constants() {
        assert_eq!(CheckInError::InvalidTicketData.to_string(), INVALID_TICKET_DATA);
        assert_eq!(CheckInError::Expired { skew_ms: 0 }.to_string(), QR_CODE_EXPIRED);
        assert_eq!(
            CheckInError::Refused(Refusal::NotIssued).to_string(),
            ALREADY_CHECKED_IN_OR_INVALID
        );
        assert_eq!(CheckInError::Failed(String::new()).to_string(), CHECK_IN_FAILED);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(CheckInError::InvalidTicketData.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            CheckInError::Refused(Refusal::AlreadyCheckedIn).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CheckInError::Failed(String::new()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_ledger_errors_map_to_refusals() {
        let err: CheckInError = LedgerError::AlreadyCheckedIn {
            ticket_id: TicketId::new("T1"),
            at: 1,
        }
        .into();
        assert_eq!(err, CheckInError::Refused(Refusal::AlreadyCheckedIn));
        assert_eq!(err.reason_label(), "already_checked_in");

        let err: CheckInError = LedgerError::Unavailable("timeout".into()).into();
        assert!(matches!(err, CheckInError::Failed(_)));
    }
}
