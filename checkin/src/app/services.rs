//! Application services - the request-facing side of the check-in store.
//!
//! `CheckInService` dispatches scans to the store and waits for their
//! outcome; `TicketService` issues tickets and encodes their payloads.

use crate::aggregates::{CheckInAction, CheckInEnvironment, CheckInReducer, CheckInState};
use crate::encoder::{DisplayedCode, EncodeError, QrEncoder, DEFAULT_ROTATION_INTERVAL};
use crate::error::CheckInError;
use crate::feed::{FeedSnapshot, FeedStats};
use crate::ledger::{LedgerError, TicketLedger};
use crate::metrics as checkin_metrics;
use crate::types::{CheckInSuccess, Salt, ScanPayload, TicketId, TicketIdentity};
use echopass_runtime::{Store, StoreError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

/// Store running the check-in reducer
pub type CheckInStore = Store<CheckInState, CheckInAction, CheckInEnvironment, CheckInReducer>;

/// Validation service
#[derive(Clone)]
pub struct CheckInService {
    store: CheckInStore,
    timeout: Duration,
}

impl CheckInService {
    /// Service over `store`, waiting at most `timeout` for each outcome
    #[must_use]
    pub const fn new(store: CheckInStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Validate a scan and, if it passes, check the ticket in
    ///
    /// # Errors
    ///
    /// The [`CheckInError`] the scan was refused with; a store failure or a
    /// missing outcome within the timeout is [`CheckInError::Failed`].
    pub async fn validate(
        &self,
        payload: ScanPayload,
        submitted_at: Option<i64>,
    ) -> Result<CheckInSuccess, CheckInError> {
        self.validate_request(Uuid::new_v4(), payload, submitted_at)
            .await
    }

    /// [`CheckInService::validate`] with a caller-chosen request id
    ///
    /// # Errors
    ///
    /// See [`CheckInService::validate`].
    #[tracing::instrument(skip(self, payload), fields(ticket_id = ?payload.ticket_id))]
    pub async fn validate_request(
        &self,
        request_id: Uuid,
        payload: ScanPayload,
        submitted_at: Option<i64>,
    ) -> Result<CheckInSuccess, CheckInError> {
        let started = Instant::now();

        let result = self
            .store
            .send_and_wait_for(
                CheckInAction::SubmitScan {
                    request_id,
                    payload,
                    submitted_at,
                },
                |action| action.is_outcome_for(request_id),
                self.timeout,
            )
            .await;

        let outcome = match result {
            Ok(CheckInAction::ScanAccepted { ticket, at, .. }) => Ok(CheckInSuccess {
                ticket_id: ticket.ticket_id,
                event_name: ticket.event_name,
                attendee_name: ticket.attendee_name,
                timestamp: at,
            }),
            Ok(CheckInAction::ScanRejected { error, .. }) => Err(error),
            Ok(CheckInAction::SubmitScan { .. }) => {
                Err(CheckInError::Failed("store echoed the command".to_string()))
            },
            Err(StoreError::Timeout) => {
                tracing::warn!(timeout_ms = ?self.timeout.as_millis(), "No check-in outcome before timeout");
                Err(CheckInError::Failed("validation timed out".to_string()))
            },
            Err(error) => Err(CheckInError::Failed(error.to_string())),
        };

        checkin_metrics::record_checkin(outcome.as_ref().map(|_| ()), started.elapsed());
        outcome
    }

    /// Feed entries and counters
    pub async fn feed(&self) -> FeedSnapshot {
        self.store.state(|s| s.feed.snapshot()).await
    }

    /// Counters only
    pub async fn stats(&self) -> FeedStats {
        self.store.state(|s| s.feed.stats()).await
    }

    /// Underlying store
    #[must_use]
    pub const fn store(&self) -> &CheckInStore {
        &self.store
    }
}

/// Errors from ticket operations
#[derive(Error, Debug)]
pub enum TicketServiceError {
    /// Ticket id, event id or owner is blank
    #[error("Ticket requires ticketId, eventId and owner")]
    InvalidTicket,

    /// No such ticket
    #[error("Ticket {0} not found")]
    NotFound(TicketId),

    /// Ledger refused or failed
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Payload encoding failed
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Ticket issuance and display service
#[derive(Clone)]
pub struct TicketService {
    ledger: Arc<dyn TicketLedger>,
    encoder: QrEncoder,
    rotation_interval: Duration,
}

impl TicketService {
    /// Service over `ledger`
    #[must_use]
    pub fn new(ledger: Arc<dyn TicketLedger>, encoder: QrEncoder) -> Self {
        Self {
            ledger,
            encoder,
            rotation_interval: DEFAULT_ROTATION_INTERVAL,
        }
    }

    /// Set how often displays should fetch a new code
    #[must_use]
    pub const fn with_rotation_interval(mut self, interval: Duration) -> Self {
        self.rotation_interval = interval;
        self
    }

    /// How often displays should fetch a new code
    #[must_use]
    pub const fn rotation_interval(&self) -> Duration {
        self.rotation_interval
    }

    /// Register a ticket
    ///
    /// # Errors
    ///
    /// [`TicketServiceError::InvalidTicket`] for a blank identity,
    /// [`LedgerError::AlreadyIssued`] for a taken id.
    pub async fn issue(&self, ticket: TicketIdentity) -> Result<TicketIdentity, TicketServiceError> {
        if !ticket.has_identity() {
            return Err(TicketServiceError::InvalidTicket);
        }
        let issued = self.ledger.issue(ticket).await?;
        checkin_metrics::record_ticket_issued();
        tracing::info!(ticket_id = %issued.ticket_id, event_id = %issued.event_id, "Ticket issued");
        Ok(issued)
    }

    /// Ticket with its check-in state
    ///
    /// # Errors
    ///
    /// [`TicketServiceError::NotFound`] for an unknown id.
    pub async fn get(&self, ticket_id: &TicketId) -> Result<TicketIdentity, TicketServiceError> {
        self.ledger
            .get(ticket_id)
            .await?
            .ok_or_else(|| TicketServiceError::NotFound(ticket_id.clone()))
    }

    /// Current scan payload for a ticket
    ///
    /// Uses `salt` when given, a fresh one otherwise.
    ///
    /// # Errors
    ///
    /// [`TicketServiceError::NotFound`] for an unknown id.
    pub async fn display_code(
        &self,
        ticket_id: &TicketId,
        salt: Option<Salt>,
    ) -> Result<DisplayedCode, TicketServiceError> {
        let ticket = self.get(ticket_id).await?;
        let salt = salt.unwrap_or_else(|| self.encoder.regenerate_salt());
        let payload = self.encoder.encode(&ticket, salt)?;
        let text = QrEncoder::render(&payload)?;
        Ok(DisplayedCode { payload, text })
    }

    /// Number of issued tickets
    ///
    /// # Errors
    ///
    /// [`LedgerError::Unavailable`] if the ledger cannot be read.
    pub async fn ticket_count(&self) -> Result<usize, TicketServiceError> {
        Ok(self.ledger.ticket_count().await?)
    }

    /// Encoder used for payloads
    #[must_use]
    pub const fn encoder(&self) -> &QrEncoder {
        &self.encoder
    }
}
