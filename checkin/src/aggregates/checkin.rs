//! Check-in validation reducer.
//!
//! A `SubmitScan` command is checked for structure and freshness inside the
//! reducer. Scans that pass go to the ledger's compare-and-set in an effect;
//! every scan, passing or not, comes back as exactly one `ScanAccepted` or
//! `ScanRejected`, and only those outcome actions write to the feed.

use crate::error::CheckInError;
use crate::feed::CheckInFeed;
use crate::ledger::TicketLedger;
use crate::types::{CheckInRecord, ScanIdentity, ScanPayload, TicketId, TicketIdentity};
use echopass_core::{effect::Effect, environment::Clock, reducer::Reducer, smallvec, SmallVec};
use std::sync::Arc;
use uuid::Uuid;

/// Maximum distance between validation time and payload timestamp
pub const DEFAULT_FRESHNESS_WINDOW_MS: i64 = 5 * 60 * 1000;

// ============================================================================
// Actions (Commands + Outcomes)
// ============================================================================

/// Actions for the check-in reducer
#[derive(Debug, Clone)]
pub enum CheckInAction {
    // Commands
    /// A kiosk submitted a decoded scan payload
    SubmitScan {
        /// Correlates the outcome with the submitting request
        request_id: Uuid,
        /// Decoded payload
        payload: ScanPayload,
        /// Client-side submission time, epoch milliseconds
        submitted_at: Option<i64>,
    },

    // Outcomes
    /// The ticket was admitted
    ScanAccepted {
        /// Submitting request
        request_id: Uuid,
        /// Ticket after the transition
        ticket: TicketIdentity,
        /// Validation time, epoch milliseconds
        at: i64,
    },

    /// The scan was refused
    ScanRejected {
        /// Submitting request
        request_id: Uuid,
        /// Ticket id carried by the scan, if any
        ticket_id: Option<TicketId>,
        /// Ledger view of the ticket, when it is known
        ticket: Option<TicketIdentity>,
        /// Why
        error: CheckInError,
        /// Validation time, epoch milliseconds
        at: i64,
    },
}

impl CheckInAction {
    /// Request this action belongs to
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        match self {
            Self::SubmitScan { request_id, .. }
            | Self::ScanAccepted { request_id, .. }
            | Self::ScanRejected { request_id, .. } => *request_id,
        }
    }

    /// Whether this is the outcome of `request_id`
    #[must_use]
    pub fn is_outcome_for(&self, request_id: Uuid) -> bool {
        match self {
            Self::SubmitScan { .. } => false,
            Self::ScanAccepted { .. } | Self::ScanRejected { .. } => {
                self.request_id() == request_id
            },
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// Operator-session state: the outcome feed
#[derive(Debug, Clone, Default)]
pub struct CheckInState {
    /// Recent outcomes and running totals
    pub feed: CheckInFeed,
}

impl CheckInState {
    /// State with a feed of the given capacity
    #[must_use]
    pub fn new(feed_capacity: usize) -> Self {
        Self {
            feed: CheckInFeed::new(feed_capacity),
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the check-in reducer
#[derive(Clone)]
pub struct CheckInEnvironment {
    /// Validation time source
    pub clock: Arc<dyn Clock>,
    /// Ticket state authority
    pub ledger: Arc<dyn TicketLedger>,
    /// Freshness window, milliseconds (inclusive)
    pub freshness_window_ms: i64,
}

impl CheckInEnvironment {
    /// Environment with the default five minute window
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ledger: Arc<dyn TicketLedger>) -> Self {
        Self {
            clock,
            ledger,
            freshness_window_ms: DEFAULT_FRESHNESS_WINDOW_MS,
        }
    }

    /// Override the freshness window
    #[must_use]
    pub const fn with_freshness_window(mut self, window_ms: i64) -> Self {
        self.freshness_window_ms = window_ms;
        self
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Check-in validation reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckInReducer;

impl CheckInReducer {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Structural and freshness checks
    ///
    /// A missing payload timestamp reads as the epoch and so is always stale.
    ///
    /// # Errors
    ///
    /// - [`CheckInError::InvalidTicketData`]: ticket id, event id or owner missing
    /// - [`CheckInError::Expired`]: `|now - timestamp| > window_ms`
    pub fn precheck(
        payload: &ScanPayload,
        now: i64,
        window_ms: i64,
    ) -> Result<ScanIdentity, CheckInError> {
        let identity = payload.identity().ok_or(CheckInError::InvalidTicketData)?;

        let skew_ms = now
            .saturating_sub(payload.timestamp_or_epoch())
            .saturating_abs();
        if skew_ms > window_ms {
            return Err(CheckInError::Expired { skew_ms });
        }

        Ok(identity)
    }

    fn record(
        request_id: Uuid,
        ticket_id: String,
        ticket: Option<&TicketIdentity>,
        at: i64,
        reason: Option<String>,
    ) -> CheckInRecord {
        CheckInRecord {
            id: request_id.to_string(),
            ticket_id,
            event_name: ticket.map(|t| t.event_name.clone()).unwrap_or_default(),
            attendee_name: ticket.and_then(|t| t.attendee_name.clone()),
            timestamp: at,
            success: reason.is_none(),
            reason,
        }
    }
}

impl Reducer for CheckInReducer {
    type State = CheckInState;
    type Action = CheckInAction;
    type Environment = CheckInEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            CheckInAction::SubmitScan {
                request_id,
                payload,
                submitted_at,
            } => {
                let now = env.clock.now_millis();
                tracing::debug!(
                    %request_id,
                    ticket_id = ?payload.ticket_id,
                    payload_timestamp = ?payload.timestamp,
                    submitted_at = ?submitted_at,
                    "Scan submitted"
                );

                let ledger = Arc::clone(&env.ledger);

                match Self::precheck(&payload, now, env.freshness_window_ms) {
                    Err(error) => {
                        let ticket_id = payload.ticket_id.filter(|id| !id.is_blank());
                        smallvec![Effect::future(async move {
                            // Expired scans of a real ticket still show its names in the feed
                            let ticket = match (&error, &ticket_id) {
                                (CheckInError::Expired { .. }, Some(id)) => {
                                    ledger.get(id).await.ok().flatten()
                                },
                                _ => None,
                            };
                            Some(CheckInAction::ScanRejected {
                                request_id,
                                ticket_id,
                                ticket,
                                error,
                                at: now,
                            })
                        })]
                    },
                    Ok(scan) => smallvec![Effect::future(async move {
                        match ledger.check_in(&scan, now).await {
                            Ok(ticket) => Some(CheckInAction::ScanAccepted {
                                request_id,
                                ticket,
                                at: now,
                            }),
                            Err(err) => {
                                tracing::debug!(%request_id, error = %err, "Ledger refused check-in");
                                let ticket = if err.is_refusal() {
                                    ledger.get(&scan.ticket_id).await.ok().flatten()
                                } else {
                                    None
                                };
                                Some(CheckInAction::ScanRejected {
                                    request_id,
                                    ticket_id: Some(scan.ticket_id),
                                    ticket,
                                    error: err.into(),
                                    at: now,
                                })
                            },
                        }
                    })],
                }
            },

            // ========== Outcomes ==========
            CheckInAction::ScanAccepted {
                request_id,
                ticket,
                at,
            } => {
                tracing::info!(%request_id, ticket_id = %ticket.ticket_id, "Ticket checked in");
                state.feed.append(Self::record(
                    request_id,
                    ticket.ticket_id.to_string(),
                    Some(&ticket),
                    at,
                    None,
                ));
                SmallVec::new()
            },

            CheckInAction::ScanRejected {
                request_id,
                ticket_id,
                ticket,
                error,
                at,
            } => {
                tracing::info!(
                    %request_id,
                    ticket_id = ?ticket_id,
                    reason = error.reason_label(),
                    "Check-in refused"
                );
                state.feed.append(Self::record(
                    request_id,
                    ticket_id.map(|id| id.to_string()).unwrap_or_default(),
                    ticket.as_ref(),
                    at,
                    Some(error.to_string()),
                ));
                SmallVec::new()
            },
        }
    }
}
