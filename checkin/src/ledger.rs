//! Ticket ledger: the single ordering authority over ticket state.
//!
//! The ownership/duplicate check and the `Pending -> CheckedIn` transition
//! happen in one [`TicketLedger::check_in`] call. Implementations must make
//! that call a compare-and-set: of any number of concurrent calls for the same
//! ticket, at most one returns `Ok`.
//!
//! # Implementations
//!
//! - [`InMemoryTicketLedger`]: process-local map behind a write lock

use crate::types::{EventId, ScanIdentity, TicketId, TicketIdentity};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors returned by ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A ticket with this id already exists
    #[error("Ticket {0} is already issued")]
    AlreadyIssued(TicketId),

    /// No ticket with this id was ever issued
    #[error("Ticket {0} was never issued")]
    NotIssued(TicketId),

    /// The scan names a different event than the ticket admits to
    #[error("Ticket {ticket_id} belongs to event {expected}, scan presented {presented}")]
    EventMismatch {
        /// Scanned ticket
        ticket_id: TicketId,
        /// Event the ticket was issued for
        expected: EventId,
        /// Event named by the scan
        presented: EventId,
    },

    /// The scan names a different holder than the ledger records
    #[error("Ticket {0} is held by a different owner")]
    OwnerMismatch(TicketId),

    /// The ticket was already used
    #[error("Ticket {ticket_id} was already checked in at {at}")]
    AlreadyCheckedIn {
        /// Scanned ticket
        ticket_id: TicketId,
        /// Epoch milliseconds of the earlier check-in
        at: i64,
    },

    /// The ledger could not be reached
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    /// Whether this is a business-rule refusal rather than an infrastructure failure
    #[must_use]
    pub const fn is_refusal(&self) -> bool {
        !matches!(self, Self::Unavailable(_))
    }
}

/// Boxed future returned by ledger operations
pub type LedgerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LedgerError>> + Send + 'a>>;

/// Storage of issued tickets and their check-in state
pub trait TicketLedger: Send + Sync {
    /// Register a newly issued ticket
    ///
    /// The ticket is stored as not checked in, whatever the input says.
    ///
    /// # Errors
    ///
    /// [`LedgerError::AlreadyIssued`] if the ticket id is taken.
    fn issue(&self, ticket: TicketIdentity) -> LedgerFuture<'_, TicketIdentity>;

    /// Look a ticket up
    ///
    /// # Errors
    ///
    /// [`LedgerError::Unavailable`] if the ledger cannot be read.
    fn get(&self, ticket_id: &TicketId) -> LedgerFuture<'_, Option<TicketIdentity>>;

    /// Atomically verify a scan and mark the ticket checked in
    ///
    /// Returns the ticket after the transition.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotIssued`], [`LedgerError::EventMismatch`],
    ///   [`LedgerError::OwnerMismatch`]: the scan does not describe a real ticket
    /// - [`LedgerError::AlreadyCheckedIn`]: the ticket was used before
    fn check_in(&self, scan: &ScanIdentity, at: i64) -> LedgerFuture<'_, TicketIdentity>;

    /// Number of issued tickets
    fn ticket_count(&self) -> LedgerFuture<'_, usize>;
}

/// In-process ticket ledger
///
/// Every `check_in` runs its checks and the flip under one write lock, which
/// makes the transition linearizable per ticket.
#[derive(Debug, Default)]
pub struct InMemoryTicketLedger {
    tickets: RwLock<HashMap<TicketId, TicketIdentity>>,
}

impl InMemoryTicketLedger {
    /// Empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger pre-loaded with issued tickets
    ///
    /// Later duplicates of an id replace earlier ones.
    #[must_use]
    pub fn with_tickets(tickets: impl IntoIterator<Item = TicketIdentity>) -> Self {
        let tickets = tickets
            .into_iter()
            .map(|ticket| (ticket.ticket_id.clone(), ticket))
            .collect();
        Self {
            tickets: RwLock::new(tickets),
        }
    }
}

impl TicketLedger for InMemoryTicketLedger {
    fn issue(&self, mut ticket: TicketIdentity) -> LedgerFuture<'_, TicketIdentity> {
        Box::pin(async move {
            let mut tickets = self.tickets.write().await;
            if tickets.contains_key(&ticket.ticket_id) {
                return Err(LedgerError::AlreadyIssued(ticket.ticket_id));
            }

            ticket.checked_in = false;
            ticket.checked_in_at = None;
            tickets.insert(ticket.ticket_id.clone(), ticket.clone());

            tracing::debug!(ticket_id = %ticket.ticket_id, event_id = %ticket.event_id, "Ticket issued");
            Ok(ticket)
        })
    }

    fn get(&self, ticket_id: &TicketId) -> LedgerFuture<'_, Option<TicketIdentity>> {
        let ticket_id = ticket_id.clone();
        Box::pin(async move { Ok(self.tickets.read().await.get(&ticket_id).cloned()) })
    }

    fn check_in(&self, scan: &ScanIdentity, at: i64) -> LedgerFuture<'_, TicketIdentity> {
        let scan = scan.clone();
        Box::pin(async move {
            let mut tickets = self.tickets.write().await;

            let ticket = tickets
                .get_mut(&scan.ticket_id)
                .ok_or_else(|| LedgerError::NotIssued(scan.ticket_id.clone()))?;

            if ticket.event_id != scan.event_id {
                return Err(LedgerError::EventMismatch {
                    ticket_id: scan.ticket_id,
                    expected: ticket.event_id.clone(),
                    presented: scan.event_id,
                });
            }

            if ticket.owner != scan.owner {
                return Err(LedgerError::OwnerMismatch(scan.ticket_id));
            }

            if ticket.checked_in {
                return Err(LedgerError::AlreadyCheckedIn {
                    ticket_id: scan.ticket_id,
                    at: ticket.checked_in_at.unwrap_or_default(),
                });
            }

            ticket.checked_in = true;
            ticket.checked_in_at = Some(at);
            Ok(ticket.clone())
        })
    }

    fn ticket_count(&self) -> LedgerFuture<'_, usize> {
        Box::pin(async move { Ok(self.tickets.read().await.len()) })
    }
}
