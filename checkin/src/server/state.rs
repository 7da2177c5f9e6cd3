//! Application state for the check-in HTTP server.

use crate::app::{CheckInService, TicketService};
use echopass_web::PassphraseGate;

/// State shared by every handler; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Scan validation and feed
    pub checkin: CheckInService,
    /// Ticket issuance and display
    pub tickets: TicketService,
    /// Gate in front of the kiosk routes
    pub gate: PassphraseGate,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(checkin: CheckInService, tickets: TicketService, gate: PassphraseGate) -> Self {
        Self {
            checkin,
            tickets,
            gate,
        }
    }
}
