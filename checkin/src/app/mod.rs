//! Application wiring.
//!
//! - `services`: request-facing services over the store and ledger
//! - `coordinator`: builds the store, services and router from configuration

mod coordinator;
mod services;

pub use coordinator::CheckInApp;
pub use services::{CheckInService, CheckInStore, TicketService, TicketServiceError};
