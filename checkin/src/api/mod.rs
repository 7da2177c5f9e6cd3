//! HTTP API handlers.
//!
//! - `checkin`: scan submission (`POST /api/checkin/qr`)
//! - `feed`: operator feed and counters
//! - `tickets`: ticket issuance, status and QR payloads

pub mod checkin;
pub mod feed;
pub mod tickets;
