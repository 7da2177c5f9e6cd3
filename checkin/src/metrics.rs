//! Business metrics for check-in.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `echopass_checkins_total{outcome,reason}` - Validation outcomes
//! - `echopass_tickets_issued_total` - Tickets registered in the ledger
//! - `echopass_qr_payloads_encoded_total` - Scan payloads encoded
//!
//! ## Histograms
//! - `echopass_checkin_duration_seconds` - Time from submission to outcome

use crate::error::CheckInError;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Register metric descriptions.
///
/// Call once at startup, before anything is recorded.
pub fn register_checkin_metrics() {
    describe_counter!(
        "echopass_checkins_total",
        "Check-in attempts by outcome (success, failure) and reason"
    );
    describe_histogram!(
        "echopass_checkin_duration_seconds",
        "Time from scan submission to validation outcome"
    );
    describe_counter!(
        "echopass_tickets_issued_total",
        "Tickets registered in the ledger"
    );
    describe_counter!(
        "echopass_qr_payloads_encoded_total",
        "Scan payloads encoded for display"
    );

    tracing::info!("Check-in metrics registered");
}

/// Record a check-in outcome and its latency.
pub fn record_checkin(outcome: Result<(), &CheckInError>, elapsed: Duration) {
    let (label, reason) = match outcome {
        Ok(()) => ("success", "none"),
        Err(error) => ("failure", error.reason_label()),
    };
    counter!("echopass_checkins_total", "outcome" => label, "reason" => reason).increment(1);
    histogram!("echopass_checkin_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record a ticket registration.
pub fn record_ticket_issued() {
    counter!("echopass_tickets_issued_total").increment(1);
}

/// Record an encoded payload.
pub fn record_payload_encoded() {
    counter!("echopass_qr_payloads_encoded_total").increment(1);
}
