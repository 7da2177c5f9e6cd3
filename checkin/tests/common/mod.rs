//! Shared fixtures for integration tests.

#![allow(dead_code)]

use echopass_checkin::ledger::LedgerFuture;
use echopass_checkin::types::ScanIdentity;
use echopass_checkin::{
    CheckInApp, Config, EventId, InMemoryTicketLedger, Owner, TicketId, TicketIdentity, TicketLedger,
};
use echopass_testing::{MockClock, TEST_EPOCH_MILLIS};
use std::sync::Arc;
use std::time::Duration;

pub const EVENT_NAME: &str = "Web3 Developer Conference 2024";

pub fn ticket(id: &str) -> TicketIdentity {
    TicketIdentity::new(TicketId::new(id), EventId::new("E1"), 1, Owner::new("0xabc"))
        .with_event_name(EVENT_NAME)
        .with_tier_name("General Admission")
}

/// Configuration used by every test application.
pub fn test_config(passphrase: Option<&str>) -> Config {
    let mut config = Config::default();
    config.checkin.kiosk_passphrase = passphrase.map(str::to_string);
    config.server.shutdown_timeout = 1;
    config
}

/// Application over a mock clock and a ledger holding `tickets`.
pub fn app(
    passphrase: Option<&str>,
    tickets: impl IntoIterator<Item = TicketIdentity>,
) -> (Arc<MockClock>, CheckInApp) {
    app_with_ledger(
        test_config(passphrase),
        Arc::new(InMemoryTicketLedger::with_tickets(tickets)),
    )
}

/// Application over a mock clock and the given ledger.
pub fn app_with_ledger(config: Config, ledger: Arc<dyn TicketLedger>) -> (Arc<MockClock>, CheckInApp) {
    echopass_testing::init_test_tracing();

    let clock = Arc::new(MockClock::at_millis(TEST_EPOCH_MILLIS));
    let app = CheckInApp::new(config, clock.clone(), ledger);
    (clock, app)
}

/// Ledger whose check-ins commit, then take `delay` to answer.
///
/// Models a remote ledger that has applied the transition while the
/// response is still on its way.
pub struct SlowLedger {
    inner: InMemoryTicketLedger,
    delay: Duration,
}

impl SlowLedger {
    pub fn new(tickets: impl IntoIterator<Item = TicketIdentity>, delay: Duration) -> Self {
        Self {
            inner: InMemoryTicketLedger::with_tickets(tickets),
            delay,
        }
    }
}

impl TicketLedger for SlowLedger {
    fn issue(&self, ticket: TicketIdentity) -> LedgerFuture<'_, TicketIdentity> {
        self.inner.issue(ticket)
    }

    fn get(&self, ticket_id: &TicketId) -> LedgerFuture<'_, Option<TicketIdentity>> {
        self.inner.get(ticket_id)
    }

    fn check_in(&self, scan: &ScanIdentity, at: i64) -> LedgerFuture<'_, TicketIdentity> {
        let scan = scan.clone();
        Box::pin(async move {
            let ticket = self.inner.check_in(&scan, at).await?;
            tokio::time::sleep(self.delay).await;
            Ok(ticket)
        })
    }

    fn ticket_count(&self) -> LedgerFuture<'_, usize> {
        self.inner.ticket_count()
    }
}
