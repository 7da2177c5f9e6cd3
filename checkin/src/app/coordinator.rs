//! Application coordinator - builds every component from configuration.

use super::services::{CheckInService, CheckInStore, TicketService};
use crate::aggregates::{CheckInEnvironment, CheckInReducer, CheckInState};
use crate::config::Config;
use crate::encoder::QrEncoder;
use crate::ledger::TicketLedger;
use crate::server::{build_router, AppState};
use axum::Router;
use echopass_core::environment::Clock;
use echopass_runtime::{Store, StoreError};
use echopass_web::PassphraseGate;
use std::sync::Arc;
use std::time::Duration;

/// The assembled check-in application
pub struct CheckInApp {
    config: Config,
    store: CheckInStore,
    state: AppState,
}

impl CheckInApp {
    /// Wire store, services and gate around `ledger`
    #[must_use]
    pub fn new(config: Config, clock: Arc<dyn Clock>, ledger: Arc<dyn TicketLedger>) -> Self {
        let env = CheckInEnvironment::new(Arc::clone(&clock), Arc::clone(&ledger))
            .with_freshness_window(config.checkin.freshness_window_ms);
        let store = Store::new(
            CheckInState::new(config.checkin.feed_capacity),
            CheckInReducer::new(),
            env,
        );

        let checkin = CheckInService::new(store.clone(), config.checkin.validation_timeout());
        let tickets = TicketService::new(ledger, QrEncoder::new(clock))
            .with_rotation_interval(config.checkin.qr_rotation_interval());
        let gate = PassphraseGate::new(config.checkin.kiosk_passphrase.clone());

        tracing::info!(
            freshness_window_ms = config.checkin.freshness_window_ms,
            feed_capacity = config.checkin.feed_capacity,
            kiosk_gate = gate.is_enforced(),
            "Check-in application initialized"
        );

        Self {
            config,
            store,
            state: AppState::new(checkin, tickets, gate),
        }
    }

    /// HTTP router over this application
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Shared handler state
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Loaded configuration
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Stop accepting scans and wait for in-flight validations
    ///
    /// # Errors
    ///
    /// [`StoreError::ShutdownTimeout`] if validations are still running after
    /// the configured shutdown timeout.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.store
            .shutdown(Duration::from_secs(self.config.server.shutdown_timeout))
            .await
    }
}
