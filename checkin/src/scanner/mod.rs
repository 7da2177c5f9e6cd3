//! Scan submission client.
//!
//! Runs on the kiosk: takes raw QR text (from a [`CaptureSession`] or typed
//! in), rejects anything that is not a ticket payload without calling the
//! service, forwards the rest, and publishes the latest result for the
//! kiosk screen.
//!
//! ```ignore
//! let transport = HttpTransport::new(&config.scanner.base_url, config.scanner.request_timeout())?;
//! let submitter = ScanSubmitter::new(transport, Arc::new(SystemClock), config.scanner.request_timeout());
//!
//! let outcome = submitter.submit(&raw_text).await;
//! ```

pub mod capture;
pub mod transport;

pub use capture::{CaptureDevice, CaptureError, CaptureSession, LineScanner};
pub use transport::{CheckInTransport, HttpTransport, LocalTransport, TransportError};

use crate::api::checkin::CheckInRequest;
use crate::error::CHECK_IN_FAILED;
use crate::types::ScanPayload;
use echopass_core::environment::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Reason reported for text that is not a ticket payload
pub const LOCAL_INVALID_TICKET_DATA: &str = "invalid ticket data";

/// Result of one submission as the kiosk shows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Ticket admitted
    Admitted {
        /// Admitted ticket
        ticket_id: String,
        /// Service message
        message: String,
        /// Check-in time, epoch milliseconds
        timestamp: i64,
    },
    /// Ticket not admitted
    Refused {
        /// Why
        reason: String,
    },
}

impl ScanOutcome {
    /// Whether the ticket was admitted
    #[must_use]
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }

    fn refused(reason: impl Into<String>) -> Self {
        Self::Refused {
            reason: reason.into(),
        }
    }
}

/// Most recent attempt, replaced by each new one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastScan {
    /// Raw scanned text
    pub data: String,
    /// Whether it was admitted
    pub success: bool,
    /// Local time of the attempt, epoch milliseconds
    pub timestamp: i64,
    /// Failure reason
    pub reason: Option<String>,
}

/// Kiosk-side submitter
pub struct ScanSubmitter<T> {
    transport: T,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    last_scan: watch::Sender<Option<LastScan>>,
}

impl<T: CheckInTransport> ScanSubmitter<T> {
    /// Submitter over `transport`, giving up on a response after `timeout`
    #[must_use]
    pub fn new(transport: T, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        let (last_scan, _) = watch::channel(None);
        Self {
            transport,
            clock,
            timeout,
            last_scan,
        }
    }

    /// Parse `raw`, submit it, and record the result
    ///
    /// Never retries: a failed attempt is repeated only by scanning again.
    pub async fn submit(&self, raw: &str) -> ScanOutcome {
        let outcome = match parse_payload(raw) {
            Some(payload) => self.forward(payload).await,
            None => {
                tracing::debug!("Scanned text is not a ticket payload");
                ScanOutcome::refused(LOCAL_INVALID_TICKET_DATA)
            },
        };

        let last = LastScan {
            data: raw.to_string(),
            success: outcome.is_admitted(),
            timestamp: self.clock.now_millis(),
            reason: match &outcome {
                ScanOutcome::Admitted { .. } => None,
                ScanOutcome::Refused { reason } => Some(reason.clone()),
            },
        };
        self.last_scan.send_replace(Some(last));

        outcome
    }

    /// Read one code from `session` and submit it
    ///
    /// `None` once the device stops producing codes.
    pub async fn scan_next(&self, session: &CaptureSession) -> Option<ScanOutcome> {
        let raw = session.next_code().await?;
        Some(self.submit(&raw).await)
    }

    async fn forward(&self, payload: ScanPayload) -> ScanOutcome {
        let request = CheckInRequest {
            ticket_data: payload,
            timestamp: Some(self.clock.now_millis()),
        };

        match tokio::time::timeout(self.timeout, self.transport.submit(request)).await {
            Ok(Ok(response)) if response.success => ScanOutcome::Admitted {
                ticket_id: response.ticket_id.unwrap_or_default(),
                message: response.message.unwrap_or_default(),
                timestamp: response.timestamp.unwrap_or_default(),
            },
            Ok(Ok(response)) => {
                ScanOutcome::refused(response.error.unwrap_or_else(|| CHECK_IN_FAILED.to_string()))
            },
            Ok(Err(error)) => {
                tracing::warn!(%error, "Check-in request failed");
                ScanOutcome::refused(CHECK_IN_FAILED)
            },
            Err(_) => {
                tracing::warn!(timeout_ms = ?self.timeout.as_millis(), "Check-in request timed out");
                ScanOutcome::refused(CHECK_IN_FAILED)
            },
        }
    }

    /// Most recent attempt
    #[must_use]
    pub fn last_scan(&self) -> Option<LastScan> {
        self.last_scan.borrow().clone()
    }

    /// Follow attempts as they happen
    #[must_use]
    pub fn watch_last_scan(&self) -> watch::Receiver<Option<LastScan>> {
        self.last_scan.subscribe()
    }
}

/// Decode QR text into a payload carrying a full identity
fn parse_payload(raw: &str) -> Option<ScanPayload> {
    let payload: ScanPayload = serde_json::from_str(raw.trim()).ok()?;
    payload.identity().map(|_| payload)
}
