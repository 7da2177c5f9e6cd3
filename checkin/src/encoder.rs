//! Ticket identity encoder and rotating QR display.
//!
//! [`QrEncoder::encode`] turns a ticket plus a salt into the [`ScanPayload`]
//! a holder's device shows; [`QrEncoder::render`] produces the exact text a
//! QR renderer draws. [`QrDisplay`] keeps only the currently displayed code and
//! re-encodes it on a fixed interval or on demand.

use crate::metrics as checkin_metrics;
use crate::types::{Salt, ScanPayload, TicketIdentity};
use echopass_core::environment::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

/// Default automatic rotation period
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(30);

/// Errors from encoding a ticket
#[derive(Error, Debug)]
pub enum EncodeError {
    /// A required identity field is empty
    #[error("Ticket is missing {0}")]
    MissingField(&'static str),

    /// The payload could not be serialized
    #[error("Failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Builds scan payloads from ticket identities
#[derive(Clone)]
pub struct QrEncoder {
    clock: Arc<dyn Clock>,
}

impl QrEncoder {
    /// Encoder stamping payloads with `clock`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Payload for `ticket` at the current time
    ///
    /// # Errors
    ///
    /// [`EncodeError::MissingField`] if ticket id, event id or owner is blank.
    pub fn encode(&self, ticket: &TicketIdentity, salt: Salt) -> Result<ScanPayload, EncodeError> {
        if ticket.ticket_id.is_blank() {
            return Err(EncodeError::MissingField("ticketId"));
        }
        if ticket.event_id.is_blank() {
            return Err(EncodeError::MissingField("eventId"));
        }
        if ticket.owner.is_blank() {
            return Err(EncodeError::MissingField("owner"));
        }

        checkin_metrics::record_payload_encoded();

        Ok(ScanPayload {
            ticket_id: Some(ticket.ticket_id.clone()),
            token_id: Some(ticket.token_id),
            event_id: Some(ticket.event_id.clone()),
            owner: Some(ticket.owner.clone()),
            salt: Some(salt),
            timestamp: Some(self.clock.now_millis()),
        })
    }

    /// Fresh salt from the clock
    #[must_use]
    pub fn regenerate_salt(&self) -> Salt {
        Salt::from_millis(self.clock.now_millis())
    }

    /// Text to draw into the QR code
    ///
    /// # Errors
    ///
    /// [`EncodeError::Serialization`] if the payload cannot be serialized.
    pub fn render(payload: &ScanPayload) -> Result<String, EncodeError> {
        Ok(serde_json::to_string(payload)?)
    }

    /// Encode with a fresh salt and render
    ///
    /// # Errors
    ///
    /// See [`QrEncoder::encode`] and [`QrEncoder::render`].
    pub fn display_code(&self, ticket: &TicketIdentity) -> Result<DisplayedCode, EncodeError> {
        let payload = self.encode(ticket, self.regenerate_salt())?;
        let text = Self::render(&payload)?;
        Ok(DisplayedCode { payload, text })
    }
}

/// The code currently on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedCode {
    /// Structured payload
    pub payload: ScanPayload,
    /// Rendered QR text
    pub text: String,
}

/// Rotating display of one ticket's code
///
/// Dropping the display stops rotation.
pub struct QrDisplay {
    encoder: QrEncoder,
    ticket: TicketIdentity,
    current: Arc<watch::Sender<DisplayedCode>>,
    refresh: Arc<Notify>,
    task: JoinHandle<()>,
}

impl QrDisplay {
    /// Encode `ticket` now and rotate it every `interval`
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails if the ticket cannot be encoded.
    pub fn start(
        encoder: QrEncoder,
        ticket: TicketIdentity,
        interval: Duration,
    ) -> Result<Self, EncodeError> {
        let initial = encoder.display_code(&ticket)?;
        let (tx, _) = watch::channel(initial);
        let current = Arc::new(tx);
        let refresh = Arc::new(Notify::new());

        let task = tokio::spawn(Self::rotate(
            encoder.clone(),
            ticket.clone(),
            Arc::clone(&current),
            Arc::clone(&refresh),
            interval,
        ));

        Ok(Self {
            encoder,
            ticket,
            current,
            refresh,
            task,
        })
    }

    async fn rotate(
        encoder: QrEncoder,
        ticket: TicketIdentity,
        current: Arc<watch::Sender<DisplayedCode>>,
        refresh: Arc<Notify>,
        interval: Duration,
    ) {
        let period = interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {},
                () = refresh.notified() => {
                    // refresh() has already published its code
                    ticker.reset();
                    continue;
                },
            }

            match encoder.display_code(&ticket) {
                Ok(code) => {
                    current.send_replace(code);
                },
                Err(error) => {
                    tracing::warn!(ticket_id = %ticket.ticket_id, %error, "Failed to rotate QR code");
                },
            }
        }
    }

    /// Code on screen right now
    #[must_use]
    pub fn current(&self) -> DisplayedCode {
        self.current.borrow().clone()
    }

    /// Follow rotations
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DisplayedCode> {
        self.current.subscribe()
    }

    /// Re-encode immediately and restart the rotation period
    ///
    /// # Errors
    ///
    /// Fails if the ticket cannot be encoded; the previous code stays up.
    pub fn refresh(&self) -> Result<DisplayedCode, EncodeError> {
        let code = self.encoder.display_code(&self.ticket)?;
        self.current.send_replace(code.clone());
        self.refresh.notify_one();
        Ok(code)
    }
}

impl Drop for QrDisplay {
    fn drop(&mut self) {
        self.task.abort();
    }
}
