//! Axum integration for the EchoPass check-in service.
//!
//! The imperative shell around the check-in reducer:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, correlation IDs
//! │  - Request parsing                      │  ← kiosk passphrase gate
//! │  - Response serialization               │  ← logging
//! ├─────────────────────────────────────────┤
//! │         Functional Core                 │
//! │  - Check-in reducer, feed               │  ← tested without I/O
//! │  - Effect descriptions (ledger CAS)     │
//! └─────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

pub use error::AppError;
pub use extractors::CorrelationId;
pub use middleware::{
    correlation_id, require_passphrase, PassphraseGate, CORRELATION_ID_HEADER, PASSPHRASE_HEADER,
};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
