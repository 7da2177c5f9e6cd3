//! EchoPass check-in - QR ticket validation for event entry
//!
//! A ticket holder's device shows a QR code built from the ticket identity and
//! a rotating salt. A kiosk scans it and submits it; the validation service
//! checks structure and freshness, then asks the ticket ledger to flip the
//! ticket from pending to checked in. Every attempt lands in a bounded feed
//! the door staff watch.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   QR text   ┌──────────────┐  POST /api/checkin/qr  ┌───────────────────┐
//! │  QrDisplay   │ ──────────▶ │ ScanSubmitter│ ─────────────────────▶ │  CheckInService   │
//! │ (QrEncoder)  │             │  (kiosk)     │ ◀───────────────────── │  Store + reducer  │
//! └──────────────┘             └──────────────┘       verdict          └───────────────────┘
//!                                                                         │            │
//!                                                               ledger CAS│            │ outcome
//!                                                                         ▼            ▼
//!                                                                 ┌──────────────┐ ┌────────────┐
//!                                                                 │ TicketLedger │ │ CheckInFeed│
//!                                                                 └──────────────┘ └────────────┘
//! ```
//!
//! # Key Properties
//!
//! ## 1. Exactly-once check-in
//!
//! ```text
//! ledger.check_in(scan)  // verify + flip under one lock
//!
//! N concurrent scans of one ticket → 1 × ScanAccepted, N-1 × "already checked in"
//! ```
//!
//! ## 2. Freshness
//!
//! `|now - payload.timestamp| <= 5 min`, measured on the server clock.
//!
//! ## 3. One feed record per attempt
//!
//! Only outcome actions write to the feed, and every submission produces
//! exactly one outcome, also when it completes during shutdown.
//!
//! # Binaries
//!
//! - `echopass-server`: validation service, feed and ticket endpoints
//! - `echopass-kiosk`: reads a keyboard-wedge scanner and submits over HTTP
//! - `echopass-display`: prints a ticket's code, rotating it on schedule

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregates;
pub mod api;
pub mod app;
pub mod config;
pub mod encoder;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod metrics;
pub mod scanner;
pub mod server;
pub mod types;

pub use aggregates::{CheckInAction, CheckInEnvironment, CheckInReducer, CheckInState};
pub use app::{CheckInApp, CheckInService, TicketService};
pub use config::Config;
pub use encoder::{QrDisplay, QrEncoder};
pub use error::CheckInError;
pub use feed::{CheckInFeed, FeedSnapshot, FeedStats};
pub use ledger::{InMemoryTicketLedger, LedgerError, TicketLedger};
pub use scanner::{ScanOutcome, ScanSubmitter};
pub use types::{CheckInRecord, EventId, Owner, Salt, ScanPayload, TicketId, TicketIdentity};
