//! EchoPass scanning kiosk
//!
//! Reads decoded QR codes from a keyboard-wedge scanner on stdin, one per
//! line, submits each to the check-in service and prints the verdict.
//!
//! # Usage
//!
//! ```bash
//! SCANNER_BASE_URL=http://door-server:8080 KIOSK_PASSPHRASE=door-7 \
//!     cargo run --bin echopass-kiosk
//! ```

use echopass_checkin::scanner::{CaptureSession, HttpTransport, LineScanner};
use echopass_checkin::{Config, ScanOutcome, ScanSubmitter};
use echopass_core::environment::SystemClock;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},echopass_checkin=debug", config.server.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let transport = HttpTransport::from_config(&config)?;
    tracing::info!(service = %transport.base_url(), "Kiosk starting");

    let submitter = ScanSubmitter::new(
        transport,
        Arc::new(SystemClock),
        config.scanner.request_timeout(),
    );

    let session =
        CaptureSession::start(Arc::new(LineScanner::new(BufReader::new(tokio::io::stdin())))).await?;

    println!("Ready to scan");
    loop {
        let outcome = tokio::select! {
            outcome = submitter.scan_next(&session) => outcome,
            _ = tokio::signal::ctrl_c() => None,
        };

        match outcome {
            Some(ScanOutcome::Admitted { ticket_id, message, .. }) => {
                println!("ADMIT  {ticket_id}  {message}");
            },
            Some(ScanOutcome::Refused { reason }) => println!("REFUSE {reason}"),
            None => break,
        }
    }

    session.stop();
    tracing::info!("Kiosk stopped");
    Ok(())
}
