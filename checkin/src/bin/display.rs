//! EchoPass ticket display
//!
//! Shows a ticket's scan code the way the holder's screen does: fetches the
//! ticket from the service, then prints a freshly salted code every
//! `QR_ROTATION_INTERVAL_SECS`. Type `r` and Enter to refresh at once.
//!
//! # Usage
//!
//! ```bash
//! SCANNER_BASE_URL=http://door-server:8080 cargo run --bin echopass-display -- TKT-001
//! ```

use echopass_checkin::scanner::HttpTransport;
use echopass_checkin::{Config, QrDisplay, QrEncoder, TicketId};
use echopass_core::environment::SystemClock;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
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

    let ticket_id = std::env::args()
        .nth(1)
        .map(TicketId::new)
        .ok_or_else(|| anyhow::anyhow!("usage: echopass-display <ticket-id>"))?;

    let transport = HttpTransport::from_config(&config)?;
    let ticket = transport.fetch_ticket(&ticket_id).await?;
    tracing::info!(ticket_id = %ticket.ticket_id, event = %ticket.event_name, "Displaying ticket");

    let display = QrDisplay::start(
        QrEncoder::new(Arc::new(SystemClock)),
        ticket,
        config.checkin.qr_rotation_interval(),
    )?;
    let mut codes = display.subscribe();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", codes.borrow_and_update().text);
    loop {
        tokio::select! {
            changed = codes.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", codes.borrow_and_update().text);
            },
            line = input.next_line() => match line {
                Ok(Some(line)) if line.trim() == "r" => {
                    if let Err(error) = display.refresh() {
                        tracing::warn!(%error, "Refresh failed");
                    }
                },
                Ok(Some(_)) => {},
                Ok(None) | Err(_) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
