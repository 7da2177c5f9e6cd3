//! Scan client over real HTTP.
//!
//! Binds the service (or a misbehaving stand-in) on a loopback port and
//! drives it through `HttpTransport` and `ScanSubmitter`.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Integration tests can use expect for setup

mod common;

use axum::{http::StatusCode, routing::post, Router};
use common::{app, test_config, ticket, EVENT_NAME};
use echopass_checkin::api::checkin::CheckInRequest;
use echopass_checkin::scanner::{CaptureSession, CheckInTransport, HttpTransport, LineScanner, TransportError};
use echopass_checkin::{EventId, Owner, ScanOutcome, ScanPayload, ScanSubmitter, TicketId};
use echopass_testing::{test_clock, TEST_EPOCH_MILLIS};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn request(ticket_id: &str) -> CheckInRequest {
    CheckInRequest {
        ticket_data: ScanPayload {
            ticket_id: Some(TicketId::new(ticket_id)),
            token_id: Some(1),
            event_id: Some(EventId::new("E1")),
            owner: Some(Owner::new("0xabc")),
            salt: None,
            timestamp: Some(TEST_EPOCH_MILLIS),
        },
        timestamp: Some(TEST_EPOCH_MILLIS),
    }
}

#[tokio::test]
async fn test_submit_reads_success_and_refusal_bodies() {
    let (_, app) = app(None, [ticket("T1")]);
    let base_url = serve(app.router()).await;
    let transport = HttpTransport::new(&base_url, Duration::from_secs(2)).unwrap();

    let admitted = transport.submit(request("T1")).await.unwrap();
    assert!(admitted.success);
    assert_eq!(admitted.ticket_id.as_deref(), Some("T1"));
    assert_eq!(admitted.timestamp, Some(TEST_EPOCH_MILLIS));

    // 400 still carries a check-in response
    let duplicate = transport.submit(request("T1")).await.unwrap();
    assert!(!duplicate.success);
    assert_eq!(
        duplicate.error.as_deref(),
        Some("Ticket already checked in or invalid")
    );
}

#[tokio::test]
async fn test_passphrase_header_is_sent() {
    let (_, app) = app(Some("door-7"), [ticket("T1"), ticket("T2")]);
    let base_url = serve(app.router()).await;

    let bare = HttpTransport::new(&base_url, Duration::from_secs(2)).unwrap();
    let denied = bare.submit(request("T1")).await.unwrap_err();
    assert!(matches!(
        denied,
        TransportError::UnexpectedResponse { status: 401, .. }
    ));

    let keyed = bare.clone().with_passphrase("door-7");
    assert!(keyed.submit(request("T1")).await.unwrap().success);

    let mut config = test_config(Some("door-7"));
    config.scanner.base_url = format!("{base_url}/");
    let configured = HttpTransport::from_config(&config).unwrap();
    assert_eq!(configured.base_url(), base_url);
    assert!(configured.submit(request("T2")).await.unwrap().success);
}

#[tokio::test]
async fn test_non_json_500_is_unexpected_response() {
    let router = Router::new().route(
        "/api/checkin/qr",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
    );
    let base_url = serve(router).await;
    let transport = HttpTransport::new(&base_url, Duration::from_secs(2)).unwrap();

    let error = transport.submit(request("T1")).await.unwrap_err();
    assert!(matches!(
        error,
        TransportError::UnexpectedResponse { status: 500, .. }
    ));

    let submitter = ScanSubmitter::new(transport, Arc::new(test_clock()), Duration::from_secs(2));
    let raw = serde_json::to_string(&request("T1").ticket_data).unwrap();
    assert_eq!(
        submitter.submit(&raw).await,
        ScanOutcome::Refused {
            reason: "Check-in failed".to_string()
        }
    );
}

#[tokio::test]
async fn test_fetch_ticket() {
    let (_, app) = app(None, [ticket("T1")]);
    let base_url = serve(app.router()).await;
    let transport = HttpTransport::new(&base_url, Duration::from_secs(2)).unwrap();

    let fetched = transport.fetch_ticket(&TicketId::new("T1")).await.unwrap();
    assert_eq!(fetched.event_name, EVENT_NAME);
    assert!(!fetched.checked_in);

    let missing = transport.fetch_ticket(&TicketId::new("T404")).await.unwrap_err();
    assert!(matches!(
        missing,
        TransportError::UnexpectedResponse { status: 404, .. }
    ));
}

/// Scanner input to admission: the line a wedge scanner types is the code the
/// service handed out.
#[tokio::test]
async fn test_line_scanner_to_service() {
    let (_, app) = app(None, [ticket("T1")]);
    let base_url = serve(app.router()).await;

    let qr: Value = reqwest::get(format!("{base_url}/api/tickets/T1/qr"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let typed = format!("{}\n{}\n", qr["qrData"].as_str().unwrap(), qr["qrData"].as_str().unwrap());
    let input = std::io::Cursor::new(typed.into_bytes());

    let session = CaptureSession::start(Arc::new(LineScanner::new(input))).await.unwrap();
    let submitter = ScanSubmitter::new(
        HttpTransport::new(&base_url, Duration::from_secs(2)).unwrap(),
        Arc::new(test_clock()),
        Duration::from_secs(2),
    );

    assert!(submitter.scan_next(&session).await.unwrap().is_admitted());
    assert_eq!(
        submitter.scan_next(&session).await.unwrap(),
        ScanOutcome::Refused {
            reason: "Ticket already checked in or invalid".to_string()
        }
    );
    assert!(submitter.scan_next(&session).await.is_none());

    let stats = app.state().checkin.stats().await;
    assert_eq!((stats.total, stats.successful, stats.failed), (2, 1, 1));
}
