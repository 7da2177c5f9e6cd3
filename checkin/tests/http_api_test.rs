//! HTTP API integration tests.
//!
//! Drive the full router (gate, correlation ids, handlers, store) in process
//! with `axum-test`.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Integration tests can use expect for setup

mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use common::{app, app_with_ledger, test_config, ticket, SlowLedger, EVENT_NAME};
use echopass_testing::TEST_EPOCH_MILLIS;
use serde_json::{json, Value};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

fn server(passphrase: Option<&str>) -> (std::sync::Arc<echopass_testing::MockClock>, TestServer) {
    let (clock, app) = app(passphrase, [ticket("T1")]);
    let server = TestServer::new(app.router()).expect("test server");
    (clock, server)
}

fn fresh_payload(timestamp: i64) -> Value {
    json!({
        "ticketData": {
            "ticketId": "T1",
            "tokenId": 1,
            "eventId": "E1",
            "owner": "0xabc",
            "salt": timestamp,
            "timestamp": timestamp
        },
        "timestamp": timestamp
    })
}

#[tokio::test]
async fn test_health_and_readiness() {
    let (_, server) = server(None);

    let health = server.get("/health").await;
    health.assert_status_ok();
    assert_eq!(health.json::<Value>()["status"], "ok");

    let ready = server.get("/ready").await;
    ready.assert_status_ok();
    assert_eq!(ready.json::<Value>()["ready"], true);
}

#[tokio::test]
async fn test_check_in_then_duplicate() {
    let (_, server) = server(None);

    let first = server
        .post("/api/checkin/qr")
        .json(&fresh_payload(TEST_EPOCH_MILLIS))
        .await;
    first.assert_status_ok();
    assert_eq!(
        first.json::<Value>(),
        json!({
            "success": true,
            "message": "Check-in successful",
            "ticketId": "T1",
            "timestamp": TEST_EPOCH_MILLIS
        })
    );

    let second = server
        .post("/api/checkin/qr")
        .json(&fresh_payload(TEST_EPOCH_MILLIS))
        .await;
    second.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        second.json::<Value>(),
        json!({"success": false, "error": "Ticket already checked in or invalid"})
    );

    let status = server.get("/api/tickets/T1").await.json::<Value>();
    assert_eq!(status["checkedIn"], true);
    assert_eq!(status["checkedInAt"], TEST_EPOCH_MILLIS);

    let feed = server.get("/api/checkin/feed").await.json::<Value>();
    assert_eq!(feed["stats"], json!({"total": 2, "successful": 1, "failed": 1}));
    assert_eq!(feed["entries"][0]["success"], false);
    assert_eq!(feed["entries"][0]["eventName"], EVENT_NAME);
    assert_eq!(feed["entries"][1]["success"], true);
}

#[tokio::test]
async fn test_expired_payload_is_refused() {
    let (clock, server) = server(None);
    clock.advance_millis(600_000);

    let response = server
        .post("/api/checkin/qr")
        .json(&fresh_payload(TEST_EPOCH_MILLIS))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "QR code expired");

    let status = server.get("/api/tickets/T1").await.json::<Value>();
    assert_eq!(status["checkedIn"], false);
}

#[tokio::test]
async fn test_fractional_timestamps_are_judged_on_freshness() {
    let (clock, server) = server(None);
    let body = |timestamp: f64| {
        json!({
            "ticketData": {"ticketId": "T1", "eventId": "E1", "owner": "0xabc", "timestamp": timestamp},
            "timestamp": timestamp
        })
    };

    clock.advance_millis(600_000);
    let stale = server.post("/api/checkin/qr").json(&body(1_735_689_600_000.5)).await;
    stale.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(stale.json::<Value>()["error"], "QR code expired");

    let fresh = server.post("/api/checkin/qr").json(&body(1_735_690_200_000.5)).await;
    fresh.assert_status_ok();
    assert_eq!(fresh.json::<Value>()["ticketId"], "T1");
}

#[tokio::test]
async fn test_validation_timeout_is_500_check_in_failed() {
    let mut config = test_config(None);
    config.checkin.validation_timeout_ms = 50;
    let ledger = Arc::new(SlowLedger::new([ticket("T1")], Duration::from_millis(300)));
    let (_, app) = app_with_ledger(config, ledger);
    let server = TestServer::new(app.router()).expect("test server");

    let response = server
        .post("/api/checkin/qr")
        .json(&fresh_payload(TEST_EPOCH_MILLIS))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({"success": false, "error": "Check-in failed"})
    );
}

#[tokio::test]
async fn test_malformed_bodies_are_invalid_ticket_data() {
    let (_, server) = server(None);

    let empty_ticket = server
        .post("/api/checkin/qr")
        .json(&json!({"ticketData": {}, "timestamp": TEST_EPOCH_MILLIS}))
        .await;
    empty_ticket.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        empty_ticket.json::<Value>(),
        json!({"success": false, "error": "Invalid ticket data"})
    );

    let no_ticket = server.post("/api/checkin/qr").json(&json!({})).await;
    no_ticket.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(no_ticket.json::<Value>()["error"], "Invalid ticket data");

    let not_json = server.post("/api/checkin/qr").text("hello").await;
    not_json.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(not_json.json::<Value>()["error"], "Invalid ticket data");

    let stats = server.get("/api/checkin/stats").await.json::<Value>();
    assert_eq!(stats, json!({"total": 3, "successful": 0, "failed": 3}));
}

#[tokio::test]
async fn test_qr_endpoint_round_trip() {
    let (_, server) = server(None);

    let qr = server.get("/api/tickets/T1/qr").await;
    qr.assert_status_ok();
    let qr = qr.json::<Value>();
    assert_eq!(qr["payload"]["timestamp"], TEST_EPOCH_MILLIS);
    assert_eq!(qr["refreshInSecs"], 30);

    // The rendered text is exactly what a kiosk decodes and submits
    let ticket_data: Value = serde_json::from_str(qr["qrData"].as_str().unwrap()).unwrap();
    let response = server
        .post("/api/checkin/qr")
        .json(&json!({"ticketData": ticket_data, "timestamp": TEST_EPOCH_MILLIS}))
        .await;
    response.assert_status_ok();

    let salted = server.get("/api/tickets/T1/qr?salt=1234").await.json::<Value>();
    assert_eq!(salted["payload"]["salt"], 1234);
}

#[tokio::test]
async fn test_ticket_issuance() {
    let (_, server) = server(None);

    let mut new_ticket = serde_json::to_value(ticket("T2")).unwrap();
    new_ticket["attendeeName"] = json!("Jane Smith");

    let created = server.post("/api/tickets").json(&new_ticket).await;
    created.assert_status(StatusCode::CREATED);
    assert_eq!(created.json::<Value>()["attendeeName"], "Jane Smith");

    let duplicate = server.post("/api/tickets").json(&new_ticket).await;
    duplicate.assert_status(StatusCode::CONFLICT);
    assert_eq!(duplicate.json::<Value>()["code"], "CONFLICT");

    let blank = server
        .post("/api/tickets")
        .json(&json!({"ticketId": "T3", "eventId": "", "owner": "0xabc"}))
        .await;
    blank.assert_status(StatusCode::BAD_REQUEST);

    let missing = server.get("/api/tickets/T404").await;
    missing.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(missing.json::<Value>()["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_kiosk_routes_require_passphrase() {
    let (_, server) = server(Some("door-7"));
    let header = HeaderName::from_static("x-kiosk-passphrase");

    let denied = server.get("/api/checkin/feed").await;
    denied.assert_status(StatusCode::UNAUTHORIZED);

    let denied_scan = server
        .post("/api/checkin/qr")
        .json(&fresh_payload(TEST_EPOCH_MILLIS))
        .await;
    denied_scan.assert_status(StatusCode::UNAUTHORIZED);

    let allowed = server
        .post("/api/checkin/qr")
        .add_header(header.clone(), HeaderValue::from_static("door-7"))
        .json(&fresh_payload(TEST_EPOCH_MILLIS))
        .await;
    allowed.assert_status_ok();

    // Refused requests never reached the service
    let stats = server
        .get("/api/checkin/stats")
        .add_header(header, HeaderValue::from_static("door-7"))
        .await
        .json::<Value>();
    assert_eq!(stats["total"], 1);

    // Issuance is an operator action too
    let new_ticket = serde_json::to_value(ticket("T2")).unwrap();
    server
        .post("/api/tickets")
        .json(&new_ticket)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/api/tickets")
        .add_header(
            HeaderName::from_static("x-kiosk-passphrase"),
            HeaderValue::from_static("door-7"),
        )
        .json(&new_ticket)
        .await
        .assert_status(StatusCode::CREATED);

    // Ticket reads and probe routes stay open
    server.get("/api/tickets/T1").await.assert_status_ok();
    server.get("/api/tickets/T1/qr").await.assert_status_ok();
    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let (_, server) = server(None);
    let id = "6f9619ff-8b86-d011-b42d-00cf4fc964ff";

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-correlation-id"),
            HeaderValue::from_static(id),
        )
        .await;

    assert_eq!(response.header("x-correlation-id"), id);
}

#[tokio::test]
async fn test_concurrent_duplicate_posts() {
    let (_, server) = server(None);
    let body = fresh_payload(TEST_EPOCH_MILLIS);

    let (a, b) = tokio::join!(
        server.post("/api/checkin/qr").json(&body).into_future(),
        server.post("/api/checkin/qr").json(&body).into_future(),
    );

    let mut statuses = [a.status_code(), b.status_code()];
    statuses.sort_by_key(StatusCode::as_u16);
    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);
}
