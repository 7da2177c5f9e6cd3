//! Operator feed endpoints.

use crate::feed::{FeedSnapshot, FeedStats};
use crate::server::state::AppState;
use axum::{extract::State, Json};

/// Recent outcomes, newest first, with counters.
///
/// ```bash
/// curl http://localhost:8080/api/checkin/feed -H 'X-Kiosk-Passphrase: ...'
/// # {"entries":[{"id":"...","ticketId":"T1",...}],"stats":{"total":1,"successful":1,"failed":0}}
/// ```
pub async fn get_feed(State(state): State<AppState>) -> Json<FeedSnapshot> {
    Json(state.checkin.feed().await)
}

/// Counters only.
pub async fn get_stats(State(state): State<AppState>) -> Json<FeedStats> {
    Json(state.checkin.stats().await)
}
