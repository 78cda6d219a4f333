// src/middleware/watcher.rs
//
// Write watcher: counts mutating requests and refreshes the current month's
// cached summary every N writes. The refresh runs on a spawned task so the
// request that tripped the threshold never waits for it.
use std::sync::atomic::Ordering;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use tracing::{info, warn};

use crate::services::summary;
use crate::state::AppState;

const DEFAULT_WRITE_THRESHOLD: u64 = 20;

fn write_threshold() -> u64 {
    std::env::var("SUMMARY_WRITE_THRESHOLD")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_WRITE_THRESHOLD)
}

pub async fn watch_writes(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let is_write = method == Method::POST
        || method == Method::PUT
        || method == Method::PATCH
        || method == Method::DELETE;

    let response = next.run(req).await;

    if is_write && response.status().is_success() {
        let count = state.write_counter.fetch_add(1, Ordering::Relaxed) + 1;
        if count >= write_threshold() {
            state.write_counter.store(0, Ordering::Relaxed);
            let pool = state.db_pool.clone();
            tokio::spawn(async move {
                let today = Utc::now().date_naive();
                match summary::recompute_current_month(&pool, today).await {
                    Ok(s) => info!(month = s.month, year = s.year, "Summary refreshed by write watcher"),
                    Err(e) => warn!(error = ?e, "Write watcher summary refresh failed"),
                }
            });
        }
    }

    response
}
