use axum::{
    routing::{delete, get},
    Router,
};
use crate::handlers::summary;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/summaries", get(summary::list_summaries).post(summary::generate_summary))
        .route("/summaries/dashboard", get(summary::dashboard))
        .route("/summaries/{id}", delete(summary::delete_summary))
        .route_layer(axum::middleware::from_fn(require_auth))
}
