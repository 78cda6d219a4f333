use axum::{
    routing::{delete, get},
    Router,
};
use crate::handlers::investment;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/investments", get(investment::list_investments).post(investment::create_investment))
        .route("/investments/{id}", delete(investment::delete_investment))
        .route_layer(axum::middleware::from_fn(require_auth))
}
