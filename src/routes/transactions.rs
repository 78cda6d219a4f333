use axum::{
    routing::{get, patch},
    Router,
};
use crate::handlers::transaction;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(transaction::list_daily_transactions).post(transaction::create_daily_transaction),
        )
        .route(
            "/transactions/{id}",
            patch(transaction::update_daily_transaction)
                .delete(transaction::delete_daily_transaction),
        )
        .route_layer(axum::middleware::from_fn(require_auth))
}
