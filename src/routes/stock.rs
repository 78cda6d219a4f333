use axum::{
    routing::{delete, get},
    Router,
};
use crate::handlers::stock;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stock", get(stock::list_stock_transactions).post(stock::create_stock_transaction))
        .route("/stock/{id}", delete(stock::delete_stock_transaction))
        .route_layer(axum::middleware::from_fn(require_auth))
}
