use axum::{routing::patch, Router};
use crate::handlers::installment;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/installments/{id}", patch(installment::update_installment))
        .route_layer(axum::middleware::from_fn(require_auth))
}
