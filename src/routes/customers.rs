use axum::{
    routing::{get, patch},
    Router,
};
use crate::handlers::customer;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(customer::list_customers).post(customer::create_customer))
        .route(
            "/customers/{id}",
            patch(customer::update_customer)
                .get(customer::get_customer)
                .delete(customer::delete_customer),
        )
        .route_layer(axum::middleware::from_fn(require_auth))
}
