use axum::{
    routing::{get, patch},
    Router,
};
use crate::handlers::product;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(product::list_products).post(product::register_product))
        .route(
            "/products/{id}",
            patch(product::update_product)
                .get(product::get_product)
                .delete(product::delete_product),
        )
        .route_layer(axum::middleware::from_fn(require_auth))
}
