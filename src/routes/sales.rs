use axum::{
    routing::{get, post},
    Router,
};
use crate::handlers::{installment, sale};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(sale::list_sales).post(sale::create_sale))
        .route("/sales/{id}", get(sale::get_sale).delete(sale::delete_sale))
        .route("/sales/{id}/return", post(sale::return_sale))
        .route("/sales/{id}/installments/pay", post(installment::pay_installment))
        .route_layer(axum::middleware::from_fn(require_auth))
}
