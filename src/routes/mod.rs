pub mod auth;
pub mod customers;
pub mod installments;
pub mod investments;
pub mod products;
pub mod sales;
pub mod stock;
pub mod summaries;
pub mod transactions;

use axum::Router;
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(customers::routes())
        .merge(installments::routes())
        .merge(investments::routes())
        .merge(products::routes())
        .merge(sales::routes())
        .merge(stock::routes())
        .merge(summaries::routes())
        .merge(transactions::routes())
}
