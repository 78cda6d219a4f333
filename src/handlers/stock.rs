use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use crate::dtos::product::ProductResponse;
use crate::dtos::stock::{CreateStockTransactionRequest, StockListQuery, StockTransactionResponse};
use crate::error::AppError;
use crate::models::sale::PaymentMethod;
use crate::models::transaction::StockTransaction;
use crate::services::stock::{self, NewStockMovement};
use crate::state::AppState;

// GET /stock
#[instrument(skip(state))]
pub async fn list_stock_transactions(
    Query(query): Query<StockListQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<StockTransactionResponse>>, AppError> {
    let rows = sqlx::query_as::<_, StockTransaction>(
        "SELECT id, product_id, sale_id, quantity, direction, kind, date, note, initial, created_at
         FROM stock_transactions
         WHERE ($1::BIGINT IS NULL OR product_id = $1)
           AND ($2::stock_kind IS NULL OR kind = $2)
           AND ($3::DATE IS NULL OR date >= $3)
           AND ($4::DATE IS NULL OR date <= $4)
         ORDER BY date DESC, id DESC
         LIMIT $5 OFFSET $6",
    )
    .bind(query.product_id)
    .bind(query.kind)
    .bind(query.from)
    .bind(query.to)
    .bind(query.limit.unwrap_or(100).clamp(1, 500))
    .bind(query.offset.unwrap_or(0).max(0))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(rows.into_iter().map(StockTransactionResponse::from).collect()))
}

// POST /stock - Manual stock movement (restock, supplier return).
#[instrument(skip(state, payload))]
pub async fn create_stock_transaction(
    State(state): State<AppState>,
    Json(payload): Json<CreateStockTransactionRequest>,
) -> Result<(StatusCode, Json<StockTransactionResponse>), AppError> {
    let movement = stock::create_stock_transaction(
        &state.db_pool,
        NewStockMovement {
            product_id: payload.product_id,
            quantity: payload.quantity,
            direction: payload.direction,
            kind: payload.kind,
            date: payload.date,
            note: payload.note,
            payment_method: payload.payment_method.unwrap_or(PaymentMethod::Cash),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(StockTransactionResponse::from(movement))))
}

// DELETE /stock/:id - Returns the product with its corrected count.
#[instrument(skip(state), fields(id))]
pub async fn delete_stock_transaction(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = stock::delete_stock_transaction(&state.db_pool, id).await?;
    Ok(Json(ProductResponse::from(product)))
}
