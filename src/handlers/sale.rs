// src/handlers/sale.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use crate::dtos::sale::{
    CreateSaleRequest, InstallmentResponse, ReturnSaleRequest, SaleDetailResponse,
    SaleListQuery, SaleResponse,
};
use crate::error::AppError;
use crate::models::installment::Installment;
use crate::models::sale::{Sale, SaleType};
use crate::services::sale::{self, NewSale, SaleReturn};
use crate::state::AppState;

const DEFAULT_MAX_INSTALLMENTS: i32 = 10;

fn max_installments() -> i32 {
    std::env::var("MAX_INSTALLMENTS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_MAX_INSTALLMENTS)
}

// POST /sales
#[instrument(skip(state, payload))]
pub async fn create_sale(
    State(state): State<AppState>,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), AppError> {
    if payload.sale_type == SaleType::Installment {
        let limit = max_installments();
        if payload.total_installments > limit {
            return Err(AppError::validation(format!(
                "Cannot split a sale across more than {limit} installments"
            )));
        }
    }

    let sale = sale::create_sale(
        &state.db_pool,
        NewSale {
            customer_id: payload.customer_id,
            product_id: payload.product_id,
            sale_date: payload.sale_date,
            sale_type: payload.sale_type,
            payment_method: payload.payment_method,
            quantity: payload.quantity,
            discount: payload.discount,
            down_payment: payload.down_payment,
            total_installments: payload.total_installments,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(SaleResponse::from(sale))))
}

// GET /sales - Optional filters combine with AND.
#[instrument(skip(state))]
pub async fn list_sales(
    Query(query): Query<SaleListQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<SaleResponse>>, AppError> {
    let sales = sqlx::query_as::<_, Sale>(
        "SELECT id, customer_id, product_id, sale_date, sale_type, payment_method,
                quantity, discount, total_amount, down_payment, paid_amount,
                remaining_amount, per_installment, total_installments, paid_installments,
                return_quantity, return_amount, status, created_at
         FROM sales
         WHERE ($1::BIGINT IS NULL OR customer_id = $1)
           AND ($2::BIGINT IS NULL OR product_id = $2)
           AND ($3::sale_status IS NULL OR status = $3)
           AND ($4::DATE IS NULL OR sale_date >= $4)
           AND ($5::DATE IS NULL OR sale_date <= $5)
         ORDER BY sale_date DESC, id DESC
         LIMIT $6 OFFSET $7",
    )
    .bind(query.customer_id)
    .bind(query.product_id)
    .bind(query.status)
    .bind(query.from)
    .bind(query.to)
    .bind(query.limit.unwrap_or(100).clamp(1, 500))
    .bind(query.offset.unwrap_or(0).max(0))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(sales.into_iter().map(SaleResponse::from).collect()))
}

// GET /sales/:id - Sale with its installment schedule.
#[instrument(skip(state), fields(id))]
pub async fn get_sale(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<SaleDetailResponse>, AppError> {
    let sale = sqlx::query_as::<_, Sale>(
        "SELECT id, customer_id, product_id, sale_date, sale_type, payment_method,
                quantity, discount, total_amount, down_payment, paid_amount,
                remaining_amount, per_installment, total_installments, paid_installments,
                return_quantity, return_amount, status, created_at
         FROM sales WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Sale not found"))?;

    let (customer_name, product_name) = sqlx::query_as::<_, (String, String)>(
        "SELECT c.name, p.name FROM customers c, products p WHERE c.id = $1 AND p.id = $2",
    )
    .bind(sale.customer_id)
    .bind(sale.product_id)
    .fetch_one(&state.db_pool)
    .await?;

    let installments = sqlx::query_as::<_, Installment>(
        "SELECT id, sale_id, amount, due_date, paid_date, status FROM installments
         WHERE sale_id = $1 ORDER BY due_date, id",
    )
    .bind(id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(SaleDetailResponse {
        sale: SaleResponse::from(sale),
        customer_name,
        product_name,
        installments: installments.into_iter().map(InstallmentResponse::from).collect(),
    }))
}

// POST /sales/:id/return
#[instrument(skip(state, payload), fields(id))]
pub async fn return_sale(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<ReturnSaleRequest>,
) -> Result<Json<SaleResponse>, AppError> {
    let sale = sale::return_sale(
        &state.db_pool,
        SaleReturn {
            sale_id: id,
            date: payload.date,
            quantity: payload.quantity,
            refund_method: payload.refund_method,
            note: payload.note,
        },
    )
    .await?;

    Ok(Json(SaleResponse::from(sale)))
}

// DELETE /sales/:id
#[instrument(skip(state), fields(id))]
pub async fn delete_sale(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    sale::delete_sale(&state.db_pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
