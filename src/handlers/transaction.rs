// src/handlers/transaction.rs
//
// Manual daily-ledger entries. Rows generated by the sale/stock/installment
// engines carry link columns and may only be changed through their engines;
// the guard here keeps manual edits away from them.
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use tracing::instrument;

use crate::dtos::transaction::{
    CreateDailyTransactionRequest, DailyTransactionListQuery, DailyTransactionResponse,
    UpdateDailyTransactionRequest,
};
use crate::error::AppError;
use crate::models::transaction::{DailyTransaction, LedgerKind, TxDirection};
use crate::state::AppState;

fn is_engine_generated(row: &DailyTransaction) -> bool {
    row.sale_id.is_some()
        || row.stock_id.is_some()
        || row.installment_id.is_some()
        || row.investment_id.is_some()
        || row.product_id.is_some()
}

async fn fetch_transaction(state: &AppState, id: i64) -> Result<DailyTransaction, AppError> {
    sqlx::query_as::<_, DailyTransaction>(
        "SELECT id, kind, direction, amount, date, note, sale_id, product_id, stock_id,
                installment_id, investment_id, created_at
         FROM daily_transactions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Daily transaction not found"))
}

// GET /transactions
#[instrument(skip(state))]
pub async fn list_daily_transactions(
    Query(query): Query<DailyTransactionListQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<DailyTransactionResponse>>, AppError> {
    let rows = sqlx::query_as::<_, DailyTransaction>(
        "SELECT id, kind, direction, amount, date, note, sale_id, product_id, stock_id,
                installment_id, investment_id, created_at
         FROM daily_transactions
         WHERE ($1::ledger_kind IS NULL OR kind = $1)
           AND ($2::tx_direction IS NULL OR direction = $2)
           AND ($3::DATE IS NULL OR date >= $3)
           AND ($4::DATE IS NULL OR date <= $4)
         ORDER BY date DESC, id DESC
         LIMIT $5 OFFSET $6",
    )
    .bind(query.kind)
    .bind(query.direction)
    .bind(query.from)
    .bind(query.to)
    .bind(query.limit.unwrap_or(100).clamp(1, 500))
    .bind(query.offset.unwrap_or(0).max(0))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(rows.into_iter().map(DailyTransactionResponse::from).collect()))
}

// POST /transactions
#[instrument(skip(state, payload))]
pub async fn create_daily_transaction(
    State(state): State<AppState>,
    Json(payload): Json<CreateDailyTransactionRequest>,
) -> Result<(StatusCode, Json<DailyTransactionResponse>), AppError> {
    if payload.amount <= Decimal::ZERO {
        return Err(AppError::validation("Amount must be greater than zero"));
    }

    let direction = payload.direction.unwrap_or(match payload.kind {
        LedgerKind::Expense | LedgerKind::Debt => TxDirection::Out,
        LedgerKind::Cash | LedgerKind::Bank => TxDirection::In,
    });

    let row = sqlx::query_as::<_, DailyTransaction>(
        "INSERT INTO daily_transactions (kind, direction, amount, date, note)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, kind, direction, amount, date, note, sale_id, product_id, stock_id,
                   installment_id, investment_id, created_at",
    )
    .bind(payload.kind)
    .bind(direction)
    .bind(payload.amount)
    .bind(payload.date)
    .bind(payload.note)
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(DailyTransactionResponse::from(row))))
}

// PATCH /transactions/:id
#[instrument(skip(state, payload), fields(id))]
pub async fn update_daily_transaction(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateDailyTransactionRequest>,
) -> Result<Json<DailyTransactionResponse>, AppError> {
    let existing = fetch_transaction(&state, id).await?;
    if is_engine_generated(&existing) {
        return Err(AppError::conflict(
            "This transaction belongs to a sale, stock or investment record. Modify that record instead",
        ));
    }
    if let Some(amount) = payload.amount {
        if amount <= Decimal::ZERO {
            return Err(AppError::validation("Amount must be greater than zero"));
        }
    }

    let row = sqlx::query_as::<_, DailyTransaction>(
        "UPDATE daily_transactions SET
             kind = COALESCE($1, kind),
             direction = COALESCE($2, direction),
             amount = COALESCE($3, amount),
             date = COALESCE($4, date),
             note = COALESCE($5, note)
         WHERE id = $6
         RETURNING id, kind, direction, amount, date, note, sale_id, product_id, stock_id,
                   installment_id, investment_id, created_at",
    )
    .bind(payload.kind)
    .bind(payload.direction)
    .bind(payload.amount)
    .bind(payload.date)
    .bind(payload.note)
    .bind(id)
    .fetch_one(&state.db_pool)
    .await?;

    Ok(Json(DailyTransactionResponse::from(row)))
}

// DELETE /transactions/:id
#[instrument(skip(state), fields(id))]
pub async fn delete_daily_transaction(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let existing = fetch_transaction(&state, id).await?;
    if is_engine_generated(&existing) {
        return Err(AppError::conflict(
            "This transaction belongs to a sale, stock or investment record. Modify that record instead",
        ));
    }

    sqlx::query("DELETE FROM daily_transactions WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
