use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use tracing::instrument;

use crate::dtos::investment::{CreateInvestmentRequest, InvestmentResponse};
use crate::error::AppError;
use crate::models::investment::Investment;
use crate::state::AppState;

// GET /investments
#[instrument(skip(state))]
pub async fn list_investments(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvestmentResponse>>, AppError> {
    let rows = sqlx::query_as::<_, Investment>(
        "SELECT id, amount, date, note FROM investments ORDER BY date DESC, id DESC",
    )
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(rows.into_iter().map(InvestmentResponse::from).collect()))
}

// POST /investments - Capital injection; writes the matching inbound cash row.
#[instrument(skip(state, payload))]
pub async fn create_investment(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvestmentRequest>,
) -> Result<(StatusCode, Json<InvestmentResponse>), AppError> {
    if payload.amount <= Decimal::ZERO {
        return Err(AppError::validation("Amount must be greater than zero"));
    }

    let mut tx = state.db_pool.begin().await?;

    let investment = sqlx::query_as::<_, Investment>(
        "INSERT INTO investments (amount, date, note)
         VALUES ($1, $2, $3)
         RETURNING id, amount, date, note",
    )
    .bind(payload.amount)
    .bind(payload.date)
    .bind(&payload.note)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO daily_transactions (kind, direction, amount, date, note, investment_id)
         VALUES ('CASH', 'IN', $1, $2, $3, $4)",
    )
    .bind(payload.amount)
    .bind(payload.date)
    .bind(payload.note.unwrap_or_else(|| "Owner investment".to_string()))
    .bind(investment.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(InvestmentResponse::from(investment))))
}

// DELETE /investments/:id - Removes the investment and its ledger row.
#[instrument(skip(state), fields(id))]
pub async fn delete_investment(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db_pool.begin().await?;

    sqlx::query("DELETE FROM daily_transactions WHERE investment_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM investments WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(AppError::not_found("Investment not found"));
    }

    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
