use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use crate::dtos::summary::{DashboardQuery, GenerateSummaryRequest, MonthlySummaryResponse};
use crate::error::AppError;
use crate::models::summary::MonthlySummary;
use crate::services::summary::{self, DashboardSummary};
use crate::state::AppState;

// GET /summaries
#[instrument(skip(state))]
pub async fn list_summaries(
    State(state): State<AppState>,
) -> Result<Json<Vec<MonthlySummaryResponse>>, AppError> {
    let rows = sqlx::query_as::<_, MonthlySummary>(
        "SELECT id, month, year, total_expense, total_debt, total_bank, total_cash,
                total_sales, cost_of_stock, gross_profit, net_profit, stock_value,
                total_investment, created_at
         FROM monthly_summaries ORDER BY year DESC, month DESC",
    )
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(rows.into_iter().map(MonthlySummaryResponse::from).collect()))
}

// POST /summaries - Rebuild one month from the raw ledgers.
#[instrument(skip(state))]
pub async fn generate_summary(
    State(state): State<AppState>,
    Json(payload): Json<GenerateSummaryRequest>,
) -> Result<Json<MonthlySummaryResponse>, AppError> {
    let summary = summary::recompute_month(&state.db_pool, payload.month, payload.year).await?;
    Ok(Json(MonthlySummaryResponse::from(summary)))
}

// GET /summaries/dashboard
#[instrument(skip(state))]
pub async fn dashboard(
    Query(query): Query<DashboardQuery>,
    State(state): State<AppState>,
) -> Result<Json<DashboardSummary>, AppError> {
    let dashboard = summary::aggregate_range(
        &state.db_pool,
        query.from_year,
        query.from_month,
        query.to_year,
        query.to_month,
    )
    .await?;

    Ok(Json(dashboard))
}

// DELETE /summaries/:id
#[instrument(skip(state), fields(id))]
pub async fn delete_summary(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    summary::delete_summary(&state.db_pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
