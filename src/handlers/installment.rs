use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::instrument;

use crate::dtos::sale::{PayInstallmentRequest, SaleResponse, UpdateInstallmentRequest};
use crate::error::AppError;
use crate::services::installment::{self, PayInstallment, UpdateInstallment};
use crate::state::AppState;

// POST /sales/:id/installments/pay - Collect against the earliest unpaid slot.
#[instrument(skip(state, payload), fields(id))]
pub async fn pay_installment(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<PayInstallmentRequest>,
) -> Result<Json<SaleResponse>, AppError> {
    let sale = installment::pay_installment(
        &state.db_pool,
        PayInstallment {
            sale_id: id,
            amount: payload.amount,
            paid_date: payload.paid_date,
            payment_method: payload.payment_method,
        },
        Utc::now().date_naive(),
    )
    .await?;

    Ok(Json(SaleResponse::from(sale)))
}

// PATCH /installments/:id - Correct a recorded payment.
#[instrument(skip(state, payload), fields(id))]
pub async fn update_installment(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateInstallmentRequest>,
) -> Result<Json<SaleResponse>, AppError> {
    let sale = installment::update_installment(
        &state.db_pool,
        UpdateInstallment {
            installment_id: id,
            amount: payload.amount,
            paid_date: payload.paid_date,
            payment_method: payload.payment_method,
        },
        Utc::now().date_naive(),
    )
    .await?;

    Ok(Json(SaleResponse::from(sale)))
}
