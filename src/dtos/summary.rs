use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::summary::MonthlySummary;

#[derive(Debug, Deserialize)]
pub struct GenerateSummaryRequest {
    pub month: u32,
    pub year: i32,
}

/// Inclusive month range for the dashboard aggregate.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub from_month: u32,
    pub from_year: i32,
    pub to_month: u32,
    pub to_year: i32,
}

#[derive(Serialize)]
pub struct MonthlySummaryResponse {
    pub id: i64,
    pub month: i32,
    pub year: i32,
    pub total_expense: Decimal,
    pub total_debt: Decimal,
    pub total_bank: Decimal,
    pub total_cash: Decimal,
    pub total_sales: Decimal,
    pub cost_of_stock: Decimal,
    pub gross_profit: Decimal,
    pub net_profit: Decimal,
    pub stock_value: Decimal,
    pub total_investment: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<MonthlySummary> for MonthlySummaryResponse {
    fn from(row: MonthlySummary) -> Self {
        Self {
            id: row.id,
            month: row.month,
            year: row.year,
            total_expense: row.total_expense,
            total_debt: row.total_debt,
            total_bank: row.total_bank,
            total_cash: row.total_cash,
            total_sales: row.total_sales,
            cost_of_stock: row.cost_of_stock,
            gross_profit: row.gross_profit,
            net_profit: row.net_profit,
            stock_value: row.stock_value,
            total_investment: row.total_investment,
            created_at: row.created_at,
        }
    }
}
