use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::investment::Investment;

#[derive(Deserialize)]
pub struct CreateInvestmentRequest {
    pub amount: Decimal,
    pub date: NaiveDate,
    pub note: Option<String>,
}

#[derive(Serialize)]
pub struct InvestmentResponse {
    pub id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl From<Investment> for InvestmentResponse {
    fn from(row: Investment) -> Self {
        Self {
            id: row.id,
            amount: row.amount,
            date: row.date,
            note: row.note,
        }
    }
}
