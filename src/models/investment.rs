use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Investment {
    pub id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub note: Option<String>,
}
