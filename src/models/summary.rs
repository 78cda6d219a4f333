use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Cached aggregate for one (year, month). Always produced by full
/// recomputation from the raw ledgers, never patched incrementally.
/// All fields except `stock_value` are monthly flows; `stock_value` is a
/// live snapshot taken at computation time.
#[derive(Debug, Clone, FromRow)]
pub struct MonthlySummary {
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
