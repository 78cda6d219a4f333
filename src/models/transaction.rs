use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tx_direction", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TxDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "stock_kind", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum StockKind {
    Purchase,
    Sale,
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ledger_kind", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum LedgerKind {
    Cash,
    Bank,
    Expense,
    Debt,
}

impl From<crate::models::sale::PaymentMethod> for LedgerKind {
    fn from(method: crate::models::sale::PaymentMethod) -> Self {
        match method {
            crate::models::sale::PaymentMethod::Cash => LedgerKind::Cash,
            crate::models::sale::PaymentMethod::Bank => LedgerKind::Bank,
        }
    }
}

/// Append-only inventory ledger row. One row per physical stock movement;
/// deletion goes through the stock engine so the compensating product
/// adjustment is applied with it.
#[derive(Debug, Clone, FromRow)]
pub struct StockTransaction {
    pub id: i64,
    pub product_id: i64,
    pub sale_id: Option<i64>,
    pub quantity: i32,
    pub direction: TxDirection,
    pub kind: StockKind,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub initial: bool,
    pub created_at: DateTime<Utc>,
}

/// Append-only cash/bank ledger row. Every money movement in the system has
/// exactly one of these.
#[derive(Debug, Clone, FromRow)]
pub struct DailyTransaction {
    pub id: i64,
    pub kind: LedgerKind,
    pub direction: TxDirection,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub sale_id: Option<i64>,
    pub product_id: Option<i64>,
    pub stock_id: Option<i64>,
    pub installment_id: Option<i64>,
    pub investment_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
