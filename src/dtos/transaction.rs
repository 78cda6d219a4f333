use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::transaction::{DailyTransaction, LedgerKind, TxDirection};

/// Manual ledger entry. Engine-generated rows carry link columns and are
/// created by their engines, never through this shape. Direction defaults
/// by kind: expenses and debts flow out, cash and bank notes flow in.
#[derive(Deserialize)]
pub struct CreateDailyTransactionRequest {
    pub kind: LedgerKind,
    pub direction: Option<TxDirection>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateDailyTransactionRequest {
    pub kind: Option<LedgerKind>,
    pub direction: Option<TxDirection>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DailyTransactionListQuery {
    pub kind: Option<LedgerKind>,
    pub direction: Option<TxDirection>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct DailyTransactionResponse {
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

impl From<DailyTransaction> for DailyTransactionResponse {
    fn from(row: DailyTransaction) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            direction: row.direction,
            amount: row.amount,
            date: row.date,
            note: row.note,
            sale_id: row.sale_id,
            product_id: row.product_id,
            stock_id: row.stock_id,
            installment_id: row.installment_id,
            investment_id: row.investment_id,
            created_at: row.created_at,
        }
    }
}
