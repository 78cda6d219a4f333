use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::sale::PaymentMethod;
use crate::models::transaction::{StockKind, StockTransaction, TxDirection};

#[derive(Deserialize)]
pub struct CreateStockTransactionRequest {
    pub product_id: i64,
    pub quantity: i32,
    pub direction: TxDirection,
    pub kind: StockKind,
    pub date: NaiveDate,
    pub note: Option<String>,
    /// How a purchase was paid for. Defaults to cash.
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Deserialize)]
pub struct StockListQuery {
    pub product_id: Option<i64>,
    pub kind: Option<StockKind>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct StockTransactionResponse {
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

impl From<StockTransaction> for StockTransactionResponse {
    fn from(row: StockTransaction) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            sale_id: row.sale_id,
            quantity: row.quantity,
            direction: row.direction,
            kind: row.kind,
            date: row.date,
            note: row.note,
            initial: row.initial,
            created_at: row.created_at,
        }
    }
}
