use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sale_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SaleType {
    Cash,
    Installment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Cash,
    Bank,
}

/// Derived by the engines from amounts and dates, never accepted from a
/// caller. COMPLETED and RETURNED are terminal for payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sale_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SaleStatus {
    Active,
    Partial,
    Completed,
    Returned,
}

#[derive(Debug, Clone, FromRow)]
pub struct Sale {
    pub id: i64,
    pub customer_id: i64,
    pub product_id: i64,
    pub sale_date: NaiveDate,
    pub sale_type: SaleType,
    pub payment_method: PaymentMethod,
    pub quantity: i32,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub down_payment: Decimal,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub per_installment: Decimal,
    pub total_installments: i32,
    pub paid_installments: i32,
    pub return_quantity: i32,
    pub return_amount: Decimal,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}
