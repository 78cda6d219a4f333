use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::installment::{Installment, InstallmentStatus};
use crate::models::sale::{PaymentMethod, Sale, SaleStatus, SaleType};

#[derive(Deserialize)]
pub struct CreateSaleRequest {
    pub customer_id: i64,
    pub product_id: i64,
    pub sale_date: NaiveDate,
    pub sale_type: SaleType,
    pub payment_method: PaymentMethod,
    pub quantity: i32,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub down_payment: Decimal,
    #[serde(default)]
    pub total_installments: i32,
}

#[derive(Deserialize)]
pub struct ReturnSaleRequest {
    pub date: NaiveDate,
    pub quantity: i32,
    pub refund_method: PaymentMethod,
    pub note: Option<String>,
}

/// Optional list filters; all combine with AND.
#[derive(Debug, Deserialize)]
pub struct SaleListQuery {
    pub customer_id: Option<i64>,
    pub product_id: Option<i64>,
    pub status: Option<SaleStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct SaleResponse {
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

impl From<Sale> for SaleResponse {
    fn from(sale: Sale) -> Self {
        Self {
            id: sale.id,
            customer_id: sale.customer_id,
            product_id: sale.product_id,
            sale_date: sale.sale_date,
            sale_type: sale.sale_type,
            payment_method: sale.payment_method,
            quantity: sale.quantity,
            discount: sale.discount,
            total_amount: sale.total_amount,
            down_payment: sale.down_payment,
            paid_amount: sale.paid_amount,
            remaining_amount: sale.remaining_amount,
            per_installment: sale.per_installment,
            total_installments: sale.total_installments,
            paid_installments: sale.paid_installments,
            return_quantity: sale.return_quantity,
            return_amount: sale.return_amount,
            status: sale.status,
            created_at: sale.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct InstallmentResponse {
    pub id: i64,
    pub sale_id: i64,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub status: InstallmentStatus,
}

impl From<Installment> for InstallmentResponse {
    fn from(row: Installment) -> Self {
        Self {
            id: row.id,
            sale_id: row.sale_id,
            amount: row.amount,
            due_date: row.due_date,
            paid_date: row.paid_date,
            status: row.status,
        }
    }
}

/// Sale with its parties and schedule, for the detail view.
#[derive(Serialize)]
pub struct SaleDetailResponse {
    #[serde(flatten)]
    pub sale: SaleResponse,
    pub customer_name: String,
    pub product_name: String,
    pub installments: Vec<InstallmentResponse>,
}

#[derive(Deserialize)]
pub struct PayInstallmentRequest {
    pub amount: Option<Decimal>,
    pub paid_date: NaiveDate,
    pub payment_method: PaymentMethod,
}

#[derive(Deserialize)]
pub struct UpdateInstallmentRequest {
    pub amount: Decimal,
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
}
