// src/dtos/product.rs
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Registering a product also records its founding stock purchase, so the
/// request carries the purchase date alongside the catalogue fields.
#[derive(Debug, Deserialize)]
pub struct RegisterProductRequest {
    pub name: String,
    pub category: String,
    pub brand: String,
    pub buying_price: Decimal,
    pub selling_price: Decimal,
    pub stock_quantity: i32,
    pub date: NaiveDate,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub buying_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub brand: String,
    pub buying_price: Decimal,
    pub selling_price: Decimal,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::product::Product> for ProductResponse {
    fn from(product: crate::models::product::Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            category: product.category,
            brand: product.brand,
            buying_price: product.buying_price,
            selling_price: product.selling_price,
            stock_quantity: product.stock_quantity,
            created_at: product.created_at,
        }
    }
}
