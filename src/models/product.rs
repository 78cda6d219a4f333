use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub brand: String,
    pub buying_price: Decimal,
    pub selling_price: Decimal,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
}
