use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub cnic: String,
    pub phone: String,
    pub address: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}
