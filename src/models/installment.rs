use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// PENDING -> LATE happens lazily (sweep during payment); PAID is set on
/// payment and can only be undone by the full-return zero-out path or the
/// completion-regress reopen path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "installment_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Late,
}

#[derive(Debug, Clone, FromRow)]
pub struct Installment {
    pub id: i64,
    pub sale_id: i64,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub status: InstallmentStatus,
}
