// src/services/installment.rs
//
// Installment engine: collects payments against a sale's schedule and lets
// a recorded payment be corrected later. The sale row is the source of truth
// for balances; installment rows are the schedule and the receipt trail.
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;

use crate::error::AppError;
use crate::models::installment::{Installment, InstallmentStatus};
use crate::models::sale::{PaymentMethod, Sale, SaleStatus};
use crate::models::transaction::LedgerKind;

pub struct PayInstallment {
    pub sale_id: i64,
    /// Collected amount. Defaults to the scheduled amount of the earliest
    /// unpaid installment.
    pub amount: Option<Decimal>,
    pub paid_date: NaiveDate,
    pub payment_method: PaymentMethod,
}

pub struct UpdateInstallment {
    pub installment_id: i64,
    pub amount: Decimal,
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct SaleAmounts {
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub status: SaleStatus,
}

/// Recomputes a sale's balance after `paid` has been collected in total.
/// A sale that went through a partial return keeps its PARTIAL status until
/// the balance closes.
pub fn sale_amounts(
    total_amount: Decimal,
    discount: Decimal,
    paid: Decimal,
    current_status: SaleStatus,
) -> Result<SaleAmounts, AppError> {
    let net = total_amount - discount;
    if paid > net {
        return Err(AppError::conflict(
            "Payment exceeds the remaining balance of the sale",
        ));
    }

    let remaining = net - paid;
    let status = if remaining == Decimal::ZERO {
        SaleStatus::Completed
    } else if current_status == SaleStatus::Partial {
        SaleStatus::Partial
    } else {
        SaleStatus::Active
    };

    Ok(SaleAmounts {
        paid_amount: paid,
        remaining_amount: remaining,
        status,
    })
}

/// A payment can only be dated inside the life of the sale so far.
pub fn validate_payment_date(
    sale_date: NaiveDate,
    paid_date: NaiveDate,
    today: NaiveDate,
) -> Result<(), AppError> {
    if paid_date < sale_date {
        return Err(AppError::validation(
            "Payment date cannot be before the sale date",
        ));
    }
    if paid_date > today {
        return Err(AppError::validation("Payment date cannot be in the future"));
    }
    Ok(())
}

/// Earliest-due unpaid installment of a schedule. Due-date ties break by
/// row id, so two slots due the same day are collected in insertion order.
pub fn earliest_unpaid(rows: &[Installment]) -> Option<&Installment> {
    rows.iter()
        .filter(|row| row.status != InstallmentStatus::Paid)
        .min_by_key(|row| (row.due_date, row.id))
}

/// Splits `remaining` evenly across `slots` reopened installments, last one
/// absorbing the rounding remainder.
fn split_evenly(remaining: Decimal, slots: usize) -> Vec<Decimal> {
    let n = Decimal::from(slots as u32);
    let base = (remaining / n).round_dp(2);
    (1..=slots)
        .map(|i| {
            if i == slots {
                remaining - base * Decimal::from(slots as u32 - 1)
            } else {
                base
            }
        })
        .collect()
}

/// Collects a payment against the earliest unpaid installment of a sale.
///
/// Overdue PENDING rows are swept to LATE first, then the earliest-due
/// unpaid row (LATE included) receives the payment. If the collection
/// closes the balance, every other unpaid row is zeroed and marked PAID so
/// the book carries no phantom receivable.
pub async fn pay_installment(
    pool: &PgPool,
    input: PayInstallment,
    today: NaiveDate,
) -> Result<Sale, AppError> {
    let mut tx = pool.begin().await?;

    let sale = sqlx::query_as::<_, Sale>(
        "SELECT id, customer_id, product_id, sale_date, sale_type, payment_method,
                quantity, discount, total_amount, down_payment, paid_amount,
                remaining_amount, per_installment, total_installments, paid_installments,
                return_quantity, return_amount, status, created_at
         FROM sales WHERE id = $1",
    )
    .bind(input.sale_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Sale not found"))?;

    match sale.status {
        SaleStatus::Completed => {
            return Err(AppError::conflict("Sale is already fully paid"))
        }
        SaleStatus::Returned => {
            return Err(AppError::conflict("Sale has been returned"))
        }
        SaleStatus::Active | SaleStatus::Partial => {}
    }

    validate_payment_date(sale.sale_date, input.paid_date, today)?;

    sqlx::query(
        "UPDATE installments SET status = 'LATE'
         WHERE sale_id = $1 AND status = 'PENDING' AND due_date < $2",
    )
    .bind(sale.id)
    .bind(today)
    .execute(&mut *tx)
    .await?;

    let schedule = sqlx::query_as::<_, Installment>(
        "SELECT id, sale_id, amount, due_date, paid_date, status FROM installments
         WHERE sale_id = $1",
    )
    .bind(sale.id)
    .fetch_all(&mut *tx)
    .await?;
    let due = earliest_unpaid(&schedule)
        .cloned()
        .ok_or_else(|| AppError::not_found("No unpaid installments for this sale"))?;

    let amount = input.amount.unwrap_or(due.amount);
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("Amount must be greater than zero"));
    }

    let amounts = sale_amounts(
        sale.total_amount,
        sale.discount,
        sale.paid_amount + amount,
        sale.status,
    )?;

    sqlx::query(
        "UPDATE installments SET amount = $1, status = 'PAID', paid_date = $2 WHERE id = $3",
    )
    .bind(amount)
    .bind(input.paid_date)
    .bind(due.id)
    .execute(&mut *tx)
    .await?;

    if amounts.status == SaleStatus::Completed {
        sqlx::query(
            "UPDATE installments SET amount = 0, status = 'PAID', paid_date = $1
             WHERE sale_id = $2 AND status <> 'PAID'",
        )
        .bind(input.paid_date)
        .bind(sale.id)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "INSERT INTO daily_transactions (kind, direction, amount, date, note, sale_id, installment_id)
         VALUES ($1, 'IN', $2, $3, $4, $5, $6)",
    )
    .bind(LedgerKind::from(input.payment_method))
    .bind(amount)
    .bind(input.paid_date)
    .bind(format!(
        "Installment payment for sale #{}. Method: {:?}",
        sale.id, input.payment_method
    ))
    .bind(sale.id)
    .bind(due.id)
    .execute(&mut *tx)
    .await?;

    let updated = sqlx::query_as::<_, Sale>(
        "UPDATE sales SET paid_amount = $1, remaining_amount = $2,
                          paid_installments = paid_installments + 1, status = $3
         WHERE id = $4
         RETURNING id, customer_id, product_id, sale_date, sale_type, payment_method,
                   quantity, discount, total_amount, down_payment, paid_amount,
                   remaining_amount, per_installment, total_installments, paid_installments,
                   return_quantity, return_amount, status, created_at",
    )
    .bind(amounts.paid_amount)
    .bind(amounts.remaining_amount)
    .bind(amounts.status)
    .bind(sale.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    debug!(sale_id = sale.id, installment_id = due.id, amount = %amount, "Installment collected");
    Ok(updated)
}

/// Corrects a previously recorded payment. The linked daily-ledger row is
/// updated in place so the money trail stays in step with the receipt.
///
/// Lowering the amount can reopen a sale that had been closed by a
/// zero-and-close sweep: zeroed PAID rows go back to PENDING and the
/// reopened balance is split across them.
pub async fn update_installment(
    pool: &PgPool,
    input: UpdateInstallment,
    today: NaiveDate,
) -> Result<Sale, AppError> {
    if input.amount < Decimal::ZERO {
        return Err(AppError::validation("Amount cannot be negative"));
    }

    let mut tx = pool.begin().await?;

    let installment = sqlx::query_as::<_, Installment>(
        "SELECT id, sale_id, amount, due_date, paid_date, status FROM installments WHERE id = $1",
    )
    .bind(input.installment_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Installment not found"))?;

    if installment.status != InstallmentStatus::Paid {
        return Err(AppError::conflict("Only paid installments can be updated"));
    }

    let sale = sqlx::query_as::<_, Sale>(
        "SELECT id, customer_id, product_id, sale_date, sale_type, payment_method,
                quantity, discount, total_amount, down_payment, paid_amount,
                remaining_amount, per_installment, total_installments, paid_installments,
                return_quantity, return_amount, status, created_at
         FROM sales WHERE id = $1",
    )
    .bind(installment.sale_id)
    .fetch_one(&mut *tx)
    .await?;

    if sale.status == SaleStatus::Returned {
        return Err(AppError::conflict("Sale has been returned"));
    }

    let paid_date = input.paid_date.or(installment.paid_date).ok_or_else(|| {
        AppError::internal("Paid installment has no payment date")
    })?;
    validate_payment_date(sale.sale_date, paid_date, today)?;

    let others_paid = sqlx::query_as::<_, (Option<Decimal>,)>(
        "SELECT SUM(amount) FROM installments
         WHERE sale_id = $1 AND status = 'PAID' AND id <> $2",
    )
    .bind(sale.id)
    .bind(installment.id)
    .fetch_one(&mut *tx)
    .await?
    .0
    .unwrap_or(Decimal::ZERO);

    let amounts = sale_amounts(
        sale.total_amount,
        sale.discount,
        sale.down_payment + others_paid + input.amount,
        sale.status,
    )?;

    sqlx::query(
        "UPDATE installments SET amount = $1, paid_date = $2 WHERE id = $3",
    )
    .bind(input.amount)
    .bind(paid_date)
    .bind(installment.id)
    .execute(&mut *tx)
    .await?;

    let ledger_kind = input
        .payment_method
        .map(LedgerKind::from)
        .unwrap_or_else(|| LedgerKind::from(sale.payment_method));
    let touched = sqlx::query(
        "UPDATE daily_transactions SET amount = $1, date = $2, kind = $3
         WHERE installment_id = $4",
    )
    .bind(input.amount)
    .bind(paid_date)
    .bind(ledger_kind)
    .bind(installment.id)
    .execute(&mut *tx)
    .await?;
    if touched.rows_affected() == 0 && input.amount > Decimal::ZERO {
        sqlx::query(
            "INSERT INTO daily_transactions (kind, direction, amount, date, note, sale_id, installment_id)
             VALUES ($1, 'IN', $2, $3, $4, $5, $6)",
        )
        .bind(ledger_kind)
        .bind(input.amount)
        .bind(paid_date)
        .bind(format!("Installment payment for sale #{} (corrected)", sale.id))
        .bind(sale.id)
        .bind(installment.id)
        .execute(&mut *tx)
        .await?;
    }

    if amounts.status == SaleStatus::Completed {
        sqlx::query(
            "UPDATE installments SET amount = 0, status = 'PAID', paid_date = $1
             WHERE sale_id = $2 AND status <> 'PAID'",
        )
        .bind(paid_date)
        .bind(sale.id)
        .execute(&mut *tx)
        .await?;
    } else {
        // Rows zeroed by a previous completion sweep come back as PENDING
        // and share the reopened balance.
        let zeroed = sqlx::query_as::<_, Installment>(
            "SELECT id, sale_id, amount, due_date, paid_date, status FROM installments
             WHERE sale_id = $1 AND status = 'PAID' AND amount = 0 AND id <> $2
             ORDER BY due_date, id",
        )
        .bind(sale.id)
        .bind(installment.id)
        .fetch_all(&mut *tx)
        .await?;

        if !zeroed.is_empty() {
            let shares = split_evenly(amounts.remaining_amount, zeroed.len());
            for (row, share) in zeroed.iter().zip(shares) {
                sqlx::query(
                    "UPDATE installments SET amount = $1, status = 'PENDING', paid_date = NULL
                     WHERE id = $2",
                )
                .bind(share)
                .bind(row.id)
                .execute(&mut *tx)
                .await?;
            }
        }
    }

    let paid_count = sqlx::query_as::<_, (i64,)>(
        "SELECT COUNT(*) FROM installments
         WHERE sale_id = $1 AND status = 'PAID' AND amount > 0",
    )
    .bind(sale.id)
    .fetch_one(&mut *tx)
    .await?
    .0;

    let updated = sqlx::query_as::<_, Sale>(
        "UPDATE sales SET paid_amount = $1, remaining_amount = $2,
                          paid_installments = $3, status = $4
         WHERE id = $5
         RETURNING id, customer_id, product_id, sale_date, sale_type, payment_method,
                   quantity, discount, total_amount, down_payment, paid_amount,
                   remaining_amount, per_installment, total_installments, paid_installments,
                   return_quantity, return_amount, status, created_at",
    )
    .bind(amounts.paid_amount)
    .bind(amounts.remaining_amount)
    .bind(paid_count as i32)
    .bind(amounts.status)
    .bind(sale.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    debug!(sale_id = sale.id, installment_id = installment.id, "Installment corrected");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn payment_closes_the_sale_when_balance_hits_zero() {
        let amounts = sale_amounts(dec("600"), dec("0"), dec("600"), SaleStatus::Active).unwrap();
        assert_eq!(amounts.remaining_amount, Decimal::ZERO);
        assert_eq!(amounts.status, SaleStatus::Completed);
    }

    #[test]
    fn partial_payment_keeps_the_sale_active() {
        let amounts = sale_amounts(dec("600"), dec("0"), dec("350"), SaleStatus::Active).unwrap();
        assert_eq!(amounts.remaining_amount, dec("250"));
        assert_eq!(amounts.status, SaleStatus::Active);
    }

    #[test]
    fn partially_returned_sale_stays_partial_until_closed() {
        let amounts = sale_amounts(dec("450"), dec("0"), dec("200"), SaleStatus::Partial).unwrap();
        assert_eq!(amounts.status, SaleStatus::Partial);

        let closed = sale_amounts(dec("450"), dec("0"), dec("450"), SaleStatus::Partial).unwrap();
        assert_eq!(closed.status, SaleStatus::Completed);
    }

    #[test]
    fn overpayment_is_a_conflict() {
        let err = sale_amounts(dec("600"), dec("50"), dec("600"), SaleStatus::Active).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn discount_lowers_the_bar_for_completion() {
        let amounts = sale_amounts(dec("600"), dec("100"), dec("500"), SaleStatus::Active).unwrap();
        assert_eq!(amounts.status, SaleStatus::Completed);
    }

    #[test]
    fn payment_before_sale_date_is_rejected() {
        let err = validate_payment_date(
            date("2026-03-10"),
            date("2026-03-05"),
            date("2026-04-01"),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn future_payment_date_is_rejected() {
        let err = validate_payment_date(
            date("2026-03-10"),
            date("2026-05-01"),
            date("2026-04-01"),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn payment_on_sale_date_or_today_is_accepted() {
        validate_payment_date(date("2026-03-10"), date("2026-03-10"), date("2026-04-01")).unwrap();
        validate_payment_date(date("2026-03-10"), date("2026-04-01"), date("2026-04-01")).unwrap();
    }

    fn slot(id: i64, due: &str, status: InstallmentStatus) -> Installment {
        Installment {
            id,
            sale_id: 1,
            amount: dec("100"),
            due_date: date(due),
            paid_date: None,
            status,
        }
    }

    #[test]
    fn earliest_due_open_slot_is_collected_first() {
        let schedule = vec![
            slot(3, "2026-06-10", InstallmentStatus::Pending),
            slot(1, "2026-04-10", InstallmentStatus::Paid),
            slot(2, "2026-05-10", InstallmentStatus::Late),
        ];
        assert_eq!(earliest_unpaid(&schedule).unwrap().id, 2);
    }

    #[test]
    fn due_date_ties_break_by_row_id() {
        let schedule = vec![
            slot(8, "2026-05-10", InstallmentStatus::Pending),
            slot(7, "2026-05-10", InstallmentStatus::Pending),
        ];
        assert_eq!(earliest_unpaid(&schedule).unwrap().id, 7);
    }

    #[test]
    fn fully_paid_schedule_has_nothing_to_collect() {
        let schedule = vec![
            slot(1, "2026-04-10", InstallmentStatus::Paid),
            slot(2, "2026-05-10", InstallmentStatus::Paid),
        ];
        assert!(earliest_unpaid(&schedule).is_none());
    }

    #[test]
    fn reopened_balance_splits_with_last_share_absorbing_remainder() {
        let shares = split_evenly(dec("100"), 3);
        assert_eq!(shares, vec![dec("33.33"), dec("33.33"), dec("33.34")]);
        let sum: Decimal = shares.iter().copied().sum();
        assert_eq!(sum, dec("100"));
    }
}
