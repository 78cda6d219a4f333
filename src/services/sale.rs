// src/services/sale.rs
//
// Sale engine: creates cash and installment sales, handles partial/full
// returns, and deletes erroneous entries with full compensation. All money
// math is Decimal; every division is followed by an exact remainder so the
// ledger invariant `paid + remaining == total - discount` holds.
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;

use crate::error::AppError;
use crate::models::sale::{PaymentMethod, Sale, SaleStatus, SaleType};
use crate::models::transaction::LedgerKind;

pub struct NewSale {
    pub customer_id: i64,
    pub product_id: i64,
    pub sale_date: NaiveDate,
    pub sale_type: SaleType,
    pub payment_method: PaymentMethod,
    pub quantity: i32,
    pub discount: Decimal,
    pub down_payment: Decimal,
    pub total_installments: i32,
}

pub struct SaleReturn {
    pub sale_id: i64,
    pub date: NaiveDate,
    pub quantity: i32,
    pub refund_method: PaymentMethod,
    pub note: Option<String>,
}

/// Amounts derived at sale creation. `paid_installments` counts money
/// collections, so a cash sale that collected anything counts as one.
#[derive(Debug, PartialEq, Eq)]
pub struct SalePricing {
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub down_payment: Decimal,
    pub remaining_amount: Decimal,
    pub per_installment: Decimal,
    pub total_installments: i32,
    pub paid_installments: i32,
    pub status: SaleStatus,
}

pub fn price_sale(
    sale_type: SaleType,
    selling_price: Decimal,
    quantity: i32,
    discount: Decimal,
    down_payment: Decimal,
    total_installments: i32,
) -> Result<SalePricing, AppError> {
    let total_amount = selling_price * Decimal::from(quantity);

    if discount > total_amount {
        return Err(AppError::validation(
            "Discount cannot be greater than total amount",
        ));
    }

    let pricing = match sale_type {
        SaleType::Cash => {
            let paid = total_amount - discount;
            SalePricing {
                total_amount,
                paid_amount: paid,
                down_payment: paid,
                remaining_amount: Decimal::ZERO,
                per_installment: Decimal::ZERO,
                total_installments: 0,
                paid_installments: i32::from(paid > Decimal::ZERO),
                status: SaleStatus::Completed,
            }
        }
        SaleType::Installment => {
            if total_installments < 1 {
                return Err(AppError::validation(
                    "At least one installment is required",
                ));
            }
            let remaining = total_amount - discount - down_payment;
            if remaining < Decimal::ZERO {
                return Err(AppError::validation(
                    "Paid amount cannot be greater than total amount",
                ));
            }
            let per = (remaining / Decimal::from(total_installments)).round_dp(2);
            SalePricing {
                total_amount,
                paid_amount: down_payment,
                down_payment,
                remaining_amount: remaining,
                per_installment: per,
                total_installments,
                paid_installments: 0,
                status: if remaining == Decimal::ZERO {
                    SaleStatus::Completed
                } else {
                    SaleStatus::Active
                },
            }
        }
    };

    if pricing.paid_amount > pricing.total_amount {
        return Err(AppError::validation(
            "Paid amount cannot be greater than total amount",
        ));
    }

    Ok(pricing)
}

/// Splits the remaining balance across `n` monthly due dates. Division is
/// rounded to the cent and the last installment absorbs the remainder, so
/// the schedule always sums to `remaining` exactly.
pub fn plan_installments(
    remaining: Decimal,
    total_installments: i32,
    sale_date: NaiveDate,
) -> Vec<(Decimal, NaiveDate)> {
    let base = (remaining / Decimal::from(total_installments)).round_dp(2);

    (1..=total_installments)
        .map(|i| {
            let amount = if i == total_installments {
                remaining - base * Decimal::from(total_installments - 1)
            } else {
                base
            };
            let due_date = sale_date
                .checked_add_months(Months::new(i as u32))
                .unwrap_or(sale_date);
            (amount, due_date)
        })
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
pub struct ReturnPlan {
    pub full: bool,
    pub refund: Decimal,
    pub new_quantity: i32,
    pub new_return_quantity: i32,
    pub new_total_amount: Decimal,
    pub new_discount: Decimal,
    pub new_down_payment: Decimal,
    pub new_paid_amount: Decimal,
    pub new_remaining_amount: Decimal,
    pub new_return_amount: Decimal,
    pub status: SaleStatus,
}

/// Computes the effect of returning `return_quantity` units of a sale.
///
/// Refund policy: a full return pays back everything the customer has paid,
/// net of prior refunds. A partial return refunds the selling-price value of
/// the returned units, but only out of the down-payment pool; when the pool
/// cannot cover it the stock still comes back and no cash leaves.
pub fn plan_return(
    sale: &Sale,
    selling_price: Decimal,
    return_quantity: i32,
) -> Result<ReturnPlan, AppError> {
    if sale.status == SaleStatus::Returned {
        return Err(AppError::conflict("Sale is already fully returned"));
    }
    if return_quantity <= 0 {
        return Err(AppError::validation(
            "Return quantity must be greater than zero",
        ));
    }
    // sale.quantity tracks un-returned units; prior returns already reduced
    // it together with total_amount, so per-unit values stay constant.
    let remaining_to_return = sale.quantity;
    if return_quantity > remaining_to_return {
        return Err(AppError::validation(format!(
            "Cannot return {return_quantity} units. Only {remaining_to_return} units remain to be returned"
        )));
    }

    let returned = Decimal::from(return_quantity);
    let sold = Decimal::from(sale.quantity);
    let new_quantity = sale.quantity - return_quantity;
    let full = new_quantity == 0;

    let value_of_returned_goods = selling_price * returned;

    let (refund, new_down_payment) = if full {
        // paid_amount is already net of earlier refunds, so it is exactly
        // what the customer still holds against this sale.
        (sale.paid_amount.max(Decimal::ZERO), Decimal::ZERO)
    } else if sale.down_payment >= value_of_returned_goods {
        (
            value_of_returned_goods,
            sale.down_payment - value_of_returned_goods,
        )
    } else {
        // Down-payment pool cannot cover the refund: stock restoration still
        // proceeds, no cash leaves.
        (Decimal::ZERO, sale.down_payment)
    };

    // Proportional (unit-price based) reduction of gross and discount; the
    // outstanding balance is re-derived so paid + remaining always equals
    // the new net total.
    let gross_unit = (sale.total_amount / sold).round_dp(2);
    let discount_unit = (sale.discount / sold).round_dp(2);

    let plan = if full {
        ReturnPlan {
            full,
            refund,
            new_quantity: 0,
            new_return_quantity: sale.return_quantity + return_quantity,
            new_total_amount: Decimal::ZERO,
            new_discount: Decimal::ZERO,
            new_down_payment: Decimal::ZERO,
            new_paid_amount: Decimal::ZERO,
            new_remaining_amount: Decimal::ZERO,
            new_return_amount: sale.return_amount + refund,
            status: SaleStatus::Returned,
        }
    } else {
        let new_total_amount = sale.total_amount - gross_unit * returned;
        let new_discount = sale.discount - discount_unit * returned;
        let new_paid_amount = sale.paid_amount - refund;
        ReturnPlan {
            full,
            refund,
            new_quantity,
            new_return_quantity: sale.return_quantity + return_quantity,
            new_total_amount,
            new_discount,
            new_down_payment,
            new_paid_amount,
            new_remaining_amount: (new_total_amount - new_discount - new_paid_amount)
                .max(Decimal::ZERO),
            new_return_amount: sale.return_amount + refund,
            status: SaleStatus::Partial,
        }
    };

    Ok(plan)
}

/// Creates a sale with all of its side effects in one transaction: the sale
/// row, the inbound daily-ledger row for any money collected up front, the
/// outbound SALE stock movement, the stock decrement, and (for installment
/// sales) the schedule.
pub async fn create_sale(pool: &PgPool, input: NewSale) -> Result<Sale, AppError> {
    if input.quantity <= 0 {
        return Err(AppError::validation("Quantity must be at least 1"));
    }
    if input.discount < Decimal::ZERO || input.down_payment < Decimal::ZERO {
        return Err(AppError::validation("Amounts cannot be negative"));
    }

    let mut tx = pool.begin().await?;

    let product = sqlx::query_as::<_, (String, Decimal, i32)>(
        "SELECT name, selling_price, stock_quantity FROM products WHERE id = $1",
    )
    .bind(input.product_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;
    let (_product_name, selling_price, stock_quantity) = product;

    let customer_exists = sqlx::query_as::<_, (i64,)>("SELECT id FROM customers WHERE id = $1")
        .bind(input.customer_id)
        .fetch_optional(&mut *tx)
        .await?;
    if customer_exists.is_none() {
        return Err(AppError::not_found("Customer not found"));
    }

    if let Some(purchase_date) = super::stock::initial_purchase_date(&mut tx, input.product_id).await? {
        if input.sale_date < purchase_date {
            return Err(AppError::validation(format!(
                "Sale date cannot be before {purchase_date} product purchase date"
            )));
        }
    }

    if stock_quantity < input.quantity {
        return Err(AppError::conflict("Not enough stock available"));
    }

    let pricing = price_sale(
        input.sale_type,
        selling_price,
        input.quantity,
        input.discount,
        input.down_payment,
        input.total_installments,
    )?;

    let sale = sqlx::query_as::<_, Sale>(
        "INSERT INTO sales (customer_id, product_id, sale_date, sale_type, payment_method,
                            quantity, discount, total_amount, down_payment, paid_amount,
                            remaining_amount, per_installment, total_installments,
                            paid_installments, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
         RETURNING id, customer_id, product_id, sale_date, sale_type, payment_method,
                   quantity, discount, total_amount, down_payment, paid_amount,
                   remaining_amount, per_installment, total_installments, paid_installments,
                   return_quantity, return_amount, status, created_at",
    )
    .bind(input.customer_id)
    .bind(input.product_id)
    .bind(input.sale_date)
    .bind(input.sale_type)
    .bind(input.payment_method)
    .bind(input.quantity)
    .bind(input.discount)
    .bind(pricing.total_amount)
    .bind(pricing.down_payment)
    .bind(pricing.paid_amount)
    .bind(pricing.remaining_amount)
    .bind(pricing.per_installment)
    .bind(pricing.total_installments)
    .bind(pricing.paid_installments)
    .bind(pricing.status)
    .fetch_one(&mut *tx)
    .await?;

    // Exactly one inbound ledger row for the money collected at the counter.
    if pricing.down_payment > Decimal::ZERO {
        sqlx::query(
            "INSERT INTO daily_transactions (kind, direction, amount, date, note, sale_id)
             VALUES ($1, 'IN', $2, $3, $4, $5)",
        )
        .bind(LedgerKind::from(input.payment_method))
        .bind(pricing.down_payment)
        .bind(input.sale_date)
        .bind(format!(
            "Sale #{} down payment from customer. Method: {:?}",
            sale.id, input.payment_method
        ))
        .bind(sale.id)
        .execute(&mut *tx)
        .await?;
    }

    if input.sale_type == SaleType::Installment && pricing.remaining_amount > Decimal::ZERO {
        for (amount, due_date) in plan_installments(
            pricing.remaining_amount,
            pricing.total_installments,
            input.sale_date,
        ) {
            sqlx::query(
                "INSERT INTO installments (sale_id, amount, due_date, status)
                 VALUES ($1, $2, $3, 'PENDING')",
            )
            .bind(sale.id)
            .bind(amount)
            .bind(due_date)
            .execute(&mut *tx)
            .await?;
        }
    }

    sqlx::query(
        "INSERT INTO stock_transactions (product_id, sale_id, quantity, direction, kind, date, note)
         VALUES ($1, $2, $3, 'OUT', 'SALE', $4, $5)",
    )
    .bind(input.product_id)
    .bind(sale.id)
    .bind(input.quantity)
    .bind(input.sale_date)
    .bind(format!(
        "Sale #{} to customer. Method: {:?}",
        sale.id, input.payment_method
    ))
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE products SET stock_quantity = stock_quantity - $1 WHERE id = $2")
        .bind(input.quantity)
        .bind(input.product_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    debug!(id = sale.id, "Sale created");
    Ok(sale)
}

/// Partial or full return. Restores stock, pays the computed refund out of
/// the daily ledger, and on a full return closes the installment book and
/// removes the sale's inbound ledger rows so summaries don't double-count.
pub async fn return_sale(pool: &PgPool, input: SaleReturn) -> Result<Sale, AppError> {
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

    let selling_price = sqlx::query_as::<_, (Decimal,)>(
        "SELECT selling_price FROM products WHERE id = $1",
    )
    .bind(sale.product_id)
    .fetch_one(&mut *tx)
    .await?
    .0;

    let plan = plan_return(&sale, selling_price, input.quantity)?;

    sqlx::query(
        "INSERT INTO stock_transactions (product_id, sale_id, quantity, direction, kind, date, note)
         VALUES ($1, $2, $3, 'IN', 'RETURN', $4, $5)",
    )
    .bind(sale.product_id)
    .bind(sale.id)
    .bind(input.quantity)
    .bind(input.date)
    .bind(format!(
        "RETURN: Sale #{}. {} units returned. {}",
        sale.id,
        input.quantity,
        input.note.as_deref().unwrap_or("")
    ))
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE products SET stock_quantity = stock_quantity + $1 WHERE id = $2")
        .bind(input.quantity)
        .bind(sale.product_id)
        .execute(&mut *tx)
        .await?;

    if plan.refund > Decimal::ZERO {
        if plan.full {
            // The sale's inflows are reversed by this payout; drop them so a
            // month recomputation doesn't count money that went back out.
            sqlx::query(
                "DELETE FROM daily_transactions WHERE sale_id = $1 AND direction = 'IN'",
            )
            .bind(sale.id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO daily_transactions (kind, direction, amount, date, note, sale_id)
             VALUES ($1, 'OUT', $2, $3, $4, $5)",
        )
        .bind(LedgerKind::from(input.refund_method))
        .bind(plan.refund)
        .bind(input.date)
        .bind(format!(
            "REFUND: Sale return. Sale ID: {}. Method: {:?}",
            sale.id, input.refund_method
        ))
        .bind(sale.id)
        .execute(&mut *tx)
        .await?;
    }

    if plan.full {
        // Close the book: every installment is zeroed and marked PAID.
        sqlx::query(
            "UPDATE installments SET amount = 0, status = 'PAID', paid_date = $1 WHERE sale_id = $2",
        )
        .bind(input.date)
        .bind(sale.id)
        .execute(&mut *tx)
        .await?;
    }

    let updated = sqlx::query_as::<_, Sale>(
        "UPDATE sales SET quantity = $1, total_amount = $2, discount = $3, down_payment = $4,
                          paid_amount = $5, remaining_amount = $6, return_quantity = $7,
                          return_amount = $8, status = $9
         WHERE id = $10
         RETURNING id, customer_id, product_id, sale_date, sale_type, payment_method,
                   quantity, discount, total_amount, down_payment, paid_amount,
                   remaining_amount, per_installment, total_installments, paid_installments,
                   return_quantity, return_amount, status, created_at",
    )
    .bind(plan.new_quantity)
    .bind(plan.new_total_amount)
    .bind(plan.new_discount)
    .bind(plan.new_down_payment)
    .bind(plan.new_paid_amount)
    .bind(plan.new_remaining_amount)
    .bind(plan.new_return_quantity)
    .bind(plan.new_return_amount)
    .bind(plan.status)
    .bind(sale.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    debug!(id = sale.id, refund = %plan.refund, full = plan.full, "Sale return processed");
    Ok(updated)
}

/// Erroneous-entry correction, not a business return: removes the sale and
/// every row hanging off it, and puts the still-outstanding units back on
/// the shelf. Ordered so no foreign key is left dangling mid-transaction.
pub async fn delete_sale(pool: &PgPool, sale_id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let sale = sqlx::query_as::<_, (i64, i32)>(
        "SELECT product_id, quantity FROM sales WHERE id = $1",
    )
    .bind(sale_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Sale not found"))?;
    let (product_id, quantity_to_restore) = sale;

    sqlx::query("DELETE FROM daily_transactions WHERE sale_id = $1")
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM installments WHERE sale_id = $1")
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM stock_transactions WHERE sale_id = $1")
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;

    if quantity_to_restore > 0 {
        sqlx::query("UPDATE products SET stock_quantity = stock_quantity + $1 WHERE id = $2")
            .bind(quantity_to_restore)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query("DELETE FROM sales WHERE id = $1")
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample_sale(
        quantity: i32,
        discount: &str,
        total: &str,
        down: &str,
        paid: &str,
        remaining: &str,
        status: SaleStatus,
    ) -> Sale {
        Sale {
            id: 1,
            customer_id: 1,
            product_id: 1,
            sale_date: date("2026-03-10"),
            sale_type: SaleType::Installment,
            payment_method: PaymentMethod::Cash,
            quantity,
            discount: dec(discount),
            total_amount: dec(total),
            down_payment: dec(down),
            paid_amount: dec(paid),
            remaining_amount: dec(remaining),
            per_installment: Decimal::ZERO,
            total_installments: 3,
            paid_installments: 0,
            return_quantity: 0,
            return_amount: Decimal::ZERO,
            status,
            created_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    #[test]
    fn cash_sale_is_completed_with_nothing_remaining() {
        // 3 units at 150, no discount.
        let pricing =
            price_sale(SaleType::Cash, dec("150"), 3, Decimal::ZERO, Decimal::ZERO, 0).unwrap();
        assert_eq!(pricing.total_amount, dec("450"));
        assert_eq!(pricing.paid_amount, dec("450"));
        assert_eq!(pricing.remaining_amount, Decimal::ZERO);
        assert_eq!(pricing.status, SaleStatus::Completed);
        assert_eq!(pricing.paid_installments, 1);
    }

    #[test]
    fn installment_sale_keeps_ledger_balance() {
        // 4 units at 150, down payment 200 over 3 installments.
        let pricing =
            price_sale(SaleType::Installment, dec("150"), 4, Decimal::ZERO, dec("200"), 3)
                .unwrap();
        assert_eq!(pricing.total_amount, dec("600"));
        assert_eq!(pricing.paid_amount, dec("200"));
        assert_eq!(pricing.remaining_amount, dec("400"));
        assert_eq!(pricing.status, SaleStatus::Active);
        // paid + remaining == total - discount
        assert_eq!(
            pricing.paid_amount + pricing.remaining_amount,
            pricing.total_amount
        );
    }

    #[test]
    fn discount_larger_than_total_is_rejected() {
        let err =
            price_sale(SaleType::Cash, dec("150"), 1, dec("200"), Decimal::ZERO, 0).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn down_payment_above_total_is_rejected() {
        let err =
            price_sale(SaleType::Installment, dec("100"), 1, Decimal::ZERO, dec("150"), 2)
                .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn installment_plan_requires_at_least_one_slot() {
        let err =
            price_sale(SaleType::Installment, dec("100"), 1, Decimal::ZERO, dec("10"), 0)
                .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn schedule_sums_exactly_to_remaining() {
        let plan = plan_installments(dec("400"), 3, date("2026-03-10"));
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].0, dec("133.33"));
        assert_eq!(plan[1].0, dec("133.33"));
        assert_eq!(plan[2].0, dec("133.34"));
        let sum: Decimal = plan.iter().map(|(amount, _)| *amount).sum();
        assert_eq!(sum, dec("400"));
    }

    #[test]
    fn schedule_due_dates_are_monthly_from_sale_date() {
        let plan = plan_installments(dec("300"), 3, date("2026-01-31"));
        assert_eq!(plan[0].1, date("2026-02-28"));
        assert_eq!(plan[1].1, date("2026-03-31"));
        assert_eq!(plan[2].1, date("2026-04-30"));
    }

    #[test]
    fn full_return_refunds_everything_paid() {
        // Cash sale: 3 units, paid 450 in full.
        let mut sale = sample_sale(3, "0", "450", "450", "450", "0", SaleStatus::Completed);
        sale.sale_type = SaleType::Cash;

        let plan = plan_return(&sale, dec("150"), 3).unwrap();
        assert!(plan.full);
        assert_eq!(plan.refund, dec("450"));
        assert_eq!(plan.status, SaleStatus::Returned);
        assert_eq!(plan.new_quantity, 0);
        assert_eq!(plan.new_paid_amount, Decimal::ZERO);
        assert_eq!(plan.new_remaining_amount, Decimal::ZERO);
        assert_eq!(plan.new_down_payment, Decimal::ZERO);
        assert_eq!(plan.new_return_amount, dec("450"));
    }

    #[test]
    fn partial_return_refund_comes_out_of_down_payment() {
        // 4 units at 150, down 200. Returning 1 unit is worth 150 and the
        // pool covers it.
        let sale = sample_sale(4, "0", "600", "200", "200", "400", SaleStatus::Active);

        let plan = plan_return(&sale, dec("150"), 1).unwrap();
        assert!(!plan.full);
        assert_eq!(plan.refund, dec("150"));
        assert_eq!(plan.new_down_payment, dec("50"));
        assert_eq!(plan.new_quantity, 3);
        assert_eq!(plan.new_total_amount, dec("450"));
        assert_eq!(plan.new_paid_amount, dec("50"));
        assert_eq!(plan.new_remaining_amount, dec("400"));
        assert_eq!(plan.status, SaleStatus::Partial);
        // Ledger balance holds after the proration.
        assert_eq!(
            plan.new_paid_amount + plan.new_remaining_amount,
            plan.new_total_amount - plan.new_discount
        );
    }

    #[test]
    fn partial_return_without_pool_moves_no_cash() {
        // Down payment 100 cannot cover a 150 refund: stock comes back,
        // nothing is paid out.
        let sale = sample_sale(4, "0", "600", "100", "100", "500", SaleStatus::Active);

        let plan = plan_return(&sale, dec("150"), 1).unwrap();
        assert_eq!(plan.refund, Decimal::ZERO);
        assert_eq!(plan.new_down_payment, dec("100"));
        assert_eq!(plan.new_paid_amount, dec("100"));
        assert_eq!(plan.new_quantity, 3);
        assert_eq!(plan.status, SaleStatus::Partial);
    }

    #[test]
    fn full_return_after_partial_refunds_only_what_is_still_held() {
        // State after a one-unit partial return of a 4-unit sale.
        let mut sale = sample_sale(3, "0", "450", "50", "50", "400", SaleStatus::Partial);
        sale.return_quantity = 1;
        sale.return_amount = dec("150");

        let plan = plan_return(&sale, dec("150"), 3).unwrap();
        assert!(plan.full);
        assert_eq!(plan.refund, dec("50"));
        assert_eq!(plan.new_return_quantity, 4);
        assert_eq!(plan.new_return_amount, dec("200"));
        assert_eq!(plan.status, SaleStatus::Returned);
    }

    #[test]
    fn returning_more_than_sold_is_rejected() {
        let sale = sample_sale(3, "0", "450", "0", "0", "450", SaleStatus::Active);
        let err = plan_return(&sale, dec("150"), 4).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn returned_sale_rejects_further_returns() {
        let sale = sample_sale(0, "0", "0", "0", "0", "0", SaleStatus::Returned);
        let err = plan_return(&sale, dec("150"), 1).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
