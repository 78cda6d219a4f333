// src/services/summary.rs
//
// Monthly summary engine. A summary row is a cache: it is always produced by
// folding the raw ledgers for the month from scratch and upserted on
// (year, month), so recomputing is idempotent and safe to trigger often.
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::debug;

use crate::error::AppError;
use crate::models::summary::MonthlySummary;
use crate::models::transaction::{LedgerKind, TxDirection};

/// Money flows of one period, folded from the daily ledger.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Flows {
    pub total_expense: Decimal,
    pub total_debt: Decimal,
    pub total_bank: Decimal,
    pub total_cash: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TrendPoint {
    pub month: i32,
    pub year: i32,
    pub total_sales: Decimal,
    pub gross_profit: Decimal,
    pub net_profit: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_expense: Decimal,
    pub total_debt: Decimal,
    pub total_bank: Decimal,
    pub total_cash: Decimal,
    pub total_sales: Decimal,
    pub cost_of_stock: Decimal,
    pub gross_profit: Decimal,
    pub net_profit: Decimal,
    pub stock_value: Decimal,
    pub total_investment: Decimal,
    pub total_receivable: Decimal,
    pub total_customers: i64,
    pub total_products: i64,
    pub trend_data: Vec<TrendPoint>,
}

/// Folds raw ledger rows into period flows. Expense and debt only ever flow
/// out; cash and bank are signed nets of both directions.
pub fn fold_ledger(rows: &[(LedgerKind, TxDirection, Decimal)]) -> Flows {
    let mut flows = Flows::default();
    for (kind, direction, amount) in rows {
        let signed = match direction {
            TxDirection::In => *amount,
            TxDirection::Out => -*amount,
        };
        match kind {
            LedgerKind::Expense => {
                if *direction == TxDirection::Out {
                    flows.total_expense += *amount;
                }
            }
            LedgerKind::Debt => {
                if *direction == TxDirection::Out {
                    flows.total_debt += *amount;
                }
            }
            LedgerKind::Bank => flows.total_bank += signed,
            LedgerKind::Cash => flows.total_cash += signed,
        }
    }
    flows
}

/// Profit figures for a period. Debt repayments come out of net profit the
/// same way expenses do.
pub fn profit_figures(
    total_sales: Decimal,
    cost_of_stock: Decimal,
    total_expense: Decimal,
    total_debt: Decimal,
) -> (Decimal, Decimal) {
    let gross_profit = total_sales - cost_of_stock;
    let net_profit = gross_profit - total_expense - total_debt;
    (gross_profit, net_profit)
}

/// Half-open date range of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AppError> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::validation("Month must be between 1 and 12"))?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| AppError::validation("Month must be between 1 and 12"))?;
    Ok((start, end))
}

/// Every (year, month) from one endpoint to the other, inclusive. Endpoints
/// given in the wrong order are normalized rather than rejected.
pub fn month_walk(
    from_year: i32,
    from_month: u32,
    to_year: i32,
    to_month: u32,
) -> Vec<(i32, u32)> {
    let a = (from_year, from_month);
    let b = (to_year, to_month);
    let (mut cursor, stop) = if a <= b { (a, b) } else { (b, a) };

    let mut months = Vec::new();
    loop {
        months.push(cursor);
        if cursor == stop {
            break;
        }
        cursor = if cursor.1 == 12 {
            (cursor.0 + 1, 1)
        } else {
            (cursor.0, cursor.1 + 1)
        };
    }
    months
}

/// Rebuilds the cached summary for one month from the raw ledgers and
/// upserts it. `stock_value` is a snapshot of current inventory at cost,
/// taken now regardless of which month is being rebuilt.
pub async fn recompute_month(
    pool: &PgPool,
    month: u32,
    year: i32,
) -> Result<MonthlySummary, AppError> {
    let (start, end) = month_bounds(year, month)?;

    let mut tx = pool.begin().await?;

    let rows = sqlx::query_as::<_, (LedgerKind, TxDirection, Decimal)>(
        "SELECT kind, direction, amount FROM daily_transactions
         WHERE date >= $1 AND date < $2",
    )
    .bind(start)
    .bind(end)
    .fetch_all(&mut *tx)
    .await?;
    let flows = fold_ledger(&rows);

    // Sale totals by sale date, not cash collected; installment collections
    // already show up in the cash/bank nets.
    let total_sales = sqlx::query_as::<_, (Option<Decimal>,)>(
        "SELECT SUM(total_amount) FROM sales WHERE sale_date >= $1 AND sale_date < $2",
    )
    .bind(start)
    .bind(end)
    .fetch_one(&mut *tx)
    .await?
    .0
    .unwrap_or(Decimal::ZERO);

    // Cost of goods sold in the month, net of units that came back from
    // supplier/customer returns.
    let cost_of_stock = sqlx::query_as::<_, (Option<Decimal>,)>(
        "SELECT SUM(CASE WHEN st.kind = 'SALE' THEN st.quantity * p.buying_price
                         WHEN st.kind = 'RETURN' AND st.direction = 'IN'
                              THEN -st.quantity * p.buying_price
                         ELSE 0 END)
         FROM stock_transactions st JOIN products p ON p.id = st.product_id
         WHERE st.date >= $1 AND st.date < $2",
    )
    .bind(start)
    .bind(end)
    .fetch_one(&mut *tx)
    .await?
    .0
    .unwrap_or(Decimal::ZERO);

    let total_investment = sqlx::query_as::<_, (Option<Decimal>,)>(
        "SELECT SUM(amount) FROM investments WHERE date >= $1 AND date < $2",
    )
    .bind(start)
    .bind(end)
    .fetch_one(&mut *tx)
    .await?
    .0
    .unwrap_or(Decimal::ZERO);

    let stock_value = sqlx::query_as::<_, (Option<Decimal>,)>(
        "SELECT SUM(stock_quantity * buying_price) FROM products",
    )
    .fetch_one(&mut *tx)
    .await?
    .0
    .unwrap_or(Decimal::ZERO);

    let (gross_profit, net_profit) = profit_figures(
        total_sales,
        cost_of_stock,
        flows.total_expense,
        flows.total_debt,
    );

    let summary = sqlx::query_as::<_, MonthlySummary>(
        "INSERT INTO monthly_summaries (month, year, total_expense, total_debt, total_bank,
                                        total_cash, total_sales, cost_of_stock, gross_profit,
                                        net_profit, stock_value, total_investment)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         ON CONFLICT (year, month) DO UPDATE SET
             total_expense = EXCLUDED.total_expense,
             total_debt = EXCLUDED.total_debt,
             total_bank = EXCLUDED.total_bank,
             total_cash = EXCLUDED.total_cash,
             total_sales = EXCLUDED.total_sales,
             cost_of_stock = EXCLUDED.cost_of_stock,
             gross_profit = EXCLUDED.gross_profit,
             net_profit = EXCLUDED.net_profit,
             stock_value = EXCLUDED.stock_value,
             total_investment = EXCLUDED.total_investment
         RETURNING id, month, year, total_expense, total_debt, total_bank, total_cash,
                   total_sales, cost_of_stock, gross_profit, net_profit, stock_value,
                   total_investment, created_at",
    )
    .bind(month as i32)
    .bind(year)
    .bind(flows.total_expense)
    .bind(flows.total_debt)
    .bind(flows.total_bank)
    .bind(flows.total_cash)
    .bind(total_sales)
    .bind(cost_of_stock)
    .bind(gross_profit)
    .bind(net_profit)
    .bind(stock_value)
    .bind(total_investment)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    debug!(month, year, "Monthly summary recomputed");
    Ok(summary)
}

/// Dashboard aggregate over an inclusive month range. Each month is rebuilt
/// from the ledgers first, so the answer never reflects a stale cache, and
/// every total is the sum of the per-month figures the trend reports.
pub async fn aggregate_range(
    pool: &PgPool,
    from_year: i32,
    from_month: u32,
    to_year: i32,
    to_month: u32,
) -> Result<DashboardSummary, AppError> {
    month_bounds(from_year, from_month)?;
    month_bounds(to_year, to_month)?;

    let months = month_walk(from_year, from_month, to_year, to_month);

    let mut totals = Flows::default();
    let mut total_sales = Decimal::ZERO;
    let mut cost_of_stock = Decimal::ZERO;
    let mut total_investment = Decimal::ZERO;
    let mut stock_value = Decimal::ZERO;
    let mut trend_data = Vec::with_capacity(months.len());

    // Each month is rebuilt and then summed as cached, so the range totals
    // are exactly the sum of the trend points.
    for (year, month) in &months {
        let summary = recompute_month(pool, *month, *year).await?;
        totals.total_expense += summary.total_expense;
        totals.total_debt += summary.total_debt;
        totals.total_bank += summary.total_bank;
        totals.total_cash += summary.total_cash;
        total_sales += summary.total_sales;
        cost_of_stock += summary.cost_of_stock;
        total_investment += summary.total_investment;
        stock_value = summary.stock_value;
        trend_data.push(TrendPoint {
            month: summary.month,
            year: summary.year,
            total_sales: summary.total_sales,
            gross_profit: summary.gross_profit,
            net_profit: summary.net_profit,
        });
    }

    let total_receivable = sqlx::query_as::<_, (Option<Decimal>,)>(
        "SELECT SUM(remaining_amount) FROM sales WHERE status IN ('ACTIVE', 'PARTIAL')",
    )
    .fetch_one(pool)
    .await?
    .0
    .unwrap_or(Decimal::ZERO);

    let total_customers = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM customers")
        .fetch_one(pool)
        .await?
        .0;
    let total_products = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?
        .0;

    let (gross_profit, net_profit) = profit_figures(
        total_sales,
        cost_of_stock,
        totals.total_expense,
        totals.total_debt,
    );

    Ok(DashboardSummary {
        total_expense: totals.total_expense,
        total_debt: totals.total_debt,
        total_bank: totals.total_bank,
        total_cash: totals.total_cash,
        total_sales,
        cost_of_stock,
        gross_profit,
        net_profit,
        stock_value,
        total_investment,
        total_receivable,
        total_customers,
        total_products,
        trend_data,
    })
}

/// Recomputes the current month. Fired by the write watcher, so failures are
/// logged by the caller rather than surfaced to the request.
pub async fn recompute_current_month(pool: &PgPool, today: NaiveDate) -> Result<MonthlySummary, AppError> {
    recompute_month(pool, today.month(), today.year()).await
}

pub async fn delete_summary(pool: &PgPool, id: i64) -> Result<(), AppError> {
    let deleted = sqlx::query("DELETE FROM monthly_summaries WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(AppError::not_found("Monthly summary not found"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn expense_and_debt_count_outflows_only() {
        let flows = fold_ledger(&[
            (LedgerKind::Expense, TxDirection::Out, dec("100")),
            (LedgerKind::Expense, TxDirection::In, dec("40")),
            (LedgerKind::Debt, TxDirection::Out, dec("30")),
        ]);
        assert_eq!(flows.total_expense, dec("100"));
        assert_eq!(flows.total_debt, dec("30"));
    }

    #[test]
    fn cash_and_bank_are_signed_nets() {
        let flows = fold_ledger(&[
            (LedgerKind::Cash, TxDirection::In, dec("500")),
            (LedgerKind::Cash, TxDirection::Out, dec("120")),
            (LedgerKind::Bank, TxDirection::In, dec("200")),
            (LedgerKind::Bank, TxDirection::Out, dec("350")),
        ]);
        assert_eq!(flows.total_cash, dec("380"));
        assert_eq!(flows.total_bank, dec("-150"));
    }

    #[test]
    fn empty_ledger_folds_to_zero() {
        assert_eq!(fold_ledger(&[]), Flows::default());
    }

    #[test]
    fn profit_is_sale_totals_minus_stock_cost() {
        // 4 units at 150 sold against 400 of stock at buying price.
        let (gross, net) = profit_figures(dec("600"), dec("400"), Decimal::ZERO, Decimal::ZERO);
        assert_eq!(gross, dec("200"));
        assert_eq!(net, dec("200"));
    }

    #[test]
    fn net_profit_subtracts_debt_as_well_as_expense() {
        let (gross, net) = profit_figures(dec("600"), dec("400"), dec("50"), dec("100"));
        assert_eq!(gross, dec("200"));
        assert_eq!(net, dec("50"));
    }

    #[test]
    fn december_bounds_roll_into_next_year() {
        let (start, end) = month_bounds(2026, 12).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
    }

    #[test]
    fn month_thirteen_is_rejected() {
        let err = month_bounds(2026, 13).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn walk_crosses_year_boundaries() {
        let months = month_walk(2025, 11, 2026, 2);
        assert_eq!(months, vec![(2025, 11), (2025, 12), (2026, 1), (2026, 2)]);
    }

    #[test]
    fn walk_normalizes_reversed_endpoints() {
        assert_eq!(
            month_walk(2026, 3, 2026, 1),
            month_walk(2026, 1, 2026, 3)
        );
    }

    #[test]
    fn walk_of_a_single_month_has_one_entry() {
        assert_eq!(month_walk(2026, 5, 2026, 5), vec![(2026, 5)]);
    }
}
