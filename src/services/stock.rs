// src/services/stock.rs
//
// Stock engine: applies inward/outward movements to a product and records
// each movement as an immutable StockTransaction row. Purchase inflows also
// record the cash outflow that paid for the stock.
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;

use crate::error::AppError;
use crate::models::product::Product;
use crate::models::sale::PaymentMethod;
use crate::models::transaction::{LedgerKind, StockKind, StockTransaction, TxDirection};

pub struct NewStockMovement {
    pub product_id: i64,
    pub quantity: i32,
    pub direction: TxDirection,
    pub kind: StockKind,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub payment_method: PaymentMethod,
}

pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub brand: String,
    pub buying_price: Decimal,
    pub selling_price: Decimal,
    pub stock_quantity: i32,
    pub date: NaiveDate,
    pub note: Option<String>,
}

/// Applies a movement to a current on-hand count. The shop can never show
/// negative inventory, so any movement that would take the count below zero
/// is rejected before anything is written.
pub fn adjusted_quantity(
    current: i32,
    quantity: i32,
    direction: TxDirection,
) -> Result<i32, AppError> {
    let new_quantity = match direction {
        TxDirection::In => current + quantity,
        TxDirection::Out => current - quantity,
    };

    if new_quantity < 0 {
        return Err(AppError::conflict(format!(
            "Not enough stock available. Current stock is {current}"
        )));
    }

    Ok(new_quantity)
}

/// Records a stock movement and updates the product's on-hand count in one
/// transaction. Purchase inflows additionally write the matching cash/bank
/// outflow to the daily ledger, linked via stock_id.
pub async fn create_stock_transaction(
    pool: &PgPool,
    input: NewStockMovement,
) -> Result<StockTransaction, AppError> {
    if input.quantity <= 0 {
        return Err(AppError::validation("Quantity must be greater than 0"));
    }

    let mut tx = pool.begin().await?;

    let product = sqlx::query_as::<_, (String, i32, Decimal)>(
        "SELECT name, stock_quantity, buying_price FROM products WHERE id = $1",
    )
    .bind(input.product_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;
    let (product_name, current_stock, buying_price) = product;

    let purchase_date = initial_purchase_date(&mut tx, input.product_id).await?;
    if let Some(purchase_date) = purchase_date {
        if input.date < purchase_date {
            return Err(AppError::validation(format!(
                "Stock transaction date cannot be before {purchase_date} (product purchase date)"
            )));
        }
    }

    let new_quantity = adjusted_quantity(current_stock, input.quantity, input.direction)?;

    let note = input.note.unwrap_or_else(|| match input.kind {
        StockKind::Return => format!(
            "{product_name} # Return to Supplier of {} units",
            input.quantity
        ),
        _ => format!("{product_name} # {:?} of {} units", input.kind, input.quantity),
    });

    let movement = sqlx::query_as::<_, StockTransaction>(
        "INSERT INTO stock_transactions (product_id, quantity, direction, kind, date, note)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, product_id, sale_id, quantity, direction, kind, date, note, initial, created_at",
    )
    .bind(input.product_id)
    .bind(input.quantity)
    .bind(input.direction)
    .bind(input.kind)
    .bind(input.date)
    .bind(&note)
    .fetch_one(&mut *tx)
    .await?;

    if input.kind == StockKind::Purchase && input.direction == TxDirection::In {
        let cost = buying_price * Decimal::from(input.quantity);
        sqlx::query(
            "INSERT INTO daily_transactions (kind, direction, amount, date, note, stock_id, product_id)
             VALUES ($1, 'OUT', $2, $3, $4, $5, $6)",
        )
        .bind(LedgerKind::from(input.payment_method))
        .bind(cost)
        .bind(input.date)
        .bind(format!(
            "{product_name} # Purchase of {} units",
            input.quantity
        ))
        .bind(movement.id)
        .bind(input.product_id)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE products SET stock_quantity = $1 WHERE id = $2")
        .bind(new_quantity)
        .bind(input.product_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    debug!(id = movement.id, product_id = input.product_id, new_quantity, "Stock movement recorded");
    Ok(movement)
}

/// Deletes a stock transaction and applies the compensating adjustment to
/// the product. A daily-ledger row linked to the movement is removed in the
/// same transaction so no orphaned money entry survives.
pub async fn delete_stock_transaction(pool: &PgPool, id: i64) -> Result<Product, AppError> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, StockTransaction>(
        "SELECT id, product_id, sale_id, quantity, direction, kind, date, note, initial, created_at
         FROM stock_transactions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Stock transaction not found"))?;

    let current_stock = sqlx::query_as::<_, (i32,)>(
        "SELECT stock_quantity FROM products WHERE id = $1",
    )
    .bind(existing.product_id)
    .fetch_one(&mut *tx)
    .await?
    .0;

    // Undo the original movement: an inflow is taken back out, an outflow
    // is put back in.
    let inverse = match existing.direction {
        TxDirection::In => TxDirection::Out,
        TxDirection::Out => TxDirection::In,
    };
    let new_quantity = adjusted_quantity(current_stock, existing.quantity, inverse)?;

    sqlx::query("DELETE FROM daily_transactions WHERE stock_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM stock_transactions WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET stock_quantity = $1 WHERE id = $2
         RETURNING id, name, category, brand, buying_price, selling_price, stock_quantity, created_at",
    )
    .bind(new_quantity)
    .bind(existing.product_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(product)
}

/// Registers a product together with its founding PURCHASE movement
/// (`initial = true`) and, when the initial stock cost anything, the expense
/// row that paid for it. The initial movement's date is the floor every
/// later sale/stock date is validated against.
pub async fn register_product(pool: &PgPool, input: NewProduct) -> Result<Product, AppError> {
    if input.stock_quantity < 0 {
        return Err(AppError::validation("Stock quantity cannot be negative"));
    }

    let mut tx = pool.begin().await?;

    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (name, category, brand, buying_price, selling_price, stock_quantity)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, name, category, brand, buying_price, selling_price, stock_quantity, created_at",
    )
    .bind(&input.name)
    .bind(&input.category)
    .bind(&input.brand)
    .bind(input.buying_price)
    .bind(input.selling_price)
    .bind(input.stock_quantity)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO stock_transactions (product_id, quantity, direction, kind, date, note, initial)
         VALUES ($1, $2, 'IN', 'PURCHASE', $3, $4, TRUE)",
    )
    .bind(product.id)
    .bind(input.stock_quantity)
    .bind(input.date)
    .bind(input.note.as_deref())
    .execute(&mut *tx)
    .await?;

    let total_cost = input.buying_price * Decimal::from(input.stock_quantity);
    if total_cost > Decimal::ZERO {
        sqlx::query(
            "INSERT INTO daily_transactions (kind, direction, amount, date, note, product_id)
             VALUES ('EXPENSE', 'OUT', $1, $2, $3, $4)",
        )
        .bind(total_cost)
        .bind(input.date)
        .bind(input.note.clone().unwrap_or_else(|| {
            format!(
                "Initial purchase of {} units of {}",
                input.stock_quantity, input.name
            )
        }))
        .bind(product.id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(product)
}

pub(crate) async fn initial_purchase_date(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: i64,
) -> Result<Option<NaiveDate>, AppError> {
    let date = sqlx::query_as::<_, (NaiveDate,)>(
        "SELECT date FROM stock_transactions
         WHERE product_id = $1 AND initial ORDER BY id LIMIT 1",
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?
    .map(|row| row.0);

    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflow_adds_to_current_stock() {
        assert_eq!(adjusted_quantity(10, 4, TxDirection::In).unwrap(), 14);
    }

    #[test]
    fn outflow_subtracts_from_current_stock() {
        assert_eq!(adjusted_quantity(10, 4, TxDirection::Out).unwrap(), 6);
    }

    #[test]
    fn outflow_may_empty_the_shelf_exactly() {
        assert_eq!(adjusted_quantity(4, 4, TxDirection::Out).unwrap(), 0);
    }

    #[test]
    fn outflow_below_zero_is_rejected() {
        let err = adjusted_quantity(3, 20, TxDirection::Out).unwrap_err();
        match err {
            AppError::Conflict(msg) => assert!(msg.contains("Not enough stock")),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }
}
