// src/handlers/product.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{error, instrument};

use crate::dtos::product::{ProductResponse, RegisterProductRequest, UpdateProductRequest};
use crate::error::AppError;
use crate::models::product::Product;
use crate::services::stock::{self, NewProduct};
use crate::state::AppState;

// GET /products - List all products
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    match sqlx::query_as::<_, Product>(
        "SELECT id, name, category, brand, buying_price, selling_price, stock_quantity, created_at
         FROM products ORDER BY name",
    )
    .fetch_all(&state.db_pool)
    .await
    {
        Ok(products) => Ok(Json(products.into_iter().map(ProductResponse::from).collect())),
        Err(e) => {
            error!(?e, "Failed to fetch products");
            Err(e.into())
        }
    }
}

// GET /products/:id
#[instrument(skip(state), fields(id))]
pub async fn get_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, category, brand, buying_price, selling_price, stock_quantity, created_at
         FROM products WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(Json(ProductResponse::from(product)))
}

// POST /products - Register a product with its founding stock purchase
#[instrument(skip(state, payload))]
pub async fn register_product(
    State(state): State<AppState>,
    Json(payload): Json<RegisterProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Product name required"));
    }
    if payload.buying_price.is_sign_negative() || payload.selling_price.is_sign_negative() {
        return Err(AppError::validation("Prices cannot be negative"));
    }

    let product = stock::register_product(
        &state.db_pool,
        NewProduct {
            name: payload.name.trim().to_string(),
            category: payload.category,
            brand: payload.brand,
            buying_price: payload.buying_price,
            selling_price: payload.selling_price,
            stock_quantity: payload.stock_quantity,
            date: payload.date,
            note: payload.note,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

// PATCH /products/:id - Catalogue fields only; stock changes go through
// stock transactions.
#[instrument(skip(state, payload), fields(id))]
pub async fn update_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET
             name = COALESCE($1, name),
             category = COALESCE($2, category),
             brand = COALESCE($3, brand),
             buying_price = COALESCE($4, buying_price),
             selling_price = COALESCE($5, selling_price)
         WHERE id = $6
         RETURNING id, name, category, brand, buying_price, selling_price, stock_quantity, created_at",
    )
    .bind(payload.name)
    .bind(payload.category)
    .bind(payload.brand)
    .bind(payload.buying_price)
    .bind(payload.selling_price)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(Json(ProductResponse::from(product)))
}

// DELETE /products/:id
#[instrument(skip(state), fields(id))]
pub async fn delete_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.code().as_deref() == Some("23503") {
                    return AppError::conflict(
                        "Product has sales or stock history and cannot be deleted",
                    );
                }
            }
            e.into()
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Product not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
