use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use crate::dtos::customer::{CreateCustomerRequest, CustomerResponse, UpdateCustomerRequest};
use crate::error::AppError;
use crate::models::customer::Customer;
use crate::state::AppState;

fn validate_cnic(cnic: &str) -> Result<(), AppError> {
    if cnic.len() != 13 || !cnic.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation("CNIC must be exactly 13 digits"));
    }
    Ok(())
}

// GET /customers
#[instrument(skip(state))]
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    let customers = sqlx::query_as::<_, Customer>(
        "SELECT id, name, cnic, phone, address, email, created_at FROM customers ORDER BY name",
    )
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(customers.into_iter().map(CustomerResponse::from).collect()))
}

// GET /customers/:id
#[instrument(skip(state), fields(id))]
pub async fn get_customer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<CustomerResponse>, AppError> {
    let customer = sqlx::query_as::<_, Customer>(
        "SELECT id, name, cnic, phone, address, email, created_at FROM customers WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Customer not found"))?;

    Ok(Json(CustomerResponse::from(customer)))
}

// POST /customers
#[instrument(skip(state, payload))]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Customer name required"));
    }
    validate_cnic(&payload.cnic)?;

    let customer = sqlx::query_as::<_, Customer>(
        "INSERT INTO customers (name, cnic, phone, address, email)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, name, cnic, phone, address, email, created_at",
    )
    .bind(payload.name.trim())
    .bind(&payload.cnic)
    .bind(&payload.phone)
    .bind(payload.address)
    .bind(payload.email)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| {
        if let Some(db_err) = e.as_database_error() {
            if db_err.code().as_deref() == Some("23505") {
                return AppError::conflict("A customer with this CNIC already exists");
            }
        }
        e.into()
    })?;

    Ok((StatusCode::CREATED, Json(CustomerResponse::from(customer))))
}

// PATCH /customers/:id - CNIC is identity, not editable.
#[instrument(skip(state, payload), fields(id))]
pub async fn update_customer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    let customer = sqlx::query_as::<_, Customer>(
        "UPDATE customers SET
             name = COALESCE($1, name),
             phone = COALESCE($2, phone),
             address = COALESCE($3, address),
             email = COALESCE($4, email)
         WHERE id = $5
         RETURNING id, name, cnic, phone, address, email, created_at",
    )
    .bind(payload.name)
    .bind(payload.phone)
    .bind(payload.address)
    .bind(payload.email)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Customer not found"))?;

    Ok(Json(CustomerResponse::from(customer)))
}

// DELETE /customers/:id
#[instrument(skip(state), fields(id))]
pub async fn delete_customer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.code().as_deref() == Some("23503") {
                    return AppError::conflict(
                        "Customer has sales on record and cannot be deleted",
                    );
                }
            }
            e.into()
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Customer not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::validate_cnic;

    #[test]
    fn thirteen_digits_pass() {
        validate_cnic("3520212345671").unwrap();
    }

    #[test]
    fn short_or_non_numeric_cnic_fails() {
        assert!(validate_cnic("12345").is_err());
        assert!(validate_cnic("35202-1234567").is_err());
        assert!(validate_cnic("35202123456712").is_err());
    }
}
