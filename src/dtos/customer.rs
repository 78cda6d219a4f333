use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub cnic: String,
    pub phone: String,
    pub address: String,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: i64,
    pub name: String,
    pub cnic: String,
    pub phone: String,
    pub address: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::customer::Customer> for CustomerResponse {
    fn from(customer: crate::models::customer::Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            cnic: customer.cnic,
            phone: customer.phone,
            address: customer.address,
            email: customer.email,
            created_at: customer.created_at,
        }
    }
}
