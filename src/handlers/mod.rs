pub mod auth;
pub mod customer;
pub mod installment;
pub mod investment;
pub mod product;
pub mod sale;
pub mod stock;
pub mod summary;
pub mod transaction;
