pub mod customer;
pub mod investment;
pub mod product;
pub mod sale;
pub mod stock;
pub mod summary;
pub mod transaction;
pub mod user;
