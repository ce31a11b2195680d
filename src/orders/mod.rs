//! Orders: records, status lifecycle and the back-office status update

pub mod admin;
pub mod handlers;
pub mod models;

pub use admin::OrderAdmin;
pub use handlers::routes;
