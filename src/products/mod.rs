//! Product catalogue

pub mod catalog;
pub mod handlers;
pub mod models;

pub use catalog::ProductCatalog;
pub use handlers::routes;
