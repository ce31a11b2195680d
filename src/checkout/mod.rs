//! Checkout Domain Module
//!
//! - `wizard`: the three-step state machine and its validation
//! - `service`: order placement against the persistence and notification ports
//! - `handlers`: REST endpoints

pub mod errors;
pub mod handlers;
pub mod models;
pub mod service;
pub mod wizard;

pub use errors::CheckoutError;
pub use handlers::routes;
pub use service::CheckoutService;
pub use wizard::{CheckoutWizard, ValidationErrors};
