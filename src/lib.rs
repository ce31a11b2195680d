//! Storefront Cart Library
//!
//! Cart aggregation and pricing, the three-step checkout wizard and order
//! placement for a localized storefront, served over a small REST API.

// Domain modules
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod pricing;
pub mod products;

// Collaborators
pub mod adapters;
pub mod ports;

// Infrastructure
pub mod config;
pub mod logging;
pub mod router;
