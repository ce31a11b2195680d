//! Adapters for the external collaborators
//!
//! - `memory`: in-process stand-ins (default wiring, tests)
//! - `rest_store`: hosted table store over HTTP
//! - `email`: transactional email API over HTTP

pub mod email;
pub mod memory;
pub mod rest_store;

use crate::{
    config::ServerConfig,
    ports::{Notifier, Ports},
};
use std::sync::Arc;
use tracing::info;

/// Wires the ports from configuration.
///
/// The hosted store is used when `STORE_URL` is set, the email API when
/// `EMAIL_API_URL` is set; anything else falls back to the in-memory adapter.
pub fn from_config(config: &ServerConfig) -> Result<Ports, reqwest::Error> {
    let notifier: Arc<dyn Notifier> = match &config.email_api_url {
        Some(url) => {
            info!(endpoint = %url, "using email api");
            Arc::new(email::HttpNotifier::new(
                url.clone(),
                config.email_api_key.clone(),
            )?)
        }
        None => Arc::new(memory::OutboxNotifier::new()),
    };

    let ports = match &config.store_url {
        Some(url) => {
            info!(store = %url, "using hosted store");
            let store = Arc::new(rest_store::RestStore::new(
                url.clone(),
                config.store_api_key.clone().unwrap_or_default(),
            )?);

            Ports {
                orders: store.clone(),
                products: store.clone(),
                identity: store,
                notifier,
            }
        }
        None => {
            info!("using in-memory store with demo catalogue");
            let store = Arc::new(memory::InMemoryStore::with_products(memory::demo_catalog()));

            Ports {
                orders: store.clone(),
                products: store.clone(),
                identity: store,
                notifier,
            }
        }
    };

    Ok(ports)
}
