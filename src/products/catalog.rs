//! Product catalogue with two-phase price adjustment
//!
//! The local copy is what the back-office list shows. A price change is
//! applied locally first, then written remotely; if the write fails the local
//! value is restored, unless a later adjustment has replaced it meanwhile.

use super::models::Product;
use crate::{
    ports::{PersistenceError, ProductRepository},
    pricing::Amount,
};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("product {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub struct ProductCatalog {
    repo: Arc<dyn ProductRepository>,
    local: DashMap<String, Product>,
}

impl ProductCatalog {
    pub fn new(repo: Arc<dyn ProductRepository>) -> Self {
        Self {
            repo,
            local: DashMap::new(),
        }
    }

    /// Reloads the local copy from the store
    pub async fn refresh(&self) -> Result<Vec<Product>, CatalogError> {
        let products = self.repo.list_products().await?;

        self.local.clear();
        for product in &products {
            self.local.insert(product.id.clone(), product.clone());
        }

        Ok(products)
    }

    /// Local copy of one product
    pub fn cached(&self, id: &str) -> Option<Product> {
        self.local.get(id).map(|p| p.clone())
    }

    /// Local copy of a product, fetched from the store on a miss
    pub async fn get(&self, id: &str) -> Result<Product, CatalogError> {
        self.load(id).await?;
        self.cached(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_owned()))
    }

    async fn load(&self, id: &str) -> Result<(), CatalogError> {
        if self.local.contains_key(id) {
            return Ok(());
        }

        let product = self
            .repo
            .find_product(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_owned()))?;
        self.local.insert(product.id.clone(), product);

        Ok(())
    }

    /// Sets a product's price: locally, then remotely, rolling back on failure.
    pub async fn adjust_price(&self, id: &str, price: Amount) -> Result<Product, CatalogError> {
        self.load(id).await?;

        let previous = {
            let mut product = self
                .local
                .get_mut(id)
                .ok_or_else(|| CatalogError::NotFound(id.to_owned()))?;
            std::mem::replace(&mut product.price, price)
        };

        match self.repo.update_product_price(id, price).await {
            Ok(product) => {
                info!(product_id = %id, previous, price, "price updated");
                self.local.insert(product.id.clone(), product.clone());
                Ok(product)
            }
            Err(e) => {
                warn!(product_id = %id, error = %e, "price update rejected, restoring previous value");
                if let Some(mut product) = self.local.get_mut(id) {
                    if product.price == price {
                        product.price = previous;
                    }
                }

                Err(match e {
                    PersistenceError::NotFound { .. } => CatalogError::NotFound(id.to_owned()),
                    other => other.into(),
                })
            }
        }
    }
}
