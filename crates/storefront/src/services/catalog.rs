//! Cached catalog reads.
//!
//! Products are cached with `moka` for 60 seconds, so admin edits show up on
//! the storefront within a minute. Image bytes are never cached here.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use delightful_naturals_core::ProductId;
use delightful_naturals_core::catalog::Product;

use crate::db::{ProductRepository, RepositoryError};

const CATALOG_TTL: Duration = Duration::from_secs(60);

/// Cache key for catalog entries.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Products,
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
}

/// Read-through cache in front of [`ProductRepository`].
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    /// Create an empty catalog cache.
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(256)
            .time_to_live(CATALOG_TTL)
            .build();
        Self { cache }
    }

    /// Every product, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    #[instrument(skip_all)]
    pub async fn products(&self, pool: &PgPool) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = Arc::new(ProductRepository::new(pool).list().await?);
        self.cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// A single product. Missing products are not cached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    #[instrument(skip(self, pool), fields(product_id = %id))]
    pub async fn product(
        &self,
        pool: &PgPool,
        id: &ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let product = ProductRepository::new(pool).get(id).await?;
        if let Some(product) = &product {
            self.cache
                .insert(key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }
        Ok(product)
    }

}
