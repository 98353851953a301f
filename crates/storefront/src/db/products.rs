//! Catalog reads.

use sqlx::PgPool;

use delightful_naturals_core::ProductId;
use delightful_naturals_core::catalog::{Product, ProductImage};

use super::RepositoryError;

const PRODUCT_COLUMNS: &str = "id, name, size, in_stock, price, blurb, how_to_use, benefits, \
                               gallery, rating, reviews, updated_at";

/// Repository for product and product image reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every product, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product ORDER BY name, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// A single product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// A stored gallery image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_image(
        &self,
        id: &ProductId,
        index: u8,
    ) -> Result<Option<ProductImage>, RepositoryError> {
        let image = sqlx::query_as::<_, ProductImage>(
            r"
            SELECT product_id, idx, name, mime, size, data, updated_at
            FROM product_image
            WHERE product_id = $1 AND idx = $2
            ",
        )
        .bind(id)
        .bind(i16::from(index))
        .fetch_optional(self.pool)
        .await?;
        Ok(image)
    }
}
