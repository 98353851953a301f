//! Catalog writes for the product editor.

use rust_decimal::Decimal;
use sqlx::PgPool;

use delightful_naturals_core::ProductId;
use delightful_naturals_core::catalog::{Product, ProductImage};

use super::RepositoryError;

const PRODUCT_COLUMNS: &str = "id, name, size, in_stock, price, blurb, how_to_use, benefits, \
                               gallery, rating, reviews, updated_at";

/// A fully coerced product ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub id: ProductId,
    pub name: String,
    pub size: String,
    pub in_stock: bool,
    pub price: Decimal,
    pub blurb: String,
    pub how_to_use: Vec<String>,
    pub benefits: Vec<String>,
    pub gallery: Vec<String>,
    pub rating: f64,
    pub reviews: i32,
}

/// A decoded gallery image to store alongside a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    pub index: u8,
    pub name: String,
    pub mime: String,
    pub data: Vec<u8>,
}

/// Repository for product and product image operations.
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

    /// Insert or replace a product and its uploaded images in one transaction.
    ///
    /// Returns the stored product and whether the row was newly created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// written in that case.
    pub async fn upsert(
        &self,
        draft: &ProductDraft,
        images: &[NewImage],
    ) -> Result<(Product, bool), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existed = sqlx::query_scalar::<_, i32>("SELECT 1 FROM product WHERE id = $1 FOR UPDATE")
            .bind(&draft.id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();

        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO product (id, name, size, in_stock, price, blurb, how_to_use, benefits,
                                 gallery, rating, reviews)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                size = EXCLUDED.size,
                in_stock = EXCLUDED.in_stock,
                price = EXCLUDED.price,
                blurb = EXCLUDED.blurb,
                how_to_use = EXCLUDED.how_to_use,
                benefits = EXCLUDED.benefits,
                gallery = EXCLUDED.gallery,
                rating = EXCLUDED.rating,
                reviews = EXCLUDED.reviews,
                updated_at = NOW()
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&draft.id)
        .bind(&draft.name)
        .bind(&draft.size)
        .bind(draft.in_stock)
        .bind(draft.price)
        .bind(&draft.blurb)
        .bind(&draft.how_to_use)
        .bind(&draft.benefits)
        .bind(&draft.gallery)
        .bind(draft.rating)
        .bind(draft.reviews)
        .fetch_one(&mut *tx)
        .await?;

        for image in images {
            let size = i32::try_from(image.data.len()).map_err(|_| {
                RepositoryError::DataCorruption(format!("image {} too large", image.index))
            })?;

            sqlx::query(
                r"
                INSERT INTO product_image (product_id, idx, name, mime, size, data)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (product_id, idx) DO UPDATE SET
                    name = EXCLUDED.name,
                    mime = EXCLUDED.mime,
                    size = EXCLUDED.size,
                    data = EXCLUDED.data,
                    updated_at = NOW()
                ",
            )
            .bind(&draft.id)
            .bind(i16::from(image.index))
            .bind(&image.name)
            .bind(&image.mime)
            .bind(size)
            .bind(&image.data)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok((product, !existed))
    }

    /// Delete a product and its stored images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM product_image WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
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
