//! Testimonial management.

use sqlx::PgPool;

use delightful_naturals_core::content::Testimonial;

use super::RepositoryError;

const TESTIMONIAL_COLUMNS: &str =
    "id, author, location, rating, text, avatar_url, published, created_at, updated_at";

/// A coerced testimonial ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct TestimonialDraft {
    pub id: String,
    pub author: String,
    pub location: Option<String>,
    pub rating: f64,
    pub text: String,
    pub avatar_url: Option<String>,
    pub published: bool,
}

/// Repository for testimonial database operations.
pub struct TestimonialRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TestimonialRepository<'a> {
    /// Create a new testimonial repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All testimonials, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: i64) -> Result<Vec<Testimonial>, RepositoryError> {
        let rows = sqlx::query_as::<_, Testimonial>(&format!(
            "SELECT {TESTIMONIAL_COLUMNS} FROM testimonial ORDER BY updated_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert or replace a testimonial. `created_at` survives updates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, draft: &TestimonialDraft) -> Result<Testimonial, RepositoryError> {
        let row = sqlx::query_as::<_, Testimonial>(&format!(
            r"
            INSERT INTO testimonial (id, author, location, rating, text, avatar_url, published)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                author = EXCLUDED.author,
                location = EXCLUDED.location,
                rating = EXCLUDED.rating,
                text = EXCLUDED.text,
                avatar_url = EXCLUDED.avatar_url,
                published = EXCLUDED.published,
                updated_at = NOW()
            RETURNING {TESTIMONIAL_COLUMNS}
            "
        ))
        .bind(&draft.id)
        .bind(&draft.author)
        .bind(&draft.location)
        .bind(draft.rating)
        .bind(&draft.text)
        .bind(&draft.avatar_url)
        .bind(draft.published)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }
}
