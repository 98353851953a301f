//! Published testimonials and journal posts.

use sqlx::PgPool;

use delightful_naturals_core::content::{JournalPost, Testimonial};

use super::RepositoryError;

const TESTIMONIAL_COLUMNS: &str =
    "id, author, location, rating, text, avatar_url, published, created_at, updated_at";

const JOURNAL_COLUMNS: &str = "id, title, slug, excerpt, content, cover_url, author, tags, \
                               published, published_at, created_at, updated_at";

/// Repository for storefront content reads. Only published rows are visible.
pub struct ContentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContentRepository<'a> {
    /// Create a new content repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Published testimonials, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn published_testimonials(
        &self,
        limit: i64,
    ) -> Result<Vec<Testimonial>, RepositoryError> {
        let rows = sqlx::query_as::<_, Testimonial>(&format!(
            r"
            SELECT {TESTIMONIAL_COLUMNS} FROM testimonial
            WHERE published
            ORDER BY updated_at DESC
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Published journal posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn published_posts(&self, limit: i64) -> Result<Vec<JournalPost>, RepositoryError> {
        let rows = sqlx::query_as::<_, JournalPost>(&format!(
            r"
            SELECT {JOURNAL_COLUMNS} FROM journal_post
            WHERE published
            ORDER BY COALESCE(published_at, created_at) DESC
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// The latest published post with this slug. Slugs are not unique.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn published_post_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<JournalPost>, RepositoryError> {
        let post = sqlx::query_as::<_, JournalPost>(&format!(
            r"
            SELECT {JOURNAL_COLUMNS} FROM journal_post
            WHERE published AND slug = $1
            ORDER BY created_at DESC
            LIMIT 1
            "
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(post)
    }
}
