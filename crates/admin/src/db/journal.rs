//! Journal post management.
//!
//! Listing is keyset-paginated: the cursor is the id of the last post on the
//! previous page. With a search term posts are ordered by slug, otherwise
//! newest first.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delightful_naturals_core::content::JournalPost;

use super::RepositoryError;

const JOURNAL_COLUMNS: &str = "id, title, slug, excerpt, content, cover_url, author, tags, \
                               published, published_at, created_at, updated_at";

/// A coerced journal post ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalDraft {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub cover_url: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
}

/// Journal list parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalQuery {
    pub limit: i64,
    /// Id of the last post already seen. Unknown ids are ignored.
    pub after: Option<String>,
    /// Lower-case slug prefix.
    pub slug_prefix: Option<String>,
}

/// Escape `LIKE` wildcards and append `%` for a prefix match.
fn prefix_pattern(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[derive(Debug, sqlx::FromRow)]
struct CursorRow {
    id: String,
    slug: String,
    created_at: DateTime<Utc>,
}

/// Repository for journal database operations.
pub struct JournalRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> JournalRepository<'a> {
    /// Create a new journal repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of posts, published or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, query: &JournalQuery) -> Result<Vec<JournalPost>, RepositoryError> {
        let cursor = match query.after.as_deref() {
            Some(after) => {
                sqlx::query_as::<_, CursorRow>(
                    "SELECT id, slug, created_at FROM journal_post WHERE id = $1",
                )
                .bind(after)
                .fetch_optional(self.pool)
                .await?
            }
            None => None,
        };

        let posts = if let Some(prefix) = query.slug_prefix.as_deref() {
            sqlx::query_as::<_, JournalPost>(&format!(
                r"
                SELECT {JOURNAL_COLUMNS} FROM journal_post
                WHERE slug LIKE $1
                  AND ($2::text IS NULL OR (slug, id) > ($2, $3))
                ORDER BY slug, id
                LIMIT $4
                "
            ))
            .bind(prefix_pattern(prefix))
            .bind(cursor.as_ref().map(|c| c.slug.clone()))
            .bind(cursor.as_ref().map(|c| c.id.clone()))
            .bind(query.limit)
            .fetch_all(self.pool)
            .await?
        } else {
            sqlx::query_as::<_, JournalPost>(&format!(
                r"
                SELECT {JOURNAL_COLUMNS} FROM journal_post
                WHERE ($1::timestamptz IS NULL OR (created_at, id) < ($1, $2))
                ORDER BY created_at DESC, id DESC
                LIMIT $3
                "
            ))
            .bind(cursor.as_ref().map(|c| c.created_at))
            .bind(cursor.as_ref().map(|c| c.id.clone()))
            .bind(query.limit)
            .fetch_all(self.pool)
            .await?
        };

        Ok(posts)
    }

    /// Insert a post, replacing any post with the same id.
    ///
    /// `published_at` is stamped when the post is first written as published.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, draft: &JournalDraft) -> Result<JournalPost, RepositoryError> {
        let post = sqlx::query_as::<_, JournalPost>(&format!(
            r"
            INSERT INTO journal_post (id, title, slug, excerpt, content, cover_url, author, tags,
                                      published, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, CASE WHEN $9 THEN NOW() END)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                slug = EXCLUDED.slug,
                excerpt = EXCLUDED.excerpt,
                content = EXCLUDED.content,
                cover_url = EXCLUDED.cover_url,
                author = EXCLUDED.author,
                tags = EXCLUDED.tags,
                published = EXCLUDED.published,
                published_at = CASE
                    WHEN EXCLUDED.published
                        THEN COALESCE(journal_post.published_at, EXCLUDED.published_at)
                END,
                updated_at = NOW()
            RETURNING {JOURNAL_COLUMNS}
            "
        ))
        .bind(&draft.id)
        .bind(&draft.title)
        .bind(&draft.slug)
        .bind(&draft.excerpt)
        .bind(&draft.content)
        .bind(&draft.cover_url)
        .bind(&draft.author)
        .bind(&draft.tags)
        .bind(draft.published)
        .fetch_one(self.pool)
        .await?;
        Ok(post)
    }

    /// Delete a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no post has this id.
    pub async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM journal_post WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_pattern() {
        assert_eq!(prefix_pattern("wash"), "wash%");
        assert_eq!(prefix_pattern("100%"), "100\\%%");
        assert_eq!(prefix_pattern("a_b"), "a\\_b%");
    }
}
