//! Editorial content: customer testimonials and journal posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer testimonial shown on the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: String,
    pub author: String,
    pub location: Option<String>,
    /// Star rating, `1.0..=5.0`.
    pub rating: f64,
    pub text: String,
    pub avatar_url: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Testimonial {
    /// Whole stars to draw, rounding the rating.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // rating is 1..=5
    pub fn stars(&self) -> u8 {
        self.rating.round().clamp(0.0, 5.0) as u8
    }
}

/// A journal (blog) post. `content` is markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct JournalPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub cover_url: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalPost {
    /// Date shown on listings: publication date, else creation date.
    #[must_use]
    pub fn display_date(&self) -> String {
        self.published_at
            .unwrap_or(self.created_at)
            .format("%-d %B %Y")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_display_date_prefers_published_at() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single();
        let published = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).single();
        let (Some(created), Some(published)) = (created, published) else {
            panic!("valid test dates");
        };

        let mut post = JournalPost {
            id: "abc".to_string(),
            title: "Wash day".to_string(),
            slug: "wash-day".to_string(),
            excerpt: String::new(),
            content: String::new(),
            cover_url: None,
            author: None,
            tags: vec![],
            published: true,
            published_at: Some(published),
            created_at: created,
            updated_at: created,
        };
        assert_eq!(post.display_date(), "15 March 2024");

        post.published_at = None;
        assert_eq!(post.display_date(), "1 March 2024");
    }

    #[test]
    fn test_testimonial_stars_round() {
        let now = Utc::now();
        let testimonial = Testimonial {
            id: "t1".to_string(),
            author: "Naledi".to_string(),
            location: None,
            rating: 4.6,
            text: "Lovely".to_string(),
            avatar_url: None,
            published: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(testimonial.stars(), 5);
    }
}
