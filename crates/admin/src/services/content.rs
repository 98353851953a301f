//! Testimonial and journal submissions.

use rand::Rng;
use serde_json::Value;
use thiserror::Error;

use delightful_naturals_core::clamp_testimonial_rating;
use delightful_naturals_core::slug::{normalize_slug, slugify};

use super::coerce;
use crate::db::journal::JournalDraft;
use crate::db::testimonials::TestimonialDraft;

/// Length of generated testimonial ids.
const TESTIMONIAL_ID_LENGTH: usize = 8;

/// Length of generated journal post ids.
const JOURNAL_ID_LENGTH: usize = 20;

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Why a content submission was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("title is required")]
    TitleRequired,
}

/// A random lower-case alphanumeric id.
#[must_use]
pub fn random_id(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .filter_map(|_| ID_ALPHABET.get(rng.random_range(0..ID_ALPHABET.len())))
        .map(|b| char::from(*b))
        .collect()
}

/// Coerce a testimonial body.
///
/// Accepts `author`/`text` or the form's `name`/`message`. A missing rating
/// means five stars; `published` is true unless sent as `false`.
#[must_use]
pub fn parse_testimonial(body: &Value) -> TestimonialDraft {
    let id = coerce::optional_text(body, "id")
        .unwrap_or_else(|| random_id(TESTIMONIAL_ID_LENGTH));

    let rating = match body.get("rating") {
        None => 5.0,
        Some(_) => clamp_testimonial_rating(coerce::number(body, "rating")),
    };

    TestimonialDraft {
        id,
        author: coerce::text_any(body, &["author", "name"]).trim().to_string(),
        location: coerce::optional_text(body, "location"),
        rating,
        text: coerce::text_any(body, &["text", "message"]).trim().to_string(),
        avatar_url: coerce::optional_text(body, "avatarUrl"),
        published: coerce::unless_false(body, "published"),
    }
}

/// Coerce a journal post body.
///
/// The slug is taken from `slug` when given, otherwise derived from the
/// title, and falls back to the id when neither yields any characters.
///
/// # Errors
///
/// Returns [`ContentError::TitleRequired`] when the title is blank.
pub fn parse_journal_post(body: &Value) -> Result<JournalDraft, ContentError> {
    let title = coerce::text(body, "title").trim().to_string();
    if title.is_empty() {
        return Err(ContentError::TitleRequired);
    }

    let id = coerce::optional_text(body, "id").unwrap_or_else(|| random_id(JOURNAL_ID_LENGTH));

    let mut slug = coerce::optional_text(body, "slug")
        .map_or_else(|| slugify(&title), |s| normalize_slug(&s));
    if slug.is_empty() {
        slug = normalize_slug(&id);
    }

    Ok(JournalDraft {
        slug,
        excerpt: coerce::text(body, "excerpt"),
        content: coerce::text(body, "content"),
        cover_url: coerce::optional_text(body, "coverUrl"),
        author: coerce::optional_text(body, "author"),
        tags: coerce::string_list(body, "tags"),
        published: coerce::unless_false(body, "published"),
        title,
        id,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_random_id_shape() {
        let id = random_id(TESTIMONIAL_ID_LENGTH);
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_testimonial_accepts_form_field_names() {
        let draft = parse_testimonial(&json!({
            "name": "Zanele",
            "message": "My edges grew back!",
            "location": "  ",
        }));
        assert_eq!(draft.author, "Zanele");
        assert_eq!(draft.text, "My edges grew back!");
        assert_eq!(draft.location, None);
        assert_eq!(draft.id.len(), 8);
        assert!(draft.published);
        assert!((draft.rating - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_testimonial_rating_is_clamped() {
        let low = parse_testimonial(&json!({ "id": "t1", "rating": 0 }));
        assert!((low.rating - 1.0).abs() < f64::EPSILON);
        assert_eq!(low.id, "t1");

        let high = parse_testimonial(&json!({ "rating": "9" }));
        assert!((high.rating - 5.0).abs() < f64::EPSILON);

        let junk = parse_testimonial(&json!({ "rating": "lots" }));
        assert!((junk.rating - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_testimonial_published_only_false_disables() {
        assert!(!parse_testimonial(&json!({ "published": false })).published);
        assert!(parse_testimonial(&json!({ "published": 0 })).published);
    }

    #[test]
    fn test_journal_requires_title() {
        assert_eq!(
            parse_journal_post(&json!({ "title": "   " })),
            Err(ContentError::TitleRequired)
        );
    }

    #[test]
    fn test_journal_slug_derivation() {
        let draft = parse_journal_post(&json!({ "title": "Wash Day: A Routine!" })).unwrap();
        assert_eq!(draft.slug, "wash-day-a-routine");
        assert_eq!(draft.id.len(), 20);
        assert!(draft.tags.is_empty());
        assert!(draft.published);

        let draft =
            parse_journal_post(&json!({ "title": "Anything", "slug": "My Custom Slug" })).unwrap();
        assert_eq!(draft.slug, "my-custom-slug");

        let draft = parse_journal_post(&json!({ "id": "post1", "title": "!!!" })).unwrap();
        assert_eq!(draft.slug, "post1");
    }

    #[test]
    fn test_journal_slug_is_capped() {
        let draft = parse_journal_post(&json!({ "title": "a".repeat(300) })).unwrap();
        assert_eq!(draft.slug.len(), 140);
    }
}
