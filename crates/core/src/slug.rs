//! URL slugs for journal posts.

/// Longest slug stored for a journal post.
pub const MAX_SLUG_LENGTH: usize = 140;

/// Derive a URL slug from a title.
///
/// Lowercases the input, collapses every run of characters outside
/// `[a-z0-9]` into a single dash and trims dashes from both ends. The result
/// is cut to [`MAX_SLUG_LENGTH`] characters.
///
/// ```
/// use delightful_naturals_core::slug::slugify;
///
/// assert_eq!(slugify("  Wash Day: A Routine!  "), "wash-day-a-routine");
/// ```
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len().min(MAX_SLUG_LENGTH));
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_LENGTH {
            break;
        }
    }

    slug.truncate(MAX_SLUG_LENGTH);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Normalize a caller-supplied slug: the same character rules as
/// [`slugify`], so a hand-typed slug can never escape `[a-z0-9-]`.
#[must_use]
pub fn normalize_slug(slug: &str) -> String {
    slugify(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Growth Oil 100ml"), "growth-oil-100ml");
    }

    #[test]
    fn test_slugify_collapses_and_trims() {
        assert_eq!(slugify("--Scalp   care -- tips--"), "scalp-care-tips");
        assert_eq!(slugify("Rooibos & Rosemary"), "rooibos-rosemary");
    }

    #[test]
    fn test_slugify_empty_for_symbols_only() {
        assert_eq!(slugify("!!! ???"), "");
    }

    #[test]
    fn test_slugify_caps_length() {
        let slug = slugify(&"word ".repeat(100));
        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(!slug.ends_with('-'));
        assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn test_normalize_slug_strips_unsafe_characters() {
        assert_eq!(normalize_slug("My/Post?x=1"), "my-post-x-1");
    }
}
