//! Markdown rendering for journal posts.

use comrak::{Options, markdown_to_html};

/// Words per minute used for the reading-time estimate.
const WORDS_PER_MINUTE: usize = 200;

/// Render journal markdown to HTML.
///
/// GFM extensions are enabled. Raw HTML in the source is escaped, so post
/// bodies cannot inject markup.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;
    options.render.escape = true;

    markdown_to_html(content, &options)
}

/// Estimated reading time in whole minutes, at least one.
#[must_use]
pub fn reading_time_minutes(content: &str) -> usize {
    content
        .split_whitespace()
        .count()
        .div_ceil(WORDS_PER_MINUTE)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_headings_and_lists() {
        let html = render_markdown("## Wash day\n\n- detangle\n- rinse\n");
        assert!(html.contains("<h2"));
        assert!(html.contains("Wash day"));
        assert!(html.contains("<li>detangle</li>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_markdown("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(450)), 3);
    }
}
