//! Seed the catalog and content tables from a YAML file.
//!
//! Entries use the same field names as the admin editor's JSON bodies and
//! go through the same coercion, so a seed file behaves exactly like a
//! series of editor saves. Entries with an `id` are upserted, which makes
//! re-running a seed safe.
//!
//! ```yaml
//! products:
//!   - id: detox-60
//!     name: Detox Tea
//!     price: "189.00"
//! testimonials:
//!   - id: t-lerato
//!     author: Lerato
//!     text: Lovely.
//! journal:
//!   - id: wash-day
//!     title: Wash day
//! ```

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use delightful_naturals_admin::db::{JournalRepository, ProductRepository, TestimonialRepository};
use delightful_naturals_admin::services::{parse_journal_post, parse_submission, parse_testimonial};
use delightful_naturals_core::ProductId;

use super::connect;

/// Top-level layout of a seed file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub products: Vec<Value>,
    #[serde(default)]
    pub testimonials: Vec<Value>,
    #[serde(default)]
    pub journal: Vec<Value>,
}

impl SeedFile {
    /// Parse YAML text.
    ///
    /// # Errors
    ///
    /// Returns the YAML error for malformed input.
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Product ids named in the file that are well formed.
    fn product_ids(&self) -> Vec<ProductId> {
        self.products
            .iter()
            .filter_map(|p| p.get("id").and_then(Value::as_str))
            .filter_map(|id| ProductId::parse(id).ok())
            .collect()
    }
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub products: usize,
    pub testimonials: usize,
    pub journal: usize,
}

/// Load `path` and upsert every entry.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, an entry is
/// invalid, or a database write fails. Entries before the failing one stay
/// written.
pub async fn run(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    tracing::info!(path = %path.display(), "Loading seed file");
    let content = tokio::fs::read_to_string(path).await?;
    let seed = SeedFile::parse(&content)?;

    let pool = connect().await?;
    let mut result = SeedResult::default();

    let allowed = seed.product_ids();
    let products = ProductRepository::new(&pool);
    for body in &seed.products {
        let submission = parse_submission(body, &allowed)?;
        let (product, created) = products.upsert(&submission.draft, &submission.images).await?;
        tracing::info!(product_id = %product.id, created, "Product seeded");
        result.products += 1;
    }

    let testimonials = TestimonialRepository::new(&pool);
    for body in &seed.testimonials {
        let testimonial = testimonials.upsert(&parse_testimonial(body)).await?;
        tracing::debug!(testimonial_id = %testimonial.id, "Testimonial seeded");
        result.testimonials += 1;
    }

    let journal = JournalRepository::new(&pool);
    for body in &seed.journal {
        let post = journal.create(&parse_journal_post(body)?).await?;
        tracing::debug!(post_id = %post.id, slug = %post.slug, "Journal post seeded");
        result.journal += 1;
    }

    tracing::info!("Seeding complete!");
    tracing::info!("  Products: {}", result.products);
    tracing::info!("  Testimonials: {}", result.testimonials);
    tracing::info!("  Journal posts: {}", result.journal);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_are_optional() {
        let seed = SeedFile::parse("testimonials:\n  - author: Lerato\n    text: Lovely\n").unwrap();
        assert!(seed.products.is_empty());
        assert_eq!(seed.testimonials.len(), 1);
        assert!(seed.journal.is_empty());
    }

    #[test]
    fn test_product_ids_skip_malformed() {
        let seed = SeedFile::parse(
            "products:\n  - id: detox-60\n  - id: Not An Id\n  - name: no id\n",
        )
        .unwrap();
        assert_eq!(seed.product_ids(), vec![ProductId::parse("detox-60").unwrap()]);
    }

    #[test]
    fn test_bundled_seed_file_parses() {
        let seed = SeedFile::parse(include_str!("../../seed/catalog.yaml")).unwrap();
        assert_eq!(seed.product_ids().len(), seed.products.len());
        for body in &seed.products {
            parse_submission(body, &seed.product_ids()).unwrap();
        }
        for body in &seed.journal {
            parse_journal_post(body).unwrap();
        }
    }
}
