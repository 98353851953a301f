//! Local media store for uploaded files.
//!
//! Files land under `{root}/products/{product_id}/{millis}-{safe_name}` and
//! are served back from `/media/...`.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;

use delightful_naturals_core::ProductId;

/// URL prefix the media directory is served under.
pub const MEDIA_URL_PREFIX: &str = "/media";

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
#[must_use]
pub fn safe_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // A bare "." or ".." would escape the product directory.
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        cleaned
    }
}

/// A file written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// Path relative to the store root, always `/`-separated.
    pub path: String,
    /// Public URL.
    pub url: String,
}

/// Filesystem-backed media store.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The directory files are written to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an uploaded product file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or file cannot be written.
    pub async fn save_product_file(
        &self,
        product_id: &ProductId,
        file_name: &str,
        data: &[u8],
    ) -> io::Result<StoredMedia> {
        let file_name = format!("{}-{}", Utc::now().timestamp_millis(), safe_name(file_name));
        let path = format!("products/{product_id}/{file_name}");

        let dir = self.root.join("products").join(product_id.as_str());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), data).await?;

        tracing::info!(path = %path, bytes = data.len(), "Stored uploaded file");

        Ok(StoredMedia {
            url: format!("{MEDIA_URL_PREFIX}/{path}"),
            path,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("hero shot (1).webp"), "hero_shot__1_.webp");
        assert_eq!(safe_name("a/../../b.png"), "a_.._.._b.png");
        assert_eq!(safe_name("ünïcode.jpg"), "_n_code.jpg");
        assert_eq!(safe_name(""), "file");
        assert_eq!(safe_name(".."), "file");
    }

    #[tokio::test]
    async fn test_save_product_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().to_path_buf());
        let id = ProductId::parse("detox-60").unwrap();

        let stored = store
            .save_product_file(&id, "label front.png", b"png-bytes")
            .await
            .unwrap();

        assert!(stored.path.starts_with("products/detox-60/"));
        assert!(stored.path.ends_with("-label_front.png"));
        assert_eq!(stored.url, format!("/media/{}", stored.path));

        let on_disk = tokio::fs::read(dir.path().join(&stored.path)).await.unwrap();
        assert_eq!(on_disk, b"png-bytes");
    }
}
