//! Embedded image pipeline.
//!
//! Images referenced by a document are resolved to files in a cache
//! directory, in the format the LaTeX project embeds (JPEG):
//!
//! 1. **Locate**: network URLs are downloaded into the cache, `data:` URLs
//!    are decoded into it, anything else is a path relative to the document.
//! 2. **Normalize**: JPEG sources are copied as-is; every other format is
//!    converted, flattening transparency onto white.
//! 3. **Name**: the cached file's stem is returned for `\includegraphics`.
//!
//! Every step is skipped when its destination already exists, so re-running
//! a compile never re-fetches or re-converts. The cache may be deleted or
//! pre-populated between runs.
//!
//! The renderer only sees the [`AssetPipeline`] trait; [`ImageCache`] is
//! the synchronous implementation and [`NoAssets`] disables images.

mod convert;
mod fetch;

pub use convert::{Convert, RasterConverter, flatten_onto_white};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use fetch::{DataUrl, Fetch, OfflineFetcher, decode_data_url};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

use crate::error::{Error, Result};
use crate::latex::{is_data_url, is_url, join_relative, stem_for_path};

/// Extension of every cached embed file.
pub const TARGET_EXTENSION: &str = "jpg";

/// Resolves image locators to embeddable file stems.
pub trait AssetPipeline {
    /// Make the image at `url` available in the cache and return the stem
    /// to embed. `document_path` is the referencing document's path, used
    /// to resolve relative locators and to namespace cache entries.
    fn resolve_image(&self, url: &str, document_path: &str) -> Result<String>;
}

/// Pipeline that refuses every image.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetPipeline for NoAssets {
    fn resolve_image(&self, url: &str, _document_path: &str) -> Result<String> {
        Err(Error::UnsupportedSource(format!(
            "images are disabled ({url})"
        )))
    }
}

/// Configuration for the image cache.
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Directory that document-relative paths are resolved against.
    pub base_dir: PathBuf,
    /// Directory holding fetched and converted files.
    pub cache_dir: PathBuf,
    /// Give up on network fetches after this long.
    pub timeout: Option<Duration>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            cache_dir: PathBuf::from("images"),
            timeout: None,
        }
    }
}

/// Where the bytes of an image come from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source<'a> {
    Remote(&'a str),
    Inline(&'a str),
    Local(String),
}

fn classify<'a>(url: &'a str, document_path: &str) -> Source<'a> {
    if is_url(url) {
        Source::Remote(url.trim())
    } else if is_data_url(url) {
        Source::Inline(url.trim())
    } else {
        Source::Local(join_relative(url, document_path))
    }
}

/// Split the last path segment of `path` into `(name, ".ext")`.
fn split_extension(path: &str) -> (&str, &str) {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    }
}

/// Host and path of a network URL, without scheme, query and fragment.
fn url_host_and_path(url: &str) -> (&str, &str) {
    let without_scheme = url
        .split_once("//")
        .map(|(_, rest)| rest)
        .unwrap_or(url);
    let end = without_scheme.find(['?', '#']).unwrap_or(without_scheme.len());
    let trimmed = &without_scheme[..end];
    trimmed.split_once('/').unwrap_or((trimmed, ""))
}

fn sha1_hex(text: &str) -> String {
    sha1_smol::Sha1::from(text).digest().to_string()
}

fn is_jpeg_extension(ext: &str) -> bool {
    ext.eq_ignore_ascii_case(".jpg") || ext.eq_ignore_ascii_case(".jpeg")
}

/// Synchronous, file-backed image cache.
pub struct ImageCache {
    config: AssetConfig,
    fetcher: Box<dyn Fetch>,
    converter: Box<dyn Convert>,
}

impl ImageCache {
    /// Create a cache using the default fetcher and [`RasterConverter`].
    pub fn new(config: AssetConfig) -> Self {
        let fetcher = fetch::default_fetcher(config.timeout);
        Self {
            config,
            fetcher,
            converter: Box::new(RasterConverter),
        }
    }

    /// Replace the network fetcher.
    pub fn with_fetcher(mut self, fetcher: impl Fetch + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    /// Replace the image converter.
    pub fn with_converter(mut self, converter: impl Convert + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    /// The cache configuration.
    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    fn ensure_cache_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.config.cache_dir)?;
        Ok(())
    }

    /// Download a network image into the cache.
    ///
    /// Returns the working copy's path, its stem and its extension.
    fn fetch_remote(&self, url: &str, document_path: &str) -> Result<(PathBuf, String, String)> {
        let (host, path) = url_host_and_path(url);
        let (name, ext) = split_extension(path);
        let name = if name.is_empty() {
            sha1_hex(url)
        } else {
            name.to_string()
        };
        let doc_dir = Path::new(document_path)
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        // The placeholder extension keeps dots inside `name` intact.
        let stem = stem_for_path(&format!("{doc_dir}/{host}/{name}.x"));

        let working = self.config.cache_dir.join(format!("{stem}{ext}"));
        if working.exists() {
            debug!("cache hit for {url}");
        } else {
            debug!("fetching {url}");
            let bytes = self.fetcher.fetch(url)?;
            self.ensure_cache_dir()?;
            fs::write(&working, bytes)?;
        }
        Ok((working, stem, ext.to_string()))
    }

    /// Decode an inline image into the cache.
    fn decode_inline(&self, url: &str) -> Result<(PathBuf, String, String)> {
        let stem = format!("data-{}", &sha1_hex(url)[..16]);
        let data = decode_data_url(url)?;
        let ext = data.extension();
        let working = self.config.cache_dir.join(format!("{stem}{ext}"));
        if !working.exists() {
            self.ensure_cache_dir()?;
            fs::write(&working, &data.bytes)?;
        }
        Ok((working, stem, ext.to_string()))
    }
}

impl AssetPipeline for ImageCache {
    fn resolve_image(&self, url: &str, document_path: &str) -> Result<String> {
        if url.trim().is_empty() {
            return Err(Error::UnsupportedSource("empty image locator".to_string()));
        }

        let (working, stem, ext) = match classify(url, document_path) {
            Source::Remote(url) => self.fetch_remote(url, document_path)?,
            Source::Inline(url) => self.decode_inline(url)?,
            Source::Local(path) => {
                let (_, ext) = split_extension(&path);
                let ext = ext.to_string();
                (self.config.base_dir.join(&path), stem_for_path(&path), ext)
            }
        };

        let dest = self
            .config
            .cache_dir
            .join(format!("{stem}.{TARGET_EXTENSION}"));
        if dest.exists() {
            debug!("{} already cached", dest.display());
            return Ok(stem);
        }

        self.ensure_cache_dir()?;
        if is_jpeg_extension(&ext) {
            fs::copy(&working, &dest)?;
        } else {
            debug!("converting {} to {}", working.display(), dest.display());
            self.converter.convert(&working, &dest)?;
        }
        Ok(stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            classify("https://x.org/a.png", "doc.md"),
            Source::Remote("https://x.org/a.png")
        );
        assert_eq!(
            classify("data:image/png;base64,AA==", "doc.md"),
            Source::Inline("data:image/png;base64,AA==")
        );
        assert_eq!(
            classify("img/a.png", "basic/doc.md"),
            Source::Local("basic/img/a.png".to_string())
        );
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("dir/a.png"), ("a", ".png"));
        assert_eq!(split_extension("a.tar.gz"), ("a.tar", ".gz"));
        assert_eq!(split_extension("dir/noext"), ("noext", ""));
        assert_eq!(split_extension(""), ("", ""));
    }

    #[test]
    fn test_url_host_and_path() {
        assert_eq!(
            url_host_and_path("https://cdn.example.com/img/a.png?v=2"),
            ("cdn.example.com", "img/a.png")
        );
        assert_eq!(url_host_and_path("//example.com"), ("example.com", ""));
    }

    #[test]
    fn test_no_assets_always_fails() {
        assert!(NoAssets.resolve_image("a.png", "doc.md").is_err());
    }

    #[test]
    fn test_empty_local_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(AssetConfig {
            base_dir: dir.path().to_path_buf(),
            cache_dir: dir.path().join("images"),
            timeout: None,
        });
        assert!(cache.resolve_image("", "doc.md").is_err());
        assert!(cache.resolve_image("  ", "doc.md").is_err());
    }
}
