//! Fetching remote image bytes.

use std::time::Duration;

use base64::Engine;
use percent_encoding::percent_decode_str;

use crate::error::{Error, Result};

/// Source of bytes for network locators.
///
/// Fetches are synchronous: the compile blocks until the call returns.
pub trait Fetch {
    /// Download the resource at `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP(S) fetcher.
#[cfg(feature = "http")]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    /// Create a fetcher without a timeout.
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    /// Create a fetcher whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let url = if url.starts_with("//") {
            format!("https:{url}")
        } else {
            url.to_string()
        };
        let fetch_error = |message: String| Error::Fetch {
            url: url.clone(),
            message,
        };

        let mut response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| fetch_error(e.to_string()))?;
        response
            .body_mut()
            .read_to_vec()
            .map_err(|e| fetch_error(e.to_string()))
    }
}

/// Fetcher used when network access is compiled out or disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

impl Fetch for OfflineFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        Err(Error::Fetch {
            url: url.to_string(),
            message: "network access is disabled".to_string(),
        })
    }
}

/// The fetcher an [`ImageCache`](super::ImageCache) uses unless told otherwise.
#[cfg(feature = "http")]
pub(crate) fn default_fetcher(timeout: Option<Duration>) -> Box<dyn Fetch> {
    Box::new(HttpFetcher::with_timeout(timeout))
}

#[cfg(not(feature = "http"))]
pub(crate) fn default_fetcher(_timeout: Option<Duration>) -> Box<dyn Fetch> {
    Box::new(OfflineFetcher)
}

/// A decoded `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Media type, lowercased (`image/png`), empty when absent.
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// File extension (with dot) matching the media type.
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/jpeg" | "image/jpg" => ".jpg",
            "image/png" => ".png",
            "image/gif" => ".gif",
            "image/webp" => ".webp",
            "image/svg+xml" => ".svg",
            _ => "",
        }
    }
}

/// Decode an RFC 2397 `data:` URL.
pub fn decode_data_url(url: &str) -> Result<DataUrl> {
    let invalid = || Error::InvalidDataUrl(truncate(url, 48));

    let trimmed = url.trim();
    let rest = trimmed
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .map(|_| &trimmed[5..])
        .ok_or_else(invalid)?;
    let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;

    let mut segments = header.split(';');
    let mime = segments.next().unwrap_or_default().trim().to_ascii_lowercase();
    let is_base64 = segments.any(|s| s.trim().eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|_| invalid())?
    } else {
        percent_decode_str(payload).collect()
    };

    Ok(DataUrl { mime, bytes })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
