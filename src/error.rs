//! Error types for mdtex operations.

use thiserror::Error;

/// Errors that can occur while loading a syntax tree or resolving assets.
///
/// The render path itself never fails: these errors surface from
/// [`Node::from_json`](crate::ast::Node::from_json) and from the asset
/// pipeline, where the renderer catches them and emits an empty fragment.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("image conversion error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("unsupported image source: {0}")]
    UnsupportedSource(String),
}

pub type Result<T> = std::result::Result<T, Error>;
