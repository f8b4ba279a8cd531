//! Locator classification and document-relative path handling.
//!
//! Documents are addressed by their path relative to the project root
//! (`basic/sort.md`). Anchor labels and cached asset names are both derived
//! from such paths so that several compiled documents can share one LaTeX
//! project without collisions.

use std::path::{Component, Path};

use percent_encoding::percent_decode_str;

/// Whether the locator points at a network resource.
pub fn is_url(locator: &str) -> bool {
    let lower = locator.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

/// Whether the locator is an inline `data:` URL.
pub fn is_data_url(locator: &str) -> bool {
    locator.trim_start().get(..5).is_some_and(|s| s.eq_ignore_ascii_case("data:"))
}

/// Whether the locator starts with a URI scheme (`https:`, `mailto:`, ...).
fn has_scheme(locator: &str) -> bool {
    let Some((scheme, _)) = locator.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Whether a link target refers to a section of this document set.
///
/// Anything without a scheme that is not protocol-relative is internal:
/// `../dp/knapsack.md`, `#usage`, `intro.md#setup`.
pub fn is_internal_link(locator: &str) -> bool {
    let locator = locator.trim();
    !has_scheme(locator) && !locator.starts_with("//")
}

/// Resolve a document-relative locator against the current document path.
///
/// The fragment and query are dropped and percent-escapes decoded. A bare
/// fragment resolves to the document itself.
///
/// # Examples
///
/// ```
/// use mdtex::latex::join_relative;
///
/// assert_eq!(join_relative("../dp/knapsack.md", "basic/sort.md"), "dp/knapsack.md");
/// assert_eq!(join_relative("images/a%20b.png", "basic/sort.md"), "basic/images/a b.png");
/// assert_eq!(join_relative("#usage", "basic/sort.md"), "basic/sort.md");
/// assert_eq!(join_relative("/index.md", "basic/sort.md"), "index.md");
/// ```
pub fn join_relative(locator: &str, document_path: &str) -> String {
    let locator = locator.trim();
    let end = locator.find(['#', '?']).unwrap_or(locator.len());
    let path_part = &locator[..end];

    if path_part.is_empty() {
        return normalize(Path::new(document_path), Vec::new());
    }

    let decoded = percent_decode_str(path_part).decode_utf8_lossy();
    let rel_path = Path::new(decoded.as_ref());

    // Absolute paths are rooted at the project root
    if rel_path.has_root() {
        return normalize(rel_path, Vec::new());
    }

    let base = Path::new(document_path).parent().unwrap_or(Path::new(""));
    let stack = normalize_components(base, Vec::new());
    normalize(rel_path, stack)
}

fn normalize(path: &Path, stack: Vec<String>) -> String {
    normalize_components(path, stack).join("/")
}

fn normalize_components(path: &Path, mut stack: Vec<String>) -> Vec<String> {
    for component in path.components() {
        match component {
            Component::ParentDir => {
                stack.pop();
            }
            Component::Normal(c) => stack.push(c.to_string_lossy().into_owned()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    stack
}

/// Path segments with the extension of the last one removed.
fn stem_segments(path: &str) -> Vec<String> {
    let mut segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(sanitize)
        .collect();
    if let Some(last) = segments.last_mut()
        && let Some(dot) = last.rfind('.')
        && dot > 0
    {
        last.truncate(dot);
    }
    segments
}

fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Anchor label for a document path: `basic/sort.md` becomes `basic:sort:`.
///
/// Labels end with a separator so a footnote identifier can be appended
/// directly.
pub fn label_for_path(path: &str) -> String {
    stem_segments(path)
        .iter()
        .map(|s| format!("{s}:"))
        .collect()
}

/// File-system-safe stem for a path: `basic/img/a.png` becomes `basic-img-a`.
pub fn stem_for_path(path: &str) -> String {
    stem_segments(path).join("-")
}
