//! Pure LaTeX generation from syntax trees.
//!
//! This module turns a [`Node`](crate::ast::Node) tree into LaTeX source.
//! The pieces, leaves first:
//!
//! - [`escape`]: string transformations for LaTeX special characters
//! - [`metrics`]: display-width estimates used to size table columns
//! - [`location`]: URL classification, relative paths, labels and stems
//! - [`refs`]: the collection pass building the [`ReferenceTable`]
//! - [`render`]: the recursive node renderer
//! - [`assemble`]: the [`Compiler`] tying both passes together
//!
//! Image I/O lives in [`crate::assets`] behind the
//! [`AssetPipeline`](crate::assets::AssetPipeline) trait, so everything
//! here is deterministic given its collaborators.
//!
//! ## Design Notes
//!
//! - **Two passes**: link definitions and footnotes may appear anywhere, so
//!   they are collected before rendering. Footnote ordinals follow the order
//!   of definitions, not of references.
//! - **Endnotes**: footnote definitions render as a numbered list at the end
//!   of the document. Every reference gets its own anchor
//!   (`endnoteref:<label><id>-<k>`) and footnotes referenced more than once
//!   carry one backlink per reference.
//! - **Explicit state**: the only mutable state, the per-footnote occurrence
//!   counters, lives in a [`RenderState`] owned by one compile.
//! - **Line breaks**: inside table cells and link text a newline becomes
//!   `\newline` instead of a paragraph break.

mod assemble;
mod escape;
mod location;
mod metrics;
mod refs;
mod render;

pub use assemble::{Compiler, HEADER};
pub use escape::{
    FORCED_BREAK, PARAGRAPH_START, escape_latex, escape_text_commands, force_linebreaks,
    strip_paragraph_start, trailing_line_feed,
};
pub use location::{
    is_data_url, is_internal_link, is_url, join_relative, label_for_path, stem_for_path,
};
pub use metrics::{char_width, estimated_width, is_wide, text_width};
pub use refs::{Collection, LinkDefinition, ReferenceTable};
pub use render::{CompileStats, RenderOptions, RenderState, Renderer, Scope};
