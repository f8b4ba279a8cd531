//! Markdown front end.
//!
//! The compiler consumes [`Node`] trees and normally gets them from remark's
//! mdast JSON. This module parses Markdown source directly, which the
//! compiler needs for collapsible-block titles and the CLI uses for `.md`
//! inputs.

mod markdown;

pub use markdown::MarkdownParser;

use crate::ast::Node;

/// Parses a standalone Markdown fragment into a syntax tree.
///
/// The returned node is always a [`Node::Root`]. Parsing never fails:
/// anything that is not recognised markup is text.
pub trait FragmentParser {
    fn parse_fragment(&self, source: &str) -> Node;
}
