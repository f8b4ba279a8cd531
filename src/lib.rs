//! # mdtex
//!
//! Compile Markdown syntax trees (mdast) into LaTeX source.
//!
//! ## Features
//!
//! - Every common mdast node kind, plus math, footnotes and `details` blocks
//! - Footnotes collected into a numbered endnote list with backlinks
//! - Tables sized by an estimate of each column's display width
//! - Images fetched, converted to JPEG and cached for `\includegraphics`
//! - Load trees from remark's JSON output or parse Markdown directly
//!
//! ## Quick Start
//!
//! ```
//! use mdtex::ast::Node;
//! use mdtex::latex::RenderOptions;
//!
//! let tree = Node::root(vec![Node::paragraph(vec![Node::text("50% done")])]);
//! let latex = mdtex::compile(&tree, &RenderOptions::new("intro:"));
//!
//! assert_eq!(latex, "% Generated by mdtex\n\\label{sect:intro:}\n\\par 50\\% done\n");
//! ```
//!
//! ## Images
//!
//! [`compile`] drops images. To embed them, compile through a
//! [`Compiler`](latex::Compiler) with an [`ImageCache`](assets::ImageCache):
//!
//! ```no_run
//! use mdtex::assets::{AssetConfig, ImageCache};
//! use mdtex::latex::{Compiler, RenderOptions};
//! use mdtex::parse::MarkdownParser;
//!
//! let tree = MarkdownParser.parse("![plot](img/plot.png)");
//! let cache = ImageCache::new(AssetConfig::default());
//! let compiler = Compiler::new(
//!     RenderOptions::for_document("basic/sort.md"),
//!     &cache,
//!     &MarkdownParser,
//! );
//! let latex = compiler.compile(&tree);
//! ```

pub mod assets;
pub mod ast;
pub mod error;
pub mod latex;
pub mod parse;
pub mod util;

pub use ast::Node;
pub use error::{Error, Result};
pub use latex::{CompileStats, Compiler, RenderOptions};
pub use parse::{FragmentParser, MarkdownParser};

/// Compile a tree without images, parsing collapsible-block titles as Markdown.
pub fn compile(root: &Node, options: &RenderOptions) -> String {
    Compiler::new(options.clone(), &assets::NoAssets, &MarkdownParser).compile(root)
}
