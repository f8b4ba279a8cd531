//! Whole-document compilation: collection pass, render pass, endnotes.

use std::fmt::Write as _;

use log::debug;

use crate::assets::AssetPipeline;
use crate::ast::Node;
use crate::parse::FragmentParser;

use super::refs::{Collection, ReferenceTable};
use super::render::{CompileStats, RenderOptions, Renderer, Scope};

/// Marker comment opening every generated document.
pub const HEADER: &str = "% Generated by mdtex\n";

/// Compiles syntax trees into complete LaTeX documents.
///
/// A compiler holds only configuration and collaborators; every call to
/// [`compile`](Self::compile) starts from fresh render state, so one
/// compiler can be reused for many documents with the same options.
pub struct Compiler<'a> {
    options: RenderOptions,
    assets: &'a dyn AssetPipeline,
    fragments: &'a dyn FragmentParser,
}

impl<'a> Compiler<'a> {
    pub fn new(
        options: RenderOptions,
        assets: &'a dyn AssetPipeline,
        fragments: &'a dyn FragmentParser,
    ) -> Self {
        Self {
            options,
            assets,
            fragments,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Compile a document tree.
    pub fn compile(&self, root: &Node) -> String {
        self.compile_with_stats(root).0
    }

    /// Compile a document tree, also reporting what went wrong on the way.
    pub fn compile_with_stats(&self, root: &Node) -> (String, CompileStats) {
        let Collection { mut table, pending } = ReferenceTable::collect(root);
        debug!(
            "collected {} footnote(s) for `{}`",
            table.footnote_count(),
            self.options.document_path
        );

        let mut renderer = Renderer::new(&table, &self.options, self.assets, self.fragments);
        let article = renderer.render(root, Scope::for_options(&self.options));
        // Bodies render after the main text so occurrence indices follow
        // reading order; they share the same counters.
        let bodies: Vec<String> = pending
            .iter()
            .map(|children| renderer.render_footnote_body(children))
            .collect();
        let (_, mut stats) = renderer.into_parts();
        table.set_bodies(bodies);
        stats.footnotes = table.footnote_count();

        let mut output = String::with_capacity(HEADER.len() + article.len());
        output.push_str(HEADER);
        output.push_str(&article);
        output.push_str(&endnotes(&table, &self.options.label_prefix));
        (output, stats)
    }
}

/// The numbered endnote list, empty when the document has no footnotes.
fn endnotes(table: &ReferenceTable, prefix: &str) -> String {
    if table.footnote_count() == 0 {
        return String::new();
    }

    let mut out = String::from("\n\\begin{enumerate}\n");
    for ordinal in 1..=table.footnote_count() {
        let identifier = table.identifier(ordinal).unwrap_or_default();
        let label = format!("{prefix}{identifier}");
        let uses = table.use_count(identifier);

        if uses == 1 {
            let _ = writeln!(
                out,
                "\\renewcommand{{\\labelenumi}}{{\\hyperref[endnoteref:{label}-1]{{[\\theenumi]}}}}"
            );
        } else {
            out.push_str("\\renewcommand{\\labelenumi}{[\\theenumi]}\n");
        }

        let _ = write!(
            out,
            "\\item\\label{{endnote:{label}}}{}",
            table.body(ordinal).unwrap_or_default()
        );
        if uses >= 2 {
            for k in 1..=uses {
                let _ = write!(out, " \\hyperref[endnoteref:{label}-{k}]{{[{ordinal}-{k}]}}");
            }
        }
        out.push('\n');
    }
    out.push_str("\\end{enumerate}\n");
    out
}
