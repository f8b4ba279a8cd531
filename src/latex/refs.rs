//! Forward-reference resolution (the collection pass).
//!
//! Before anything is rendered, one traversal of the tree gathers:
//!
//! - link definitions (`[id]: url`), last definition wins;
//! - footnote ordinals, assigned in the order definitions are first met;
//! - footnote use counts, counting every reference that will be rendered.
//!   References inside an ignored duplicate definition do not count.
//!
//! Footnote bodies are rendered afterwards, once every ordinal is known,
//! so a body may reference a footnote defined later in the document.

use std::collections::HashMap;

use log::warn;

use crate::ast::{Node, walk_pruned};

use super::escape::escape_latex;

/// A link definition target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDefinition {
    /// The URL as written in the document.
    pub url: String,
    /// The URL with LaTeX special characters escaped.
    pub escaped: String,
}

/// Link targets and footnote metadata for one document.
///
/// Immutable once the collection pass has finished.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    links: HashMap<String, LinkDefinition>,
    ordinals: HashMap<String, usize>,
    /// Footnote identifiers in ordinal order (index = ordinal - 1).
    identifiers: Vec<String>,
    /// Rendered footnote bodies in ordinal order.
    bodies: Vec<String>,
    use_counts: HashMap<String, usize>,
}

/// Output of [`ReferenceTable::collect`]: the table without footnote bodies
/// plus the definitions whose bodies still have to be rendered.
#[derive(Debug)]
pub struct Collection<'a> {
    pub table: ReferenceTable,
    /// Footnote definition children in ordinal order.
    pub pending: Vec<&'a [Node]>,
}

impl ReferenceTable {
    /// Run the collection pass over the whole tree.
    pub fn collect(root: &Node) -> Collection<'_> {
        let mut table = ReferenceTable::default();
        let mut pending = Vec::new();

        walk_pruned(root, &mut |node| {
            match node {
                Node::Definition { identifier, url } => {
                    table.links.insert(
                        identifier.clone(),
                        LinkDefinition {
                            url: url.clone(),
                            escaped: escape_latex(url),
                        },
                    );
                }
                Node::FootnoteDefinition {
                    identifier,
                    children,
                } => {
                    if table.ordinals.contains_key(identifier) {
                        warn!("footnote `{identifier}` is defined more than once; keeping the first");
                        // Its body is never rendered
                        return false;
                    }
                    table.identifiers.push(identifier.clone());
                    table
                        .ordinals
                        .insert(identifier.clone(), table.identifiers.len());
                    pending.push(children.as_slice());
                }
                Node::FootnoteReference { identifier } => {
                    *table.use_counts.entry(identifier.clone()).or_default() += 1;
                }
                _ => {}
            }
            true
        });

        Collection { table, pending }
    }

    /// Store rendered footnote bodies, in ordinal order.
    pub(crate) fn set_bodies(&mut self, bodies: Vec<String>) {
        debug_assert_eq!(bodies.len(), self.identifiers.len());
        self.bodies = bodies;
    }

    /// Look up a link definition.
    pub fn link(&self, identifier: &str) -> Option<&LinkDefinition> {
        self.links.get(identifier)
    }

    /// Ordinal (1-based) of a footnote.
    pub fn ordinal(&self, identifier: &str) -> Option<usize> {
        self.ordinals.get(identifier).copied()
    }

    /// Identifier of the footnote with the given ordinal.
    pub fn identifier(&self, ordinal: usize) -> Option<&str> {
        self.identifiers
            .get(ordinal.checked_sub(1)?)
            .map(String::as_str)
    }

    /// Rendered body of the footnote with the given ordinal.
    pub fn body(&self, ordinal: usize) -> Option<&str> {
        self.bodies.get(ordinal.checked_sub(1)?).map(String::as_str)
    }

    /// Number of rendered references to a footnote.
    pub fn use_count(&self, identifier: &str) -> usize {
        self.use_counts.get(identifier).copied().unwrap_or(0)
    }

    /// Number of defined footnotes.
    pub fn footnote_count(&self) -> usize {
        self.identifiers.len()
    }
}
