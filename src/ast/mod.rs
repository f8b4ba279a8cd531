//! Syntax tree consumed by the compiler.
//!
//! The tree is mdast-shaped: [`Node`] is a closed sum type over the node
//! kinds remark produces with its math, footnote and details extensions.
//! Trees come from [`Node::from_json`] (remark's JSON output) or from
//! [`crate::parse::MarkdownParser`], and are never mutated by the compiler.

mod node;

pub use node::{Align, Node};

/// Visit `node` and all of its descendants in document order (pre-order).
pub fn walk<'a>(node: &'a Node, visit: &mut impl FnMut(&'a Node)) {
    visit(node);
    for child in node.children() {
        walk(child, visit);
    }
}

/// Like [`walk`], but skips the descendants of any node for which `visit`
/// returns `false`.
pub fn walk_pruned<'a>(node: &'a Node, visit: &mut impl FnMut(&'a Node) -> bool) {
    if visit(node) {
        for child in node.children() {
            walk_pruned(child, visit);
        }
    }
}

/// Concatenate the text values of a subtree, ignoring markup.
pub fn plain_text(node: &Node) -> String {
    let mut result = String::new();
    walk(node, &mut |n| {
        if let Some(value) = n.value() {
            result.push_str(value);
        }
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_order() {
        let tree = Node::root(vec![
            Node::paragraph(vec![Node::text("a"), Node::text("b")]),
            Node::text("c"),
        ]);
        let mut seen = Vec::new();
        walk(&tree, &mut |n| seen.push(n.kind().to_string()));
        assert_eq!(seen, ["root", "paragraph", "text", "text", "text"]);
    }

    #[test]
    fn test_walk_pruned_skips_subtree() {
        let tree = Node::root(vec![
            Node::paragraph(vec![Node::text("skipped")]),
            Node::text("kept"),
        ]);
        let mut seen = Vec::new();
        walk_pruned(&tree, &mut |n| {
            seen.push(n.kind().to_string());
            n.kind() != "paragraph"
        });
        assert_eq!(seen, ["root", "paragraph", "text"]);
    }

    #[test]
    fn test_plain_text() {
        let tree = Node::paragraph(vec![
            Node::text("one "),
            Node::Strong {
                children: vec![Node::text("two")],
            },
        ]);
        assert_eq!(plain_text(&tree), "one two");
    }
}
