//! Display-width estimation for layout hints.
//!
//! Widths are only used to size table columns and wrap code listings, so a
//! coarse East Asian width classification is enough: wide characters count
//! as two columns, everything else as one.

use crate::ast::Node;

/// Whether `c` occupies two columns in a monospaced rendering.
pub fn is_wide(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x115F
            | 0x2E80..=0x303E
            | 0x3041..=0x33FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xA000..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x20000..=0x2FFFD
            | 0x30000..=0x3FFFD
    )
}

/// Width of a single character.
pub fn char_width(c: char) -> usize {
    if is_wide(c) { 2 } else { 1 }
}

/// Estimated width of a string.
pub fn text_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

/// Estimated width of a node: its own value plus all of its children.
pub fn estimated_width(node: &Node) -> usize {
    let own = node.value().map(text_width).unwrap_or(0);
    own + node.children().iter().map(estimated_width).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ascii_width() {
        assert_eq!(text_width("hello"), 5);
    }

    #[test]
    fn test_wide_width() {
        assert_eq!(text_width("中文"), 4);
        assert_eq!(text_width("한글"), 4);
        assert_eq!(text_width("ｆｕｌｌ"), 8);
        assert_eq!(text_width("a中"), 3);
    }

    #[test]
    fn test_node_width_sums_children() {
        let cell = Node::TableCell {
            children: vec![
                Node::text("ab"),
                Node::Strong {
                    children: vec![Node::text("中")],
                },
                Node::InlineCode {
                    value: "x".to_string(),
                },
            ],
        };
        assert_eq!(estimated_width(&cell), 5);
    }

    proptest! {
        #[test]
        fn prop_width_is_additive(a in "\\PC*", b in "\\PC*") {
            let joined = format!("{a}{b}");
            prop_assert_eq!(text_width(&joined), text_width(&a) + text_width(&b));

            let split = Node::paragraph(vec![Node::text(a.clone()), Node::text(b.clone())]);
            prop_assert_eq!(estimated_width(&split), estimated_width(&Node::text(joined)));
        }

        #[test]
        fn prop_each_char_is_one_or_two(c in any::<char>()) {
            let w = text_width(&c.to_string());
            prop_assert_eq!(w, if is_wide(c) { 2 } else { 1 });
        }
    }
}
