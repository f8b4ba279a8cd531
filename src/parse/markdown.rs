//! Markdown → syntax tree via comrak.
//!
//! Pipeline: Markdown string → comrak AST → [`Node`] tree.
//!
//! comrak resolves reference-style links while parsing, so its trees never
//! contain `linkReference` or `definition` nodes. Footnotes, tables, task
//! lists, strikethrough, `$` math and `---` front matter are enabled.

use comrak::nodes::{AstNode, ListType, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};
use serde_json::Value;

use crate::ast::{Align, Node, plain_text};

use super::FragmentParser;

/// comrak-backed Markdown parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownParser;

impl MarkdownParser {
    /// Parse a whole Markdown document.
    pub fn parse(&self, source: &str) -> Node {
        let arena = Arena::new();
        let options = comrak_options();
        let root = parse_document(&arena, source, &options);
        convert(root)
    }
}

impl FragmentParser for MarkdownParser {
    fn parse_fragment(&self, source: &str) -> Node {
        self.parse(source)
    }
}

fn comrak_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.math_dollars = true;
    options.extension.front_matter_delimiter = Some("---".to_string());
    options
}

fn convert_children<'a>(node: &'a AstNode<'a>) -> Vec<Node> {
    node.children().map(convert).collect()
}

fn convert<'a>(node: &'a AstNode<'a>) -> Node {
    let data = node.data.borrow();

    match &data.value {
        NodeValue::Document => Node::Root {
            children: convert_children(node),
        },

        NodeValue::FrontMatter(raw) => Node::FrontMatter {
            value: strip_front_matter_fences(raw),
        },

        NodeValue::Paragraph => {
            let mut children = convert_children(node);
            // A paragraph holding only `$$...$$` is display math
            if matches!(children.as_slice(), [Node::BlockMath { .. }]) {
                children.swap_remove(0)
            } else {
                Node::Paragraph { children }
            }
        }

        NodeValue::Heading(heading) => Node::Heading {
            depth: heading.level,
            children: convert_children(node),
        },

        NodeValue::BlockQuote => Node::Blockquote {
            children: convert_children(node),
        },

        NodeValue::List(list) => {
            let ordered = matches!(list.list_type, ListType::Ordered);
            Node::List {
                ordered,
                start: ordered.then(|| u32::try_from(list.start).unwrap_or(u32::MAX)),
                children: convert_children(node),
            }
        }

        NodeValue::Item(_) => Node::ListItem {
            checked: None,
            children: convert_children(node),
        },

        NodeValue::TaskItem(symbol) => Node::ListItem {
            checked: Some(symbol.is_some()),
            children: convert_children(node),
        },

        NodeValue::CodeBlock(block) => Node::Code {
            lang: block.info.split_whitespace().next().map(str::to_string),
            value: block
                .literal
                .strip_suffix('\n')
                .unwrap_or(block.literal.as_str())
                .to_string(),
        },

        NodeValue::HtmlBlock(html) => Node::RawInline {
            value: html.literal.clone(),
        },

        NodeValue::ThematicBreak => Node::ThematicBreak,

        NodeValue::FootnoteDefinition(definition) => Node::FootnoteDefinition {
            identifier: definition.name.to_lowercase(),
            children: convert_children(node),
        },

        NodeValue::Table(table) => Node::Table {
            align: table.alignments.iter().map(align).collect(),
            children: convert_children(node),
        },

        NodeValue::TableRow(_) => Node::TableRow {
            children: convert_children(node),
        },

        NodeValue::TableCell => Node::TableCell {
            children: convert_children(node),
        },

        NodeValue::Text(text) => Node::text(text.clone()),

        NodeValue::SoftBreak => Node::text("\n"),

        NodeValue::LineBreak => Node::LineBreak,

        NodeValue::Code(code) => Node::InlineCode {
            value: code.literal.clone(),
        },

        NodeValue::HtmlInline(html) => Node::RawInline {
            value: html.clone(),
        },

        NodeValue::Emph => Node::Emphasis {
            children: convert_children(node),
        },

        NodeValue::Strong => Node::Strong {
            children: convert_children(node),
        },

        NodeValue::Strikethrough => Node::Delete {
            children: convert_children(node),
        },

        NodeValue::Link(link) => Node::Link {
            url: link.url.clone(),
            title: (!link.title.is_empty()).then(|| link.title.clone()),
            children: convert_children(node),
        },

        NodeValue::Image(link) => {
            let alt: String = convert_children(node).iter().map(plain_text).collect();
            Node::Image {
                url: link.url.clone(),
                alt: (!alt.is_empty()).then_some(alt),
            }
        }

        NodeValue::FootnoteReference(reference) => Node::FootnoteReference {
            identifier: reference.name.to_lowercase(),
        },

        NodeValue::Math(math) if math.display_math => Node::BlockMath {
            value: math.literal.trim().to_string(),
        },

        NodeValue::Math(math) => Node::InlineMath {
            value: math.literal.clone(),
        },

        other => {
            let debug = format!("{other:?}");
            let kind = debug
                .split(|c: char| !c.is_alphanumeric())
                .next()
                .unwrap_or_default()
                .to_string();
            Node::Unsupported {
                kind,
                data: Value::String(debug),
            }
        }
    }
}

fn align(alignment: &TableAlignment) -> Align {
    match alignment {
        TableAlignment::Left => Align::Left,
        TableAlignment::Center => Align::Center,
        TableAlignment::Right => Align::Right,
        TableAlignment::None => Align::Unset,
    }
}

/// Front matter as comrak reports it still carries its `---` fences.
fn strip_front_matter_fences(raw: &str) -> String {
    raw.lines()
        .filter(|line| line.trim_end() != "---")
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
