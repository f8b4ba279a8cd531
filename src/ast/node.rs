//! The closed set of syntax tree node kinds.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::Result;

/// Column alignment of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "Option<String>")]
pub enum Align {
    Left,
    Center,
    Right,
    #[default]
    Unset,
}

impl From<Option<String>> for Align {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("left") => Align::Left,
            Some("center") => Align::Center,
            Some("right") => Align::Right,
            _ => Align::Unset,
        }
    }
}

/// One element of a parsed document.
///
/// Variants follow mdast naming. The `type` tags that differ from the
/// variant name are `break`, `yaml`, `html`, `math` and `details`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Root {
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    Paragraph {
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    Heading {
        depth: u8,
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    Text {
        value: String,
    },
    Emphasis {
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    Strong {
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    InlineCode {
        value: String,
    },
    Code {
        #[serde(default)]
        lang: Option<String>,
        value: String,
    },
    Delete {
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    List {
        #[serde(default)]
        ordered: bool,
        #[serde(default)]
        start: Option<u32>,
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    ListItem {
        #[serde(default)]
        checked: Option<bool>,
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    ThematicBreak,
    Blockquote {
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    #[serde(rename = "break")]
    LineBreak,
    #[serde(rename = "yaml")]
    FrontMatter {
        #[serde(default)]
        value: String,
    },
    #[serde(rename = "html")]
    RawInline {
        #[serde(default)]
        value: String,
    },
    Link {
        url: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    LinkReference {
        identifier: String,
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    Image {
        url: String,
        #[serde(default)]
        alt: Option<String>,
    },
    ImageReference {
        identifier: String,
        #[serde(default)]
        alt: Option<String>,
    },
    Table {
        #[serde(default)]
        align: Vec<Align>,
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    TableRow {
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    TableCell {
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    Footnote {
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    FootnoteReference {
        identifier: String,
    },
    Definition {
        identifier: String,
        url: String,
    },
    FootnoteDefinition {
        identifier: String,
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    InlineMath {
        value: String,
    },
    #[serde(rename = "math")]
    BlockMath {
        value: String,
    },
    #[serde(rename = "details")]
    CollapsibleBlock {
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default, deserialize_with = "children")]
        children: Vec<Node>,
    },
    /// A node whose kind is not part of the dispatch set.
    #[serde(skip)]
    Unsupported { kind: String, data: Value },
}

/// `type` tags accepted by the derived deserializer.
const KNOWN_KINDS: &[&str] = &[
    "root",
    "paragraph",
    "heading",
    "text",
    "emphasis",
    "strong",
    "inlineCode",
    "code",
    "delete",
    "list",
    "listItem",
    "thematicBreak",
    "blockquote",
    "break",
    "yaml",
    "html",
    "link",
    "linkReference",
    "image",
    "imageReference",
    "table",
    "tableRow",
    "tableCell",
    "footnote",
    "footnoteReference",
    "definition",
    "footnoteDefinition",
    "inlineMath",
    "math",
    "details",
];

fn children<'de, D>(deserializer: D) -> std::result::Result<Vec<Node>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Value>::deserialize(deserializer)?
        .into_iter()
        .map(|value| Node::from_value(value).map_err(D::Error::custom))
        .collect()
}

impl Node {
    /// Parse an mdast JSON document.
    ///
    /// Unknown node kinds anywhere in the tree load as
    /// [`Node::Unsupported`]; malformed known kinds are an error.
    pub fn from_json(source: &str) -> Result<Node> {
        let value: Value = serde_json::from_str(source)?;
        Ok(Node::from_value(value)?)
    }

    /// Convert an already-parsed JSON value into a node.
    pub fn from_value(value: Value) -> serde_json::Result<Node> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if KNOWN_KINDS.contains(&kind.as_str()) {
            serde_json::from_value(value)
        } else {
            Ok(Node::Unsupported { kind, data: value })
        }
    }

    /// Create a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    /// Create a paragraph holding the given children.
    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Paragraph { children }
    }

    /// Create a document root holding the given children.
    pub fn root(children: Vec<Node>) -> Self {
        Node::Root { children }
    }

    /// The mdast `type` tag of this node.
    pub fn kind(&self) -> &str {
        match self {
            Node::Root { .. } => "root",
            Node::Paragraph { .. } => "paragraph",
            Node::Heading { .. } => "heading",
            Node::Text { .. } => "text",
            Node::Emphasis { .. } => "emphasis",
            Node::Strong { .. } => "strong",
            Node::InlineCode { .. } => "inlineCode",
            Node::Code { .. } => "code",
            Node::Delete { .. } => "delete",
            Node::List { .. } => "list",
            Node::ListItem { .. } => "listItem",
            Node::ThematicBreak => "thematicBreak",
            Node::Blockquote { .. } => "blockquote",
            Node::LineBreak => "break",
            Node::FrontMatter { .. } => "yaml",
            Node::RawInline { .. } => "html",
            Node::Link { .. } => "link",
            Node::LinkReference { .. } => "linkReference",
            Node::Image { .. } => "image",
            Node::ImageReference { .. } => "imageReference",
            Node::Table { .. } => "table",
            Node::TableRow { .. } => "tableRow",
            Node::TableCell { .. } => "tableCell",
            Node::Footnote { .. } => "footnote",
            Node::FootnoteReference { .. } => "footnoteReference",
            Node::Definition { .. } => "definition",
            Node::FootnoteDefinition { .. } => "footnoteDefinition",
            Node::InlineMath { .. } => "inlineMath",
            Node::BlockMath { .. } => "math",
            Node::CollapsibleBlock { .. } => "details",
            Node::Unsupported { kind, .. } => kind.as_str(),
        }
    }

    /// Child nodes, empty for leaf kinds.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Root { children }
            | Node::Paragraph { children }
            | Node::Heading { children, .. }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Delete { children }
            | Node::List { children, .. }
            | Node::ListItem { children, .. }
            | Node::Blockquote { children }
            | Node::Link { children, .. }
            | Node::LinkReference { children, .. }
            | Node::Table { children, .. }
            | Node::TableRow { children }
            | Node::TableCell { children }
            | Node::Footnote { children }
            | Node::FootnoteDefinition { children, .. }
            | Node::CollapsibleBlock { children, .. } => children,
            _ => &[],
        }
    }

    /// The literal `value` carried by leaf kinds.
    pub fn value(&self) -> Option<&str> {
        match self {
            Node::Text { value }
            | Node::InlineCode { value }
            | Node::Code { value, .. }
            | Node::FrontMatter { value }
            | Node::RawInline { value }
            | Node::InlineMath { value }
            | Node::BlockMath { value } => Some(value),
            _ => None,
        }
    }
}
