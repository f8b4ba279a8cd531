//! Core syntax tree → LaTeX rendering.
//!
//! Rendering is a recursive walk that returns one fragment per node. The
//! [`Renderer`] borrows the resolved references and the collaborators it
//! needs (image pipeline, fragment parser) and owns the per-compile
//! [`RenderState`]. Context that changes during descent (`nested`, forced
//! line breaks) travels by value in a [`Scope`].

use log::warn;
use memchr::memmem;

use crate::assets::AssetPipeline;
use crate::ast::{Align, Node, plain_text};
use crate::parse::FragmentParser;

use super::escape::{
    FORCED_BREAK, escape_latex, escape_text_commands, force_linebreaks, strip_paragraph_start,
    trailing_line_feed,
};
use super::location::{is_data_url, is_internal_link, is_url, join_relative, label_for_path};
use super::metrics::{char_width, estimated_width};
use super::refs::ReferenceTable;

/// Sectioning commands from outermost to innermost.
const SECTION_COMMANDS: [&str; 6] = [
    "chapter",
    "section",
    "subsection",
    "subsubsection",
    "paragraph",
    "subparagraph",
];

/// Widest column weight a table column can get.
const MAX_COLUMN_WIDTH: usize = 60;

/// Code listings are hard-wrapped at this many columns.
const CODE_LINE_LIMIT: usize = 80;

/// Spacing inserted between table body rows.
const ROW_SEPARATOR: &str = "\\specialrule{0em}{0.4em}{0.4em}";

/// Inline math containing one of these is emitted without `$` delimiters.
const INLINE_UNWRAPPED: &[&str] = &["\\LaTeX", "\\TeX"];

/// Block math containing one of these already opens its own environment.
const BLOCK_UNWRAPPED: &[&str] = &[
    "{equation}",
    "{equation*}",
    "{align}",
    "{align*}",
    "{eqnarray}",
    "{eqnarray*}",
];

/// Configuration for one compile.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Namespace for every generated anchor.
    pub label_prefix: String,
    /// Path of the document relative to the project root.
    pub document_path: String,
    /// Added to every heading level.
    pub heading_offset: usize,
    /// Render as an embedded sub-document (no top-level anchor).
    pub nested: bool,
}

impl RenderOptions {
    /// Options with the given anchor prefix and defaults otherwise.
    pub fn new(label_prefix: impl Into<String>) -> Self {
        Self {
            label_prefix: label_prefix.into(),
            ..Self::default()
        }
    }

    /// Options for the document at `path`, labelled after its path.
    pub fn for_document(path: impl Into<String>) -> Self {
        let document_path = path.into();
        Self {
            label_prefix: label_for_path(&document_path),
            document_path,
            ..Self::default()
        }
    }

    pub fn with_document_path(mut self, path: impl Into<String>) -> Self {
        self.document_path = path.into();
        self
    }

    pub fn with_heading_offset(mut self, offset: usize) -> Self {
        self.heading_offset = offset;
        self
    }

    pub fn with_nested(mut self, nested: bool) -> Self {
        self.nested = nested;
        self
    }
}

/// Rendering context that changes during descent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scope {
    /// Suppress the document anchor of a root node.
    pub nested: bool,
    /// Turn literal newlines into forced line breaks.
    pub force_linebreak: bool,
}

impl Scope {
    /// The scope a document root starts in.
    pub fn for_options(options: &RenderOptions) -> Self {
        Self {
            nested: options.nested,
            force_linebreak: false,
        }
    }

    fn forced(self) -> Self {
        Self {
            force_linebreak: true,
            ..self
        }
    }
}

/// Mutable state of one compile: per-footnote occurrence counters.
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    /// Occurrences rendered so far, indexed by ordinal - 1.
    occurrences: Vec<usize>,
}

impl RenderState {
    /// Record one more occurrence of a footnote and return its 1-based index.
    pub fn next_occurrence(&mut self, ordinal: usize) -> usize {
        let slot = ordinal.saturating_sub(1);
        if self.occurrences.len() <= slot {
            self.occurrences.resize(slot + 1, 0);
        }
        self.occurrences[slot] += 1;
        self.occurrences[slot]
    }

    /// Number of occurrences of a footnote rendered so far.
    pub fn occurrences(&self, ordinal: usize) -> usize {
        ordinal
            .checked_sub(1)
            .and_then(|slot| self.occurrences.get(slot))
            .copied()
            .unwrap_or(0)
    }
}

/// Counters describing recoverable problems met during a compile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    /// Footnotes in the endnote list.
    pub footnotes: usize,
    /// Images that could not be resolved.
    pub failed_images: usize,
    /// Nodes of unsupported kinds.
    pub unsupported_nodes: usize,
    /// References to undefined footnotes.
    pub dangling_footnotes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Callout {
    Note,
    Warning,
}

impl Callout {
    fn from_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("warning") => Callout::Warning,
            _ => Callout::Note,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Callout::Note => "Note",
            Callout::Warning => "Warning",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Callout::Note => "info-blue",
            Callout::Warning => "warning-orange",
        }
    }
}

/// Recursive node renderer.
pub struct Renderer<'a> {
    refs: &'a ReferenceTable,
    options: &'a RenderOptions,
    assets: &'a dyn AssetPipeline,
    fragments: &'a dyn FragmentParser,
    state: RenderState,
    stats: CompileStats,
}

impl<'a> Renderer<'a> {
    /// Create a renderer with fresh state.
    pub fn new(
        refs: &'a ReferenceTable,
        options: &'a RenderOptions,
        assets: &'a dyn AssetPipeline,
        fragments: &'a dyn FragmentParser,
    ) -> Self {
        Self {
            refs,
            options,
            assets,
            fragments,
            state: RenderState::default(),
            stats: CompileStats::default(),
        }
    }

    /// Give back the state and counters.
    pub fn into_parts(self) -> (RenderState, CompileStats) {
        (self.state, self.stats)
    }

    /// The occurrence counters so far.
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Render the body of a footnote definition for the endnote list.
    ///
    /// The leading paragraph marker is removed so the body can follow the
    /// item label directly.
    pub fn render_footnote_body(&mut self, children: &[Node]) -> String {
        let scope = Scope::for_options(self.options);
        let body = self.render_children(children, scope);
        strip_paragraph_start(&body).trim().to_string()
    }

    /// Render one node.
    pub fn render(&mut self, node: &Node, scope: Scope) -> String {
        match node {
            Node::Root { children } => {
                let parts: Vec<String> = children.iter().map(|c| self.render(c, scope)).collect();
                let article = trailing_line_feed(&parts.join("\n"));
                if scope.nested {
                    article
                } else {
                    format!("\\label{{sect:{}}}\n{article}", self.options.label_prefix)
                }
            }

            Node::Paragraph { children } => {
                format!("\\par {}", self.render_children(children, scope))
            }

            Node::Heading { depth, children } => {
                let level = (usize::from(*depth).max(2) - 2)
                    .saturating_add(self.options.heading_offset)
                    .min(5);
                format!(
                    "\\{}*{{{}}}",
                    SECTION_COMMANDS[level],
                    self.render_children(children, scope)
                )
            }

            Node::Text { value } => {
                let escaped = escape_latex(value);
                if scope.force_linebreak {
                    force_linebreaks(&escaped)
                } else {
                    escaped
                }
            }

            Node::Emphasis { children } => {
                format!("\\emph{{{}}}", self.render_children(children, scope))
            }

            Node::Strong { children } => {
                format!("{{\\bfseries {}}}", self.render_children(children, scope))
            }

            Node::InlineCode { value } => {
                format!("\\hytt{{{}}}", force_linebreaks(&escape_latex(value)))
            }

            Node::Code { lang, value } => code_block(lang.as_deref(), value),

            Node::Delete { children } => strike_through(children),

            Node::List {
                ordered,
                start,
                children,
            } => {
                let env = if *ordered { "enumerate" } else { "itemize" };
                let reset = match start {
                    Some(start) if *ordered && *start != 1 => {
                        format!("\n\\setcounter{{enumi}}{{{}}}", i64::from(*start) - 1)
                    }
                    _ => String::new(),
                };
                format!(
                    "\\begin{{{env}}}{reset}\n{}\\end{{{env}}}",
                    self.render_children(children, scope)
                )
            }

            Node::ListItem { checked, children } => {
                let body = self.render_children(children, scope);
                let body = strip_paragraph_start(&body);
                match checked {
                    None => format!("\\item {body}\n"),
                    // Checklists render through the todolist package; the
                    // output has not been verified to compile.
                    Some(done) => format!(
                        "\\begin{{todolist}}\n\\item {} {body}\n\\end{{todolist}}\n",
                        if *done { "[\\done]" } else { "" }
                    ),
                }
            }

            Node::ThematicBreak => "\\vskip 0.5em".to_string(),

            Node::Blockquote { children } => format!(
                "\\begin{{quotation}}\n{}\\end{{quotation}}",
                self.render_children(children, scope)
            ),

            Node::LineBreak => {
                if scope.force_linebreak {
                    FORCED_BREAK.to_string()
                } else {
                    "\n\n".to_string()
                }
            }

            Node::FrontMatter { .. } | Node::RawInline { .. } => String::new(),

            Node::Link { url, children, .. } => {
                let escaped = escape_latex(url.trim());
                self.link(url, &escaped, children, scope)
            }

            Node::LinkReference {
                identifier,
                children,
            } => match self.refs.link(identifier) {
                Some(def) => self.link(&def.url, &def.escaped, children, scope),
                None => String::new(),
            },

            Node::Image { url, alt } => self.image(url, alt.as_deref()),

            Node::ImageReference { identifier, alt } => match self.refs.link(identifier) {
                Some(def) => self.image(&def.url, alt.as_deref()),
                None => String::new(),
            },

            Node::Table { align, children } => self.table(align, children, scope),

            Node::TableRow { children } => self.table_row(children, scope),

            Node::TableCell { children } => self.render_children(children, scope.forced()),

            Node::Footnote { children } => {
                format!("\\footnote{{{}}}", self.render_children(children, scope))
            }

            Node::FootnoteReference { identifier } => self.footnote_reference(identifier),

            // Consumed by the collection pass.
            Node::Definition { .. } | Node::FootnoteDefinition { .. } => String::new(),

            Node::InlineMath { value } => {
                let body = escape_text_commands(value);
                if contains_any(value, INLINE_UNWRAPPED) {
                    body
                } else {
                    format!("${body}$")
                }
            }

            Node::BlockMath { value } => {
                let body = escape_text_commands(value);
                if contains_any(value, BLOCK_UNWRAPPED) {
                    body
                } else {
                    format!("\\begin{{equation*}}\n{body}\n\\end{{equation*}}\n")
                }
            }

            Node::CollapsibleBlock {
                value,
                title,
                children,
            } => self.collapsible(value.as_deref(), title.as_deref(), children, scope),

            Node::Unsupported { kind, data } => {
                let structure = serde_json::to_string_pretty(data).unwrap_or_default();
                warn!("unsupported node type: {kind}\n{structure}");
                self.stats.unsupported_nodes += 1;
                String::new()
            }
        }
    }

    fn render_children(&mut self, children: &[Node], scope: Scope) -> String {
        children.iter().map(|c| self.render(c, scope)).collect()
    }

    /// Render a link to `url` (raw) whose escaped form is `escaped`.
    ///
    /// Children are rendered once, with forced line breaks, since link
    /// arguments cannot hold paragraph breaks.
    fn link(&mut self, url: &str, escaped: &str, children: &[Node], scope: Scope) -> String {
        let text = self.render_children(children, scope.forced());
        if text.is_empty() || url.trim().is_empty() {
            return String::new();
        }

        if is_internal_link(url) {
            let location = label_for_path(&join_relative(url, &self.options.document_path));
            if location.is_empty() {
                return String::new();
            }
            format!("\\hyperref[sect:{location}]{{{text}}}")
        } else if text == escaped {
            format!("\\hyref{{{escaped}}}{{\\hytt{{{text}}}}}")
        } else {
            format!("\\hyref{{{escaped}}}{{{text}}}")
        }
    }

    fn image(&mut self, url: &str, alt: Option<&str>) -> String {
        match self.assets.resolve_image(url, &self.options.document_path) {
            Ok(stem) => format!(
                "\\begin{{figure}}[htbp]\n\\centering\n\\includegraphics[max width=0.7\\textwidth, max height=0.4\\textheight]{{{stem}}}\n\\caption{{{}}}\\end{{figure}}",
                escape_latex(alt.unwrap_or_default())
            ),
            Err(err) => {
                let source = if is_url(url) || is_data_url(url) {
                    url.to_string()
                } else {
                    join_relative(url, &self.options.document_path)
                };
                warn!("error occurred when processing image file `{source}`: {err}");
                self.stats.failed_images += 1;
                String::new()
            }
        }
    }

    fn table(&mut self, align: &[Align], rows: &[Node], scope: Scope) -> String {
        let columns = align.len();
        // Cells beyond the alignment row are dropped
        let rows: Vec<&[Node]> = rows
            .iter()
            .map(|row| {
                let cells = row.children();
                &cells[..cells.len().min(columns)]
            })
            .collect();

        let mut widths = vec![0usize; columns];
        for cells in &rows {
            for (width, cell) in widths.iter_mut().zip(cells.iter()) {
                *width = (*width).max(estimated_width(cell)).min(MAX_COLUMN_WIDTH);
            }
        }

        let layout: String = widths
            .iter()
            .zip(align)
            .map(|(width, align)| format!("X[{width},{},m]", column_code(*align)))
            .collect();

        let mut rendered = rows.iter().map(|cells| self.table_row(cells, scope));
        let header = rendered.next().unwrap_or_default();
        let body: Vec<String> = rendered.collect();

        format!(
            "\\begin{{longtabu}}to\\linewidth[c]{{{layout}}}\n\
             \\toprule\n{header}\\midrule\n\\endfirsthead\n\
             \\toprule\n{header}\\midrule\n\\endhead\n\
             \\bottomrule\n\\endfoot\n\
             \\bottomrule\n\\endlastfoot\n\
             {}\\end{{longtabu}}",
            body.join(ROW_SEPARATOR)
        )
    }

    fn table_row(&mut self, cells: &[Node], scope: Scope) -> String {
        let cells: Vec<String> = cells.iter().map(|c| self.render(c, scope)).collect();
        format!("{} \\\\\n", cells.join(" & "))
    }

    fn footnote_reference(&mut self, identifier: &str) -> String {
        let Some(ordinal) = self.refs.ordinal(identifier) else {
            warn!("reference to undefined footnote `{identifier}`");
            self.stats.dangling_footnotes += 1;
            return String::new();
        };

        let occurrence = self.state.next_occurrence(ordinal);
        let label = format!("{}{identifier}", self.options.label_prefix);
        let suffix = if self.refs.use_count(identifier) > 1 {
            format!("-{occurrence}")
        } else {
            String::new()
        };

        format!(
            "\\textsuperscript{{\\label{{endnoteref:{label}-{occurrence}}}\\hyperref[endnote:{label}]{{[{ordinal}{suffix}]}}}}"
        )
    }

    fn collapsible(
        &mut self,
        value: Option<&str>,
        title: Option<&str>,
        children: &[Node],
        scope: Scope,
    ) -> String {
        let callout = Callout::from_value(value);
        let source = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(callout.title());

        let fragment = self.fragments.parse_fragment(source);
        let title = self.render(
            &fragment,
            Scope {
                nested: true,
                ..scope
            },
        );
        let title = strip_paragraph_start(&title).trim_end();

        format!(
            "\\begin{{details}}{{{}}}{{{title}}}\n{}\n\\end{{details}}",
            callout.color(),
            self.render_children(children, scope)
        )
    }
}

fn column_code(align: Align) -> char {
    match align {
        Align::Left => 'l',
        Align::Right => 'r',
        Align::Center | Align::Unset => 'c',
    }
}

fn contains_any(source: &str, markers: &[&str]) -> bool {
    markers
        .iter()
        .any(|marker| memmem::find(source.as_bytes(), marker.as_bytes()).is_some())
}

fn code_block(lang: Option<&str>, value: &str) -> String {
    let lang = match lang.map(str::trim) {
        None | Some("") | Some("plain") => "text",
        Some("markdown") => "md",
        Some(other) => other,
    };
    let lines: Vec<String> = value
        .replace('\t', "    ")
        .split('\n')
        .map(wrap_code_line)
        .collect();
    format!(
        "\n\\begin{{minted}}[]{{{lang}}}\n{}\n\\end{{minted}}\n",
        lines.join("\n")
    )
}

/// Hard-wrap a listing line at [`CODE_LINE_LIMIT`] display columns.
fn wrap_code_line(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if column >= CODE_LINE_LIMIT {
            result.push('\n');
            column = 0;
        }
        result.push(c);
        column += char_width(c);
    }
    result
}

/// Strike through each character separately so the line can break anywhere.
fn strike_through(children: &[Node]) -> String {
    let text: String = children.iter().map(plain_text).collect();
    text.chars()
        .map(|c| format!("\\sout{{{}}}", escape_latex(c.encode_utf8(&mut [0; 4]))))
        .collect::<Vec<_>>()
        .join("\u{200b}")
}
