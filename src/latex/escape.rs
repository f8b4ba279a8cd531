//! Pure LaTeX escaping utilities.
//!
//! These functions handle escaping special LaTeX characters, forced line
//! breaks, and the small amount of text surgery the renderer needs on
//! already-rendered fragments.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Paragraph marker emitted at the start of every rendered paragraph.
pub const PARAGRAPH_START: &str = "\\par ";

/// Command emitted for a forced line break.
pub const FORCED_BREAK: &str = "\\newline ";

/// Text-formatting commands whose arguments are escaped inside math.
pub const TEXT_COMMANDS: &[&str] = &["textit", "textbf", "text"];

static TEXT_COMMAND_RE: Lazy<Regex> = Lazy::new(|| {
    let names = TEXT_COMMANDS.join("|");
    Regex::new(&format!(r"\\({names})(\s*)\{{([^{{}}]*)\}}")).expect("valid text command regex")
});

/// Escape special LaTeX characters in text.
///
/// Escapes characters that have special meaning in LaTeX:
/// - Grouping: `{`, `}`
/// - Commands: `\`
/// - Parameters and math: `#`, `$`
/// - Comments and alignment: `%`, `&`
/// - Scripts: `^`, `_`
/// - Ties: `~`
///
/// # Examples
///
/// ```
/// use mdtex::latex::escape_latex;
///
/// assert_eq!(escape_latex("50% done"), "50\\% done");
/// assert_eq!(escape_latex("a_b"), "a\\_b");
/// ```
pub fn escape_latex(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 10);

    for c in text.chars() {
        match c {
            '{' | '}' | '#' | '$' | '%' | '&' | '_' => {
                result.push('\\');
                result.push(c);
            }
            '\\' => result.push_str("\\textbackslash{}"),
            '^' => result.push_str("\\textasciicircum{}"),
            '~' => result.push_str("\\textasciitilde{}"),
            _ => result.push(c),
        }
    }

    result
}

/// Replace literal newlines with an explicit forced-break command.
///
/// Apply after [`escape_latex`]; the inserted command must not be escaped.
pub fn force_linebreaks(text: &str) -> String {
    text.replace('\n', FORCED_BREAK)
}

/// Escape the arguments of text commands embedded in math source.
///
/// Only the bracketed argument of `\text{}`, `\textit{}` and `\textbf{}` is
/// escaped; the rest of the math source is left untouched.
///
/// # Examples
///
/// ```
/// use mdtex::latex::escape_text_commands;
///
/// assert_eq!(
///     escape_text_commands(r"x_1 \text{50% off}"),
///     r"x_1 \text{50\% off}"
/// );
/// ```
pub fn escape_text_commands(source: &str) -> String {
    TEXT_COMMAND_RE
        .replace_all(source, |caps: &Captures| {
            format!("\\{}{}{{{}}}", &caps[1], &caps[2], escape_latex(&caps[3]))
        })
        .into_owned()
}

/// Strip a leading paragraph marker so the fragment can follow a label.
pub fn strip_paragraph_start(fragment: &str) -> &str {
    let trimmed = fragment.trim_start();
    trimmed.strip_prefix(PARAGRAPH_START).unwrap_or(trimmed)
}

/// Normalize trailing whitespace to exactly one newline.
pub fn trailing_line_feed(text: &str) -> String {
    let mut result = text.trim_end().to_string();
    result.push('\n');
    result
}
