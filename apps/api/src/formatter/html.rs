//! HTML side of the content formatter: rendering parsed blocks to preview
//! HTML, and the deterministic HTML → plain-text reduction used when the
//! rich editor is the source of truth and a markdown-like form is needed.
//!
//! The reducer is an order-preserving degrade, not a DOM parser: tags are
//! scanned left to right and mapped to text effects (`<br>` → newline,
//! `<li>` → `- ` line, `<h1..6>` → `## `-marked line, `<p>` → paragraph
//! break); everything unrecognized is stripped.

use crate::formatter::blocks::Block;
use crate::formatter::inline::InlineSpan;

// ────────────────────────────────────────────────────────────────────────────
// Blocks → HTML
// ────────────────────────────────────────────────────────────────────────────

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_spans_html(spans: &[InlineSpan]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            InlineSpan::Text(t) => out.push_str(&escape_html(t)),
            InlineSpan::Bold(t) => {
                out.push_str("<strong>");
                out.push_str(&escape_html(t));
                out.push_str("</strong>");
            }
            InlineSpan::Italic(t) => {
                out.push_str("<em>");
                out.push_str(&escape_html(t));
                out.push_str("</em>");
            }
            InlineSpan::Strikethrough(t) => {
                out.push_str("<s>");
                out.push_str(&escape_html(t));
                out.push_str("</s>");
            }
            InlineSpan::Code(t) => {
                out.push_str("<code>");
                out.push_str(&escape_html(t));
                out.push_str("</code>");
            }
        }
    }
    out
}

pub fn render_blocks_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Heading { level, spans, bold } => {
                let inner = render_spans_html(spans);
                if *bold {
                    out.push_str(&format!("<h{level}><strong>{inner}</strong></h{level}>"));
                } else {
                    out.push_str(&format!("<h{level}>{inner}</h{level}>"));
                }
            }
            Block::BulletList(items) => {
                out.push_str("<ul>");
                for item in items {
                    out.push_str("<li>");
                    out.push_str(&render_spans_html(item));
                    out.push_str("</li>");
                }
                out.push_str("</ul>");
            }
            Block::NumberedList(items) => {
                out.push_str("<ol>");
                for item in items {
                    out.push_str("<li>");
                    out.push_str(&render_spans_html(item));
                    out.push_str("</li>");
                }
                out.push_str("</ol>");
            }
            Block::Quote(spans) => {
                out.push_str("<blockquote>");
                out.push_str(&render_spans_html(spans));
                out.push_str("</blockquote>");
            }
            Block::DateLine(text) => {
                out.push_str("<p class=\"date-line\">");
                out.push_str(&escape_html(text));
                out.push_str("</p>");
            }
            Block::Paragraph(spans) => {
                out.push_str("<p>");
                out.push_str(&render_spans_html(spans));
                out.push_str("</p>");
            }
        }
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// HTML → plain text
// ────────────────────────────────────────────────────────────────────────────

/// Reduces rich-editor HTML to the canonical plain-text form. Deterministic
/// and total: any input produces some text, unknown tags are dropped.
pub fn convert_html_to_plain(html: &str) -> String {
    let mut out = String::new();
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else {
            // Dangling `<` with no tag end: keep it literal.
            out.push('<');
            rest = after;
            continue;
        };
        let tag = after[..close].trim().to_ascii_lowercase();
        rest = &after[close + 1..];

        let name = tag
            .trim_start_matches('/')
            .split([' ', '/'])
            .next()
            .unwrap_or("");
        let closing = tag.starts_with('/');

        match name {
            "br" => out.push('\n'),
            "li" => {
                if closing {
                    out.push('\n');
                } else {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                    out.push_str("- ");
                }
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if closing {
                    out.push('\n');
                } else {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                    out.push_str("## ");
                }
            }
            "p" | "div" | "ul" | "ol" | "blockquote" => {
                if closing {
                    out.push_str("\n\n");
                }
            }
            // Inline emphasis reduces to its text content; anything else is
            // stripped wholesale.
            _ => {}
        }
    }
    out.push_str(rest);

    collapse_newlines(&decode_entities(&out)).trim().to_string()
}

/// Collapses runs of 3+ newlines to exactly 2 (one paragraph break).
fn collapse_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut streak = 0usize;
    for c in text.chars() {
        if c == '\n' {
            streak += 1;
            if streak <= 2 {
                out.push('\n');
            }
        } else {
            streak = 0;
            out.push(c);
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Normalized-empty check used by the sync protocol: HTML whose text content
/// is only whitespace (e.g. `<p><br></p>`) counts as empty, so a full user
/// deletion is not masked by leftover markup.
pub fn is_normalized_empty(html: &str) -> bool {
    strip_tags(html)
        .replace("&nbsp;", " ")
        .chars()
        .all(char::is_whitespace)
}

fn strip_tags(html: &str) -> String {
    let mut out = String::new();
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open + 1..].find('>') {
            Some(close) => rest = &rest[open + 1 + close + 1..],
            None => {
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Strips generation artifacts from rich HTML before verbatim preview use:
/// stray markdown emphasis markers and code fences the completion model
/// sometimes leaves inside rich content.
pub fn strip_rich_artifacts(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    for line in html.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out.replace("**", "").replace("~~", "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::blocks::parse_blocks;

    #[test]
    fn test_render_bold_heading_keeps_emphasis() {
        let html = render_blocks_html(&parse_blocks("**Backend**").blocks);
        assert_eq!(html, "<h3><strong>Backend</strong></h3>");
    }

    #[test]
    fn test_render_escapes_content() {
        let html = render_blocks_html(&parse_blocks("a < b & c").blocks);
        assert_eq!(html, "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_render_lists_and_quote() {
        let html = render_blocks_html(&parse_blocks("- a\n- b\n\n1. c\n\n> d").blocks);
        assert_eq!(
            html,
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol><blockquote>d</blockquote>"
        );
    }

    #[test]
    fn test_html_to_plain_br_and_p() {
        assert_eq!(convert_html_to_plain("a<br>b"), "a\nb");
        assert_eq!(convert_html_to_plain("<p>one</p><p>two</p>"), "one\n\ntwo");
    }

    #[test]
    fn test_html_to_plain_list_items_get_dash_prefix() {
        let plain = convert_html_to_plain("<ul><li>Go</li><li>Postgres</li></ul>");
        assert_eq!(plain, "- Go\n- Postgres");
    }

    #[test]
    fn test_html_to_plain_headings_get_marker() {
        let plain = convert_html_to_plain("<h2>Skills</h2><p>body</p>");
        assert_eq!(plain, "## Skills\nbody");
    }

    #[test]
    fn test_html_to_plain_strips_emphasis_to_text() {
        let plain = convert_html_to_plain("<p><strong>bold</strong> and <em>soft</em></p>");
        assert_eq!(plain, "bold and soft");
    }

    #[test]
    fn test_html_to_plain_collapses_newline_runs() {
        let plain = convert_html_to_plain("<p>a</p><div></div><p>b</p>");
        assert!(!plain.contains("\n\n\n"));
        assert_eq!(plain, "a\n\nb");
    }

    #[test]
    fn test_html_to_plain_decodes_entities_and_unknown_tags() {
        let plain = convert_html_to_plain("<span data-x=\"1\">a &amp; b&nbsp;c</span>");
        assert_eq!(plain, "a & b c");
    }

    #[test]
    fn test_normalized_empty_detects_visually_empty_markup() {
        assert!(is_normalized_empty("<p><br></p>"));
        assert!(is_normalized_empty("  <div> &nbsp; </div> "));
        assert!(is_normalized_empty(""));
        assert!(!is_normalized_empty("<p>x</p>"));
    }

    #[test]
    fn test_strip_rich_artifacts_removes_fences_and_stray_bold() {
        let html = "```html\n<p>**Title** body</p>\n```";
        assert_eq!(strip_rich_artifacts(html), "<p>Title body</p>");
    }
}
