//! Block parser — a small state machine over classified lines instead of one
//! large branching function: each line is classified first (heading, bold
//! heading, bullet, numbered, quote, date, blank, text), then contiguous
//! runs are folded into blocks.
//!
//! The input is free text from a completion model, so every rule here is a
//! forgiving heuristic. The contract is "never fail, always degrade to a
//! readable paragraph"; `ParseOutcome::degraded` tells callers when only the
//! paragraph fallback fired.

use std::sync::LazyLock;

use regex::Regex;

use crate::formatter::inline::{parse_inline, spans_text, InlineSpan};

/// A `YYYY-MM - YYYY-MM` range, anywhere in a line.
pub static DATE_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}\s*-\s*\d{4}-\d{2}").unwrap());

static DATE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{4}-\d{2}\s*-\s*\d{4}-\d{2}\s*$").unwrap());

// ────────────────────────────────────────────────────────────────────────────
// Line classification
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `#{1,6} text`
    Heading { level: u8, text: &'a str },
    /// `**text**` alone on its line. Recovery heuristic for "bold used as an
    /// ad hoc heading" in generation output; rendered as a bold level-3
    /// heading. Known to misfire on legitimately bold sentences.
    BoldHeading(&'a str),
    /// `-`, `•`, or `*` bullet item (marker stripped).
    Bullet(&'a str),
    /// `N.` ordered item (marker stripped).
    Numbered(&'a str),
    /// `>` quote line (marker stripped).
    Quote(&'a str),
    /// A line that is exactly a `YYYY-MM - YYYY-MM` range.
    Date(&'a str),
    Blank,
    Text(&'a str),
}

pub fn classify_line(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }

    let hashes = trimmed.bytes().take_while(|b| *b == b'#').count();
    if (1..=6).contains(&hashes) {
        if let Some(text) = trimmed[hashes..].strip_prefix(' ') {
            return LineKind::Heading {
                level: hashes as u8,
                text: text.trim(),
            };
        }
    }

    // Bold-heading check must run before the `*` bullet check: `**x**` starts
    // with an asterisk but is not a list item.
    if trimmed.len() > 4 && trimmed.starts_with("**") && trimmed.ends_with("**") {
        let inner = &trimmed[2..trimmed.len() - 2];
        if !inner.contains("**") && !inner.trim().is_empty() {
            return LineKind::BoldHeading(inner.trim());
        }
    }

    for marker in ["- ", "• ", "* "] {
        if let Some(item) = trimmed.strip_prefix(marker) {
            return LineKind::Bullet(item.trim());
        }
    }

    let digits = trimmed.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(item) = trimmed[digits..].strip_prefix(". ") {
            return LineKind::Numbered(item.trim());
        }
    }

    if let Some(quoted) = trimmed.strip_prefix('>') {
        return LineKind::Quote(quoted.trim());
    }

    if DATE_LINE.is_match(trimmed) {
        return LineKind::Date(trimmed);
    }

    LineKind::Text(trimmed)
}

// ────────────────────────────────────────────────────────────────────────────
// Blocks
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: u8,
        spans: Vec<InlineSpan>,
        /// True for the bold-line heading heuristic; the renderer keeps the
        /// bold emphasis it came from.
        bold: bool,
    },
    BulletList(Vec<Vec<InlineSpan>>),
    NumberedList(Vec<Vec<InlineSpan>>),
    Quote(Vec<InlineSpan>),
    DateLine(String),
    Paragraph(Vec<InlineSpan>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub blocks: Vec<Block>,
    /// True when the input was non-blank and no structural rule fired — the
    /// whole text fell through to the paragraph rule.
    pub degraded: bool,
}

/// Parses semi-structured plain text into blocks.
pub fn parse_blocks(text: &str) -> ParseOutcome {
    parse_blocks_with(text, false)
}

/// Same as [`parse_blocks`], with the generic-fallback flag: when
/// `force_bullets` is set, every non-heading, non-date, non-blank line
/// becomes a bullet item. Used for section types whose generation output is
/// reliably a flat list without markers.
pub fn parse_blocks_with(text: &str, force_bullets: bool) -> ParseOutcome {
    /// Which list run, if any, the previous line left open. Any non-matching
    /// line kind (including a blank separator) closes the run; switching
    /// marker style starts a new list.
    #[derive(PartialEq)]
    enum Run {
        None,
        Bullet,
        Numbered,
    }

    let mut blocks: Vec<Block> = Vec::new();
    let mut run = Run::None;

    for line in text.lines() {
        let kind = classify_line(line);
        let kind = match kind {
            LineKind::Text(t) | LineKind::Quote(t) if force_bullets => LineKind::Bullet(t),
            LineKind::Numbered(t) if force_bullets => LineKind::Bullet(t),
            other => other,
        };

        match kind {
            LineKind::Blank => {
                // Separator only: breaks list runs, never emits a node.
                run = Run::None;
            }
            LineKind::Heading { level, text } => {
                run = Run::None;
                blocks.push(Block::Heading {
                    level,
                    spans: parse_inline(text),
                    bold: false,
                });
            }
            LineKind::BoldHeading(text) => {
                run = Run::None;
                blocks.push(Block::Heading {
                    level: 3,
                    spans: parse_inline(text),
                    bold: true,
                });
            }
            LineKind::Bullet(item) => {
                if run == Run::Bullet {
                    if let Some(Block::BulletList(items)) = blocks.last_mut() {
                        items.push(parse_inline(item));
                        continue;
                    }
                }
                run = Run::Bullet;
                blocks.push(Block::BulletList(vec![parse_inline(item)]));
            }
            LineKind::Numbered(item) => {
                if run == Run::Numbered {
                    if let Some(Block::NumberedList(items)) = blocks.last_mut() {
                        items.push(parse_inline(item));
                        continue;
                    }
                }
                run = Run::Numbered;
                blocks.push(Block::NumberedList(vec![parse_inline(item)]));
            }
            LineKind::Quote(text) => {
                run = Run::None;
                blocks.push(Block::Quote(parse_inline(text)));
            }
            LineKind::Date(text) => {
                run = Run::None;
                blocks.push(Block::DateLine(text.to_string()));
            }
            LineKind::Text(text) => {
                run = Run::None;
                blocks.push(Block::Paragraph(parse_inline(text)));
            }
        }
    }

    let degraded =
        !blocks.is_empty() && blocks.iter().all(|b| matches!(b, Block::Paragraph(_)));
    ParseOutcome { blocks, degraded }
}

/// Extracts normalized plain text from blocks: markers are canonical
/// (`#` headings, `- ` bullets, `N.` items, `> ` quotes) and inline markers
/// are dropped, so all semantic content survives a round trip.
pub fn blocks_to_plain(blocks: &[Block]) -> String {
    let mut out: Vec<String> = Vec::new();
    for block in blocks {
        match block {
            Block::Heading { level, spans, .. } => {
                out.push(format!("{} {}", "#".repeat(*level as usize), spans_text(spans)));
            }
            Block::BulletList(items) => {
                for item in items {
                    out.push(format!("- {}", spans_text(item)));
                }
            }
            Block::NumberedList(items) => {
                for (i, item) in items.iter().enumerate() {
                    out.push(format!("{}. {}", i + 1, spans_text(item)));
                }
            }
            Block::Quote(spans) => out.push(format!("> {}", spans_text(spans))),
            Block::DateLine(text) => out.push(text.clone()),
            Block::Paragraph(spans) => out.push(spans_text(spans)),
        }
    }
    out.join("\n")
}
