//! Section-aware preview formatters. These are policy, not generic
//! formatting: each knows the shape one section type reliably comes in and
//! renders it accordingly. All of them degrade instead of failing.

use std::sync::LazyLock;

use regex::Regex;

use crate::formatter::blocks::{classify_line, parse_blocks_with, LineKind, DATE_RANGE};
use crate::formatter::html::{escape_html, render_blocks_html};
use crate::formatter::inline::{parse_inline, spans_text};

// ────────────────────────────────────────────────────────────────────────────
// Technical / skills formatter
// ────────────────────────────────────────────────────────────────────────────

/// One category of a skills / technical-expertise section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillCategory {
    /// Empty for items that appear before any category label.
    pub label: String,
    pub items: Vec<String>,
}

/// Groups skills text into labeled categories: bold or heading-like lines
/// become labels, everything under a label becomes a flat item with no
/// inherited bold. Asterisk-only or empty residue lines are dropped.
pub fn parse_skill_categories(text: &str) -> Vec<SkillCategory> {
    let mut categories: Vec<SkillCategory> = Vec::new();

    for line in text.lines() {
        // Residue lines the completion model leaves behind.
        let residue = line.trim();
        if residue.is_empty() || residue.chars().all(|c| c == '*' || c == '_') {
            continue;
        }

        match classify_line(line) {
            LineKind::Heading { text, .. } | LineKind::BoldHeading(text) => {
                categories.push(SkillCategory {
                    label: spans_text(&parse_inline(text)).trim_end_matches(':').to_string(),
                    items: Vec::new(),
                });
            }
            LineKind::Bullet(item) | LineKind::Numbered(item) | LineKind::Quote(item) => {
                push_skill_item(&mut categories, item);
            }
            LineKind::Date(item) | LineKind::Text(item) => {
                push_skill_item(&mut categories, item);
            }
            LineKind::Blank => {}
        }
    }

    categories.retain(|c| !c.label.is_empty() || !c.items.is_empty());
    categories
}

fn push_skill_item(categories: &mut Vec<SkillCategory>, raw: &str) {
    // Bold inside an item is dropped, not inherited: items render flat.
    let item = spans_text(&parse_inline(raw)).trim().to_string();
    if item.is_empty() {
        return;
    }
    if categories.is_empty() {
        categories.push(SkillCategory {
            label: String::new(),
            items: Vec::new(),
        });
    }
    categories.last_mut().unwrap().items.push(item);
}

pub fn render_technical_html(text: &str) -> String {
    let mut out = String::new();
    for category in parse_skill_categories(text) {
        out.push_str("<div class=\"skill-category\">");
        if !category.label.is_empty() {
            out.push_str("<h4>");
            out.push_str(&escape_html(&category.label));
            out.push_str("</h4>");
        }
        if !category.items.is_empty() {
            out.push_str("<ul>");
            for item in &category.items {
                out.push_str("<li>");
                out.push_str(&escape_html(item));
                out.push_str("</li>");
            }
            out.push_str("</ul>");
        }
        out.push_str("</div>");
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Experience-block formatter
// ────────────────────────────────────────────────────────────────────────────

/// Fixed anchor labels that bucket free text inside an experience block.
/// Matched case-insensitively, with or without emphasis markers or a colon.
pub const ANCHOR_LABELS: &[&str] = &[
    "Key Responsibilities",
    "Achievements & Impact",
    "Technical Environment",
];

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[\s*_#]*(key responsibilities|achievements\s*&\s*impact|technical environment)[\s*_:]*$",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperienceBlock {
    pub company: Option<String>,
    pub role: Option<String>,
    /// Normalized `YYYY-MM - YYYY-MM` range, extracted independently of the
    /// company/role split.
    pub date_range: Option<String>,
    /// Header-region lines that were neither the company/role line nor the
    /// date range.
    pub intro: Vec<String>,
    /// (canonical anchor label, bucketed items), in order of appearance.
    pub sections: Vec<(String, Vec<String>)>,
}

/// Parses one experience block: optional leading "Company – Role" header
/// with a date range, then text bucketed under the known anchor labels.
pub fn parse_experience_block(text: &str) -> ExperienceBlock {
    let lines: Vec<&str> = text.lines().collect();
    let first_anchor = lines
        .iter()
        .position(|l| anchor_label(l).is_some())
        .unwrap_or(lines.len());

    let (header_lines, body_lines) = lines.split_at(first_anchor);

    // Date range: anywhere in the header region, independent of the split.
    let mut date_range = None;
    let mut header_rest: Vec<String> = Vec::new();
    for line in header_lines {
        if date_range.is_none() {
            if let Some(m) = DATE_RANGE.find(line) {
                date_range = Some(normalize_date_range(m.as_str()));
                let leftover = format!("{}{}", &line[..m.start()], &line[m.end()..]);
                let leftover = leftover.trim().trim_matches(['|', ',', '-']).trim();
                if !leftover.is_empty() {
                    header_rest.push(leftover.to_string());
                }
                continue;
            }
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            header_rest.push(spans_text(&parse_inline(trimmed)));
        }
    }

    // First remaining header line carries "Company – Role"; a lone line
    // without a separator is just the company.
    let mut company = None;
    let mut role = None;
    let mut intro = Vec::new();
    let mut header_iter = header_rest.into_iter();
    if let Some(first) = header_iter.next() {
        match split_company_role(&first) {
            Some((c, r)) => {
                company = Some(c);
                role = Some(r);
            }
            None => company = Some(first),
        }
    }
    if role.is_none() {
        // A short second line with no separator reads as the role.
        if let Some(second) = header_iter.next() {
            if split_company_role(&second).is_none() && second.len() <= 60 {
                role = Some(second);
            } else {
                intro.push(second);
            }
        }
    }
    intro.extend(header_iter);

    ExperienceBlock {
        company,
        role,
        date_range,
        intro,
        sections: bucket_anchored_sections(body_lines),
    }
}

fn anchor_label(line: &str) -> Option<&'static str> {
    let captures = ANCHOR.captures(line.trim())?;
    let matched = captures.get(1)?.as_str().to_ascii_lowercase();
    ANCHOR_LABELS
        .iter()
        .find(|label| {
            let canon = label.to_ascii_lowercase();
            matched == canon || matched.replace(' ', "") == canon.replace(' ', "")
        })
        .copied()
}

fn normalize_date_range(raw: &str) -> String {
    match DATE_RANGE.find(raw) {
        Some(_) => {
            let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            // compact is `YYYY-MM-YYYY-MM`; rebuild with a spaced separator.
            if compact.len() == 15 {
                format!("{} - {}", &compact[..7], &compact[8..])
            } else {
                raw.trim().to_string()
            }
        }
        None => raw.trim().to_string(),
    }
}

fn split_company_role(line: &str) -> Option<(String, String)> {
    for separator in [" – ", " — ", " - ", " | "] {
        if let Some((company, role)) = line.split_once(separator) {
            let (company, role) = (company.trim(), role.trim());
            if !company.is_empty() && !role.is_empty() {
                return Some((company.to_string(), role.to_string()));
            }
        }
    }
    None
}

/// Buckets the text between anchors into per-anchor item lists: bullet-glyph
/// lines first, comma-splitting only as the Technical Environment fallback.
fn bucket_anchored_sections(lines: &[&str]) -> Vec<(String, Vec<String>)> {
    let mut sections: Vec<(String, Vec<String>)> = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    for line in lines {
        if let Some(label) = anchor_label(line) {
            if let Some(done) = current.take() {
                sections.push(done);
            }
            current = Some((label.to_string(), Vec::new()));
            continue;
        }
        let Some((_, raw_lines)) = current.as_mut() else {
            continue;
        };
        if !line.trim().is_empty() {
            raw_lines.push(line.to_string());
        }
    }
    if let Some(done) = current.take() {
        sections.push(done);
    }

    sections
        .into_iter()
        .map(|(label, raw_lines)| {
            let items = bucket_items(&label, &raw_lines);
            (label, items)
        })
        .collect()
}

fn bucket_items(label: &str, raw_lines: &[String]) -> Vec<String> {
    let bullets: Vec<String> = raw_lines
        .iter()
        .filter_map(|l| match classify_line(l) {
            LineKind::Bullet(item) | LineKind::Numbered(item) => {
                Some(spans_text(&parse_inline(item)).trim().to_string())
            }
            _ => None,
        })
        .filter(|i| !i.is_empty())
        .collect();
    if !bullets.is_empty() {
        return bullets;
    }

    if label.eq_ignore_ascii_case("Technical Environment") {
        return raw_lines
            .join(", ")
            .split(',')
            .map(|i| spans_text(&parse_inline(i.trim())).to_string())
            .filter(|i| !i.is_empty())
            .collect();
    }

    raw_lines
        .iter()
        .map(|l| spans_text(&parse_inline(l.trim())).to_string())
        .filter(|i| !i.is_empty())
        .collect()
}

pub fn render_experience_html(text: &str) -> String {
    let block = parse_experience_block(text);
    let mut out = String::from("<div class=\"experience-block\">");

    if block.company.is_some() || block.role.is_some() || block.date_range.is_some() {
        out.push_str("<div class=\"experience-header\">");
        if let Some(company) = &block.company {
            out.push_str("<div class=\"company\">");
            out.push_str(&escape_html(company));
            out.push_str("</div>");
        }
        if let Some(role) = &block.role {
            out.push_str("<div class=\"role\">");
            out.push_str(&escape_html(role));
            out.push_str("</div>");
        }
        if let Some(range) = &block.date_range {
            out.push_str("<div class=\"date-range\">");
            out.push_str(&escape_html(range));
            out.push_str("</div>");
        }
        out.push_str("</div>");
    }

    for line in &block.intro {
        out.push_str("<p>");
        out.push_str(&escape_html(line));
        out.push_str("</p>");
    }

    for (label, items) in &block.sections {
        out.push_str("<h4>");
        out.push_str(&escape_html(label));
        out.push_str("</h4><ul>");
        for item in items {
            out.push_str("<li>");
            out.push_str(&escape_html(item));
            out.push_str("</li>");
        }
        out.push_str("</ul>");
    }

    out.push_str("</div>");
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Generic fallback formatter
// ────────────────────────────────────────────────────────────────────────────

/// Base heading/date/bullet/paragraph formatting, with the force-bullets
/// flag for section types whose generation output is a flat unmarked list.
pub fn render_generic_html(text: &str, force_bullets: bool) -> String {
    render_blocks_html(&parse_blocks_with(text, force_bullets).blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technical_formatter_bold_label_with_flat_items() {
        let categories = parse_skill_categories("**Backend**\n- Go\n- Postgres");
        assert_eq!(
            categories,
            vec![SkillCategory {
                label: "Backend".to_string(),
                items: vec!["Go".to_string(), "Postgres".to_string()],
            }]
        );
    }

    #[test]
    fn test_technical_formatter_drops_residue_lines() {
        let categories = parse_skill_categories("**Cloud**\n- AWS\n**\n*\n  \n- GCP");
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].items, vec!["AWS", "GCP"]);
    }

    #[test]
    fn test_technical_formatter_items_lose_inherited_bold() {
        let categories = parse_skill_categories("## Data\n- **Kafka**");
        assert_eq!(categories[0].items, vec!["Kafka"]);
        let html = render_technical_html("## Data\n- **Kafka**");
        assert!(html.contains("<li>Kafka</li>"));
        assert!(!html.contains("<li><strong>"));
    }

    #[test]
    fn test_technical_formatter_items_before_any_label() {
        let categories = parse_skill_categories("- Rust\n- Go");
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].label, "");
        assert_eq!(categories[0].items.len(), 2);
    }

    #[test]
    fn test_experience_header_company_role_and_dates() {
        let block =
            parse_experience_block("Acme Corp – Engineer\n2020-01 - 2022-06\n\nKey Responsibilities\n- Shipped");
        assert_eq!(block.company.as_deref(), Some("Acme Corp"));
        assert_eq!(block.role.as_deref(), Some("Engineer"));
        assert_eq!(block.date_range.as_deref(), Some("2020-01 - 2022-06"));
    }

    #[test]
    fn test_experience_date_extracted_from_combined_header_line() {
        let block = parse_experience_block("Acme Corp – Engineer | 2020-01-2022-06");
        assert_eq!(block.date_range.as_deref(), Some("2020-01 - 2022-06"));
        assert_eq!(block.company.as_deref(), Some("Acme Corp"));
        assert_eq!(block.role.as_deref(), Some("Engineer"));
    }

    #[test]
    fn test_experience_anchor_bucketing_case_insensitive() {
        let text = "Acme – Dev\nKEY RESPONSIBILITIES:\n- a\n- b\n**Achievements & Impact**\n- c\nTechnical Environment\nRust, Tokio, Postgres";
        let block = parse_experience_block(text);
        assert_eq!(block.sections.len(), 3);
        assert_eq!(block.sections[0].0, "Key Responsibilities");
        assert_eq!(block.sections[0].1, vec!["a", "b"]);
        assert_eq!(block.sections[1].0, "Achievements & Impact");
        assert_eq!(block.sections[1].1, vec!["c"]);
        assert_eq!(block.sections[2].0, "Technical Environment");
        assert_eq!(block.sections[2].1, vec!["Rust", "Tokio", "Postgres"]);
    }

    #[test]
    fn test_comma_fallback_only_for_technical_environment() {
        let text = "Key Responsibilities\nbuilt things, shipped things";
        let block = parse_experience_block(text);
        // No bullet glyphs and not Technical Environment: the line stays one item.
        assert_eq!(block.sections[0].1, vec!["built things, shipped things"]);
    }

    #[test]
    fn test_experience_render_has_header_role_and_date_nodes() {
        let html =
            render_experience_html("Acme Corp – Engineer\n2020-01 - 2022-06\n\nKey Responsibilities\n- Shipped");
        assert!(html.contains("Acme Corp"));
        assert!(html.contains("<div class=\"role\">Engineer</div>"));
        assert!(html.contains("<div class=\"date-range\">2020-01 - 2022-06</div>"));
    }

    #[test]
    fn test_experience_block_without_header_still_buckets() {
        let block = parse_experience_block("Key Responsibilities\n- solo item");
        assert!(block.company.is_none());
        assert_eq!(block.sections[0].1, vec!["solo item"]);
    }

    #[test]
    fn test_generic_force_bullets_renders_flat_list() {
        let html = render_generic_html("English - Fluent\nFrench - Basic", true);
        assert_eq!(html, "<ul><li>English - Fluent</li><li>French - Basic</li></ul>");
    }

    #[test]
    fn test_formatters_are_total_on_garbage() {
        for input in ["", "   ", "****", "> \n- \n1. ", "<<<>>>"] {
            let _ = render_technical_html(input);
            let _ = render_experience_html(input);
            let _ = render_generic_html(input, false);
            let _ = render_generic_html(input, true);
        }
    }
}
