//! Preview Renderer — a pure function from (ordered visible segments, header
//! metadata, style options) to the final document HTML.
//!
//! Output is stable for identical input: no random ids, no time-based
//! content. The only input-independent variance is the `preview-gen`
//! comment marker tied to the sync counter, which exists to defeat stale
//! markup caches and is irrelevant to visual content.

use crate::formatter::html::escape_html;
use crate::formatter::{
    is_normalized_empty, render_experience_html, render_generic_html, render_technical_html,
    strip_rich_artifacts,
};
use crate::models::segment::{GenerationStatus, Segment, SegmentType};

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ManagerContact {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Candidate metadata for the document header block. Fed from the seed
/// context; independent of any header segment the editor may show.
#[derive(Debug, Clone, Default)]
pub struct PreviewHeader {
    pub name: String,
    pub title: Option<String>,
    pub years_of_experience: Option<u32>,
    pub manager: Option<ManagerContact>,
}

#[derive(Debug, Clone, Default)]
pub struct StyleOptions {
    pub accent_color: Option<String>,
    pub font_family: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

/// Renders the full document preview. `segments` must already be the
/// visible set in document order (`SegmentStore::get_visible`).
pub fn render_preview(
    segments: &[&Segment],
    header: &PreviewHeader,
    style: &StyleOptions,
    preview_generation: u64,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("<!-- preview-gen:{preview_generation} -->"));

    let mut wrapper_style = String::new();
    if let Some(font) = &style.font_family {
        wrapper_style.push_str(&format!("font-family:{};", escape_html(font)));
    }
    if let Some(accent) = &style.accent_color {
        wrapper_style.push_str(&format!("--accent:{};", escape_html(accent)));
    }
    if wrapper_style.is_empty() {
        out.push_str("<div class=\"competence-file\">");
    } else {
        out.push_str(&format!("<div class=\"competence-file\" style=\"{wrapper_style}\">"));
    }

    out.push_str(&render_header_block(header));

    for segment in segments {
        // The document header block above already carries this data.
        if segment.segment_type == SegmentType::Header {
            continue;
        }
        out.push_str(&render_segment_block(segment));
    }

    out.push_str("</div>");
    out
}

fn render_header_block(header: &PreviewHeader) -> String {
    let mut out = String::from("<header class=\"document-header\">");
    out.push_str("<h1>");
    out.push_str(&escape_html(&header.name));
    out.push_str("</h1>");
    if let Some(title) = &header.title {
        out.push_str("<div class=\"candidate-title\">");
        out.push_str(&escape_html(title));
        out.push_str("</div>");
    }
    if let Some(years) = header.years_of_experience {
        out.push_str(&format!(
            "<div class=\"experience-years\">{years} years of experience</div>"
        ));
    }
    if let Some(manager) = &header.manager {
        out.push_str("<div class=\"manager-contact\"><span class=\"manager-name\">");
        out.push_str(&escape_html(&manager.name));
        out.push_str("</span>");
        if let Some(email) = &manager.email {
            out.push_str("<span class=\"manager-email\">");
            out.push_str(&escape_html(email));
            out.push_str("</span>");
        }
        if let Some(phone) = &manager.phone {
            out.push_str("<span class=\"manager-phone\">");
            out.push_str(&escape_html(phone));
            out.push_str("</span>");
        }
        out.push_str("</div>");
    }
    out.push_str("</header>");
    out
}

fn render_segment_block(segment: &Segment) -> String {
    let mut out = format!(
        "<section class=\"segment\" data-type=\"{}\">",
        segment.segment_type
    );
    out.push_str("<h2>");
    out.push_str(&escape_html(&segment.title));
    out.push_str("</h2>");

    let has_content =
        !segment.content.trim().is_empty() || segment.rich_content.as_deref().is_some_and(|h| !is_normalized_empty(h));

    if segment.status == GenerationStatus::Loading && !has_content {
        out.push_str(loading_placeholder());
    } else {
        out.push_str(&render_segment_body(segment));
    }

    out.push_str("</section>");
    out
}

/// Distinct pending visual: spinner plus shimmering skeleton lines, not
/// just empty output.
fn loading_placeholder() -> &'static str {
    concat!(
        "<div class=\"segment-loading\">",
        "<div class=\"spinner\"></div>",
        "<div class=\"skeleton-line\"></div>",
        "<div class=\"skeleton-line short\"></div>",
        "<div class=\"skeleton-line\"></div>",
        "</div>"
    )
}

fn render_segment_body(segment: &Segment) -> String {
    // Rich HTML wins when present and non-empty; stray generation artifacts
    // are stripped first.
    if let Some(rich) = &segment.rich_content {
        if !is_normalized_empty(rich) {
            return strip_rich_artifacts(rich);
        }
    }

    match formatter_for(segment) {
        SectionFormatter::Experience => render_experience_html(&segment.content),
        SectionFormatter::Technical => render_technical_html(&segment.content),
        SectionFormatter::FlatList => render_generic_html(&segment.content, true),
        SectionFormatter::Generic => render_generic_html(&segment.content, false),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionFormatter {
    Experience,
    Technical,
    FlatList,
    Generic,
}

/// Formatter dispatch: segment type first, then a title pattern so renamed
/// or manually added sections still get the right treatment.
fn formatter_for(segment: &Segment) -> SectionFormatter {
    match &segment.segment_type {
        SegmentType::Experience(_) => return SectionFormatter::Experience,
        SegmentType::Skills | SegmentType::TechnicalExpertise => {
            return SectionFormatter::Technical
        }
        SegmentType::Certifications | SegmentType::Languages => {
            return SectionFormatter::FlatList
        }
        _ => {}
    }

    let title = segment.title.to_lowercase();
    if title.contains("experience") && !title.contains("technical") {
        SectionFormatter::Experience
    } else if title.contains("skill") || title.contains("technical expertise") {
        SectionFormatter::Technical
    } else {
        SectionFormatter::Generic
    }
}

/// Strips the cache-bust marker; content-equality checks compare this.
pub fn without_preview_marker(html: &str) -> String {
    match html.find("-->") {
        Some(end) if html.starts_with("<!-- preview-gen:") => html[end + 3..].to_string(),
        _ => html.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::segment::Segment;

    fn header() -> PreviewHeader {
        PreviewHeader {
            name: "Ada Lovelace".to_string(),
            title: Some("Principal Engineer".to_string()),
            years_of_experience: Some(12),
            manager: None,
        }
    }

    fn render(segments: &[&Segment]) -> String {
        render_preview(segments, &header(), &StyleOptions::default(), 1)
    }

    #[test]
    fn test_header_block_and_manager_contact() {
        let mut meta = header();
        meta.manager = Some(ManagerContact {
            name: "Grace Hopper".to_string(),
            email: Some("grace@agency.example".to_string()),
            phone: None,
        });
        let html = render_preview(&[], &meta, &StyleOptions::default(), 0);
        assert!(html.contains("<h1>Ada Lovelace</h1>"));
        assert!(html.contains("12 years of experience"));
        assert!(html.contains("Grace Hopper"));
        assert!(html.contains("grace@agency.example"));
    }

    #[test]
    fn test_loading_without_content_shows_placeholder() {
        let mut segment = Segment::new(SegmentType::Summary, "Summary", 0);
        segment.status = GenerationStatus::Loading;
        let html = render(&[&segment]);
        assert!(html.contains("segment-loading"));
        assert!(html.contains("skeleton-line"));
    }

    #[test]
    fn test_loading_with_prior_content_keeps_content_visible() {
        let mut segment =
            Segment::new(SegmentType::Summary, "Summary", 0).with_content("Prior text.");
        segment.status = GenerationStatus::Loading;
        let html = render(&[&segment]);
        assert!(html.contains("Prior text."));
        assert!(!html.contains("segment-loading"));
    }

    #[test]
    fn test_experience_segment_uses_experience_formatter() {
        let segment = Segment::new(SegmentType::Experience(0), "Acme Corp", 0)
            .with_content("Acme Corp – Engineer\n2020-01 - 2022-06\n\nKey Responsibilities\n- Shipped");
        let html = render(&[&segment]);
        assert!(html.contains("experience-block"));
        assert!(html.contains("<div class=\"company\">Acme Corp</div>"));
    }

    #[test]
    fn test_technical_segment_uses_skill_categories() {
        let segment = Segment::new(SegmentType::TechnicalExpertise, "Technical Expertise", 0)
            .with_content("**Backend**\n- Go\n- Postgres");
        let html = render(&[&segment]);
        assert!(html.contains("skill-category"));
        assert!(html.contains("<h4>Backend</h4>"));
        assert!(html.contains("<li>Go</li>"));
    }

    #[test]
    fn test_title_pattern_dispatch_for_custom_section() {
        let segment = Segment::new(
            SegmentType::Knowledge("tools".to_string()),
            "Skills Matrix",
            0,
        )
        .with_content("**Frontend**\n- React");
        let html = render(&[&segment]);
        assert!(html.contains("skill-category"));
    }

    #[test]
    fn test_rich_content_used_verbatim_after_artifact_strip() {
        let mut segment = Segment::new(SegmentType::Summary, "Summary", 0).with_content("plain");
        segment.rich_content = Some("<p>**Rich** body</p>".to_string());
        let html = render(&[&segment]);
        assert!(html.contains("<p>Rich body</p>"));
        assert!(!html.contains("<p>plain</p>"));
    }

    #[test]
    fn test_empty_rich_content_falls_back_to_plain() {
        let mut segment = Segment::new(SegmentType::Summary, "Summary", 0).with_content("plain");
        segment.rich_content = Some("<p><br></p>".to_string());
        let html = render(&[&segment]);
        assert!(html.contains("<p>plain</p>"));
    }

    #[test]
    fn test_header_segment_is_not_double_rendered() {
        let segment =
            Segment::new(SegmentType::Header, "Header", 0).with_content("Ada Lovelace");
        let html = render(&[&segment]);
        assert!(!html.contains("data-type=\"header\""));
    }

    #[test]
    fn test_output_is_deterministic_modulo_marker() {
        let segment = Segment::new(SegmentType::Summary, "Summary", 0).with_content("Text.");
        let a = render_preview(&[&segment], &header(), &StyleOptions::default(), 1);
        let b = render_preview(&[&segment], &header(), &StyleOptions::default(), 2);
        assert_ne!(a, b, "marker must differ across sync generations");
        assert_eq!(without_preview_marker(&a), without_preview_marker(&b));

        let c = render_preview(&[&segment], &header(), &StyleOptions::default(), 1);
        assert_eq!(a, c, "identical input must render identically");
    }

    #[test]
    fn test_style_options_land_on_wrapper() {
        let style = StyleOptions {
            accent_color: Some("#1a73e8".to_string()),
            font_family: Some("Inter".to_string()),
        };
        let html = render_preview(&[], &header(), &style, 0);
        assert!(html.contains("font-family:Inter;"));
        assert!(html.contains("--accent:#1a73e8;"));
    }
}
