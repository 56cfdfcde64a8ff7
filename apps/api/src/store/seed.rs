//! Initial segment plan — builds the ordered section set for a new document
//! from structured candidate/job/knowledge context. Content is pre-filled
//! only where a structured field maps directly onto a section; everything
//! else starts empty and waits for generation or manual editing.

use crate::models::profile::SeedContext;
use crate::models::segment::{Segment, SegmentType};

/// Builds the initial ordered segment set. Pure; the store guards idempotence.
pub fn build_initial_segments(ctx: &SeedContext) -> Vec<Segment> {
    let candidate = &ctx.candidate;
    let mut segments = Vec::new();
    let mut order = 0i32;
    let mut push = |segments: &mut Vec<Segment>, segment: Segment| {
        segments.push(segment);
    };

    // Header: built entirely from structured fields.
    let mut header_lines = vec![candidate.name.clone()];
    if let Some(title) = &candidate.title {
        header_lines.push(title.clone());
    }
    if let Some(years) = candidate.years_of_experience {
        header_lines.push(format!("{years} years of experience"));
    }
    push(
        &mut segments,
        Segment::new(SegmentType::Header, "Header", order).with_content(header_lines.join("\n")),
    );
    order += 1;

    push(
        &mut segments,
        Segment::new(SegmentType::Summary, "Professional Summary", order)
            .with_content(candidate.summary.clone().unwrap_or_default()),
    );
    order += 1;

    // One segment per prior role, newest first as provided.
    for (i, entry) in candidate.experience.iter().enumerate() {
        let mut lines = vec![format!("{} – {}", entry.company, entry.title)];
        if let Some(range) = &entry.date_range {
            lines.push(range.clone());
        }
        if !entry.responsibilities.is_empty() {
            lines.push(String::new());
            lines.push("Key Responsibilities".to_string());
            for r in &entry.responsibilities {
                lines.push(format!("- {r}"));
            }
        }
        push(
            &mut segments,
            Segment::new(SegmentType::Experience(i), entry.company.clone(), order)
                .with_content(lines.join("\n")),
        );
        order += 1;
    }

    let skills_content = candidate
        .skills
        .iter()
        .map(|s| format!("- {s}"))
        .collect::<Vec<_>>()
        .join("\n");
    push(
        &mut segments,
        Segment::new(SegmentType::Skills, "Skills", order).with_content(skills_content),
    );
    order += 1;

    // Technical expertise starts as one generic category over the raw skill
    // list; generation replaces it with properly grouped categories.
    let expertise_content = if candidate.skills.is_empty() {
        String::new()
    } else {
        let mut lines = vec!["**Core Technologies**".to_string()];
        lines.extend(candidate.skills.iter().map(|s| format!("- {s}")));
        lines.join("\n")
    };
    push(
        &mut segments,
        Segment::new(SegmentType::TechnicalExpertise, "Technical Expertise", order)
            .with_content(expertise_content),
    );
    order += 1;

    let education_content = candidate
        .education
        .iter()
        .map(|e| match &e.date_range {
            Some(range) => format!("- {}, {} ({range})", e.degree, e.institution),
            None => format!("- {}, {}", e.degree, e.institution),
        })
        .collect::<Vec<_>>()
        .join("\n");
    push(
        &mut segments,
        Segment::new(SegmentType::Education, "Education", order).with_content(education_content),
    );
    order += 1;

    push(
        &mut segments,
        Segment::new(SegmentType::Certifications, "Certifications", order),
    );
    order += 1;

    // Languages render through the force-bullets fallback, so plain lines
    // without markers are the expected shape here.
    let languages_content = candidate
        .languages
        .iter()
        .map(|l| match &l.level {
            Some(level) => format!("{} – {level}", l.language),
            None => l.language.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n");
    push(
        &mut segments,
        Segment::new(SegmentType::Languages, "Languages", order).with_content(languages_content),
    );
    order += 1;

    if let Some(knowledge) = &ctx.knowledge {
        push(
            &mut segments,
            Segment::new(
                SegmentType::Knowledge("overview".to_string()),
                "Knowledge Base",
                order,
            )
            .with_content(knowledge.text.clone()),
        );
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{CandidateProfile, ExperienceEntry, KnowledgeContext};
    use uuid::Uuid;

    fn context_with(experience: Vec<ExperienceEntry>) -> SeedContext {
        SeedContext {
            candidate: CandidateProfile {
                id: Uuid::new_v4(),
                name: "Ada Lovelace".to_string(),
                title: Some("Principal Engineer".to_string()),
                years_of_experience: Some(12),
                summary: Some("Engine specialist.".to_string()),
                skills: vec!["Rust".to_string()],
                experience,
                education: vec![],
                languages: vec![],
            },
            job: None,
            knowledge: None,
            manager: None,
            language: "en".to_string(),
        }
    }

    #[test]
    fn test_header_prefilled_from_structured_fields() {
        let segments = build_initial_segments(&context_with(vec![]));
        let header = &segments[0];
        assert_eq!(header.segment_type, SegmentType::Header);
        assert!(header.content.contains("Ada Lovelace"));
        assert!(header.content.contains("Principal Engineer"));
        assert!(header.content.contains("12 years of experience"));
    }

    #[test]
    fn test_one_experience_segment_per_role_with_dense_order() {
        let segments = build_initial_segments(&context_with(vec![
            ExperienceEntry {
                company: "Acme Corp".to_string(),
                title: "Engineer".to_string(),
                date_range: Some("2020-01 - 2022-06".to_string()),
                responsibilities: vec!["Built the billing pipeline".to_string()],
            },
            ExperienceEntry {
                company: "Initech".to_string(),
                title: "Developer".to_string(),
                date_range: None,
                responsibilities: vec![],
            },
        ]));

        let experience: Vec<_> = segments
            .iter()
            .filter(|s| matches!(s.segment_type, SegmentType::Experience(_)))
            .collect();
        assert_eq!(experience.len(), 2);
        assert_eq!(experience[0].segment_type, SegmentType::Experience(0));
        assert!(experience[0].content.contains("Acme Corp – Engineer"));
        assert!(experience[0].content.contains("2020-01 - 2022-06"));
        assert!(experience[0].content.contains("- Built the billing pipeline"));

        let orders: Vec<i32> = segments.iter().map(|s| s.order).collect();
        assert_eq!(orders, (0..segments.len() as i32).collect::<Vec<_>>());
    }

    #[test]
    fn test_knowledge_segment_only_when_context_present() {
        let bare = build_initial_segments(&context_with(vec![]));
        assert!(!bare
            .iter()
            .any(|s| matches!(s.segment_type, SegmentType::Knowledge(_))));

        let mut ctx = context_with(vec![]);
        ctx.knowledge = Some(KnowledgeContext {
            text: "Agency delivery methodology.".to_string(),
        });
        let seeded = build_initial_segments(&ctx);
        let kb = seeded
            .iter()
            .find(|s| matches!(s.segment_type, SegmentType::Knowledge(_)))
            .expect("knowledge segment expected");
        assert_eq!(kb.content, "Agency delivery methodology.");
    }

    #[test]
    fn test_unfilled_sections_start_idle_and_empty() {
        let segments = build_initial_segments(&context_with(vec![]));
        let certs = segments
            .iter()
            .find(|s| s.segment_type == SegmentType::Certifications)
            .unwrap();
        assert!(certs.content.is_empty());
        assert!(certs.visible);
    }
}
