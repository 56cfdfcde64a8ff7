//! Seed-context input types: the structured candidate profile plus optional
//! job-description and knowledge-base context handed to the engine when a
//! new document session starts. These come from the surrounding application
//! (relational store, file extraction) — the engine only reads them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub company: String,
    pub title: String,
    /// Free-form range, e.g. "2020-01 - 2022-06". Kept as authored; the
    /// experience formatter recognizes the `YYYY-MM - YYYY-MM` shape.
    #[serde(default)]
    pub date_range: Option<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub date_range: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSkill {
    pub language: String,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub years_of_experience: Option<u32>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub languages: Vec<LanguageSkill>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescription {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

/// Recruiting-manager contact shown in the document header block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerContact {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Free-text context for knowledge-base segment types (non-candidate data,
/// e.g. agency methodology documents already extracted upstream).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeContext {
    pub text: String,
}

/// Everything `SegmentStore::seed` needs to build the initial segment set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedContext {
    pub candidate: CandidateProfile,
    #[serde(default)]
    pub job: Option<JobDescription>,
    #[serde(default)]
    pub knowledge: Option<KnowledgeContext>,
    #[serde(default)]
    pub manager: Option<ManagerContact>,
    /// BCP-47-ish language tag forwarded to the generation queue, e.g. "en".
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_context_minimal_json() {
        let json = serde_json::json!({
            "candidate": { "id": Uuid::new_v4(), "name": "Ada Lovelace" }
        });
        let ctx: SeedContext = serde_json::from_value(json).unwrap();
        assert_eq!(ctx.candidate.name, "Ada Lovelace");
        assert_eq!(ctx.language, "en");
        assert!(ctx.job.is_none());
        assert!(ctx.candidate.experience.is_empty());
    }

    #[test]
    fn test_experience_entry_camel_case_fields() {
        let json = serde_json::json!({
            "company": "Acme Corp",
            "title": "Engineer",
            "dateRange": "2020-01 - 2022-06",
            "responsibilities": ["Built the pipeline"]
        });
        let entry: ExperienceEntry = serde_json::from_value(json).unwrap();
        assert_eq!(entry.date_range.as_deref(), Some("2020-01 - 2022-06"));
        assert_eq!(entry.responsibilities.len(), 1);
    }
}
