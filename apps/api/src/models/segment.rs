//! Segment — one editable, independently generatable section of the composed
//! competence file. Pure state; all behavior lives in the store, formatter,
//! queue worker, and preview modules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Segment type vocabulary
// ────────────────────────────────────────────────────────────────────────────

/// Closed vocabulary of segment types. The tag decides which preview
/// formatter applies and which generation context is sent to the queue.
///
/// Serialized as stable string tags: `header`, `summary`, `experience-N`
/// (one per prior role, N = ordinal), `education`, `skills`,
/// `technical-expertise`, `certifications`, `languages`, and
/// knowledge-base variants as `kb-<slug>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentType {
    Header,
    Summary,
    Experience(usize),
    Education,
    Skills,
    TechnicalExpertise,
    Certifications,
    Languages,
    Knowledge(String),
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentType::Header => write!(f, "header"),
            SegmentType::Summary => write!(f, "summary"),
            SegmentType::Experience(n) => write!(f, "experience-{n}"),
            SegmentType::Education => write!(f, "education"),
            SegmentType::Skills => write!(f, "skills"),
            SegmentType::TechnicalExpertise => write!(f, "technical-expertise"),
            SegmentType::Certifications => write!(f, "certifications"),
            SegmentType::Languages => write!(f, "languages"),
            SegmentType::Knowledge(slug) => write!(f, "kb-{slug}"),
        }
    }
}

impl FromStr for SegmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "header" => return Ok(SegmentType::Header),
            "summary" => return Ok(SegmentType::Summary),
            "education" => return Ok(SegmentType::Education),
            "skills" => return Ok(SegmentType::Skills),
            "technical-expertise" => return Ok(SegmentType::TechnicalExpertise),
            "certifications" => return Ok(SegmentType::Certifications),
            "languages" => return Ok(SegmentType::Languages),
            _ => {}
        }
        if let Some(n) = s.strip_prefix("experience-") {
            return n
                .parse::<usize>()
                .map(SegmentType::Experience)
                .map_err(|_| format!("invalid experience ordinal in '{s}'"));
        }
        if let Some(slug) = s.strip_prefix("kb-") {
            if slug.is_empty() {
                return Err("empty knowledge-base slug".to_string());
            }
            return Ok(SegmentType::Knowledge(slug.to_string()));
        }
        Err(format!("unknown segment type '{s}'"))
    }
}

impl Serialize for SegmentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SegmentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generation status state machine
// ────────────────────────────────────────────────────────────────────────────

/// Per-segment generation state: `idle → loading → {done | error}`, and
/// `done`/`error` → `loading` again on explicit regenerate/enhance.
/// A content edit alone never changes status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    #[default]
    Idle,
    Loading,
    Done,
    Error,
}

// ────────────────────────────────────────────────────────────────────────────
// Segment entity
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Stable unique identifier, assigned at creation, never reused.
    pub id: Uuid,
    #[serde(rename = "type")]
    pub segment_type: SegmentType,
    /// Human-readable heading, editable independently of `segment_type`.
    pub title: String,
    /// Relative ordering key. Unique within a document; density not required.
    pub order: i32,
    /// Hidden segments are excluded from preview/export but kept in the store.
    pub visible: bool,
    /// Canonical semi-structured plain text (markdown-like headings, bullets,
    /// bold markers). Always the source of truth when `rich_content` is absent.
    pub content: String,
    /// Last-synchronized HTML from the rich editor. May be absent, or stale
    /// relative to `content` — the sync protocol is the only path allowed to
    /// update both fields together.
    #[serde(rename = "richContent")]
    pub rich_content: Option<String>,
    /// Opaque serialized editor state, persisted verbatim for exact editor
    /// reconstruction on next open.
    #[serde(rename = "editorState")]
    pub editor_state: Option<String>,
    pub status: GenerationStatus,
}

impl Segment {
    pub fn new(segment_type: SegmentType, title: impl Into<String>, order: i32) -> Self {
        Segment {
            id: Uuid::new_v4(),
            segment_type,
            title: title.into(),
            order,
            visible: true,
            content: String::new(),
            rich_content: None,
            editor_state: None,
            status: GenerationStatus::Idle,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// Partial field set merged into a segment by `SegmentStore::update`.
/// `None` means "leave unchanged"; the nested `Option`s on `rich_content`
/// and `editor_state` allow explicitly clearing those fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SegmentPatch {
    pub title: Option<String>,
    pub visible: Option<bool>,
    pub content: Option<String>,
    #[serde(rename = "richContent", default, deserialize_with = "double_option")]
    pub rich_content: Option<Option<String>>,
    #[serde(rename = "editorState", default, deserialize_with = "double_option")]
    pub editor_state: Option<Option<String>>,
    pub status: Option<GenerationStatus>,
}

/// Distinguishes an absent field (`None`, leave unchanged) from an explicit
/// JSON `null` (`Some(None)`, clear the field) during deserialization.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_type_string_round_trip() {
        let cases = [
            SegmentType::Header,
            SegmentType::Summary,
            SegmentType::Experience(0),
            SegmentType::Experience(4),
            SegmentType::Education,
            SegmentType::Skills,
            SegmentType::TechnicalExpertise,
            SegmentType::Certifications,
            SegmentType::Languages,
            SegmentType::Knowledge("overview".to_string()),
        ];
        for t in cases {
            let tag = t.to_string();
            let back: SegmentType = tag.parse().unwrap();
            assert_eq!(back, t, "round trip failed for tag '{tag}'");
        }
    }

    #[test]
    fn test_segment_type_rejects_unknown_tags() {
        assert!("experience-x".parse::<SegmentType>().is_err());
        assert!("kb-".parse::<SegmentType>().is_err());
        assert!("cover-letter".parse::<SegmentType>().is_err());
    }

    #[test]
    fn test_segment_type_serde_uses_string_tags() {
        let json = serde_json::to_string(&SegmentType::Experience(2)).unwrap();
        assert_eq!(json, r#""experience-2""#);
        let back: SegmentType = serde_json::from_str(r#""kb-methodology""#).unwrap();
        assert_eq!(back, SegmentType::Knowledge("methodology".to_string()));
    }

    #[test]
    fn test_status_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&GenerationStatus::Loading).unwrap(),
            r#""loading""#
        );
        let s: GenerationStatus = serde_json::from_str(r#""error""#).unwrap();
        assert_eq!(s, GenerationStatus::Error);
    }

    #[test]
    fn test_patch_can_explicitly_clear_rich_content() {
        let json = r#"{"richContent": null}"#;
        let patch: SegmentPatch = serde_json::from_str(json).unwrap();
        assert_eq!(patch.rich_content, Some(None));
        let empty: SegmentPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.rich_content, None);
    }
}
