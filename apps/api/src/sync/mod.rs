//! Synchronization Protocol — reconciles transient editor state into the
//! segment store on an explicit trigger, never per keystroke.
//!
//! Rules, applied all-or-nothing across every snapshot in one invocation:
//! - visually empty HTML clears `rich_content` instead of persisting empty
//!   markup, so a full deletion is not masked by stale rich HTML;
//! - a plain-text change discards `rich_content` even when non-empty, so
//!   the preview re-derives formatting from the plain source of truth;
//! - the preview generation counter is bumped so the surface re-renders
//!   instead of diffing against possibly stale cached markup.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::formatter::is_normalized_empty;
use crate::models::segment::SegmentPatch;
use crate::session::DocumentSession;

/// Latest editor state for one segment, as reported by the edit surface
/// when asked: plain text, HTML, and an opaque serialized editor state for
/// exact reconstruction on next open.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub segment_id: Uuid,
    pub plain: String,
    pub html: String,
    #[serde(default)]
    pub editor_state: Option<String>,
}

/// Outcome of one sync invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub synced: usize,
    /// Snapshots referencing a segment no longer in the store. Logged and
    /// swallowed; a concurrent removal is a legal race, not an error.
    pub missed: usize,
    /// Snapshots skipped because the segment is mid-generation; only the
    /// in-flight driver may touch a `loading` segment.
    pub skipped_loading: usize,
    pub preview_generation: u64,
}

/// Applies every snapshot to the store and bumps the preview generation.
pub fn sync_segments(session: &mut DocumentSession, snapshots: &[EditorSnapshot]) -> SyncReport {
    let mut synced = 0usize;
    let mut missed = 0usize;
    let mut skipped_loading = 0usize;

    for snapshot in snapshots {
        let Some(segment) = session.store.get(snapshot.segment_id) else {
            debug!("sync snapshot for missing segment {} dropped", snapshot.segment_id);
            missed += 1;
            continue;
        };
        if segment.status == crate::models::segment::GenerationStatus::Loading {
            debug!("sync snapshot for loading segment {} skipped", snapshot.segment_id);
            skipped_loading += 1;
            continue;
        }

        let plain_changed = segment.content != snapshot.plain;
        let rich_content = if is_normalized_empty(&snapshot.html) {
            // "No rich override": fall back to formatting plain content.
            None
        } else if plain_changed {
            // The HTML no longer matches the plain text; plain wins.
            None
        } else {
            Some(snapshot.html.clone())
        };

        let applied = session.store.update(
            snapshot.segment_id,
            SegmentPatch {
                content: Some(snapshot.plain.clone()),
                rich_content: Some(rich_content),
                editor_state: Some(snapshot.editor_state.clone()),
                ..Default::default()
            },
        );
        if applied {
            synced += 1;
        } else {
            missed += 1;
        }
    }

    let preview_generation = session.bump_preview_generation();
    SyncReport {
        synced,
        missed,
        skipped_loading,
        preview_generation,
    }
}
