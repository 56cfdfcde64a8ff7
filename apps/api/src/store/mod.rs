//! Segment Store — owns the authoritative ordered segment collection for the
//! document currently being composed, and provides the atomic mutation
//! primitives everything else goes through.
//!
//! All mutations are serialized by the session lock around the owning
//! `DocumentSession`; within one mutation a field-set merge is atomic.
//! `update` is deliberately total: async generation callbacks may race with
//! user deletions, so a missed update is a logged no-op, never a panic.

pub mod seed;

use tracing::warn;
use uuid::Uuid;

use crate::models::profile::SeedContext;
use crate::models::segment::{Segment, SegmentPatch};

#[derive(Debug, Default)]
pub struct SegmentStore {
    /// Kept in document order: `order` ascending, ties broken by insertion
    /// sequence (stable sort on mutation).
    segments: Vec<Segment>,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the initial segment set from structured context. Idempotent:
    /// a non-empty store makes this a no-op, so double invocation (e.g. a
    /// re-entered editor step) never duplicates segments.
    pub fn seed(&mut self, ctx: &SeedContext) {
        if !self.segments.is_empty() {
            return;
        }
        self.segments = seed::build_initial_segments(ctx);
    }

    /// Merges `patch` into the segment with the given id. Returns whether a
    /// segment was found; an absent id is logged and swallowed so in-flight
    /// async callers stay safe against concurrent removal.
    pub fn update(&mut self, id: Uuid, patch: SegmentPatch) -> bool {
        let Some(segment) = self.segments.iter_mut().find(|s| s.id == id) else {
            warn!("update for missing segment {id} dropped (removed mid-flight?)");
            return false;
        };
        if let Some(title) = patch.title {
            segment.title = title;
        }
        if let Some(visible) = patch.visible {
            segment.visible = visible;
        }
        if let Some(content) = patch.content {
            segment.content = content;
        }
        if let Some(rich) = patch.rich_content {
            segment.rich_content = rich;
        }
        if let Some(state) = patch.editor_state {
            segment.editor_state = state;
        }
        if let Some(status) = patch.status {
            segment.status = status;
        }
        true
    }

    /// Moves the segment at `from` to position `to` in document order and
    /// renumbers `order` densely. A pure array move: no drop, no duplication,
    /// O(N). Out-of-range indexes are a no-op.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from >= self.segments.len() || to >= self.segments.len() || from == to {
            return;
        }
        let segment = self.segments.remove(from);
        self.segments.insert(to, segment);
        for (i, s) in self.segments.iter_mut().enumerate() {
            s.order = i as i32;
        }
    }

    /// Removes the segment with the given id. Remaining `order` values are
    /// not renumbered; only relative order matters.
    pub fn remove(&mut self, id: Uuid) {
        self.segments.retain(|s| s.id != id);
    }

    /// Derived view: visible segments, ascending by `order`.
    pub fn get_visible(&self) -> Vec<&Segment> {
        let mut visible: Vec<&Segment> = self.segments.iter().filter(|s| s.visible).collect();
        visible.sort_by_key(|s| s.order);
        visible
    }

    /// Full segment list in document order.
    pub fn all(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, id: Uuid) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.segments.iter().any(|s| s.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Empties the store (starting a new document).
    pub fn clear(&mut self) {
        self.segments.clear();
    }

    #[cfg(test)]
    pub(crate) fn push_for_test(&mut self, segment: Segment) {
        self.segments.push(segment);
    }
}
