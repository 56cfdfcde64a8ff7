//! Document-editing session — the explicit state object that owns the
//! segment store, the preview generation counter, and the registry of
//! in-flight generation cancel handles. Collaborating components receive it
//! by reference (behind the session lock); nothing here is a global.

pub mod handlers;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::profile::SeedContext;
use crate::store::SegmentStore;

/// Cancellation handle for one in-flight generation request. Checked by the
/// poll driver on every tick and again before applying a result, so a
/// segment deleted mid-flight can never be resurrected by a late result.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One user composing one document. All mutations go through the session
/// lock, which serializes store updates against concurrent poll drivers.
pub struct DocumentSession {
    pub id: Uuid,
    pub context: SeedContext,
    pub store: SegmentStore,
    /// Bumped by every sync invocation; the preview embeds it as a
    /// cache-bust marker so the surface re-renders instead of diffing
    /// against stale markup.
    pub preview_generation: u64,
    inflight: HashMap<Uuid, CancelHandle>,
    pub created_at: DateTime<Utc>,
}

impl DocumentSession {
    /// Creates a session and seeds the initial segment set from context.
    pub fn new(context: SeedContext) -> Self {
        let mut store = SegmentStore::new();
        store.seed(&context);
        DocumentSession {
            id: Uuid::new_v4(),
            context,
            store,
            preview_generation: 0,
            inflight: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn bump_preview_generation(&mut self) -> u64 {
        self.preview_generation += 1;
        self.preview_generation
    }

    /// Registers a new in-flight generation for a segment, returning its
    /// cancel handle. A handle already registered for the segment is
    /// cancelled first; the poll driver it belongs to will notice and stop.
    pub fn register_inflight(&mut self, segment_id: Uuid) -> CancelHandle {
        let handle = CancelHandle::new();
        if let Some(stale) = self.inflight.insert(segment_id, handle.clone()) {
            stale.cancel();
        }
        handle
    }

    /// Cancels and forgets the in-flight generation for a segment, if any.
    pub fn cancel_inflight(&mut self, segment_id: Uuid) {
        if let Some(handle) = self.inflight.remove(&segment_id) {
            handle.cancel();
        }
    }

    /// Drops the registry entry once a poll driver reaches a terminal state.
    /// Only removes the entry if it still belongs to the finishing driver,
    /// so a regenerate that re-registered meanwhile is left alone.
    pub fn finish_inflight(&mut self, segment_id: Uuid, handle: &CancelHandle) {
        if let Some(current) = self.inflight.get(&segment_id) {
            if Arc::ptr_eq(&current.0, &handle.0) {
                self.inflight.remove(&segment_id);
            }
        }
    }

    pub fn is_generating(&self, segment_id: Uuid) -> bool {
        self.inflight.contains_key(&segment_id)
    }

    pub fn cancel_all_inflight(&mut self) {
        for handle in self.inflight.values() {
            handle.cancel();
        }
        self.inflight.clear();
    }
}

pub type SharedSession = Arc<Mutex<DocumentSession>>;

/// Registry of live sessions, shared across handlers via `AppState`.
#[derive(Clone, Default)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, context: SeedContext) -> (Uuid, SharedSession) {
        let session = DocumentSession::new(context);
        let id = session.id;
        let shared: SharedSession = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, shared.clone());
        (id, shared)
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Removes a session, cancelling everything still in flight for it.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id);
        match removed {
            Some(shared) => {
                shared.lock().await.cancel_all_inflight();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::CandidateProfile;

    fn minimal_context() -> SeedContext {
        SeedContext {
            candidate: CandidateProfile {
                id: Uuid::new_v4(),
                name: "Ada".to_string(),
                title: None,
                years_of_experience: None,
                summary: None,
                skills: vec![],
                experience: vec![],
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
    fn test_new_session_is_seeded() {
        let session = DocumentSession::new(minimal_context());
        assert!(!session.store.is_empty());
        assert_eq!(session.preview_generation, 0);
    }

    #[test]
    fn test_register_inflight_cancels_previous_handle() {
        let mut session = DocumentSession::new(minimal_context());
        let segment_id = session.store.all()[0].id;
        let first = session.register_inflight(segment_id);
        let second = session.register_inflight(segment_id);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn test_finish_inflight_ignores_superseded_handle() {
        let mut session = DocumentSession::new(minimal_context());
        let segment_id = session.store.all()[0].id;
        let stale = session.register_inflight(segment_id);
        let fresh = session.register_inflight(segment_id);
        session.finish_inflight(segment_id, &stale);
        assert!(session.is_generating(segment_id), "fresh handle must survive");
        session.finish_inflight(segment_id, &fresh);
        assert!(!session.is_generating(segment_id));
    }

    #[tokio::test]
    async fn test_manager_create_get_remove() {
        let manager = SessionManager::new();
        let (id, _) = manager.create(minimal_context()).await;
        assert!(manager.get(id).await.is_some());
        assert!(manager.remove(id).await);
        assert!(manager.get(id).await.is_none());
        assert!(!manager.remove(id).await);
    }
}
