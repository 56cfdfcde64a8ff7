//! Axum route handlers for the document-composition API. Thin by design:
//! validate, lock the session, call into the engine, map errors.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::SeedContext;
use crate::models::segment::{GenerationStatus, Segment, SegmentPatch};
use crate::preview::{render_preview, ManagerContact, PreviewHeader, StyleOptions};
use crate::queue::worker::run_generation;
use crate::queue::{EnhancementAction, EnqueueRequest, JobKind, JobPayload};
use crate::session::SharedSession;
use crate::state::AppState;
use crate::sync::{sync_segments, EditorSnapshot, SyncReport};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Serialize)]
pub struct SegmentListResponse {
    pub segments: Vec<Segment>,
}

/// User-editable segment fields. Status and rich content are deliberately
/// absent: status belongs to the generation driver, rich content to sync.
#[derive(Debug, Deserialize)]
pub struct UpdateSegmentRequest {
    pub title: Option<String>,
    pub visible: Option<bool>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MoveSegmentRequest {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Deserialize)]
pub struct GenerateSegmentRequest {
    /// Present for enhancement of existing content; absent for first-time
    /// generation.
    #[serde(default)]
    pub action: Option<EnhancementAction>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSegmentResponse {
    pub segment_id: Uuid,
    pub status: GenerationStatus,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub snapshots: Vec<EditorSnapshot>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub accent: Option<String>,
    pub font: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub html: String,
    pub preview_generation: u64,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

async fn load_session(state: &AppState, id: Uuid) -> Result<SharedSession, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// POST /api/v1/sessions
///
/// Creates a document-editing session and seeds its segment set from the
/// candidate/job/knowledge context.
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(context): Json<SeedContext>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    if context.candidate.name.trim().is_empty() {
        return Err(AppError::Validation(
            "candidate name cannot be empty".to_string(),
        ));
    }

    let (session_id, shared) = state.sessions.create(context).await;
    let segments = shared.lock().await.store.all().to_vec();
    tracing::info!("created session {session_id} with {} segments", segments.len());

    Ok(Json(CreateSessionResponse {
        session_id,
        segments,
    }))
}

/// GET /api/v1/sessions/:id/segments
pub async fn handle_get_segments(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SegmentListResponse>, AppError> {
    let shared = load_session(&state, session_id).await?;
    let segments = shared.lock().await.store.all().to_vec();
    Ok(Json(SegmentListResponse { segments }))
}

/// PATCH /api/v1/sessions/:id/segments/:segment_id
///
/// Title, visibility, and plain-content edits. A content edit invalidates
/// the stored rich HTML so the preview re-derives from plain text.
pub async fn handle_update_segment(
    State(state): State<AppState>,
    Path((session_id, segment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateSegmentRequest>,
) -> Result<Json<Segment>, AppError> {
    let shared = load_session(&state, session_id).await?;
    let mut session = shared.lock().await;

    let segment = session
        .store
        .get(segment_id)
        .ok_or_else(|| AppError::NotFound(format!("Segment {segment_id} not found")))?;

    if segment.status == GenerationStatus::Loading && request.content.is_some() {
        return Err(AppError::UnprocessableEntity(
            "segment is generating; cancel or wait before editing content".to_string(),
        ));
    }

    let content_changed = request
        .content
        .as_ref()
        .is_some_and(|c| *c != segment.content);

    session.store.update(
        segment_id,
        SegmentPatch {
            title: request.title,
            visible: request.visible,
            content: request.content,
            // Direct plain edits bypass the editor, so any stored rich HTML
            // is stale by definition.
            rich_content: content_changed.then_some(None),
            ..Default::default()
        },
    );

    Ok(Json(session.store.get(segment_id).cloned().ok_or_else(
        || AppError::NotFound(format!("Segment {segment_id} not found")),
    )?))
}

/// POST /api/v1/sessions/:id/segments/:segment_id/move
pub async fn handle_move_segment(
    State(state): State<AppState>,
    Path((session_id, _segment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<MoveSegmentRequest>,
) -> Result<Json<SegmentListResponse>, AppError> {
    let shared = load_session(&state, session_id).await?;
    let mut session = shared.lock().await;

    let len = session.store.len();
    if request.from >= len || request.to >= len {
        return Err(AppError::Validation(format!(
            "move indexes out of range (from={}, to={}, len={len})",
            request.from, request.to
        )));
    }

    session.store.reorder(request.from, request.to);
    Ok(Json(SegmentListResponse {
        segments: session.store.all().to_vec(),
    }))
}

/// DELETE /api/v1/sessions/:id/segments/:segment_id
///
/// Removes the segment and cancels any generation still in flight for it.
/// A result that already left the worker will be discarded at apply time.
pub async fn handle_delete_segment(
    State(state): State<AppState>,
    Path((session_id, segment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let shared = load_session(&state, session_id).await?;
    let mut session = shared.lock().await;

    if !session.store.contains(segment_id) {
        return Err(AppError::NotFound(format!("Segment {segment_id} not found")));
    }
    session.cancel_inflight(segment_id);
    session.store.remove(segment_id);

    Ok(Json(serde_json::json!({ "deleted": segment_id })))
}

/// POST /api/v1/sessions/:id/segments/:segment_id/generate
///
/// Starts generation (no action) or enhancement (action present) for one
/// segment: optimistic `loading`, then a detached poll driver. Errors land
/// on this segment only, as a retryable `error` status.
pub async fn handle_generate_segment(
    State(state): State<AppState>,
    Path((session_id, segment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<GenerateSegmentRequest>,
) -> Result<Json<GenerateSegmentResponse>, AppError> {
    let shared = load_session(&state, session_id).await?;
    let mut session = shared.lock().await;

    let segment = session
        .store
        .get(segment_id)
        .ok_or_else(|| AppError::NotFound(format!("Segment {segment_id} not found")))?;

    if segment.status == GenerationStatus::Loading {
        return Err(AppError::UnprocessableEntity(
            "segment already has a generation in flight".to_string(),
        ));
    }

    let enqueue = EnqueueRequest {
        kind: if request.action.is_some() {
            JobKind::AiEnhance
        } else {
            JobKind::AiOptimize
        },
        payload: JobPayload {
            segment_type: segment.segment_type.clone(),
            candidate_id: session.context.candidate.id,
            language: session.context.language.clone(),
            order: segment.order,
            enhancement_action: request.action,
            existing_content: request.action.map(|_| segment.content.clone()),
            existing_html: request.action.and(segment.rich_content.clone()),
        },
    };

    session.store.update(
        segment_id,
        SegmentPatch {
            status: Some(GenerationStatus::Loading),
            ..Default::default()
        },
    );
    let cancel = session.register_inflight(segment_id);
    drop(session);

    tokio::spawn(run_generation(
        shared,
        state.queue.clone(),
        segment_id,
        enqueue,
        state.poll,
        cancel,
    ));

    Ok(Json(GenerateSegmentResponse {
        segment_id,
        status: GenerationStatus::Loading,
    }))
}

/// POST /api/v1/sessions/:id/sync
///
/// Explicit "Sync Preview": reconciles every reported editor snapshot into
/// the store and bumps the preview generation counter.
pub async fn handle_sync(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncReport>, AppError> {
    let shared = load_session(&state, session_id).await?;
    let mut session = shared.lock().await;
    let report = sync_segments(&mut session, &request.snapshots);
    Ok(Json(report))
}

/// GET /api/v1/sessions/:id/preview
///
/// Renders the document HTML from the visible segments. The caller hands
/// this string verbatim to the export service.
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<PreviewResponse>, AppError> {
    let shared = load_session(&state, session_id).await?;
    let session = shared.lock().await;

    let candidate = &session.context.candidate;
    let header = PreviewHeader {
        name: candidate.name.clone(),
        title: candidate.title.clone(),
        years_of_experience: candidate.years_of_experience,
        manager: session.context.manager.as_ref().map(|m| ManagerContact {
            name: m.name.clone(),
            email: m.email.clone(),
            phone: m.phone.clone(),
        }),
    };
    let style = StyleOptions {
        accent_color: query.accent,
        font_family: query.font,
    };

    let html = render_preview(
        &session.store.get_visible(),
        &header,
        &style,
        session.preview_generation,
    );
    Ok(Json(PreviewResponse {
        html,
        preview_generation: session.preview_generation,
    }))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.sessions.remove(session_id).await {
        return Err(AppError::NotFound(format!("Session {session_id} not found")));
    }
    Ok(Json(serde_json::json!({ "deleted": session_id })))
}
