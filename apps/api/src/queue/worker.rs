//! Per-segment generation driver — owns the `loading → {done|error}` leg of
//! the segment state machine for one request.
//!
//! One driver task per in-flight segment; drivers never block each other and
//! results may land in any order. The driver honors its cancel handle on
//! every poll tick and once more before applying the result, and checks the
//! segment still exists at apply time: a deletion racing the poll loop means
//! the late result is discarded, never a recreated segment.
//!
//! Abandoning the loop (timeout or cancel) does not stop the external job;
//! the engine only stops waiting on it.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::formatter::convert_html_to_plain;
use crate::models::segment::{GenerationStatus, SegmentPatch};
use crate::queue::{EnqueueRequest, GenerationQueue, JobState, QueueError};
use crate::session::{CancelHandle, SharedSession};

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Fixed polling interval against the status endpoint.
    pub interval: Duration,
    /// Wall-clock budget for the whole attempt; exceeding it is a
    /// `QueueError::TimedOut`, distinct from an explicit worker failure.
    pub deadline: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: Duration::from_secs(1),
            deadline: Duration::from_secs(120),
        }
    }
}

/// Runs one generation attempt to a terminal state. The caller has already
/// set the segment to `loading` and registered `cancel` in the session.
pub async fn run_generation(
    session: SharedSession,
    queue: Arc<dyn GenerationQueue>,
    segment_id: Uuid,
    request: EnqueueRequest,
    poll: PollConfig,
    cancel: CancelHandle,
) {
    let job_id = match queue.enqueue(&request).await {
        Ok(job_id) => job_id,
        Err(e) => {
            // Terminal for this attempt; no poll is ever made.
            warn!("enqueue failed for segment {segment_id}: {e}");
            apply_terminal(&session, segment_id, &cancel, error_patch()).await;
            return;
        }
    };

    let deadline = Instant::now() + poll.deadline;
    loop {
        sleep(poll.interval).await;

        if cancel.is_cancelled() {
            info!("generation for segment {segment_id} cancelled, abandoning job {job_id}");
            return;
        }
        if Instant::now() >= deadline {
            let e = QueueError::TimedOut {
                waited: poll.deadline,
            };
            warn!("segment {segment_id} job {job_id}: {e}");
            apply_terminal(&session, segment_id, &cancel, error_patch()).await;
            return;
        }

        match queue.poll(&job_id).await {
            Ok(status) => match status.status {
                JobState::Completed => {
                    let result = status.result.unwrap_or_default();
                    let content = match (&result.content, &result.html_content) {
                        (Some(content), _) => Some(content.clone()),
                        (None, Some(html)) => Some(convert_html_to_plain(html)),
                        (None, None) => None,
                    };
                    let patch = SegmentPatch {
                        content,
                        rich_content: result.html_content.map(Some),
                        status: Some(GenerationStatus::Done),
                        ..Default::default()
                    };
                    apply_terminal(&session, segment_id, &cancel, patch).await;
                    return;
                }
                JobState::Failed => {
                    let reason = status.error.unwrap_or_else(|| "unspecified".to_string());
                    warn!("segment {segment_id} job {job_id} failed: {reason}");
                    apply_terminal(&session, segment_id, &cancel, error_patch()).await;
                    return;
                }
                JobState::Queued | JobState::Processing => {}
            },
            // Transient transport trouble: keep polling until the deadline.
            Err(e) => warn!("poll error for job {job_id}: {e}"),
        }
    }
}

fn error_patch() -> SegmentPatch {
    // Failure never rolls back prior good content; only status changes.
    SegmentPatch {
        status: Some(GenerationStatus::Error),
        ..Default::default()
    }
}

/// Applies a terminal patch under the session lock, with the cancel and
/// existence checks that make the delete-while-generating race safe.
async fn apply_terminal(
    session: &SharedSession,
    segment_id: Uuid,
    cancel: &CancelHandle,
    patch: SegmentPatch,
) {
    let mut session = session.lock().await;
    if cancel.is_cancelled() {
        return;
    }
    if !session.store.contains(segment_id) {
        warn!("segment {segment_id} gone before its generation result landed, discarding");
        session.finish_inflight(segment_id, cancel);
        return;
    }
    session.store.update(segment_id, patch);
    session.finish_inflight(segment_id, cancel);
}
