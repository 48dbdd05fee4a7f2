//! Handlers for the doer's activation overview.
//!
//! `GET` only reads. `POST /refresh` also reconciles any gate left closed
//! by an earlier failed write.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use doer_activation::{ActivationTracker, SyncStatus};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /activation
// ---------------------------------------------------------------------------

/// Current activation status, stage, and progress counts.
pub async fn get_activation(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut tracker = state.tracker(auth.doer_id);
    tracker.reload().await;
    summary_response(&tracker)
}

// ---------------------------------------------------------------------------
// POST /activation/refresh
// ---------------------------------------------------------------------------

/// Reload the doer's activation records, reconcile them, and return the
/// overview.
pub async fn refresh_activation(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut tracker = state.tracker(auth.doer_id);
    tracker.refresh().await;
    tracing::info!(doer_id = auth.doer_id, "Activation refreshed");
    summary_response(&tracker)
}

fn summary_response(tracker: &ActivationTracker) -> AppResult<impl IntoResponse> {
    if tracker.context().sync == SyncStatus::Failed {
        return Err(AppError::activation_failed(tracker.context()));
    }

    let summary = tracker.context().summary();
    tracing::debug!(
        doer_id = ?tracker.doer_id(),
        stage = summary.stage.as_str(),
        "Activation summary"
    );
    Ok(Json(DataResponse { data: summary }))
}
