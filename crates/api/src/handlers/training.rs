//! Handlers for training modules and the doer's progress through them.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use doer_activation::{ActivationSummary, SyncStatus};
use doer_core::training::validate_progress_percent;
use doer_core::types::DbId;
use doer_db::models::training::{TrainingModule, TrainingProgress};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A catalog entry with the doer's progress on it, if any.
#[derive(Debug, Serialize)]
pub struct TrainingModuleView {
    #[serde(flatten)]
    pub module: TrainingModule,
    pub progress: Option<TrainingProgress>,
}

/// Result of a training write.
#[derive(Debug, Serialize)]
pub struct TrainingUpdate {
    pub progress: Option<TrainingProgress>,
    pub activation: ActivationSummary,
}

/// Body for `PUT /activation/training/{id}/progress`.
#[derive(Debug, Deserialize)]
pub struct ProgressInput {
    pub percent: i32,
}

// ---------------------------------------------------------------------------
// GET /activation/training
// ---------------------------------------------------------------------------

/// List the training catalog in display order with the doer's progress.
pub async fn list_training(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut tracker = state.tracker(auth.doer_id);
    tracker.reload().await;
    if tracker.context().sync == SyncStatus::Failed {
        return Err(AppError::activation_failed(tracker.context()));
    }

    let ctx = tracker.context();
    let modules: Vec<TrainingModuleView> = ctx
        .modules
        .iter()
        .map(|module| TrainingModuleView {
            module: module.clone(),
            progress: ctx.progress_for(module.id).cloned(),
        })
        .collect();

    Ok(Json(DataResponse { data: modules }))
}

// ---------------------------------------------------------------------------
// POST /activation/training/{id}/complete
// ---------------------------------------------------------------------------

/// Mark a module completed for the doer.
pub async fn complete_module(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(module_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut tracker = state.tracker(auth.doer_id);
    if !tracker.complete_training_module(module_id).await {
        return Err(AppError::activation_failed(tracker.context()));
    }

    let ctx = tracker.context();
    Ok(Json(DataResponse {
        data: TrainingUpdate {
            progress: ctx.progress_for(module_id).cloned(),
            activation: ctx.summary(),
        },
    }))
}

// ---------------------------------------------------------------------------
// PUT /activation/training/{id}/progress
// ---------------------------------------------------------------------------

/// Record partial progress on a module. `percent = 100` completes it.
pub async fn record_progress(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(module_id): Path<DbId>,
    Json(input): Json<ProgressInput>,
) -> AppResult<impl IntoResponse> {
    validate_progress_percent(input.percent)?;

    let mut tracker = state.tracker(auth.doer_id);
    if !tracker.record_training_progress(module_id, input.percent).await {
        return Err(AppError::activation_failed(tracker.context()));
    }

    let ctx = tracker.context();
    Ok(Json(DataResponse {
        data: TrainingUpdate {
            progress: ctx.progress_for(module_id).cloned(),
            activation: ctx.summary(),
        },
    }))
}
