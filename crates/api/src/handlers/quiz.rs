//! Handlers for the activation quiz.
//!
//! Questions are served without their correct option; grading happens in
//! the tracker against the stored answer keys.

use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use doer_activation::{ActivationSummary, SyncStatus};
use doer_core::types::DbId;
use doer_db::models::quiz::{QuizAttempt, QuizQuestion};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A question as shown to the doer.
#[derive(Debug, Serialize)]
pub struct QuizQuestionView {
    pub id: DbId,
    pub question_text: String,
    pub options: Vec<String>,
    pub order_index: i32,
}

impl From<&QuizQuestion> for QuizQuestionView {
    fn from(q: &QuizQuestion) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text.clone(),
            options: q.options.0.clone(),
            order_index: q.order_index,
        }
    }
}

/// Body for `POST /activation/quiz/attempts`: question id to chosen option.
#[derive(Debug, Deserialize)]
pub struct SubmitQuiz {
    pub answers: HashMap<DbId, i32>,
}

/// A stored attempt with the doer's resulting activation.
#[derive(Debug, Serialize)]
pub struct QuizResult {
    pub attempt: QuizAttempt,
    pub activation: ActivationSummary,
}

// ---------------------------------------------------------------------------
// GET /activation/quiz
// ---------------------------------------------------------------------------

pub async fn list_questions(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut tracker = state.tracker(auth.doer_id);
    tracker.reload().await;
    if tracker.context().sync == SyncStatus::Failed {
        return Err(AppError::activation_failed(tracker.context()));
    }

    let questions: Vec<QuizQuestionView> = tracker
        .context()
        .questions
        .iter()
        .map(QuizQuestionView::from)
        .collect();

    Ok(Json(DataResponse { data: questions }))
}

// ---------------------------------------------------------------------------
// POST /activation/quiz/attempts
// ---------------------------------------------------------------------------

/// Grade and store an attempt. Unanswered questions count as incorrect.
pub async fn submit_attempt(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SubmitQuiz>,
) -> AppResult<impl IntoResponse> {
    let mut tracker = state.tracker(auth.doer_id);
    let attempt = tracker
        .submit_quiz(&input.answers)
        .await
        .ok_or_else(|| AppError::activation_failed(tracker.context()))?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: QuizResult {
                attempt,
                activation: tracker.context().summary(),
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /activation/quiz/attempts
// ---------------------------------------------------------------------------

/// The doer's attempts, oldest first.
pub async fn list_attempts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut tracker = state.tracker(auth.doer_id);
    let attempts = tracker
        .attempt_history()
        .await
        .ok_or_else(|| AppError::activation_failed(tracker.context()))?;

    Ok(Json(DataResponse { data: attempts }))
}
