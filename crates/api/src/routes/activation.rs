//! Route definitions for doer activation.
//!
//! Mounted at `/activation` by `api_routes()`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{activation, bank, quiz, training};
use crate::state::AppState;

/// Activation routes.
///
/// ```text
/// GET    /                              -> get_activation
/// POST   /refresh                       -> refresh_activation
/// GET    /training                      -> list_training
/// POST   /training/{id}/complete        -> complete_module
/// PUT    /training/{id}/progress        -> record_progress
/// GET    /quiz                          -> list_questions
/// GET    /quiz/attempts                 -> list_attempts
/// POST   /quiz/attempts                 -> submit_attempt
/// GET    /bank-details                  -> get_bank_details
/// POST   /bank-details                  -> submit_bank_details
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(activation::get_activation))
        .route("/refresh", post(activation::refresh_activation))
        .route("/training", get(training::list_training))
        .route("/training/{id}/complete", post(training::complete_module))
        .route("/training/{id}/progress", put(training::record_progress))
        .route("/quiz", get(quiz::list_questions))
        .route(
            "/quiz/attempts",
            get(quiz::list_attempts).post(quiz::submit_attempt),
        )
        .route(
            "/bank-details",
            get(bank::get_bank_details).post(bank::submit_bank_details),
        )
}
