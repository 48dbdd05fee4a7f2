pub mod activation;
pub mod doer;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Every route requires a doer bearer token.
///
/// ```text
/// /activation                                      overview
/// /activation/refresh                              reload + reconcile (POST)
/// /activation/training                             catalog with progress
/// /activation/training/{id}/complete               complete module (POST)
/// /activation/training/{id}/progress               partial progress (PUT)
/// /activation/quiz                                 questions, no answers
/// /activation/quiz/attempts                        history, submit (POST)
/// /activation/bank-details                         masked details, submit (POST)
///
/// /doer/profile                                    cached profile
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/activation", activation::router())
        .nest("/doer", doer::router())
}
