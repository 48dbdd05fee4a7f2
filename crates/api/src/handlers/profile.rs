//! Handler for the doer's cached profile.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use doer_core::error::CoreError;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /doer/profile
// ---------------------------------------------------------------------------

/// The doer's profile, served from the cache. Activation refreshes the
/// cached entry through the event bus.
pub async fn get_profile(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let profile = state
        .profiles
        .get_or_load(state.activation.store.as_ref(), auth.doer_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Doer",
            id: auth.doer_id,
        })?;

    Ok(Json(DataResponse { data: profile }))
}
