//! Route definitions for the doer's own profile.
//!
//! Mounted at `/doer` by `api_routes()`.

use axum::routing::get;
use axum::Router;

use crate::handlers::profile;
use crate::state::AppState;

/// ```text
/// GET    /profile                       -> get_profile
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(profile::get_profile))
}
