//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated doer from a JWT Bearer token.

pub mod auth;
