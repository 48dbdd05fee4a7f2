//! Persisted activation event model.

use doer_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `activation_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActivationEvent {
    pub id: DbId,
    pub event_type: String,
    pub doer_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}
