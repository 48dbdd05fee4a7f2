//! Doer account model.

use doer_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `doers` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Doer {
    pub id: DbId,
    pub full_name: String,
    pub email: String,
    pub is_activated: bool,
    pub activated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a doer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDoer {
    pub full_name: String,
    pub email: String,
}
