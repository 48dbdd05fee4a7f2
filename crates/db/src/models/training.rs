//! Training module catalog and per-doer progress models.

use doer_core::training::ModuleRequirement;
use doer_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `training_modules` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct TrainingModule {
    pub id: DbId,
    pub title: String,
    pub description: String,
    /// One of `video`, `pdf`, `article`.
    pub module_type: String,
    pub content_url: String,
    pub duration_minutes: i32,
    pub order_index: i32,
    pub is_required: bool,
    pub created_at: Timestamp,
}

impl TrainingModule {
    pub fn requirement(&self) -> ModuleRequirement {
        ModuleRequirement {
            module_id: self.id,
            is_required: self.is_required,
        }
    }
}

/// DTO for seeding a training module.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrainingModule {
    pub title: String,
    pub description: Option<String>,
    pub module_type: String,
    pub content_url: String,
    pub duration_minutes: Option<i32>,
    pub order_index: Option<i32>,
    pub is_required: Option<bool>,
}

/// A row from the `training_progress` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct TrainingProgress {
    pub id: DbId,
    pub doer_id: DbId,
    pub module_id: DbId,
    pub is_completed: bool,
    pub progress_percent: i32,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}
