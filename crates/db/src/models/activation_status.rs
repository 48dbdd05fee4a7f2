//! Activation status model.

use doer_core::activation::ActivationFlags;
use doer_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `activation_status` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ActivationStatus {
    pub id: DbId,
    pub doer_id: DbId,
    pub training_completed: bool,
    pub quiz_passed: bool,
    pub bank_details_added: bool,
    pub is_fully_activated: bool,
    pub activated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ActivationStatus {
    /// The gate flags carried by this row.
    pub fn flags(&self) -> ActivationFlags {
        ActivationFlags {
            training_completed: self.training_completed,
            quiz_passed: self.quiz_passed,
            bank_details_added: self.bank_details_added,
            is_fully_activated: self.is_fully_activated,
            activated_at: self.activated_at,
        }
    }

    /// A copy of this row with `flags` applied.
    pub fn with_flags(&self, flags: ActivationFlags) -> Self {
        Self {
            training_completed: flags.training_completed,
            quiz_passed: flags.quiz_passed,
            bank_details_added: flags.bank_details_added,
            is_fully_activated: flags.is_fully_activated,
            activated_at: flags.activated_at,
            ..self.clone()
        }
    }
}

/// The row returned by a flag write, with the aggregate flag as it was
/// before the write.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct StatusWrite {
    #[sqlx(flatten)]
    pub status: ActivationStatus,
    pub was_fully_activated: bool,
}

impl StatusWrite {
    /// True when this write moved the doer into full activation.
    pub fn newly_activated(&self) -> bool {
        !self.was_fully_activated && self.status.is_fully_activated
    }
}
