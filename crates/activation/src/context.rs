//! The per-doer view held by an [`ActivationTracker`](crate::ActivationTracker).
//!
//! A context only ever contains values confirmed by the store. When a write
//! fails, the previous values stay in place and `sync` moves to
//! [`SyncStatus::Failed`] with the reason in `error`.

use std::collections::HashSet;

use doer_core::activation::{derive_stage, ActivationFlags, ActivationStage, StageInputs};
use doer_core::types::{DbId, Timestamp};
use doer_db::models::activation_status::ActivationStatus;
use doer_db::models::bank_details::BankDetails;
use doer_db::models::quiz::{QuizAttempt, QuizQuestion};
use doer_db::models::training::{TrainingModule, TrainingProgress};
use serde::Serialize;

/// Whether the context agrees with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Nothing loaded yet.
    #[default]
    Idle,
    /// A store call is in flight.
    Syncing,
    /// The last operation completed against the store.
    Synced,
    /// The last operation failed; the context holds the last confirmed state.
    Failed,
}

/// Cached activation records for one doer.
#[derive(Debug, Clone, Default)]
pub struct ActivationContext {
    pub doer_id: Option<DbId>,
    pub status: Option<ActivationStatus>,
    pub modules: Vec<TrainingModule>,
    pub progress: Vec<TrainingProgress>,
    pub questions: Vec<QuizQuestion>,
    /// Attempt history, oldest first.
    pub attempts: Vec<QuizAttempt>,
    pub bank_details: Option<BankDetails>,
    /// Message describing the last failure, for display.
    pub error: Option<String>,
    pub sync: SyncStatus,
}

impl ActivationContext {
    pub fn new(doer_id: Option<DbId>) -> Self {
        Self {
            doer_id,
            ..Default::default()
        }
    }

    /// True once a refresh has populated the status.
    pub fn is_loaded(&self) -> bool {
        self.status.is_some()
    }

    /// Current flags, all closed when nothing is loaded.
    pub fn flags(&self) -> ActivationFlags {
        self.status
            .as_ref()
            .map(ActivationStatus::flags)
            .unwrap_or_default()
    }

    pub fn is_fully_activated(&self) -> bool {
        self.flags().is_fully_activated
    }

    pub fn last_attempt(&self) -> Option<&QuizAttempt> {
        self.attempts.last()
    }

    pub fn has_passed_quiz(&self) -> bool {
        self.attempts.iter().any(|a| a.passed)
    }

    pub fn completed_module_ids(&self) -> HashSet<DbId> {
        self.progress
            .iter()
            .filter(|p| p.is_completed)
            .map(|p| p.module_id)
            .collect()
    }

    pub fn module(&self, module_id: DbId) -> Option<&TrainingModule> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    pub fn progress_for(&self, module_id: DbId) -> Option<&TrainingProgress> {
        self.progress.iter().find(|p| p.module_id == module_id)
    }

    /// Replace or add the progress row for its module.
    pub(crate) fn put_progress(&mut self, row: TrainingProgress) {
        match self.progress.iter_mut().find(|p| p.module_id == row.module_id) {
            Some(existing) => *existing = row,
            None => self.progress.push(row),
        }
    }

    pub fn stage(&self) -> ActivationStage {
        derive_stage(
            &self.flags(),
            &StageInputs {
                training_progress_records: self.progress.len(),
                quiz_attempts: self.attempts.len(),
                has_bank_details: self.bank_details.is_some(),
            },
        )
    }

    /// Serializable overview for clients.
    pub fn summary(&self) -> ActivationSummary {
        let flags = self.flags();
        let completed = self.completed_module_ids();
        ActivationSummary {
            doer_id: self.doer_id,
            stage: self.stage(),
            training_completed: flags.training_completed,
            quiz_passed: flags.quiz_passed,
            bank_details_added: flags.bank_details_added,
            is_fully_activated: flags.is_fully_activated,
            activated_at: flags.activated_at,
            modules_total: self.modules.len(),
            modules_completed: self
                .modules
                .iter()
                .filter(|m| completed.contains(&m.id))
                .count(),
            quiz_attempts: self.attempts.len(),
            last_quiz_score: self.last_attempt().map(|a| a.score),
            last_quiz_total: self.last_attempt().map(|a| a.total_questions),
            has_bank_details: self.bank_details.is_some(),
            sync: self.sync,
            error: self.error.clone(),
        }
    }
}

/// Snapshot of a doer's activation returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivationSummary {
    pub doer_id: Option<DbId>,
    pub stage: ActivationStage,
    pub training_completed: bool,
    pub quiz_passed: bool,
    pub bank_details_added: bool,
    pub is_fully_activated: bool,
    pub activated_at: Option<Timestamp>,
    pub modules_total: usize,
    pub modules_completed: usize,
    pub quiz_attempts: usize,
    pub last_quiz_score: Option<i32>,
    pub last_quiz_total: Option<i32>,
    pub has_bank_details: bool,
    pub sync: SyncStatus,
    pub error: Option<String>,
}
