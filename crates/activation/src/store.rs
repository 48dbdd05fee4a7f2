//! The storage seam used by the activation tracker.

use async_trait::async_trait;
use doer_core::activation::ActivationFlags;
use doer_core::types::{DbId, Timestamp};
use doer_db::models::activation_status::{ActivationStatus, StatusWrite};
use doer_db::models::bank_details::{BankDetails, SaveBankDetails};
use doer_db::models::doer::Doer;
use doer_db::models::quiz::{CreateQuizAttempt, QuizAttempt, QuizQuestion};
use doer_db::models::training::{TrainingModule, TrainingProgress};

use crate::error::StoreResult;

/// Persistence operations for one doer's activation records.
///
/// Implementations must keep activation flags monotonic: `save_status`
/// merges the given gates with the stored ones and never clears a flag or
/// an `activated_at` stamp.
#[async_trait]
pub trait ActivationStore: Send + Sync {
    /// Cheap reachability check.
    async fn ping(&self) -> StoreResult<()>;

    async fn get_or_create_status(&self, doer_id: DbId) -> StoreResult<ActivationStatus>;

    /// Merge `flags` into the stored row.
    ///
    /// `is_fully_activated` is recomputed from the merged gates under the
    /// store's own lock, so a writer holding a stale snapshot still
    /// activates the doer when its gate is the last one. The returned
    /// [`StatusWrite`] tells whether this write made the transition.
    async fn save_status(
        &self,
        doer_id: DbId,
        flags: &ActivationFlags,
    ) -> StoreResult<StatusWrite>;

    /// The training catalog in display order.
    async fn list_training_modules(&self) -> StoreResult<Vec<TrainingModule>>;

    async fn list_training_progress(&self, doer_id: DbId) -> StoreResult<Vec<TrainingProgress>>;

    /// Upsert a completed progress row, keeping an existing `started_at`.
    async fn complete_training_module(
        &self,
        doer_id: DbId,
        module_id: DbId,
        now: Timestamp,
    ) -> StoreResult<TrainingProgress>;

    /// Upsert partial progress; the stored percent never decreases.
    async fn record_training_progress(
        &self,
        doer_id: DbId,
        module_id: DbId,
        percent: i32,
        now: Timestamp,
    ) -> StoreResult<TrainingProgress>;

    /// Quiz questions in display order.
    async fn list_quiz_questions(&self) -> StoreResult<Vec<QuizQuestion>>;

    /// All attempts, oldest first.
    async fn list_quiz_attempts(&self, doer_id: DbId) -> StoreResult<Vec<QuizAttempt>>;

    /// Append an attempt, assigning the next attempt number for the doer.
    /// Append an attempt. Repeating a `submission_id` returns the stored
    /// attempt, which makes the call safe to retry.
    async fn insert_quiz_attempt(&self, input: &CreateQuizAttempt) -> StoreResult<QuizAttempt>;

    async fn get_bank_details(&self, doer_id: DbId) -> StoreResult<Option<BankDetails>>;

    /// Insert or replace the doer's bank details with `is_verified = false`.
    async fn save_bank_details(
        &self,
        doer_id: DbId,
        input: &SaveBankDetails,
    ) -> StoreResult<BankDetails>;

    async fn get_doer(&self, doer_id: DbId) -> StoreResult<Option<Doer>>;

    async fn mark_doer_activated(
        &self,
        doer_id: DbId,
        activated_at: Timestamp,
    ) -> StoreResult<Option<Doer>>;
}
