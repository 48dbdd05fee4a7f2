//! The activation state machine.
//!
//! An [`ActivationTracker`] is built per request from shared
//! [`ActivationServices`] and the authenticated doer id. Every operation
//! follows the same shape: short-circuit when there is no doer, make sure
//! the context is loaded, write to the store, and only then update the
//! context. Public operations never return errors; failures surface as
//! `false` / `None` with the reason recorded on the context.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use doer_core::activation::{self, ActivationFlags, ActivationGate};
use doer_core::policy::ActivationPolicy;
use doer_core::quiz::{grade_quiz, AnswerKey};
use doer_core::retry::RetryPolicy;
use doer_core::training::{training_complete, validate_progress_percent, COMPLETE_PERCENT};
use doer_core::types::DbId;
use doer_db::models::activation_status::ActivationStatus;
use doer_db::models::bank_details::{BankDetails, SaveBankDetails};
use doer_db::models::quiz::{CreateQuizAttempt, QuizAttempt, QuizQuestion};
use doer_db::models::training::{TrainingModule, TrainingProgress};
use doer_events::bus::{
    EventBus, PlatformEvent, BANK_DETAILS_SUBMITTED, DOER_ACTIVATED, QUIZ_ATTEMPT_SUBMITTED,
    TRAINING_COMPLETED, TRAINING_MODULE_COMPLETED,
};
use uuid::Uuid;

use crate::context::{ActivationContext, SyncStatus};
use crate::error::{StoreError, StoreResult};
use crate::retry::retry_with_backoff;
use crate::store::ActivationStore;

const NO_DOER: &str = "No authenticated doer";

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// Shared, cheaply cloneable dependencies of every tracker.
#[derive(Clone)]
pub struct ActivationServices {
    pub store: Arc<dyn ActivationStore>,
    pub bus: Arc<EventBus>,
    pub policy: ActivationPolicy,
    pub retry: RetryPolicy,
}

impl ActivationServices {
    /// Services with the default policy and retry settings.
    pub fn new(store: Arc<dyn ActivationStore>, bus: Arc<EventBus>) -> Self {
        Self {
            store,
            bus,
            policy: ActivationPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ActivationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// A fresh tracker for `doer_id`. Nothing is loaded until the first
    /// operation or [`ActivationTracker::refresh`].
    pub fn tracker(&self, doer_id: Option<DbId>) -> ActivationTracker {
        ActivationTracker {
            services: self.clone(),
            ctx: ActivationContext::new(doer_id),
        }
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Per-doer activation progress and the rules that advance it.
pub struct ActivationTracker {
    services: ActivationServices,
    ctx: ActivationContext,
}

/// Everything `refresh` reads, fetched together.
struct Snapshot {
    status: ActivationStatus,
    modules: Vec<TrainingModule>,
    progress: Vec<TrainingProgress>,
    questions: Vec<QuizQuestion>,
    attempts: Vec<QuizAttempt>,
    bank_details: Option<BankDetails>,
}

impl ActivationTracker {
    pub fn context(&self) -> &ActivationContext {
        &self.ctx
    }

    pub fn into_context(self) -> ActivationContext {
        self.ctx
    }

    pub fn doer_id(&self) -> Option<DbId> {
        self.ctx.doer_id
    }

    // -- loading --

    /// Reload every activation record for the doer and reconcile the flags
    /// with what the records imply. A no-op without a doer.
    pub async fn refresh(&mut self) {
        let Some(doer_id) = self.ctx.doer_id else {
            tracing::debug!("Skipping activation refresh without a doer");
            return;
        };
        if !self.reload().await {
            return;
        }
        if !self.reconcile(doer_id).await {
            return;
        }
        self.ctx.sync = SyncStatus::Synced;
    }

    /// Reload every activation record without writing anything back.
    /// Returns whether the context was loaded.
    pub async fn reload(&mut self) -> bool {
        let Some(doer_id) = self.ctx.doer_id else {
            tracing::debug!("Skipping activation reload without a doer");
            return false;
        };

        self.ctx.sync = SyncStatus::Syncing;
        let snapshot = match self.load(doer_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => return self.fail(e),
        };

        self.ctx.status = Some(snapshot.status);
        self.ctx.modules = snapshot.modules;
        self.ctx.progress = snapshot.progress;
        self.ctx.questions = snapshot.questions;
        self.ctx.attempts = snapshot.attempts;
        self.ctx.bank_details = snapshot.bank_details;
        self.ctx.error = None;
        self.ctx.sync = SyncStatus::Synced;

        tracing::debug!(
            doer_id,
            stage = self.ctx.stage().as_str(),
            "Activation context loaded"
        );
        true
    }

    /// Load the context if no refresh has succeeded yet. Returns whether a
    /// loaded context is available.
    pub async fn ensure_loaded(&mut self) -> bool {
        if !self.ctx.is_loaded() {
            self.refresh().await;
        }
        self.ctx.is_loaded()
    }

    async fn load(&self, doer_id: DbId) -> StoreResult<Snapshot> {
        let policy = &self.services.retry;
        let store = self.store();

        let (status, modules, progress, questions, attempts, bank_details) = tokio::try_join!(
            retry_with_backoff(policy, "get_or_create_status", || store
                .get_or_create_status(doer_id)),
            retry_with_backoff(policy, "list_training_modules", || store
                .list_training_modules()),
            retry_with_backoff(policy, "list_training_progress", || store
                .list_training_progress(doer_id)),
            retry_with_backoff(policy, "list_quiz_questions", || store.list_quiz_questions()),
            retry_with_backoff(policy, "list_quiz_attempts", || store
                .list_quiz_attempts(doer_id)),
            retry_with_backoff(policy, "get_bank_details", || store.get_bank_details(doer_id)),
        )?;

        Ok(Snapshot {
            status,
            modules,
            progress,
            questions,
            attempts,
            bank_details,
        })
    }

    /// Open any gate the stored records already satisfy.
    ///
    /// Covers a previous request that saved progress, an attempt, or bank
    /// details but failed to write the status row afterwards.
    async fn reconcile(&mut self, doer_id: DbId) -> bool {
        let current = self.ctx.flags();
        let mut implied = current;
        if self.training_satisfied() {
            implied = implied.open(ActivationGate::Training);
        }
        if self.ctx.has_passed_quiz() {
            implied = implied.open(ActivationGate::Quiz);
        }
        if self.ctx.bank_details.is_some() {
            implied = implied.open(ActivationGate::BankDetails);
        }

        let next = activation::reevaluate(implied, Utc::now()).flags;
        if next != current {
            tracing::info!(
                doer_id,
                open_gates = next.open_count(),
                "Reconciling activation flags with stored records"
            );
        }
        self.commit_flags(doer_id, current, next).await
    }

    // -- training --

    /// Mark a training module completed, then open the training gate if
    /// every counted module is done.
    pub async fn complete_training_module(&mut self, module_id: DbId) -> bool {
        let Some(doer_id) = self.ctx.doer_id else {
            return self.fail_with(NO_DOER);
        };
        if !self.ensure_loaded().await {
            return false;
        }
        if self.ctx.module(module_id).is_none() {
            return self.fail_with(format!("Training module {module_id} not found"));
        }

        self.ctx.sync = SyncStatus::Syncing;
        let now = Utc::now();
        let store = self.store();
        let row = match retry_with_backoff(&self.services.retry, "complete_training_module", || {
            store.complete_training_module(doer_id, module_id, now)
        })
        .await
        {
            Ok(row) => row,
            Err(e) => return self.fail(e),
        };
        self.ctx.put_progress(row);

        tracing::info!(doer_id, module_id, "Training module completed");
        self.publish(
            doer_id,
            TRAINING_MODULE_COMPLETED,
            serde_json::json!({ "module_id": module_id }),
        );

        if self.training_satisfied() {
            let was_open = self.ctx.flags().training_completed;
            if !self.open_gate(doer_id, ActivationGate::Training).await {
                return false;
            }
            if !was_open {
                tracing::info!(doer_id, "Training completed");
                self.publish(doer_id, TRAINING_COMPLETED, serde_json::json!({}));
            }
        }

        self.ctx.sync = SyncStatus::Synced;
        true
    }

    /// Record partial progress on a module. 100 % completes it.
    pub async fn record_training_progress(&mut self, module_id: DbId, percent: i32) -> bool {
        let Some(doer_id) = self.ctx.doer_id else {
            return self.fail_with(NO_DOER);
        };
        if let Err(e) = validate_progress_percent(percent) {
            return self.fail_with(e.to_string());
        }
        if percent == COMPLETE_PERCENT {
            return self.complete_training_module(module_id).await;
        }
        if !self.ensure_loaded().await {
            return false;
        }
        if self.ctx.module(module_id).is_none() {
            return self.fail_with(format!("Training module {module_id} not found"));
        }

        self.ctx.sync = SyncStatus::Syncing;
        let now = Utc::now();
        let store = self.store();
        let row = match retry_with_backoff(&self.services.retry, "record_training_progress", || {
            store.record_training_progress(doer_id, module_id, percent, now)
        })
        .await
        {
            Ok(row) => row,
            Err(e) => return self.fail(e),
        };

        tracing::debug!(
            doer_id,
            module_id,
            progress_percent = row.progress_percent,
            "Training progress recorded"
        );
        self.ctx.put_progress(row);
        self.ctx.sync = SyncStatus::Synced;
        true
    }

    fn training_satisfied(&self) -> bool {
        let modules: Vec<_> = self
            .ctx
            .modules
            .iter()
            .map(TrainingModule::requirement)
            .collect();
        training_complete(
            &modules,
            &self.ctx.completed_module_ids(),
            self.services.policy.training_scope,
        )
    }

    // -- quiz --

    /// Grade and store a quiz submission (`question_id -> option index`).
    ///
    /// Returns the stored attempt. A passing attempt opens the quiz gate; if
    /// that status write fails the attempt is still returned and the failure
    /// is recorded on the context.
    pub async fn submit_quiz(&mut self, answers: &HashMap<DbId, i32>) -> Option<QuizAttempt> {
        let Some(doer_id) = self.ctx.doer_id else {
            self.fail_with(NO_DOER);
            return None;
        };
        if !self.ensure_loaded().await {
            return None;
        }
        if self.ctx.questions.is_empty() {
            self.fail_with("No quiz questions are available");
            return None;
        }

        let keys: Vec<AnswerKey> = self.ctx.questions.iter().map(|q| q.answer_key()).collect();
        let grade = grade_quiz(&keys, answers, self.services.policy.pass_threshold_percent);
        let input = CreateQuizAttempt {
            doer_id,
            submission_id: Uuid::new_v4(),
            score: grade.score,
            total_questions: grade.total_questions,
            passed: grade.passed,
            answers: grade.answers,
        };

        self.ctx.sync = SyncStatus::Syncing;
        let store = self.store();
        let attempt = match retry_with_backoff(&self.services.retry, "insert_quiz_attempt", || {
            store.insert_quiz_attempt(&input)
        })
        .await
        {
            Ok(attempt) => attempt,
            Err(e) => {
                self.fail(e);
                return None;
            }
        };
        self.ctx.attempts.push(attempt.clone());

        tracing::info!(
            doer_id,
            attempt_number = attempt.attempt_number,
            score = attempt.score,
            total_questions = attempt.total_questions,
            passed = attempt.passed,
            "Quiz attempt submitted"
        );
        self.publish(
            doer_id,
            QUIZ_ATTEMPT_SUBMITTED,
            serde_json::json!({
                "attempt_number": attempt.attempt_number,
                "score": attempt.score,
                "total_questions": attempt.total_questions,
                "passed": attempt.passed,
            }),
        );

        if attempt.passed && !self.open_gate(doer_id, ActivationGate::Quiz).await {
            return Some(attempt);
        }

        self.ctx.sync = SyncStatus::Synced;
        Some(attempt)
    }

    /// Reload and return the doer's attempts, oldest first.
    pub async fn attempt_history(&mut self) -> Option<Vec<QuizAttempt>> {
        let Some(doer_id) = self.ctx.doer_id else {
            self.fail_with(NO_DOER);
            return None;
        };

        let store = self.store();
        match retry_with_backoff(&self.services.retry, "list_quiz_attempts", || {
            store.list_quiz_attempts(doer_id)
        })
        .await
        {
            Ok(attempts) => {
                self.ctx.attempts = attempts.clone();
                Some(attempts)
            }
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    // -- bank details --

    /// Store the doer's bank details and open the bank gate.
    ///
    /// Format validation belongs to the caller.
    pub async fn submit_bank_details(&mut self, form: &SaveBankDetails) -> bool {
        let Some(doer_id) = self.ctx.doer_id else {
            return self.fail_with(NO_DOER);
        };
        if !self.ensure_loaded().await {
            return false;
        }

        self.ctx.sync = SyncStatus::Syncing;
        let store = self.store();
        let row = match retry_with_backoff(&self.services.retry, "save_bank_details", || {
            store.save_bank_details(doer_id, form)
        })
        .await
        {
            Ok(row) => row,
            Err(e) => return self.fail(e),
        };
        self.ctx.bank_details = Some(row);

        tracing::info!(doer_id, "Bank details submitted");
        self.publish(doer_id, BANK_DETAILS_SUBMITTED, serde_json::json!({}));

        if !self.open_gate(doer_id, ActivationGate::BankDetails).await {
            return false;
        }
        self.ctx.sync = SyncStatus::Synced;
        true
    }

    // -- gates --

    async fn open_gate(&mut self, doer_id: DbId, gate: ActivationGate) -> bool {
        let current = self.ctx.flags();
        let next = activation::open_gate(current, gate, Utc::now()).flags;
        if !current.is_open(gate) {
            tracing::debug!(doer_id, gate = gate.as_str(), "Opening activation gate");
        }
        self.commit_flags(doer_id, current, next).await
    }

    /// Persist `next` if it differs from `current`, then adopt the stored row.
    ///
    /// Activation side effects follow the store's answer rather than `next`:
    /// another request may have opened the remaining gates since this
    /// context was loaded, or activated the doer already.
    async fn commit_flags(
        &mut self,
        doer_id: DbId,
        current: ActivationFlags,
        next: ActivationFlags,
    ) -> bool {
        if next == current {
            return true;
        }

        let store = self.store();
        let write = match retry_with_backoff(&self.services.retry, "save_status", || {
            store.save_status(doer_id, &next)
        })
        .await
        {
            Ok(write) => write,
            Err(e) => return self.fail(e),
        };
        let newly_activated = write.newly_activated();
        self.ctx.status = Some(write.status);

        if newly_activated {
            self.on_activated(doer_id).await;
        }
        true
    }

    /// Mark the doer's profile activated and announce it on the bus.
    async fn on_activated(&mut self, doer_id: DbId) {
        let activated_at = self.ctx.flags().activated_at.unwrap_or_else(Utc::now);
        tracing::info!(doer_id, %activated_at, "Doer fully activated");

        let store = self.store();
        if let Err(e) = retry_with_backoff(&self.services.retry, "mark_doer_activated", || {
            store.mark_doer_activated(doer_id, activated_at)
        })
        .await
        {
            tracing::warn!(doer_id, error = %e, "Failed to mark doer profile activated");
        }

        self.publish(
            doer_id,
            DOER_ACTIVATED,
            serde_json::json!({ "activated_at": activated_at }),
        );
    }

    // -- helpers --

    fn store(&self) -> &dyn ActivationStore {
        self.services.store.as_ref()
    }

    fn publish(&self, doer_id: DbId, event_type: &str, payload: serde_json::Value) {
        self.services.bus.publish(
            PlatformEvent::new(event_type)
                .for_doer(doer_id)
                .with_payload(payload),
        );
    }

    fn fail(&mut self, err: StoreError) -> bool {
        self.fail_with(err.to_string())
    }

    fn fail_with(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        tracing::warn!(doer_id = ?self.ctx.doer_id, error = %message, "Activation operation failed");
        self.ctx.error = Some(message);
        self.ctx.sync = SyncStatus::Failed;
        false
    }
}
