//! In-memory [`ActivationStore`] for tests and local runs.
//!
//! Mirrors the PostgreSQL store's semantics: monotonic flag merges with the
//! aggregate flag recomputed on write, upserts keyed by (doer, module), and
//! per-doer attempt numbering with idempotent submissions. Failures can be injected to exercise the
//! tracker's retry and reconciliation paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use doer_core::activation::ActivationFlags;
use doer_core::quiz::next_attempt_number;
use doer_core::training::COMPLETE_PERCENT;
use doer_core::types::{DbId, Timestamp};
use doer_db::models::activation_status::{ActivationStatus, StatusWrite};
use doer_db::models::bank_details::{BankDetails, SaveBankDetails};
use doer_db::models::doer::{CreateDoer, Doer};
use doer_db::models::quiz::{CreateQuizAttempt, CreateQuizQuestion, QuizAttempt, QuizQuestion};
use doer_db::models::training::{CreateTrainingModule, TrainingModule, TrainingProgress};
use sqlx::types::Json;

use crate::error::{StoreError, StoreResult};
use crate::store::ActivationStore;

#[derive(Default)]
struct Tables {
    next_id: DbId,
    doers: HashMap<DbId, Doer>,
    statuses: HashMap<DbId, ActivationStatus>,
    modules: Vec<TrainingModule>,
    progress: HashMap<(DbId, DbId), TrainingProgress>,
    questions: Vec<QuizQuestion>,
    attempts: Vec<QuizAttempt>,
    bank_details: HashMap<DbId, BankDetails>,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

/// Failure injection settings.
#[derive(Default)]
struct Faults {
    /// Fail this many upcoming calls with a transient error.
    transient: usize,
    /// Fail every `save_status` call with a transient error.
    status_writes: bool,
    /// Fail every call with a transient error.
    offline: bool,
    /// Apply this many upcoming writes, then report a transient error as
    /// if the connection dropped before the reply arrived.
    lost_replies: usize,
}

/// Mutex-guarded in-memory activation store.
#[derive(Default)]
pub struct MemoryActivationStore {
    tables: Mutex<Tables>,
    faults: Mutex<Faults>,
    calls: AtomicUsize,
}

impl MemoryActivationStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- seeding --

    pub fn seed_doer(&self, input: CreateDoer) -> Doer {
        let mut t = self.lock();
        let now = Utc::now();
        let doer = Doer {
            id: t.next_id(),
            full_name: input.full_name,
            email: input.email,
            is_activated: false,
            activated_at: None,
            created_at: now,
            updated_at: now,
        };
        t.doers.insert(doer.id, doer.clone());
        doer
    }

    pub fn seed_module(&self, input: CreateTrainingModule) -> TrainingModule {
        let mut t = self.lock();
        let module = TrainingModule {
            id: t.next_id(),
            title: input.title,
            description: input.description.unwrap_or_default(),
            module_type: input.module_type,
            content_url: input.content_url,
            duration_minutes: input.duration_minutes.unwrap_or(0),
            order_index: input.order_index.unwrap_or(0),
            is_required: input.is_required.unwrap_or(true),
            created_at: Utc::now(),
        };
        t.modules.push(module.clone());
        t.modules.sort_by_key(|m| (m.order_index, m.id));
        module
    }

    pub fn seed_question(&self, input: CreateQuizQuestion) -> QuizQuestion {
        let mut t = self.lock();
        let question = QuizQuestion {
            id: t.next_id(),
            question_text: input.question_text,
            options: Json(input.options),
            correct_option_index: input.correct_option_index,
            order_index: input.order_index.unwrap_or(0),
            created_at: Utc::now(),
        };
        t.questions.push(question.clone());
        t.questions.sort_by_key(|q| (q.order_index, q.id));
        question
    }

    // -- fault injection --

    /// Fail the next `n` calls with [`StoreError::Unavailable`].
    pub fn fail_next(&self, n: usize) {
        self.faults_lock().transient = n;
    }

    /// Fail every `save_status` call until cleared.
    pub fn fail_status_writes(&self, fail: bool) {
        self.faults_lock().status_writes = fail;
    }

    /// Apply the next `n` writes but fail their replies with
    /// [`StoreError::Unavailable`].
    pub fn lose_next_replies(&self, n: usize) {
        self.faults_lock().lost_replies = n;
    }

    /// Fail every call until cleared.
    pub fn set_offline(&self, offline: bool) {
        self.faults_lock().offline = offline;
    }

    // -- inspection --

    /// Number of store calls made so far, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn progress_rows(&self, doer_id: DbId) -> Vec<TrainingProgress> {
        let t = self.lock();
        let mut rows: Vec<TrainingProgress> = t
            .progress
            .values()
            .filter(|p| p.doer_id == doer_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.module_id);
        rows
    }

    pub fn stored_status(&self, doer_id: DbId) -> Option<ActivationStatus> {
        self.lock().statuses.get(&doer_id).cloned()
    }

    // -- internals --

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn faults_lock(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the call and apply injected faults.
    fn enter(&self, op: &'static str) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut faults = self.faults_lock();
        if faults.offline {
            return Err(StoreError::Unavailable(format!("{op}: store offline")));
        }
        if faults.transient > 0 {
            faults.transient -= 1;
            return Err(StoreError::Unavailable(format!("{op}: injected failure")));
        }
        if op == "save_status" && faults.status_writes {
            return Err(StoreError::Unavailable(format!("{op}: injected failure")));
        }
        Ok(())
    }

    /// Return a write's result, or a transient error if its reply is lost.
    fn reply<T>(&self, op: &'static str, value: T) -> StoreResult<T> {
        let mut faults = self.faults_lock();
        if faults.lost_replies > 0 {
            faults.lost_replies -= 1;
            return Err(StoreError::Unavailable(format!("{op}: reply lost")));
        }
        Ok(value)
    }

    fn ensure_module(t: &Tables, module_id: DbId) -> StoreResult<()> {
        if t.modules.iter().any(|m| m.id == module_id) {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity: "TrainingModule",
                id: module_id,
            })
        }
    }
}

#[async_trait]
impl ActivationStore for MemoryActivationStore {
    async fn ping(&self) -> StoreResult<()> {
        self.enter("ping")
    }

    async fn get_or_create_status(&self, doer_id: DbId) -> StoreResult<ActivationStatus> {
        self.enter("get_or_create_status")?;
        let mut t = self.lock();
        if let Some(status) = t.statuses.get(&doer_id) {
            return Ok(status.clone());
        }
        let now = Utc::now();
        let status = ActivationStatus {
            id: t.next_id(),
            doer_id,
            training_completed: false,
            quiz_passed: false,
            bank_details_added: false,
            is_fully_activated: false,
            activated_at: None,
            created_at: now,
            updated_at: now,
        };
        t.statuses.insert(doer_id, status.clone());
        Ok(status)
    }

    async fn save_status(
        &self,
        doer_id: DbId,
        flags: &ActivationFlags,
    ) -> StoreResult<StatusWrite> {
        self.enter("save_status")?;
        let mut t = self.lock();
        let current = t
            .statuses
            .get(&doer_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "ActivationStatus",
                id: doer_id,
            })?;
        let stored = current.flags();
        let gates = ActivationFlags {
            training_completed: stored.training_completed || flags.training_completed,
            quiz_passed: stored.quiz_passed || flags.quiz_passed,
            bank_details_added: stored.bank_details_added || flags.bank_details_added,
            ..stored
        };
        let is_fully_activated = stored.is_fully_activated || gates.all_gates_open();
        let merged = ActivationFlags {
            is_fully_activated,
            activated_at: stored
                .activated_at
                .or_else(|| is_fully_activated.then(|| flags.activated_at.unwrap_or_else(Utc::now))),
            ..gates
        };
        merged
            .validate()
            .map_err(|e| StoreError::Constraint(e.to_string()))?;

        let updated = ActivationStatus {
            updated_at: Utc::now(),
            ..current.with_flags(merged)
        };
        t.statuses.insert(doer_id, updated.clone());
        drop(t);
        self.reply(
            "save_status",
            StatusWrite {
                status: updated,
                was_fully_activated: stored.is_fully_activated,
            },
        )
    }

    async fn list_training_modules(&self) -> StoreResult<Vec<TrainingModule>> {
        self.enter("list_training_modules")?;
        Ok(self.lock().modules.clone())
    }

    async fn list_training_progress(&self, doer_id: DbId) -> StoreResult<Vec<TrainingProgress>> {
        self.enter("list_training_progress")?;
        Ok(self.progress_rows(doer_id))
    }

    async fn complete_training_module(
        &self,
        doer_id: DbId,
        module_id: DbId,
        now: Timestamp,
    ) -> StoreResult<TrainingProgress> {
        self.enter("complete_training_module")?;
        let mut t = self.lock();
        Self::ensure_module(&t, module_id)?;

        let existing = t.progress.get(&(doer_id, module_id)).cloned();
        let row = match existing {
            Some(existing) => TrainingProgress {
                is_completed: true,
                progress_percent: COMPLETE_PERCENT,
                completed_at: Some(now),
                updated_at: now,
                ..existing
            },
            None => TrainingProgress {
                id: t.next_id(),
                doer_id,
                module_id,
                is_completed: true,
                progress_percent: COMPLETE_PERCENT,
                started_at: now,
                completed_at: Some(now),
                updated_at: now,
            },
        };
        t.progress.insert((doer_id, module_id), row.clone());
        Ok(row)
    }

    async fn record_training_progress(
        &self,
        doer_id: DbId,
        module_id: DbId,
        percent: i32,
        now: Timestamp,
    ) -> StoreResult<TrainingProgress> {
        self.enter("record_training_progress")?;
        let mut t = self.lock();
        Self::ensure_module(&t, module_id)?;

        let existing = t.progress.get(&(doer_id, module_id)).cloned();
        let row = match existing {
            Some(existing) => TrainingProgress {
                progress_percent: existing.progress_percent.max(percent),
                updated_at: now,
                ..existing
            },
            None => TrainingProgress {
                id: t.next_id(),
                doer_id,
                module_id,
                is_completed: false,
                progress_percent: percent,
                started_at: now,
                completed_at: None,
                updated_at: now,
            },
        };
        t.progress.insert((doer_id, module_id), row.clone());
        Ok(row)
    }

    async fn list_quiz_questions(&self) -> StoreResult<Vec<QuizQuestion>> {
        self.enter("list_quiz_questions")?;
        Ok(self.lock().questions.clone())
    }

    async fn list_quiz_attempts(&self, doer_id: DbId) -> StoreResult<Vec<QuizAttempt>> {
        self.enter("list_quiz_attempts")?;
        let mut attempts: Vec<QuizAttempt> = self
            .lock()
            .attempts
            .iter()
            .filter(|a| a.doer_id == doer_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| a.attempt_number);
        Ok(attempts)
    }

    async fn insert_quiz_attempt(&self, input: &CreateQuizAttempt) -> StoreResult<QuizAttempt> {
        self.enter("insert_quiz_attempt")?;
        let mut t = self.lock();
        if let Some(stored) = t
            .attempts
            .iter()
            .find(|a| a.submission_id == input.submission_id)
        {
            return Ok(stored.clone());
        }
        let previous = t
            .attempts
            .iter()
            .filter(|a| a.doer_id == input.doer_id)
            .map(|a| a.attempt_number)
            .max();
        let attempt = QuizAttempt {
            id: t.next_id(),
            doer_id: input.doer_id,
            submission_id: input.submission_id,
            score: input.score,
            total_questions: input.total_questions,
            passed: input.passed,
            attempt_number: next_attempt_number(previous),
            answers: Json(input.answers.clone()),
            attempted_at: Utc::now(),
        };
        t.attempts.push(attempt.clone());
        drop(t);
        self.reply("insert_quiz_attempt", attempt)
    }

    async fn get_bank_details(&self, doer_id: DbId) -> StoreResult<Option<BankDetails>> {
        self.enter("get_bank_details")?;
        Ok(self.lock().bank_details.get(&doer_id).cloned())
    }

    async fn save_bank_details(
        &self,
        doer_id: DbId,
        input: &SaveBankDetails,
    ) -> StoreResult<BankDetails> {
        self.enter("save_bank_details")?;
        let mut t = self.lock();
        let now = Utc::now();
        let existing = t
            .bank_details
            .get(&doer_id)
            .map(|row| (row.id, row.created_at));
        let (id, created_at) = match existing {
            Some(kept) => kept,
            None => (t.next_id(), now),
        };
        let row = BankDetails {
            id,
            doer_id,
            account_holder_name: input.account_holder_name.clone(),
            account_number: input.account_number.clone(),
            ifsc_code: input.ifsc_code.clone(),
            upi_id: input.upi_id.clone(),
            is_verified: false,
            created_at,
            updated_at: now,
        };
        t.bank_details.insert(doer_id, row.clone());
        drop(t);
        self.reply("save_bank_details", row)
    }

    async fn get_doer(&self, doer_id: DbId) -> StoreResult<Option<Doer>> {
        self.enter("get_doer")?;
        Ok(self.lock().doers.get(&doer_id).cloned())
    }

    async fn mark_doer_activated(
        &self,
        doer_id: DbId,
        activated_at: Timestamp,
    ) -> StoreResult<Option<Doer>> {
        self.enter("mark_doer_activated")?;
        let mut t = self.lock();
        Ok(t.doers.get_mut(&doer_id).map(|doer| {
            doer.is_activated = true;
            doer.activated_at = doer.activated_at.or(Some(activated_at));
            doer.updated_at = Utc::now();
            doer.clone()
        }))
    }
}
