//! [`ActivationStore`] backed by PostgreSQL through the `doer-db` repositories.

use async_trait::async_trait;
use doer_core::activation::ActivationFlags;
use doer_core::types::{DbId, Timestamp};
use doer_db::models::activation_status::{ActivationStatus, StatusWrite};
use doer_db::models::bank_details::{BankDetails, SaveBankDetails};
use doer_db::models::doer::Doer;
use doer_db::models::quiz::{CreateQuizAttempt, QuizAttempt, QuizQuestion};
use doer_db::models::training::{TrainingModule, TrainingProgress};
use doer_db::repositories::{
    ActivationStatusRepo, BankDetailsRepo, DoerRepo, QuizRepo, TrainingRepo,
};
use doer_db::DbPool;

use crate::error::{StoreError, StoreResult};
use crate::store::ActivationStore;

/// PostgreSQL activation store.
#[derive(Clone)]
pub struct PgActivationStore {
    pool: DbPool,
}

impl PgActivationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Map check-constraint violations (SQLSTATE 23514) to [`StoreError::Constraint`].
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23514") {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            return StoreError::Constraint(constraint);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl ActivationStore for PgActivationStore {
    async fn ping(&self) -> StoreResult<()> {
        doer_db::health_check(&self.pool).await.map_err(classify)
    }

    async fn get_or_create_status(&self, doer_id: DbId) -> StoreResult<ActivationStatus> {
        ActivationStatusRepo::get_or_create(&self.pool, doer_id)
            .await
            .map_err(classify)
    }

    async fn save_status(
        &self,
        doer_id: DbId,
        flags: &ActivationFlags,
    ) -> StoreResult<StatusWrite> {
        ActivationStatusRepo::save_flags(&self.pool, doer_id, flags)
            .await
            .map_err(classify)
    }

    async fn list_training_modules(&self) -> StoreResult<Vec<TrainingModule>> {
        TrainingRepo::list_modules(&self.pool).await.map_err(classify)
    }

    async fn list_training_progress(&self, doer_id: DbId) -> StoreResult<Vec<TrainingProgress>> {
        TrainingRepo::list_progress(&self.pool, doer_id)
            .await
            .map_err(classify)
    }

    async fn complete_training_module(
        &self,
        doer_id: DbId,
        module_id: DbId,
        now: Timestamp,
    ) -> StoreResult<TrainingProgress> {
        TrainingRepo::complete_module(&self.pool, doer_id, module_id, now)
            .await
            .map_err(classify)
    }

    async fn record_training_progress(
        &self,
        doer_id: DbId,
        module_id: DbId,
        percent: i32,
        now: Timestamp,
    ) -> StoreResult<TrainingProgress> {
        TrainingRepo::record_progress(&self.pool, doer_id, module_id, percent, now)
            .await
            .map_err(classify)
    }

    async fn list_quiz_questions(&self) -> StoreResult<Vec<QuizQuestion>> {
        QuizRepo::list_questions(&self.pool).await.map_err(classify)
    }

    async fn list_quiz_attempts(&self, doer_id: DbId) -> StoreResult<Vec<QuizAttempt>> {
        QuizRepo::list_attempts(&self.pool, doer_id)
            .await
            .map_err(classify)
    }

    async fn insert_quiz_attempt(&self, input: &CreateQuizAttempt) -> StoreResult<QuizAttempt> {
        QuizRepo::insert_attempt(&self.pool, input)
            .await
            .map_err(classify)
    }

    async fn get_bank_details(&self, doer_id: DbId) -> StoreResult<Option<BankDetails>> {
        BankDetailsRepo::find_by_doer(&self.pool, doer_id)
            .await
            .map_err(classify)
    }

    async fn save_bank_details(
        &self,
        doer_id: DbId,
        input: &SaveBankDetails,
    ) -> StoreResult<BankDetails> {
        BankDetailsRepo::upsert(&self.pool, doer_id, input)
            .await
            .map_err(classify)
    }

    async fn get_doer(&self, doer_id: DbId) -> StoreResult<Option<Doer>> {
        DoerRepo::find_by_id(&self.pool, doer_id)
            .await
            .map_err(classify)
    }

    async fn mark_doer_activated(
        &self,
        doer_id: DbId,
        activated_at: Timestamp,
    ) -> StoreResult<Option<Doer>> {
        DoerRepo::mark_activated(&self.pool, doer_id, activated_at)
            .await
            .map_err(classify)
    }
}
