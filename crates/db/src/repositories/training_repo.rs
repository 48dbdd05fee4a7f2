//! Repository for the `training_modules` and `training_progress` tables.

use doer_core::training::COMPLETE_PERCENT;
use doer_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::training::{CreateTrainingModule, TrainingModule, TrainingProgress};

/// Column list for `training_modules` queries.
const MODULE_COLUMNS: &str = "\
    id, title, description, module_type, content_url, duration_minutes, \
    order_index, is_required, created_at";

/// Column list for `training_progress` queries.
const PROGRESS_COLUMNS: &str = "\
    id, doer_id, module_id, is_completed, progress_percent, \
    started_at, completed_at, updated_at";

/// Provides catalog reads and per-doer progress upserts.
pub struct TrainingRepo;

impl TrainingRepo {
    /// List the training catalog in display order.
    pub async fn list_modules(pool: &PgPool) -> Result<Vec<TrainingModule>, sqlx::Error> {
        let query = format!(
            "SELECT {MODULE_COLUMNS} FROM training_modules ORDER BY order_index, id"
        );
        sqlx::query_as::<_, TrainingModule>(&query)
            .fetch_all(pool)
            .await
    }

    /// Insert a catalog entry.
    pub async fn create_module(
        pool: &PgPool,
        input: &CreateTrainingModule,
    ) -> Result<TrainingModule, sqlx::Error> {
        let query = format!(
            "INSERT INTO training_modules \
                 (title, description, module_type, content_url, duration_minutes, \
                  order_index, is_required) \
             VALUES ($1, COALESCE($2, ''), $3, $4, COALESCE($5, 0), COALESCE($6, 0), \
                     COALESCE($7, TRUE)) \
             RETURNING {MODULE_COLUMNS}"
        );
        sqlx::query_as::<_, TrainingModule>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.module_type)
            .bind(&input.content_url)
            .bind(input.duration_minutes)
            .bind(input.order_index)
            .bind(input.is_required)
            .fetch_one(pool)
            .await
    }

    /// List all progress rows for a doer.
    pub async fn list_progress(
        pool: &PgPool,
        doer_id: DbId,
    ) -> Result<Vec<TrainingProgress>, sqlx::Error> {
        let query = format!(
            "SELECT {PROGRESS_COLUMNS} FROM training_progress \
             WHERE doer_id = $1 \
             ORDER BY module_id"
        );
        sqlx::query_as::<_, TrainingProgress>(&query)
            .bind(doer_id)
            .fetch_all(pool)
            .await
    }

    /// Mark a module completed for a doer.
    ///
    /// Inserts the progress row on first call; later calls update the same
    /// row, keeping its original `started_at`.
    pub async fn complete_module(
        pool: &PgPool,
        doer_id: DbId,
        module_id: DbId,
        now: Timestamp,
    ) -> Result<TrainingProgress, sqlx::Error> {
        let query = format!(
            "INSERT INTO training_progress \
                 (doer_id, module_id, is_completed, progress_percent, \
                  started_at, completed_at, updated_at) \
             VALUES ($1, $2, TRUE, $3, $4, $4, $4) \
             ON CONFLICT (doer_id, module_id) DO UPDATE SET \
                 is_completed = TRUE, \
                 progress_percent = $3, \
                 completed_at = $4, \
                 updated_at = $4 \
             RETURNING {PROGRESS_COLUMNS}"
        );
        sqlx::query_as::<_, TrainingProgress>(&query)
            .bind(doer_id)
            .bind(module_id)
            .bind(COMPLETE_PERCENT)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Record partial progress on a module.
    ///
    /// The stored percent never decreases and a completed row stays
    /// completed.
    pub async fn record_progress(
        pool: &PgPool,
        doer_id: DbId,
        module_id: DbId,
        percent: i32,
        now: Timestamp,
    ) -> Result<TrainingProgress, sqlx::Error> {
        let query = format!(
            "INSERT INTO training_progress \
                 (doer_id, module_id, is_completed, progress_percent, started_at, updated_at) \
             VALUES ($1, $2, FALSE, $3, $4, $4) \
             ON CONFLICT (doer_id, module_id) DO UPDATE SET \
                 progress_percent = GREATEST(training_progress.progress_percent, EXCLUDED.progress_percent), \
                 updated_at = $4 \
             RETURNING {PROGRESS_COLUMNS}"
        );
        sqlx::query_as::<_, TrainingProgress>(&query)
            .bind(doer_id)
            .bind(module_id)
            .bind(percent)
            .bind(now)
            .fetch_one(pool)
            .await
    }
}
