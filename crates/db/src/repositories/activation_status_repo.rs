//! Repository for the `activation_status` table.

use doer_core::activation::ActivationFlags;
use doer_core::types::DbId;
use sqlx::PgPool;

use crate::models::activation_status::{ActivationStatus, StatusWrite};

/// Column list for `activation_status` queries.
const COLUMNS: &str = "\
    id, doer_id, training_completed, quiz_passed, bank_details_added, \
    is_fully_activated, activated_at, created_at, updated_at";

/// Every gate open after the merge, in terms of the stored row and the
/// bound flags.
const ALL_GATES: &str = "\
    (s.training_completed OR $2) AND (s.quiz_passed OR $3) AND (s.bank_details_added OR $4)";

/// Provides get-or-create and monotonic updates for activation status.
pub struct ActivationStatusRepo;

impl ActivationStatusRepo {
    /// Get the activation record for a doer, creating one with all flags
    /// false if it does not exist yet.
    ///
    /// Uses a no-op `DO UPDATE` so `RETURNING` always produces a row.
    pub async fn get_or_create(
        pool: &PgPool,
        doer_id: DbId,
    ) -> Result<ActivationStatus, sqlx::Error> {
        let query = format!(
            "INSERT INTO activation_status (doer_id) \
             VALUES ($1) \
             ON CONFLICT (doer_id) DO UPDATE SET doer_id = activation_status.doer_id \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ActivationStatus>(&query)
            .bind(doer_id)
            .fetch_one(pool)
            .await
    }

    /// Write flags for a doer.
    ///
    /// Every gate is OR-ed with its stored value, and the aggregate flag is
    /// recomputed from the merged gates inside the statement, so concurrent
    /// writers that each open one gate still activate the doer. The caller's
    /// `is_fully_activated` is ignored. `activated_at` keeps the first stamp,
    /// using the caller's stamp (or `NOW()`) when this write activates.
    ///
    /// The previous aggregate comes back as `was_fully_activated`; the row
    /// lock taken by the subquery makes exactly one writer see the
    /// transition.
    pub async fn save_flags(
        pool: &PgPool,
        doer_id: DbId,
        flags: &ActivationFlags,
    ) -> Result<StatusWrite, sqlx::Error> {
        let query = format!(
            "UPDATE activation_status AS s SET \
                 training_completed = s.training_completed OR $2, \
                 quiz_passed = s.quiz_passed OR $3, \
                 bank_details_added = s.bank_details_added OR $4, \
                 is_fully_activated = s.is_fully_activated OR ({ALL_GATES}), \
                 activated_at = COALESCE( \
                     s.activated_at, \
                     CASE WHEN {ALL_GATES} THEN COALESCE($5, NOW()) END \
                 ), \
                 updated_at = NOW() \
             FROM ( \
                 SELECT id AS prev_id, is_fully_activated AS was_fully_activated \
                 FROM activation_status WHERE doer_id = $1 \
                 FOR UPDATE \
             ) AS prev \
             WHERE s.id = prev.prev_id \
             RETURNING {COLUMNS}, prev.was_fully_activated"
        );
        sqlx::query_as::<_, StatusWrite>(&query)
            .bind(doer_id)
            .bind(flags.training_completed)
            .bind(flags.quiz_passed)
            .bind(flags.bank_details_added)
            .bind(flags.activated_at)
            .fetch_one(pool)
            .await
    }
}
