//! Repository for the `activation_events` table.

use doer_core::types::DbId;
use sqlx::PgPool;

use crate::models::event::ActivationEvent;

/// Column list for `activation_events` queries.
const COLUMNS: &str = "id, event_type, doer_id, payload, created_at";

/// Provides append and per-doer listing of persisted events.
pub struct EventRepo;

impl EventRepo {
    /// Insert an event row, returning its id.
    pub async fn insert(
        pool: &PgPool,
        event_type: &str,
        doer_id: Option<DbId>,
        payload: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO activation_events (event_type, doer_id, payload) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(event_type)
        .bind(doer_id)
        .bind(payload)
        .fetch_one(pool)
        .await
    }

    /// Events recorded for a doer, newest first.
    pub async fn list_for_doer(
        pool: &PgPool,
        doer_id: DbId,
        limit: i64,
    ) -> Result<Vec<ActivationEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM activation_events \
             WHERE doer_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, ActivationEvent>(&query)
            .bind(doer_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
