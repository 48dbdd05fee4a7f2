//! Repository for the `doers` table.

use doer_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::doer::{CreateDoer, Doer};

/// Column list for `doers` queries.
const COLUMNS: &str = "id, full_name, email, is_activated, activated_at, created_at, updated_at";

/// Provides read access to doer accounts and the activation unlock.
pub struct DoerRepo;

impl DoerRepo {
    /// Insert a new doer.
    pub async fn create(pool: &PgPool, input: &CreateDoer) -> Result<Doer, sqlx::Error> {
        let query = format!(
            "INSERT INTO doers (full_name, email) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Doer>(&query)
            .bind(&input.full_name)
            .bind(&input.email)
            .fetch_one(pool)
            .await
    }

    /// Find a doer by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Doer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM doers WHERE id = $1");
        sqlx::query_as::<_, Doer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Mark a doer as activated. The first activation time is kept.
    pub async fn mark_activated(
        pool: &PgPool,
        id: DbId,
        activated_at: Timestamp,
    ) -> Result<Option<Doer>, sqlx::Error> {
        let query = format!(
            "UPDATE doers SET \
                 is_activated = TRUE, \
                 activated_at = COALESCE(activated_at, $2), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Doer>(&query)
            .bind(id)
            .bind(activated_at)
            .fetch_optional(pool)
            .await
    }
}
