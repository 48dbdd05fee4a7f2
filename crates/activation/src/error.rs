use doer_core::types::DbId;

/// Errors raised by an [`ActivationStore`](crate::store::ActivationStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A referenced row does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// The write was refused by a store-side constraint.
    #[error("Constraint violated: {0}")]
    Constraint(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Whether retrying the same call may succeed.
    ///
    /// Connection, pool, and I/O failures are transient. Missing rows and
    /// constraint violations are not.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Database(err) => matches!(
                err,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Protocol(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            StoreError::Unavailable(_) => true,
            StoreError::NotFound { .. } | StoreError::Constraint(_) => false,
        }
    }
}
