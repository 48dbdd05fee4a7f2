//! Doer activation tracking.
//!
//! [`ActivationTracker`] decides when a doer becomes fully activated. It
//! reads and writes through the [`ActivationStore`] seam, keeps the doer's
//! view in an explicit [`ActivationContext`], and announces activation on
//! the event bus so profile caches can refresh.
//!
//! Two stores ship with the crate: [`PgActivationStore`] over `doer-db`
//! repositories, and [`MemoryActivationStore`] for tests and local runs.

pub mod context;
pub mod error;
pub mod memory;
pub mod pg_store;
pub mod retry;
pub mod store;
pub mod tracker;

pub use context::{ActivationContext, ActivationSummary, SyncStatus};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryActivationStore;
pub use pg_store::PgActivationStore;
pub use store::ActivationStore;
pub use tracker::{ActivationServices, ActivationTracker};
