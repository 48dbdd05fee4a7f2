//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod activation_status_repo;
pub mod bank_details_repo;
pub mod doer_repo;
pub mod event_repo;
pub mod quiz_repo;
pub mod training_repo;

pub use activation_status_repo::ActivationStatusRepo;
pub use bank_details_repo::BankDetailsRepo;
pub use doer_repo::DoerRepo;
pub use event_repo::EventRepo;
pub use quiz_repo::QuizRepo;
pub use training_repo::TrainingRepo;
