//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create/save DTO for inserts and upserts

pub mod activation_status;
pub mod bank_details;
pub mod doer;
pub mod event;
pub mod quiz;
pub mod training;
