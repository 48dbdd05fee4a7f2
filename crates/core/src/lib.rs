//! Domain logic for doer activation.
//!
//! This crate holds no I/O: every function evaluates data passed in by the
//! caller. Persistence lives in `doer-db`, orchestration in
//! `doer-activation`.

pub mod activation;
pub mod bank;
pub mod error;
pub mod policy;
pub mod quiz;
pub mod retry;
pub mod training;
pub mod types;
