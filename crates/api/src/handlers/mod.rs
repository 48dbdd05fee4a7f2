pub mod activation;
pub mod bank;
pub mod profile;
pub mod quiz;
pub mod training;
