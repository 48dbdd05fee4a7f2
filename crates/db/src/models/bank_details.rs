//! Bank details model.

use doer_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `bank_details` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct BankDetails {
    pub id: DbId,
    pub doer_id: DbId,
    pub account_holder_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub upi_id: Option<String>,
    pub is_verified: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for saving a doer's bank details (insert or replace).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaveBankDetails {
    pub account_holder_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub upi_id: Option<String>,
}
