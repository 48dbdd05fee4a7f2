//! Repository for the `bank_details` table.

use doer_core::types::DbId;
use sqlx::PgPool;

use crate::models::bank_details::{BankDetails, SaveBankDetails};

/// Column list for `bank_details` queries.
const COLUMNS: &str = "\
    id, doer_id, account_holder_name, account_number, ifsc_code, upi_id, \
    is_verified, created_at, updated_at";

/// Provides the single current bank account per doer.
pub struct BankDetailsRepo;

impl BankDetailsRepo {
    /// The doer's bank details, if submitted.
    pub async fn find_by_doer(
        pool: &PgPool,
        doer_id: DbId,
    ) -> Result<Option<BankDetails>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bank_details WHERE doer_id = $1");
        sqlx::query_as::<_, BankDetails>(&query)
            .bind(doer_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace the doer's bank details.
    ///
    /// A resubmission overwrites the account fields and clears
    /// `is_verified`; `created_at` keeps the first submission time.
    pub async fn upsert(
        pool: &PgPool,
        doer_id: DbId,
        input: &SaveBankDetails,
    ) -> Result<BankDetails, sqlx::Error> {
        let query = format!(
            "INSERT INTO bank_details \
                 (doer_id, account_holder_name, account_number, ifsc_code, upi_id, is_verified) \
             VALUES ($1, $2, $3, $4, $5, FALSE) \
             ON CONFLICT (doer_id) DO UPDATE SET \
                 account_holder_name = EXCLUDED.account_holder_name, \
                 account_number = EXCLUDED.account_number, \
                 ifsc_code = EXCLUDED.ifsc_code, \
                 upi_id = EXCLUDED.upi_id, \
                 is_verified = FALSE, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BankDetails>(&query)
            .bind(doer_id)
            .bind(&input.account_holder_name)
            .bind(&input.account_number)
            .bind(&input.ifsc_code)
            .bind(&input.upi_id)
            .fetch_one(pool)
            .await
    }
}
