//! Handlers for the doer's payout bank details.
//!
//! The form is validated here; the tracker stores whatever it is given.
//! Account numbers never leave the server unmasked.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use doer_activation::{ActivationSummary, SyncStatus};
use doer_core::bank::{
    mask_account_number, normalize_ifsc, validate_account_number, validate_ifsc, validate_upi_id,
};
use doer_core::error::CoreError;
use doer_core::types::{DbId, Timestamp};
use doer_db::models::bank_details::{BankDetails, SaveBankDetails};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /activation/bank-details`.
#[derive(Debug, Deserialize, Validate)]
pub struct BankDetailsForm {
    #[validate(length(min = 2, max = 100, message = "Account holder name must be 2-100 characters"))]
    pub account_holder_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub upi_id: Option<String>,
}

impl BankDetailsForm {
    /// Validate and normalize into the stored shape.
    ///
    /// Surrounding whitespace is trimmed, the IFSC code is uppercased, and
    /// an empty UPI id is treated as absent.
    pub fn into_save(self) -> Result<SaveBankDetails, CoreError> {
        let form = BankDetailsForm {
            account_holder_name: self.account_holder_name.trim().to_string(),
            account_number: self.account_number.trim().to_string(),
            ifsc_code: normalize_ifsc(&self.ifsc_code),
            upi_id: self
                .upi_id
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
        };

        form.validate()
            .map_err(|e| CoreError::validation(e.to_string()))?;
        validate_account_number(&form.account_number)?;
        validate_ifsc(&form.ifsc_code)?;
        validate_upi_id(form.upi_id.as_deref())?;

        Ok(SaveBankDetails {
            account_holder_name: form.account_holder_name,
            account_number: form.account_number,
            ifsc_code: form.ifsc_code,
            upi_id: form.upi_id,
        })
    }
}

/// Bank details as returned to the doer.
#[derive(Debug, Serialize)]
pub struct BankDetailsView {
    pub id: DbId,
    pub account_holder_name: String,
    pub account_number_masked: String,
    pub ifsc_code: String,
    pub upi_id: Option<String>,
    pub is_verified: bool,
    pub updated_at: Timestamp,
}

impl From<&BankDetails> for BankDetailsView {
    fn from(row: &BankDetails) -> Self {
        Self {
            id: row.id,
            account_holder_name: row.account_holder_name.clone(),
            account_number_masked: mask_account_number(&row.account_number),
            ifsc_code: row.ifsc_code.clone(),
            upi_id: row.upi_id.clone(),
            is_verified: row.is_verified,
            updated_at: row.updated_at,
        }
    }
}

/// Result of a bank details submission.
#[derive(Debug, Serialize)]
pub struct BankDetailsResult {
    pub bank_details: Option<BankDetailsView>,
    pub activation: ActivationSummary,
}

// ---------------------------------------------------------------------------
// GET /activation/bank-details
// ---------------------------------------------------------------------------

pub async fn get_bank_details(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut tracker = state.tracker(auth.doer_id);
    tracker.reload().await;
    if tracker.context().sync == SyncStatus::Failed {
        return Err(AppError::activation_failed(tracker.context()));
    }

    let details = tracker
        .context()
        .bank_details
        .as_ref()
        .map(BankDetailsView::from)
        .ok_or(CoreError::NotFound {
            entity: "BankDetails",
            id: auth.doer_id,
        })?;

    Ok(Json(DataResponse { data: details }))
}

// ---------------------------------------------------------------------------
// POST /activation/bank-details
// ---------------------------------------------------------------------------

/// Submit or replace the doer's bank details. Resubmission resets
/// verification.
pub async fn submit_bank_details(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(form): Json<BankDetailsForm>,
) -> AppResult<impl IntoResponse> {
    let input = form.into_save()?;

    let mut tracker = state.tracker(auth.doer_id);
    if !tracker.submit_bank_details(&input).await {
        return Err(AppError::activation_failed(tracker.context()));
    }

    let ctx = tracker.context();
    Ok(Json(DataResponse {
        data: BankDetailsResult {
            bank_details: ctx.bank_details.as_ref().map(BankDetailsView::from),
            activation: ctx.summary(),
        },
    }))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn form() -> BankDetailsForm {
        BankDetailsForm {
            account_holder_name: "  Asha Rao ".to_string(),
            account_number: "123456789012".to_string(),
            ifsc_code: "hdfc0001234".to_string(),
            upi_id: Some("".to_string()),
        }
    }

    #[test]
    fn normalizes_valid_form() {
        let saved = form().into_save().unwrap();
        assert_eq!(saved.account_holder_name, "Asha Rao");
        assert_eq!(saved.ifsc_code, "HDFC0001234");
        assert_eq!(saved.upi_id, None);
    }

    #[test]
    fn rejects_short_holder_name() {
        let bad = BankDetailsForm {
            account_holder_name: "A".to_string(),
            ..form()
        };
        assert_matches!(bad.into_save(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_malformed_ifsc() {
        let bad = BankDetailsForm {
            ifsc_code: "HDFC1001234".to_string(),
            ..form()
        };
        assert_matches!(bad.into_save(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_non_digit_account_number() {
        let bad = BankDetailsForm {
            account_number: "12345ABC9012".to_string(),
            ..form()
        };
        assert_matches!(bad.into_save(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_malformed_upi() {
        let bad = BankDetailsForm {
            upi_id: Some("no-at-sign".to_string()),
            ..form()
        };
        assert_matches!(bad.into_save(), Err(CoreError::Validation(_)));
    }
}
