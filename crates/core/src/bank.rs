//! Bank detail format checks and display masking.
//!
//! The activation tracker stores whatever it is given; these checks run in
//! the form layer before a submission reaches it.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// IFSC: four bank letters, a literal zero, six branch characters.
static IFSC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{4}0[A-Z0-9]{6}$").expect("valid IFSC regex"));

/// UPI virtual payment address: `handle@provider`.
static UPI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._-]{2,256}@[a-zA-Z]{2,64}$").expect("valid UPI regex")
});

pub const MIN_ACCOUNT_DIGITS: usize = 9;
pub const MAX_ACCOUNT_DIGITS: usize = 18;

/// Number of trailing account digits left visible by [`mask_account_number`].
const VISIBLE_DIGITS: usize = 4;

/// Uppercase and trim an IFSC code.
pub fn normalize_ifsc(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Validate an (already normalized) IFSC code.
pub fn validate_ifsc(code: &str) -> Result<(), CoreError> {
    if IFSC_RE.is_match(code) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid IFSC code '{code}'. Expected 4 letters, 0, then 6 letters or digits"
        )))
    }
}

/// Validate a bank account number: digits only, 9 to 18 of them.
pub fn validate_account_number(number: &str) -> Result<(), CoreError> {
    let len = number.len();
    if !number.chars().all(|c| c.is_ascii_digit())
        || !(MIN_ACCOUNT_DIGITS..=MAX_ACCOUNT_DIGITS).contains(&len)
    {
        return Err(CoreError::Validation(format!(
            "Account number must be {MIN_ACCOUNT_DIGITS} to {MAX_ACCOUNT_DIGITS} digits"
        )));
    }
    Ok(())
}

/// Validate an optional UPI id. Empty strings are treated as absent.
pub fn validate_upi_id(upi_id: Option<&str>) -> Result<(), CoreError> {
    match upi_id.map(str::trim) {
        None | Some("") => Ok(()),
        Some(id) if UPI_RE.is_match(id) => Ok(()),
        Some(id) => Err(CoreError::Validation(format!("Invalid UPI id '{id}'"))),
    }
}

/// Replace all but the last four digits with `*`.
pub fn mask_account_number(number: &str) -> String {
    let len = number.chars().count();
    if len <= VISIBLE_DIGITS {
        return number.to_string();
    }
    number
        .chars()
        .enumerate()
        .map(|(i, c)| if i < len - VISIBLE_DIGITS { '*' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ifsc_accepts_canonical_codes() {
        assert!(validate_ifsc("SBIN0001234").is_ok());
        assert!(validate_ifsc("HDFC0ABC123").is_ok());
    }

    #[test]
    fn ifsc_rejects_bad_codes() {
        assert!(validate_ifsc("SBIN1001234").is_err());
        assert!(validate_ifsc("SBI00012345").is_err());
        assert!(validate_ifsc("sbin0001234").is_err());
        assert!(validate_ifsc("SBIN000123").is_err());
    }

    #[test]
    fn normalize_then_validate_lowercase_ifsc() {
        let code = normalize_ifsc(" sbin0001234 ");
        assert_eq!(code, "SBIN0001234");
        assert!(validate_ifsc(&code).is_ok());
    }

    #[test]
    fn account_number_length_and_digits() {
        assert!(validate_account_number("123456789").is_ok());
        assert!(validate_account_number("123456789012345678").is_ok());
        assert!(validate_account_number("12345678").is_err());
        assert!(validate_account_number("1234567890123456789").is_err());
        assert!(validate_account_number("12345678a").is_err());
    }

    #[test]
    fn upi_is_optional() {
        assert!(validate_upi_id(None).is_ok());
        assert!(validate_upi_id(Some("")).is_ok());
        assert!(validate_upi_id(Some("ravi.k@okaxis")).is_ok());
        assert!(validate_upi_id(Some("no-at-sign")).is_err());
    }

    #[test]
    fn masking_keeps_last_four() {
        assert_eq!(mask_account_number("123456789012"), "********9012");
        assert_eq!(mask_account_number("1234"), "1234");
    }
}
