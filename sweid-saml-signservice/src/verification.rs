//! Pure SAD validation rules.
//!
//! Each function checks one rule of SAD validation and nothing else. They
//! are deterministic, free of I/O and small enough for the Kani harnesses in
//! `proofs.rs`.
//!
//! # Rules
//!
//! | Function | Passes when | Error code |
//! |----------|-------------|------------|
//! | [`check_expiry`] | `exp >= now - skew` | `EXPIRED` |
//! | [`check_issued_at`] | `iat <= now + skew` | `NOT_YET_VALID` |
//! | [`validate_audience`] | `aud` equals the expected audience | `AUDIENCE_MISMATCH` |
//! | [`validate_transaction`] | `jti` equals the assertion's transaction id | `TRANSACTION_MISMATCH` |
//! | [`validate_bound_attribute`] | `attr` names an attribute with a non-empty value | `ATTRIBUTE_MISMATCH` |
//! | [`validate_issuer`] | `iss` equals the assertion issuer | `ISSUER_MISMATCH` |
//! | [`validate_subject`] | `sub` equals the bound attribute value | `SUBJECT_MISMATCH` |
//! | [`validate_loa`] | `loa` equals the assertion's authn context | `LOA_MISMATCH` |

use sweid_saml::Assertion;

use crate::error::{SadError, SadErrorCode, SadValidationError};

/// Checks that a token with expiry `exp` is still valid at `now`.
///
/// All values are seconds since the epoch. A token is expired iff
/// `exp < now - skew_secs`, so `exp == now` is valid at zero skew.
///
/// # Errors
///
/// Returns `SadError::Expired` if the token has expired.
///
/// # Examples
///
/// ```
/// use sweid_saml_signservice::check_expiry;
///
/// assert!(check_expiry(1000, 1000, 0).is_ok());
/// assert!(check_expiry(999, 1000, 0).is_err());
/// assert!(check_expiry(1000, 1015, 15).is_ok());
/// assert!(check_expiry(1000, 1016, 15).is_err());
/// ```
pub fn check_expiry(exp: i64, now: i64, skew_secs: i64) -> Result<(), SadError> {
    if exp < now.saturating_sub(skew_secs) {
        Err(SadError::Expired {
            expired_at: exp,
            now,
            skew_secs,
        })
    } else {
        Ok(())
    }
}

/// Checks that a token issued at `iat` is not from the future.
///
/// # Errors
///
/// Returns `SadError::IssuedInFuture` if `iat > now + skew_secs`.
///
/// # Examples
///
/// ```
/// use sweid_saml_signservice::check_issued_at;
///
/// assert!(check_issued_at(1015, 1000, 15).is_ok());
/// assert!(check_issued_at(1016, 1000, 15).is_err());
/// ```
pub fn check_issued_at(iat: i64, now: i64, skew_secs: i64) -> Result<(), SadError> {
    if iat > now.saturating_add(skew_secs) {
        Err(SadError::IssuedInFuture {
            issued_at: iat,
            now,
            skew_secs,
        })
    } else {
        Ok(())
    }
}

/// Checks the `aud` claim.
///
/// # Errors
///
/// Returns an `AUDIENCE_MISMATCH` error if the values differ.
///
/// # Examples
///
/// ```
/// use sweid_saml_signservice::validate_audience;
///
/// assert!(validate_audience("https://sp.example.org", "https://sp.example.org").is_ok());
/// assert!(validate_audience("https://sp.example.org", "https://other.example.org").is_err());
/// ```
pub fn validate_audience(expected: &str, token_audience: &str) -> Result<(), SadValidationError> {
    exact_match(
        SadErrorCode::AudienceMismatch,
        "audience",
        expected,
        token_audience,
    )
}

/// Checks the `jti` claim against the transaction id derived from the bound
/// assertion.
///
/// # Errors
///
/// Returns a `TRANSACTION_MISMATCH` error if the values differ.
pub fn validate_transaction(expected: &str, token_jti: &str) -> Result<(), SadValidationError> {
    exact_match(
        SadErrorCode::TransactionMismatch,
        "transaction id",
        expected,
        token_jti,
    )
}

/// Checks that `attr` names an attribute of the assertion whose first value
/// is non-empty, and returns that value.
///
/// # Errors
///
/// Returns an `ATTRIBUTE_MISMATCH` error otherwise.
pub fn validate_bound_attribute<'a>(
    assertion: &'a Assertion,
    attr: &str,
) -> Result<&'a str, SadValidationError> {
    match assertion.attribute(attr).and_then(|a| a.first_value()) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(SadValidationError::new(
            SadErrorCode::AttributeMismatch,
            format!("attribute '{attr}' in assertion '{}' has an empty value", assertion.id),
        )),
        None => Err(SadValidationError::new(
            SadErrorCode::AttributeMismatch,
            format!("attribute '{attr}' is not released in assertion '{}'", assertion.id),
        )),
    }
}

/// Checks the `iss` claim against the assertion issuer.
///
/// # Errors
///
/// Returns an `ISSUER_MISMATCH` error if the values differ.
pub fn validate_issuer(expected: &str, token_issuer: &str) -> Result<(), SadValidationError> {
    exact_match(SadErrorCode::IssuerMismatch, "issuer", expected, token_issuer)
}

/// Checks the `sub` claim against the bound attribute value.
///
/// # Errors
///
/// Returns a `SUBJECT_MISMATCH` error if the values differ.
pub fn validate_subject(expected: &str, token_subject: &str) -> Result<(), SadValidationError> {
    exact_match(
        SadErrorCode::SubjectMismatch,
        "subject",
        expected,
        token_subject,
    )
}

/// Checks the `loa` claim against the assertion's authentication context.
///
/// # Errors
///
/// Returns a `LOA_MISMATCH` error if the assertion has no authentication
/// context or the values differ.
pub fn validate_loa(expected: Option<&str>, token_loa: &str) -> Result<(), SadValidationError> {
    match expected {
        Some(expected) => exact_match(SadErrorCode::LoaMismatch, "level of assurance", expected, token_loa),
        None => Err(SadValidationError::new(
            SadErrorCode::LoaMismatch,
            format!("SAD states loa '{token_loa}' but the assertion has no authentication context"),
        )),
    }
}

fn exact_match(
    code: SadErrorCode,
    what: &str,
    expected: &str,
    actual: &str,
) -> Result<(), SadValidationError> {
    if expected == actual {
        Ok(())
    } else {
        Err(SadValidationError::new(
            code,
            format!("SAD {what} '{actual}' does not match expected '{expected}'"),
        ))
    }
}
