//! Subject confirmation rules.

use sweid_saml::{Assertion, SubjectConfirmation};
use tracing::{debug, info};

use crate::context::{ValidationContext, ValidationResult};
use crate::error::{ValidationErrorCode, ValidationFailure};

/// Validates the subject confirmations of `assertion`.
///
/// At least one confirmation must pass every rule:
///
/// | # | Rule | Code |
/// |---|------|------|
/// | 1 | a confirmation exists | `MISSING_SUBJECT_CONFIRMATION` |
/// | 2 | bearer method, or holder-of-key when holder-of-key was used | `NO_BEARER_CONFIRMATION` |
/// | 3 | `Recipient` is the assertion consumer URL | `INVALID_SUBJECT_CONFIRMATION` |
/// | 4 | `NotOnOrAfter` present and not passed | `INVALID_SUBJECT_CONFIRMATION` |
/// | 5 | `InResponseTo` is the authentication request ID | `INVALID_SUBJECT_CONFIRMATION` |
/// | 6 | `Address` is a valid address, when any are configured | `INVALID_SUBJECT_CONFIRMATION` |
pub fn validate(assertion: &Assertion, ctx: &mut ValidationContext<'_>) -> ValidationResult {
    let outcome = check(assertion, ctx);
    ctx.record(outcome)
}

pub(crate) fn check(
    assertion: &Assertion,
    ctx: &ValidationContext<'_>,
) -> Result<(), ValidationFailure> {
    let confirmations = assertion
        .subject
        .as_ref()
        .map(|s| s.confirmations.as_slice())
        .unwrap_or_default();
    if confirmations.is_empty() {
        return Err(ValidationFailure::new(
            ValidationErrorCode::MissingSubjectConfirmation,
            format!("assertion '{}' has no subject confirmation", assertion.id),
        ));
    }

    let holder_of_key = ctx.params().holder_of_key;
    let candidates: Vec<&SubjectConfirmation> = confirmations
        .iter()
        .filter(|c| c.is_bearer() || (holder_of_key && c.is_holder_of_key()))
        .collect();
    if candidates.is_empty() {
        info!(assertion = %assertion.id, holder_of_key, "no usable confirmation method");
        return Err(ValidationFailure::new(
            ValidationErrorCode::NoBearerConfirmation,
            format!(
                "assertion '{}' has no {} subject confirmation",
                assertion.id,
                if holder_of_key { "bearer or holder-of-key" } else { "bearer" }
            ),
        ));
    }

    let mut last_reason = String::new();
    for confirmation in candidates {
        match check_confirmation(confirmation, ctx) {
            Ok(()) => {
                debug!(
                    assertion = %assertion.id,
                    method = %confirmation.method,
                    "subject confirmation accepted"
                );
                return Ok(());
            }
            Err(reason) => last_reason = reason,
        }
    }
    info!(assertion = %assertion.id, reason = %last_reason, "no subject confirmation accepted");
    Err(ValidationFailure::new(
        ValidationErrorCode::InvalidSubjectConfirmation,
        format!("assertion '{}': {last_reason}", assertion.id),
    ))
}

fn check_confirmation(
    confirmation: &SubjectConfirmation,
    ctx: &ValidationContext<'_>,
) -> Result<(), String> {
    let params = ctx.params();
    let Some(data) = &confirmation.data else {
        return Err("subject confirmation has no data".to_string());
    };

    match data.recipient.as_deref() {
        None => return Err("subject confirmation has no recipient".to_string()),
        Some(recipient) if recipient != params.assertion_consumer_url => {
            return Err(format!(
                "recipient '{recipient}' is not '{}'",
                params.assertion_consumer_url
            ));
        }
        Some(_) => {}
    }

    match data.not_on_or_after {
        None => return Err("subject confirmation has no NotOnOrAfter".to_string()),
        Some(noa) if ctx.has_passed(noa) => {
            return Err(format!("subject confirmation expired at {noa}"));
        }
        Some(_) => {}
    }

    match (data.in_response_to.as_deref(), params.authn_request_id.as_deref()) {
        (None, _) => return Err("subject confirmation has no InResponseTo".to_string()),
        (Some(actual), Some(expected)) if actual != expected => {
            return Err(format!("InResponseTo '{actual}' is not '{expected}'"));
        }
        _ => {}
    }

    if !params.valid_addresses.is_empty() {
        match data.address.as_deref() {
            None => return Err("subject confirmation has no address".to_string()),
            Some(address) if !params.valid_addresses.iter().any(|a| a == address) => {
                return Err(format!("address '{address}' is not a valid client address"));
            }
            Some(_) => {}
        }
    }
    Ok(())
}
