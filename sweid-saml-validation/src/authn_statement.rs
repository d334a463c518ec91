//! Authentication statement rules.

use sweid_saml::{Assertion, AuthnStatement, LevelOfAssurance};
use tracing::{debug, info};

use crate::context::{ValidationContext, ValidationResult};
use crate::error::{ValidationErrorCode, ValidationFailure};

/// Validates the first authentication statement of `assertion`.
///
/// | # | Rule | Code |
/// |---|------|------|
/// | 1 | a statement exists | `MISSING_AUTHN_STATEMENT` |
/// | 2 | `AuthnInstant` is not in the future | `AUTHN_INSTANT_IN_FUTURE` |
/// | 3 | `AuthnInstant` is within the allowed age | `AUTHN_TOO_OLD` |
/// | 4 | `SessionNotOnOrAfter`, if present, has not passed | `SESSION_EXPIRED` |
/// | 5 | an authentication context class is given | `MISSING_AUTHN_CONTEXT` |
/// | 6 | the LoA is known and allowed | `UNSUPPORTED_LOA` |
/// | 7 | the LoA was requested, when any were | `LOA_NOT_REQUESTED` |
/// | 8 | holder-of-key was used for a holder-of-key LoA | `HOLDER_OF_KEY_REQUIRED` |
pub fn validate(assertion: &Assertion, ctx: &mut ValidationContext<'_>) -> ValidationResult {
    let outcome = check(assertion, ctx).map(|_| ());
    ctx.record(outcome)
}

/// Runs the rules and returns the asserted level on success.
pub(crate) fn check(
    assertion: &Assertion,
    ctx: &ValidationContext<'_>,
) -> Result<LevelOfAssurance, ValidationFailure> {
    let Some(statement) = assertion.authn_statements.first() else {
        return Err(ValidationFailure::new(
            ValidationErrorCode::MissingAuthnStatement,
            format!("assertion '{}' has no authentication statement", assertion.id),
        ));
    };
    let loa = check_statement(statement, ctx).inspect_err(|failure| {
        info!(assertion = %assertion.id, code = %failure.code, "authn statement rejected");
    })?;
    debug!(assertion = %assertion.id, loa = %loa, "authn statement accepted");
    Ok(loa)
}

fn check_statement(
    statement: &AuthnStatement,
    ctx: &ValidationContext<'_>,
) -> Result<LevelOfAssurance, ValidationFailure> {
    let config = ctx.config();
    let params = ctx.params();

    if ctx.is_in_future(statement.authn_instant) {
        return Err(ValidationFailure::new(
            ValidationErrorCode::AuthnInstantInFuture,
            format!("authn instant {} is in the future", statement.authn_instant),
        ));
    }
    if ctx.is_older_than(statement.authn_instant, config.max_authn_age) {
        return Err(ValidationFailure::new(
            ValidationErrorCode::AuthnTooOld,
            format!(
                "authn instant {} is older than {} seconds",
                statement.authn_instant,
                config.max_authn_age.as_secs()
            ),
        ));
    }
    if let Some(session_end) = statement
        .session_not_on_or_after
        .filter(|end| ctx.has_passed(*end))
    {
        return Err(ValidationFailure::new(
            ValidationErrorCode::SessionExpired,
            format!("session ended at {session_end}"),
        ));
    }

    let Some(uri) = statement
        .authn_context_class_ref
        .as_deref()
        .filter(|uri| !uri.is_empty())
    else {
        return Err(ValidationFailure::new(
            ValidationErrorCode::MissingAuthnContext,
            "authn statement has no authentication context class reference",
        ));
    };
    let loa = match LevelOfAssurance::from_uri(uri) {
        Ok(loa) if config.allowed_loas.contains(loa) => loa,
        Ok(_) => {
            return Err(ValidationFailure::new(
                ValidationErrorCode::UnsupportedLoa,
                format!("level of assurance '{uri}' is not accepted"),
            ));
        }
        Err(err) => {
            return Err(ValidationFailure::new(
                ValidationErrorCode::UnsupportedLoa,
                err.to_string(),
            ));
        }
    };

    if !params.requested_loas.is_empty() && !params.requested_loas.iter().any(|r| r == uri) {
        return Err(ValidationFailure::new(
            ValidationErrorCode::LoaNotRequested,
            format!(
                "level of assurance '{uri}' was not requested (requested: {})",
                params.requested_loas.join(", ")
            ),
        ));
    }

    if config.holder_of_key_loas.contains(loa) && !params.holder_of_key {
        return Err(ValidationFailure::new(
            ValidationErrorCode::HolderOfKeyRequired,
            format!("level of assurance '{uri}' requires holder-of-key authentication"),
        ));
    }
    Ok(loa)
}
