//! Assertion rules.

use sweid_saml::{
    Assertion, Conditions, LevelOfAssurance, NAMEID_FORMAT_PERSISTENT, NAMEID_FORMAT_TRANSIENT,
};
use tracing::{debug, info};

use crate::context::{ValidationContext, ValidationResult};
use crate::error::{ValidationErrorCode, ValidationFailure};
use crate::{attribute_statement, authn_statement, subject_confirmation};

/// Validates an assertion against the Swedish eID profile.
///
/// Rules run in order and the first failure is recorded:
///
/// 1. the issuer is the expected identity provider (`ISSUER_MISMATCH`)
/// 2. the subject has a `NameID` value (`MISSING_SUBJECT`, `MISSING_NAME_ID`)
/// 3. the `NameID` format is persistent or transient; a warning outside
///    strict mode (`INVALID_NAME_ID_FORMAT`)
/// 4. a subject confirmation is accepted, see
///    [`subject_confirmation::validate`](crate::subject_confirmation::validate)
/// 5. conditions carry `NotBefore` and `NotOnOrAfter`, the current time is
///    inside them, and an audience restriction names the service provider
///    (`MISSING_CONDITIONS`, `ASSERTION_NOT_YET_VALID`, `ASSERTION_EXPIRED`,
///    `AUDIENCE_MISMATCH`)
/// 6. an authentication statement and an attribute statement are present
/// 7. the authentication statement, see
///    [`authn_statement::validate`](crate::authn_statement::validate)
/// 8. the attribute statements, see
///    [`attribute_statement::validate`](crate::attribute_statement::validate)
pub fn validate(assertion: &Assertion, ctx: &mut ValidationContext<'_>) -> ValidationResult {
    let outcome = check(assertion, ctx).map(|_| ());
    ctx.record(outcome)
}

/// Runs every rule and returns the asserted level of assurance.
pub(crate) fn check(
    assertion: &Assertion,
    ctx: &mut ValidationContext<'_>,
) -> Result<LevelOfAssurance, ValidationFailure> {
    let outcome = check_all(assertion, ctx);
    match &outcome {
        Ok(loa) => debug!(assertion = %assertion.id, %loa, "assertion accepted"),
        Err(failure) => info!(
            assertion = %assertion.id,
            code = %failure.code,
            reason = %failure.message,
            "assertion rejected"
        ),
    }
    outcome
}

fn check_all(
    assertion: &Assertion,
    ctx: &mut ValidationContext<'_>,
) -> Result<LevelOfAssurance, ValidationFailure> {
    check_issuer(assertion, ctx)?;
    check_subject(assertion, ctx)?;
    subject_confirmation::check(assertion, ctx)?;
    check_conditions(assertion, ctx)?;

    if assertion.authn_statements.is_empty() {
        return Err(ValidationFailure::new(
            ValidationErrorCode::MissingAuthnStatement,
            format!("assertion '{}' has no authentication statement", assertion.id),
        ));
    }
    if assertion.attribute_statements.is_empty() {
        return Err(ValidationFailure::new(
            ValidationErrorCode::MissingAttributeStatement,
            format!("assertion '{}' has no attribute statement", assertion.id),
        ));
    }

    let loa = authn_statement::check(assertion, ctx)?;
    attribute_statement::check(assertion, ctx)?;
    Ok(loa)
}

fn check_issuer(assertion: &Assertion, ctx: &ValidationContext<'_>) -> Result<(), ValidationFailure> {
    match ctx.params().idp_entity_id.as_deref() {
        Some(expected) if assertion.issuer != expected => Err(ValidationFailure::new(
            ValidationErrorCode::IssuerMismatch,
            format!("assertion issued by '{}', expected '{expected}'", assertion.issuer),
        )),
        _ => Ok(()),
    }
}

fn check_subject(
    assertion: &Assertion,
    ctx: &mut ValidationContext<'_>,
) -> Result<(), ValidationFailure> {
    let Some(subject) = &assertion.subject else {
        return Err(ValidationFailure::new(
            ValidationErrorCode::MissingSubject,
            format!("assertion '{}' has no subject", assertion.id),
        ));
    };
    let Some(name_id) = subject.name_id.as_ref().filter(|n| !n.value.is_empty()) else {
        return Err(ValidationFailure::new(
            ValidationErrorCode::MissingNameId,
            format!("assertion '{}' has no NameID value", assertion.id),
        ));
    };
    match name_id.format.as_deref() {
        Some(NAMEID_FORMAT_PERSISTENT | NAMEID_FORMAT_TRANSIENT) => Ok(()),
        other => ctx.recommend(ValidationFailure::new(
            ValidationErrorCode::InvalidNameIdFormat,
            format!(
                "NameID format '{}' is neither persistent nor transient",
                other.unwrap_or("unspecified")
            ),
        )),
    }
}

fn check_conditions(
    assertion: &Assertion,
    ctx: &ValidationContext<'_>,
) -> Result<(), ValidationFailure> {
    let missing = |what: &str| {
        ValidationFailure::new(
            ValidationErrorCode::MissingConditions,
            format!("assertion '{}' has no {what}", assertion.id),
        )
    };
    let conditions: &Conditions = assertion.conditions.as_ref().ok_or_else(|| missing("conditions"))?;
    let not_before = conditions.not_before.ok_or_else(|| missing("NotBefore condition"))?;
    let not_on_or_after = conditions
        .not_on_or_after
        .ok_or_else(|| missing("NotOnOrAfter condition"))?;

    if ctx.is_in_future(not_before) {
        return Err(ValidationFailure::new(
            ValidationErrorCode::AssertionNotYetValid,
            format!("assertion is not valid before {not_before}"),
        ));
    }
    if ctx.has_passed(not_on_or_after) {
        return Err(ValidationFailure::new(
            ValidationErrorCode::AssertionExpired,
            format!("assertion expired at {not_on_or_after}"),
        ));
    }

    let sp = ctx.params().sp_entity_id.as_str();
    if !conditions.has_audience(sp) {
        return Err(ValidationFailure::new(
            ValidationErrorCode::AudienceMismatch,
            format!("no audience restriction names '{sp}'"),
        ));
    }
    Ok(())
}
