//! Attribute statement rules.

use sweid_saml::{Assertion, AttributeStatement};
use tracing::{debug, info};

use crate::context::{ValidationContext, ValidationResult};
use crate::error::{ValidationErrorCode, ValidationFailure};

/// Validates the attributes released in `assertion`.
///
/// Attributes of every statement are considered together.
///
/// | # | Rule | Code |
/// |---|------|------|
/// | 1 | an attribute statement exists | `MISSING_ATTRIBUTE_STATEMENT` |
/// | 2 | every attribute of the required attribute set is present | `MISSING_REQUIRED_ATTRIBUTE` |
/// | 3 | every attribute requested as required is present | `MISSING_REQUIRED_ATTRIBUTE` |
/// | 4 | every attribute has a non-empty value | `MALFORMED_ATTRIBUTE_VALUE` |
/// | 5 | values follow the attribute's format (strict mode only) | `MALFORMED_ATTRIBUTE_VALUE` |
/// | 6 | released values match the principal selection | `PRINCIPAL_SELECTION_MISMATCH` |
pub fn validate(assertion: &Assertion, ctx: &mut ValidationContext<'_>) -> ValidationResult {
    let outcome = check(assertion, ctx);
    ctx.record(outcome)
}

pub(crate) fn check(
    assertion: &Assertion,
    ctx: &mut ValidationContext<'_>,
) -> Result<(), ValidationFailure> {
    if assertion.attribute_statements.is_empty() {
        return Err(ValidationFailure::new(
            ValidationErrorCode::MissingAttributeStatement,
            format!("assertion '{}' has no attribute statement", assertion.id),
        ));
    }
    let released = AttributeStatement::new(
        assertion
            .attribute_statements
            .iter()
            .flat_map(|s| s.attributes.iter().cloned())
            .collect(),
    );
    let params = ctx.params();

    if let Some(set) = params.required_attribute_set {
        set.validate_attributes(&assertion.id, &released, &params.requested_attributes)
            .map_err(|err| {
                ValidationFailure::new(ValidationErrorCode::MissingRequiredAttribute, err.to_string())
            })?;
    } else if let Some(missing) = params
        .requested_attributes
        .iter()
        .find(|r| r.is_required && !released.contains(&r.name))
    {
        info!(attribute = %missing.name, assertion = %assertion.id, "required requested attribute missing");
        return Err(ValidationFailure::new(
            ValidationErrorCode::MissingRequiredAttribute,
            format!(
                "attribute '{}' is requested as required but does not appear in assertion '{}'",
                missing.name, assertion.id
            ),
        ));
    }

    for attribute in &released.attributes {
        if attribute.values.is_empty() || attribute.values.iter().any(|v| v.trim().is_empty()) {
            return Err(ValidationFailure::new(
                ValidationErrorCode::MalformedAttributeValue,
                format!("attribute '{}' has an empty value", attribute.name),
            ));
        }
        let Some(template) = attribute.template() else {
            continue;
        };
        if let Some(bad) = attribute.values.iter().find(|v| !template.format.check(v)) {
            ctx.recommend(ValidationFailure::new(
                ValidationErrorCode::MalformedAttributeValue,
                format!(
                    "value '{bad}' of attribute '{}' is not a valid {:?}",
                    template.friendly_name, template.format
                ),
            ))?;
        }
    }

    if let Some(selection) = &params.principal_selection {
        selection.matches(&released).map_err(|expected| {
            info!(
                attribute = %expected.name,
                assertion = %assertion.id,
                "released value does not match principal selection"
            );
            ValidationFailure::new(
                ValidationErrorCode::PrincipalSelectionMismatch,
                format!(
                    "attribute '{}' does not carry the selected value '{}'",
                    expected.name, expected.value
                ),
            )
        })?;
    }

    debug!(
        assertion = %assertion.id,
        attributes = released.attributes.len(),
        "attribute statement accepted"
    );
    Ok(())
}
