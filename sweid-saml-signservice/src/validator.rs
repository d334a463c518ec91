//! SAD validation at the signature service.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sweid_saml::{Assertion, names};
use tracing::{debug, info};

use crate::claims::SadClaims;
use crate::config::SadConfig;
use crate::error::{SadErrorCode, SadValidationError};
use crate::factory::transaction_id;
use crate::keys::TrustedKeys;
use crate::request::SadRequest;
use crate::token::SadToken;
use crate::verification::{
    validate_audience, validate_bound_attribute, validate_issuer, validate_loa, validate_subject,
    validate_transaction,
};
use crate::verifier::SadVerifier;

/// Validates a SAD against the assertion it is bound to.
///
/// Rules run in a fixed order and the first failure is reported:
///
/// | # | Rule | Code |
/// |---|------|------|
/// | 1 | the token decodes | `MALFORMED` |
/// | 2 | a key registered for the assertion issuer verifies the signature | `BAD_SIGNATURE` |
/// | 3 | `exp` / `iat` within the clock skew | `EXPIRED` / `NOT_YET_VALID` |
/// | 4 | `aud` is the expected audience | `AUDIENCE_MISMATCH` |
/// | 5 | `jti` is the assertion's transaction id | `TRANSACTION_MISMATCH` |
/// | 6 | `attr` names a released attribute with a value | `ATTRIBUTE_MISMATCH` |
/// | 7 | `iss` is the assertion issuer | `ISSUER_MISMATCH` |
/// | 8 | `sub` is the value of the `attr` attribute | `SUBJECT_MISMATCH` |
/// | 9 | `loa` is the assertion's authentication context | `LOA_MISMATCH` |
///
/// [`SadValidator::validate_for_request`] adds three rules for the SAD
/// request:
///
/// | # | Rule | Code |
/// |---|------|------|
/// | 10 | `irt` is the request ID | `IN_RESPONSE_TO_MISMATCH` |
/// | 11 | `docs` is the requested document count | `DOCUMENT_COUNT_MISMATCH` |
/// | 12 | `reqid` is the sign request ID | `SIGN_REQUEST_ID_MISMATCH` |
///
/// # Example
///
/// ```
/// use sweid_saml::{Assertion, Attribute, AttributeStatement, AuthnStatement, names};
/// use sweid_saml_signservice::{SadErrorCode, SadFactory, SadValidator, SigningAlgorithm, SigningKey, TrustedKeys};
///
/// let loa3 = "http://id.elegnamnden.se/loa/1.0/loa3";
/// let assertion = Assertion::new("_a1", "https://idp.example.se")
///     .with_authn_statement(AuthnStatement::new(chrono::Utc::now(), loa3))
///     .with_attribute_statement(AttributeStatement::new(vec![Attribute::new(
///         names::PERSONAL_IDENTITY_NUMBER,
///         ["199001011234"],
///     )]));
///
/// let key = SigningKey::generate_ed25519();
/// let factory = SadFactory::new("https://idp.example.se", key.clone(), SigningAlgorithm::EdDsa).unwrap();
/// let token = factory
///     .create(&assertion, "https://sp.example.org", names::PERSONAL_IDENTITY_NUMBER, loa3, 300)
///     .unwrap()
///     .to_string();
///
/// let validator = SadValidator::new(
///     TrustedKeys::new().with_key("https://idp.example.se", key.verifying_key()),
/// );
/// assert!(validator.validate(&token, &assertion, "https://sp.example.org").is_ok());
///
/// let err = validator.validate(&token, &assertion, "https://other.example.org").unwrap_err();
/// assert_eq!(err.code, SadErrorCode::AudienceMismatch);
/// ```
#[derive(Debug, Clone)]
pub struct SadValidator {
    verifier: SadVerifier,
}

impl SadValidator {
    /// Creates a validator with the default configuration.
    #[must_use]
    pub fn new(trusted: TrustedKeys) -> Self {
        Self {
            verifier: SadVerifier::new(trusted),
        }
    }

    /// Creates a validator from configuration.
    #[must_use]
    pub fn from_config(trusted: TrustedKeys, config: &SadConfig) -> Self {
        Self {
            verifier: SadVerifier::from_config(trusted, config),
        }
    }

    /// Sets the allowed clock skew.
    #[must_use]
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.verifier = self.verifier.with_clock_skew(skew);
        self
    }

    /// Returns the underlying verifier.
    #[must_use]
    pub fn verifier(&self) -> &SadVerifier {
        &self.verifier
    }

    /// Validates a compact token at the current time.
    ///
    /// # Errors
    ///
    /// See [`SadValidator::validate_at`].
    pub fn validate(
        &self,
        compact: &str,
        assertion: &Assertion,
        expected_audience: &str,
    ) -> Result<SadClaims, SadValidationError> {
        self.validate_at(compact, assertion, expected_audience, Utc::now())
    }

    /// Validates a compact token at `now`, running rules 1 to 9.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate_at(
        &self,
        compact: &str,
        assertion: &Assertion,
        expected_audience: &str,
        now: DateTime<Utc>,
    ) -> Result<SadClaims, SadValidationError> {
        let result = self.check(compact, assertion, expected_audience, now);
        log_outcome(&result, &assertion.id);
        result
    }

    /// Validates a SAD answering `request`, running rules 1 to 12.
    ///
    /// The expected audience is the request's requester.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate_for_request(
        &self,
        compact: &str,
        assertion: &Assertion,
        request: &SadRequest,
        now: DateTime<Utc>,
    ) -> Result<SadClaims, SadValidationError> {
        let result = self
            .check(compact, assertion, &request.requester_id, now)
            .and_then(|claims| {
                check_request(&claims, request)?;
                Ok(claims)
            });
        log_outcome(&result, &assertion.id);
        result
    }

    /// Locates the `sad` attribute in the assertion and validates it
    /// against `request`.
    ///
    /// # Errors
    ///
    /// Returns `NO_SAD_ATTRIBUTE` if the assertion carries no SAD, and
    /// otherwise as [`SadValidator::validate_for_request`].
    pub fn validate_assertion(
        &self,
        assertion: &Assertion,
        request: &SadRequest,
        now: DateTime<Utc>,
    ) -> Result<SadClaims, SadValidationError> {
        let Some(compact) = assertion
            .attribute(names::SAD)
            .and_then(|a| a.first_value())
            .filter(|v| !v.is_empty())
        else {
            let err = SadValidationError::new(
                SadErrorCode::NoSadAttribute,
                format!("assertion '{}' carries no sad attribute", assertion.id),
            );
            info!(assertion = %assertion.id, code = %err.code, "SAD rejected");
            return Err(err);
        };
        self.validate_for_request(compact, assertion, request, now)
    }

    fn check(
        &self,
        compact: &str,
        assertion: &Assertion,
        expected_audience: &str,
        now: DateTime<Utc>,
    ) -> Result<SadClaims, SadValidationError> {
        let token = SadToken::parse(compact)?;
        let claims = self
            .verifier
            .verify_issued_by_at(&token, &assertion.issuer, now)?;

        validate_audience(expected_audience, &claims.aud)?;
        validate_transaction(&transaction_id(assertion), &claims.jti)?;
        let bound_value = validate_bound_attribute(assertion, &claims.attr)?;
        validate_issuer(&assertion.issuer, &claims.iss)?;
        validate_subject(bound_value, &claims.sub)?;
        validate_loa(assertion.authn_context_class_ref(), &claims.loa)?;

        Ok(claims)
    }
}

fn check_request(claims: &SadClaims, request: &SadRequest) -> Result<(), SadValidationError> {
    if claims.in_response_to() != Some(request.id.as_str()) {
        return Err(SadValidationError::new(
            SadErrorCode::InResponseToMismatch,
            format!(
                "SAD answers '{}', expected request '{}'",
                claims.in_response_to().unwrap_or("<none>"),
                request.id
            ),
        ));
    }
    if claims.document_count() != Some(request.doc_count) {
        return Err(SadValidationError::new(
            SadErrorCode::DocumentCountMismatch,
            format!(
                "SAD covers {} document(s), {} requested",
                claims
                    .document_count()
                    .map_or_else(|| "<none>".to_string(), |n| n.to_string()),
                request.doc_count
            ),
        ));
    }
    if claims.sign_request_id() != Some(request.sign_request_id.as_str()) {
        return Err(SadValidationError::new(
            SadErrorCode::SignRequestIdMismatch,
            format!(
                "SAD is for sign request '{}', expected '{}'",
                claims.sign_request_id().unwrap_or("<none>"),
                request.sign_request_id
            ),
        ));
    }
    Ok(())
}

fn log_outcome(result: &Result<SadClaims, SadValidationError>, assertion_id: &str) {
    match result {
        Ok(claims) => debug!(assertion = %assertion_id, jti = %claims.jti, "SAD accepted"),
        Err(err) => info!(
            assertion = %assertion_id,
            code = %err.code,
            reason = %err.message,
            "SAD rejected"
        ),
    }
}
