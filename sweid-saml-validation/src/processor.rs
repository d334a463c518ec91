//! The response processor.
//!
//! A response moves through a fixed sequence of states. Each step either
//! advances it or rejects it with the state it had reached:
//!
//! ```text
//! RECEIVED ──signature──▶ SIGNATURE_CHECKED ──assertion──▶ ASSERTION_VALIDATED
//!                                                                 │
//!                       ACCEPTED ◀──────────── SAD_VALIDATED ◀──sad┘
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use sweid_saml::{Assertion, LevelOfAssurance, Response};
use sweid_saml_signservice::{SadClaims, SadConfig, SadValidator};
use tracing::{debug, info, warn};

use crate::assertion;
use crate::config::ValidationConfig;
use crate::context::{ValidationContext, ValidationParameters};
use crate::error::{ResponseRejection, ValidationErrorCode, ValidationFailure};
use crate::trust::{AnchorTrustEngine, AssertionDecrypter, SignatureTrustEngine};

/// Where a response is in the processing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProcessingState {
    /// Parsed, nothing checked yet.
    Received,
    /// The response signature verified against a trust anchor.
    SignatureChecked,
    /// Response fields and the assertion passed every profile rule.
    AssertionValidated,
    /// The SAD, if one was expected, passed validation.
    SadValidated,
    /// The response is accepted.
    Accepted,
}

impl ProcessingState {
    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::SignatureChecked => "SIGNATURE_CHECKED",
            Self::AssertionValidated => "ASSERTION_VALIDATED",
            Self::SadValidated => "SAD_VALIDATED",
            Self::Accepted => "ACCEPTED",
        }
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedResponse {
    /// ID of the response
    pub response_id: String,
    /// The validated, decrypted assertion
    pub assertion: Assertion,
    /// Entity ID of the trust anchor that verified the response signature
    pub signer: Option<String>,
    /// The asserted level of assurance
    pub loa: LevelOfAssurance,
    /// Claims of the validated SAD, when one was expected
    pub sad: Option<SadClaims>,
    /// Profile deviations tolerated outside strict mode
    pub warnings: Vec<String>,
}

/// Validates SAML responses against the Swedish eID profile.
///
/// # Example
///
/// ```
/// use sweid_saml::Response;
/// use sweid_saml_validation::{
///     ProcessingState, ResponseProcessor, ValidationConfig, ValidationErrorCode, ValidationParameters,
/// };
///
/// let processor = ResponseProcessor::new(ValidationConfig::default());
/// let params = ValidationParameters::new("https://sp.example.org", "https://sp.example.org/acs");
///
/// let unsigned = Response::new("_r1", "https://idp.example.se");
/// let rejection = processor.process(&unsigned, &params, chrono::Utc::now()).unwrap_err();
///
/// assert_eq!(rejection.state, ProcessingState::Received);
/// assert_eq!(rejection.code, ValidationErrorCode::MissingSignature);
/// ```
pub struct ResponseProcessor<T = AnchorTrustEngine> {
    config: ValidationConfig,
    sad_config: SadConfig,
    trust_engine: T,
    decrypter: Option<Box<dyn AssertionDecrypter>>,
}

impl ResponseProcessor<AnchorTrustEngine> {
    /// Creates a processor that verifies signatures directly against the
    /// trust anchors' keys.
    #[must_use]
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            sad_config: SadConfig::default(),
            trust_engine: AnchorTrustEngine,
            decrypter: None,
        }
    }
}

impl<T: SignatureTrustEngine> ResponseProcessor<T> {
    /// Replaces the trust engine.
    #[must_use]
    pub fn with_trust_engine<E: SignatureTrustEngine>(self, trust_engine: E) -> ResponseProcessor<E> {
        ResponseProcessor {
            config: self.config,
            sad_config: self.sad_config,
            trust_engine,
            decrypter: self.decrypter,
        }
    }

    /// Sets the decrypter for encrypted assertions.
    #[must_use]
    pub fn with_decrypter(mut self, decrypter: impl AssertionDecrypter + 'static) -> Self {
        self.decrypter = Some(Box::new(decrypter));
        self
    }

    /// Sets the clock skew and algorithm allow-list used for SADs.
    #[must_use]
    pub fn with_sad_config(mut self, sad_config: SadConfig) -> Self {
        self.sad_config = sad_config;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Returns the SAD configuration.
    #[must_use]
    pub const fn sad_config(&self) -> &SadConfig {
        &self.sad_config
    }

    /// Processes `response` as received at `now`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResponseRejection`] naming the last state reached and the
    /// first rule that failed.
    pub fn process(
        &self,
        response: &Response,
        params: &ValidationParameters,
        now: DateTime<Utc>,
    ) -> Result<ProcessedResponse, ResponseRejection> {
        let outcome = self.run(response, params, now);
        match &outcome {
            Ok(processed) => info!(
                response = %response.id,
                loa = %processed.loa,
                warnings = processed.warnings.len(),
                "response accepted"
            ),
            Err(rejection) if is_trust_failure(rejection.code) => warn!(
                response = %response.id,
                state = %rejection.state,
                code = %rejection.code,
                reason = %rejection.message,
                "response rejected"
            ),
            Err(rejection) => info!(
                response = %response.id,
                state = %rejection.state,
                code = %rejection.code,
                reason = %rejection.message,
                "response rejected"
            ),
        }
        outcome
    }

    fn run(
        &self,
        response: &Response,
        params: &ValidationParameters,
        now: DateTime<Utc>,
    ) -> Result<ProcessedResponse, ResponseRejection> {
        let mut state = ProcessingState::Received;
        let reject = |state: ProcessingState| move |f: ValidationFailure| ResponseRejection::new(state, f);

        let signer = self
            .check_response_signature(response, params)
            .map_err(reject(state))?;
        advance(&mut state, ProcessingState::SignatureChecked, &response.id);

        let mut ctx = ValidationContext::new(&self.config, params, now);
        let (assertion, loa) = self
            .check_assertion_step(response, &mut ctx)
            .map_err(reject(state))?;
        advance(&mut state, ProcessingState::AssertionValidated, &response.id);

        let sad = self
            .check_sad(&assertion, params, now)
            .map_err(reject(state))?;
        advance(&mut state, ProcessingState::SadValidated, &response.id);

        advance(&mut state, ProcessingState::Accepted, &response.id);
        Ok(ProcessedResponse {
            response_id: response.id.clone(),
            assertion,
            signer,
            loa,
            sad,
            warnings: ctx.into_warnings(),
        })
    }

    fn check_response_signature(
        &self,
        response: &Response,
        params: &ValidationParameters,
    ) -> Result<Option<String>, ValidationFailure> {
        let Some(signature) = &response.signature else {
            return Err(ValidationFailure::new(
                ValidationErrorCode::MissingSignature,
                format!("response '{}' is not signed", response.id),
            ));
        };
        let Some(issuer) = response
            .issuer
            .as_deref()
            .or(params.idp_entity_id.as_deref())
        else {
            return Err(ValidationFailure::new(
                ValidationErrorCode::BadSignature,
                format!("response '{}' names no issuer to resolve signing keys for", response.id),
            ));
        };
        let verdict = self
            .trust_engine
            .verify_signature(signature, issuer, &params.trust_anchors);
        if !verdict.valid {
            return Err(ValidationFailure::new(
                ValidationErrorCode::BadSignature,
                format!(
                    "signature of response '{}' not verified by a trust anchor of '{issuer}'",
                    response.id
                ),
            ));
        }
        Ok(verdict.signer)
    }

    /// Response fields, assertion selection, decryption, the assertion
    /// signature and the assertion rules.
    fn check_assertion_step(
        &self,
        response: &Response,
        ctx: &mut ValidationContext<'_>,
    ) -> Result<(Assertion, LevelOfAssurance), ValidationFailure> {
        check_response_fields(response, ctx)?;
        let assertion = self.select_assertion(response, ctx)?;

        match response.issuer.as_deref() {
            Some(issuer) if issuer != assertion.issuer => {
                return Err(ValidationFailure::new(
                    ValidationErrorCode::IssuerMismatch,
                    format!(
                        "assertion '{}' issued by '{}' inside a response from '{issuer}'",
                        assertion.id, assertion.issuer
                    ),
                ));
            }
            _ => {}
        }

        if let Some(signature) = &assertion.signature {
            let verdict = self.trust_engine.verify_signature(
                signature,
                &assertion.issuer,
                &ctx.params().trust_anchors,
            );
            if !verdict.valid {
                return Err(ValidationFailure::new(
                    ValidationErrorCode::BadSignature,
                    format!(
                        "signature of assertion '{}' not verified by a trust anchor of '{}'",
                        assertion.id, assertion.issuer
                    ),
                ));
            }
        }

        let loa = assertion::check(&assertion, ctx)?;
        Ok((assertion, loa))
    }

    fn select_assertion(
        &self,
        response: &Response,
        ctx: &mut ValidationContext<'_>,
    ) -> Result<Assertion, ValidationFailure> {
        let encrypted = response.encrypted_assertions.len();
        let plain = response.assertions.len();
        if encrypted == 0 && plain == 0 {
            return Err(ValidationFailure::new(
                ValidationErrorCode::NoAssertion,
                format!("response '{}' carries no assertion", response.id),
            ));
        }
        if encrypted != 1 || plain != 0 {
            ctx.recommend(ValidationFailure::new(
                ValidationErrorCode::UnexpectedAssertions,
                format!(
                    "response '{}' carries {encrypted} encrypted and {plain} plain assertions, expected one encrypted",
                    response.id
                ),
            ))?;
        }

        let Some(encrypted) = response.encrypted_assertions.first() else {
            // Only plain assertions, tolerated outside strict mode.
            return response.assertions.first().cloned().ok_or_else(|| {
                ValidationFailure::new(ValidationErrorCode::NoAssertion, "no assertion")
            });
        };
        let Some(decrypter) = &self.decrypter else {
            return Err(ValidationFailure::new(
                ValidationErrorCode::AssertionDecryptionFailed,
                "no assertion decrypter configured",
            ));
        };
        let assertion = decrypter.decrypt(encrypted).map_err(|err| {
            ValidationFailure::new(ValidationErrorCode::AssertionDecryptionFailed, err.to_string())
        })?;
        debug!(response = %response.id, assertion = %assertion.id, "assertion decrypted");
        Ok(assertion)
    }

    fn check_sad(
        &self,
        assertion: &Assertion,
        params: &ValidationParameters,
        now: DateTime<Utc>,
    ) -> Result<Option<SadClaims>, ValidationFailure> {
        let Some(request) = &params.sad_request else {
            return Ok(None);
        };
        SadValidator::from_config(params.sad_keys.clone(), &self.sad_config)
            .validate_assertion(assertion, request, now)
            .map(Some)
            .map_err(|err| ValidationFailure::new(err.code.into(), err.message))
    }
}

/// Status, issuer, destination, `InResponseTo` and issue instant.
fn check_response_fields(
    response: &Response,
    ctx: &mut ValidationContext<'_>,
) -> Result<(), ValidationFailure> {
    let params = ctx.params();

    if !response.status.is_success() {
        return Err(ValidationFailure::new(
            ValidationErrorCode::StatusNotSuccess,
            format!(
                "status {}{}{}",
                response.status.code,
                response
                    .status
                    .sub_code
                    .as_deref()
                    .map(|s| format!(" / {s}"))
                    .unwrap_or_default(),
                response
                    .status
                    .message
                    .as_deref()
                    .map(|m| format!(": {m}"))
                    .unwrap_or_default(),
            ),
        ));
    }

    match (params.idp_entity_id.as_deref(), response.issuer.as_deref()) {
        (Some(expected), Some(actual)) if expected != actual => {
            return Err(ValidationFailure::new(
                ValidationErrorCode::ResponseIssuerMismatch,
                format!("response issued by '{actual}', expected '{expected}'"),
            ));
        }
        _ => {}
    }

    match response.destination.as_deref() {
        Some(destination) if destination != params.assertion_consumer_url => {
            return Err(ValidationFailure::new(
                ValidationErrorCode::DestinationMismatch,
                format!(
                    "destination '{destination}' is not '{}'",
                    params.assertion_consumer_url
                ),
            ));
        }
        Some(_) => {}
        None => ctx.recommend(ValidationFailure::new(
            ValidationErrorCode::DestinationMismatch,
            format!("response '{}' has no destination", response.id),
        ))?,
    }

    match params.authn_request_id.as_deref() {
        Some(expected) if response.in_response_to.as_deref() != Some(expected) => {
            return Err(ValidationFailure::new(
                ValidationErrorCode::InResponseToMismatch,
                format!(
                    "InResponseTo '{}' is not '{expected}'",
                    response.in_response_to.as_deref().unwrap_or_default()
                ),
            ));
        }
        _ => {}
    }

    if ctx.is_in_future(response.issue_instant) {
        return Err(ValidationFailure::new(
            ValidationErrorCode::ResponseIssuedInFuture,
            format!("response issued at {}", response.issue_instant),
        ));
    }
    if ctx.is_older_than(response.issue_instant, ctx.config().max_response_age) {
        return Err(ValidationFailure::new(
            ValidationErrorCode::ResponseExpired,
            format!(
                "response issued at {} is older than {} seconds",
                response.issue_instant,
                ctx.config().max_response_age.as_secs()
            ),
        ));
    }
    Ok(())
}

fn advance(state: &mut ProcessingState, next: ProcessingState, response_id: &str) {
    debug!(response = %response_id, from = %state, to = %next, "state transition");
    *state = next;
}

const fn is_trust_failure(code: ValidationErrorCode) -> bool {
    matches!(
        code,
        ValidationErrorCode::MissingSignature
            | ValidationErrorCode::BadSignature
            | ValidationErrorCode::Sad(sweid_saml_signservice::SadErrorCode::BadSignature)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_ordered() {
        assert!(ProcessingState::Received < ProcessingState::SignatureChecked);
        assert!(ProcessingState::SignatureChecked < ProcessingState::AssertionValidated);
        assert!(ProcessingState::AssertionValidated < ProcessingState::SadValidated);
        assert!(ProcessingState::SadValidated < ProcessingState::Accepted);
    }

    #[test]
    fn state_names() {
        assert_eq!(ProcessingState::SadValidated.to_string(), "SAD_VALIDATED");
        assert_eq!(ProcessingState::Accepted.as_str(), "ACCEPTED");
    }

    #[test]
    fn trust_failures_are_classified() {
        assert!(is_trust_failure(ValidationErrorCode::BadSignature));
        assert!(!is_trust_failure(ValidationErrorCode::AudienceMismatch));
    }
}
