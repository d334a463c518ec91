//! Error types for response and assertion validation.

use std::fmt;

use sweid_saml_signservice::SadErrorCode;
use thiserror::Error;

use crate::processor::ProcessingState;

/// The rule a response or assertion failed.
///
/// Codes are grouped by the step that raises them. SAD failures carry the
/// SAD validator's own code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorCode {
    // Signature step
    /// The response is not signed.
    MissingSignature,
    /// No trust anchor verified a signature.
    BadSignature,

    // Response checks
    /// The response status is not success.
    StatusNotSuccess,
    /// The response issuer is not the expected identity provider.
    ResponseIssuerMismatch,
    /// `Destination` is not the assertion consumer URL.
    DestinationMismatch,
    /// `InResponseTo` is not the authentication request ID.
    InResponseToMismatch,
    /// The response is older than the allowed response age.
    ResponseExpired,
    /// The response was issued in the future.
    ResponseIssuedInFuture,
    /// The response carries no assertion.
    NoAssertion,
    /// The response carries more, or other, assertions than the profile allows.
    UnexpectedAssertions,
    /// The encrypted assertion could not be decrypted.
    AssertionDecryptionFailed,

    // Assertion
    /// The assertion issuer is not the expected identity provider.
    IssuerMismatch,
    /// The assertion has no subject.
    MissingSubject,
    /// The subject has no `NameID` value.
    MissingNameId,
    /// The `NameID` format is neither persistent nor transient.
    InvalidNameIdFormat,
    /// The subject has no confirmation.
    MissingSubjectConfirmation,
    /// No bearer confirmation, and holder-of-key is not in use.
    NoBearerConfirmation,
    /// No confirmation passed its checks.
    InvalidSubjectConfirmation,
    /// Conditions, `NotBefore` or `NotOnOrAfter` are missing.
    MissingConditions,
    /// `NotBefore` lies in the future.
    AssertionNotYetValid,
    /// `NotOnOrAfter` has passed.
    AssertionExpired,
    /// No audience restriction names the service provider.
    AudienceMismatch,
    /// The assertion has no authentication statement.
    MissingAuthnStatement,
    /// The assertion has no attribute statement.
    MissingAttributeStatement,

    // Authentication statement
    /// `AuthnInstant` lies in the future.
    AuthnInstantInFuture,
    /// The authentication is older than the allowed age.
    AuthnTooOld,
    /// `SessionNotOnOrAfter` has passed.
    SessionExpired,
    /// The statement has no authentication context class reference.
    MissingAuthnContext,
    /// The LoA is not in the allowed set.
    UnsupportedLoa,
    /// The LoA was not among the requested ones.
    LoaNotRequested,
    /// The LoA requires holder-of-key, which was not used.
    HolderOfKeyRequired,

    // Attribute statement
    /// A required attribute is missing.
    MissingRequiredAttribute,
    /// An attribute value is empty or badly formatted.
    MalformedAttributeValue,
    /// Released values do not match the requested principal selection.
    PrincipalSelectionMismatch,

    /// The SAD failed validation.
    Sad(SadErrorCode),
}

impl ValidationErrorCode {
    /// Returns the wire name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingSignature => "MISSING_SIGNATURE",
            Self::BadSignature => "BAD_SIGNATURE",
            Self::StatusNotSuccess => "STATUS_NOT_SUCCESS",
            Self::ResponseIssuerMismatch => "RESPONSE_ISSUER_MISMATCH",
            Self::DestinationMismatch => "DESTINATION_MISMATCH",
            Self::InResponseToMismatch => "IN_RESPONSE_TO_MISMATCH",
            Self::ResponseExpired => "RESPONSE_EXPIRED",
            Self::ResponseIssuedInFuture => "RESPONSE_ISSUED_IN_FUTURE",
            Self::NoAssertion => "NO_ASSERTION",
            Self::UnexpectedAssertions => "UNEXPECTED_ASSERTIONS",
            Self::AssertionDecryptionFailed => "ASSERTION_DECRYPTION_FAILED",
            Self::IssuerMismatch => "ISSUER_MISMATCH",
            Self::MissingSubject => "MISSING_SUBJECT",
            Self::MissingNameId => "MISSING_NAME_ID",
            Self::InvalidNameIdFormat => "INVALID_NAME_ID_FORMAT",
            Self::MissingSubjectConfirmation => "MISSING_SUBJECT_CONFIRMATION",
            Self::NoBearerConfirmation => "NO_BEARER_CONFIRMATION",
            Self::InvalidSubjectConfirmation => "INVALID_SUBJECT_CONFIRMATION",
            Self::MissingConditions => "MISSING_CONDITIONS",
            Self::AssertionNotYetValid => "ASSERTION_NOT_YET_VALID",
            Self::AssertionExpired => "ASSERTION_EXPIRED",
            Self::AudienceMismatch => "AUDIENCE_MISMATCH",
            Self::MissingAuthnStatement => "MISSING_AUTHN_STATEMENT",
            Self::MissingAttributeStatement => "MISSING_ATTRIBUTE_STATEMENT",
            Self::AuthnInstantInFuture => "AUTHN_INSTANT_IN_FUTURE",
            Self::AuthnTooOld => "AUTHN_TOO_OLD",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::MissingAuthnContext => "MISSING_AUTHN_CONTEXT",
            Self::UnsupportedLoa => "UNSUPPORTED_LOA",
            Self::LoaNotRequested => "LOA_NOT_REQUESTED",
            Self::HolderOfKeyRequired => "HOLDER_OF_KEY_REQUIRED",
            Self::MissingRequiredAttribute => "MISSING_REQUIRED_ATTRIBUTE",
            Self::MalformedAttributeValue => "MALFORMED_ATTRIBUTE_VALUE",
            Self::PrincipalSelectionMismatch => "PRINCIPAL_SELECTION_MISMATCH",
            Self::Sad(code) => code.as_str(),
        }
    }
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SadErrorCode> for ValidationErrorCode {
    fn from(code: SadErrorCode) -> Self {
        Self::Sad(code)
    }
}

/// One failed rule: the code and a description naming the offending value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct ValidationFailure {
    /// The rule that failed
    pub code: ValidationErrorCode,
    /// Human readable details
    pub message: String,
}

impl ValidationFailure {
    /// Creates a failure.
    pub fn new(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A rejected response: the last state the processor reached and the rule
/// that stopped it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("response rejected after {state} [{code}]: {message}")]
pub struct ResponseRejection {
    /// The last state reached before the failure
    pub state: ProcessingState,
    /// The rule that failed
    pub code: ValidationErrorCode,
    /// Human readable details
    pub message: String,
}

impl ResponseRejection {
    pub(crate) fn new(state: ProcessingState, failure: ValidationFailure) -> Self {
        Self {
            state,
            code: failure.code,
            message: failure.message,
        }
    }
}

/// An encrypted assertion could not be opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("assertion decryption failed: {reason}")]
pub struct AssertionDecryptionError {
    /// Description of the failure
    pub reason: String,
}

/// Errors raised when loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("invalid validation configuration: {reason}")]
    Parse {
        /// Parser message
        reason: String,
    },
}
