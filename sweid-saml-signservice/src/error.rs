//! Error types for SAD and SignMessage operations.

use std::fmt;

use thiserror::Error;

/// Errors from the SAD codec, signer and verifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SadError {
    /// The compact token could not be decoded.
    #[error("malformed SAD token: {reason}")]
    MalformedToken {
        /// Description of the format error
        reason: String,
    },
    /// A required claim was not provided to the builder.
    #[error("missing required SAD claim '{claim}'")]
    MissingClaim {
        /// Short name of the missing claim
        claim: &'static str,
    },
    /// Claims violate an invariant.
    #[error("invalid SAD claims: {reason}")]
    InvalidClaims {
        /// Description of the violation
        reason: String,
    },
    /// The signing algorithm is not supported, or not allowed, for the key.
    #[error(
        "unsupported SAD signing algorithm '{algorithm}'; use EdDSA with an Ed25519 key or RS256/RS384/RS512 with an RSA key"
    )]
    UnsupportedAlgorithm {
        /// The algorithm name
        algorithm: String,
    },
    /// The token carries no signature segment.
    #[error("SAD token is not signed")]
    MissingSignature,
    /// No trusted key verified the signature.
    #[error(
        "SAD signature verification failed against {trusted_keys} trusted key(s); token may have been tampered with"
    )]
    SignatureInvalid {
        /// Number of keys that were tried
        trusted_keys: usize,
    },
    /// The signature verified under a key registered for another entity.
    #[error(
        "SAD signed with a key registered for '{signer}', not for issuer '{issuer}'; register the issuer's key under its entity ID"
    )]
    UntrustedSigner {
        /// Label of the key that verified the signature
        signer: String,
        /// Entity the SAD had to come from
        issuer: String,
    },
    /// The token's `exp` lies more than the allowed skew in the past.
    #[error("SAD expired at {expired_at} (now {now}, allowed skew {skew_secs}s); request a new SAD")]
    Expired {
        /// The `exp` claim, seconds since the epoch
        expired_at: i64,
        /// Evaluation time, seconds since the epoch
        now: i64,
        /// Allowed clock skew in seconds
        skew_secs: i64,
    },
    /// The token's `iat` lies more than the allowed skew in the future.
    #[error("SAD issued at {issued_at} is in the future (now {now}, allowed skew {skew_secs}s)")]
    IssuedInFuture {
        /// The `iat` claim, seconds since the epoch
        issued_at: i64,
        /// Evaluation time, seconds since the epoch
        now: i64,
        /// Allowed clock skew in seconds
        skew_secs: i64,
    },
    /// Key material could not be loaded or generated.
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Description of the key error
        reason: String,
    },
    /// The signature primitive failed.
    #[error("signing failed: {reason}")]
    SigningFailed {
        /// Description of the failure
        reason: String,
    },
}

/// Errors raised when issuing a SAD.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    /// The attribute the SAD should reference is not in the assertion.
    #[error(
        "attribute '{name}' has no value in assertion '{assertion_id}'; a SAD can only reference a released attribute"
    )]
    AttributeNotFound {
        /// The attribute name
        name: String,
        /// ID of the assertion
        assertion_id: String,
    },
    /// A call parameter is out of range.
    #[error("invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the parameter
        parameter: &'static str,
        /// Why it was rejected
        reason: String,
    },
    /// Building or signing the token failed.
    #[error(transparent)]
    Sad(#[from] SadError),
}

/// The rule a SAD failed during validation.
///
/// Exactly one code is reported per validation call: the first failing rule
/// in the validator's fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SadErrorCode {
    /// The token could not be decoded.
    Malformed,
    /// No trusted key verified the signature.
    BadSignature,
    /// The token has expired.
    Expired,
    /// The token was issued in the future.
    NotYetValid,
    /// `aud` is not the expected audience.
    AudienceMismatch,
    /// `jti` is not the transaction id of the bound assertion.
    TransactionMismatch,
    /// `attr` does not name a released attribute with a value.
    AttributeMismatch,
    /// `iss` is not the assertion issuer.
    IssuerMismatch,
    /// `sub` is not the value of the referenced attribute.
    SubjectMismatch,
    /// `loa` is not the assertion's authentication context.
    LoaMismatch,
    /// The `irt` extension does not match the SAD request ID.
    InResponseToMismatch,
    /// The `docs` extension does not match the requested document count.
    DocumentCountMismatch,
    /// The `reqid` extension does not match the sign request ID.
    SignRequestIdMismatch,
    /// The assertion carries no SAD attribute.
    NoSadAttribute,
}

impl SadErrorCode {
    /// Returns the wire name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "MALFORMED",
            Self::BadSignature => "BAD_SIGNATURE",
            Self::Expired => "EXPIRED",
            Self::NotYetValid => "NOT_YET_VALID",
            Self::AudienceMismatch => "AUDIENCE_MISMATCH",
            Self::TransactionMismatch => "TRANSACTION_MISMATCH",
            Self::AttributeMismatch => "ATTRIBUTE_MISMATCH",
            Self::IssuerMismatch => "ISSUER_MISMATCH",
            Self::SubjectMismatch => "SUBJECT_MISMATCH",
            Self::LoaMismatch => "LOA_MISMATCH",
            Self::InResponseToMismatch => "IN_RESPONSE_TO_MISMATCH",
            Self::DocumentCountMismatch => "DOCUMENT_COUNT_MISMATCH",
            Self::SignRequestIdMismatch => "SIGN_REQUEST_ID_MISMATCH",
            Self::NoSadAttribute => "NO_SAD_ATTRIBUTE",
        }
    }
}

impl fmt::Display for SadErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed SAD validation: the failing rule and a description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SAD validation failed [{code}]: {message}")]
pub struct SadValidationError {
    /// The rule that failed
    pub code: SadErrorCode,
    /// Human readable details
    pub message: String,
}

impl SadValidationError {
    /// Creates a validation error.
    pub fn new(code: SadErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<SadError> for SadValidationError {
    fn from(err: SadError) -> Self {
        let code = match err {
            SadError::MalformedToken { .. }
            | SadError::MissingClaim { .. }
            | SadError::InvalidClaims { .. } => SadErrorCode::Malformed,
            SadError::Expired { .. } => SadErrorCode::Expired,
            SadError::IssuedInFuture { .. } => SadErrorCode::NotYetValid,
            SadError::UnsupportedAlgorithm { .. }
            | SadError::MissingSignature
            | SadError::SignatureInvalid { .. }
            | SadError::UntrustedSigner { .. }
            | SadError::InvalidKey { .. }
            | SadError::SigningFailed { .. } => SadErrorCode::BadSignature,
        };
        Self::new(code, err.to_string())
    }
}

/// Errors raised when building a SAD request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// A required field was not provided.
    #[error("missing required SAD request field '{field}'")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },
    /// The document count is zero.
    #[error("SAD request must cover at least one document")]
    NoDocuments,
    /// A request parameter has an empty name.
    #[error("request parameter names must not be empty")]
    EmptyParameterName,
}

/// Errors raised when encrypting a SignMessage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncryptError {
    /// The message has no content.
    #[error("sign message has no content to encrypt")]
    EmptyMessage,
    /// The message is already encrypted.
    #[error("sign message is already encrypted")]
    AlreadyEncrypted,
    /// The message names a display entity other than the recipient.
    #[error(
        "sign message display entity '{display_entity}' does not match recipient '{recipient}'; encrypt to the entity that displays the message"
    )]
    DisplayEntityMismatch {
        /// Display entity named in the message
        display_entity: String,
        /// Recipient entity ID
        recipient: String,
    },
    /// The encryption primitive failed.
    #[error("sign message encryption failed: {reason}")]
    EncryptionFailed {
        /// Description of the failure
        reason: String,
    },
}

/// Errors from a [`PayloadEncryption`](crate::PayloadEncryption)
/// implementation when opening a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadDecryptError {
    /// The key could not unwrap the content key; it is likely not the
    /// recipient's key.
    #[error("content key could not be unwrapped with this key")]
    KeyUnwrap,
    /// The content key was recovered but the content did not decrypt or
    /// failed its integrity check.
    #[error("content decryption failed: {reason}")]
    Content {
        /// Description of the failure
        reason: String,
    },
    /// The payload names an algorithm the implementation does not support.
    #[error("unsupported encryption algorithm '{uri}'")]
    UnsupportedAlgorithm {
        /// The algorithm URI
        uri: String,
    },
}

/// Errors raised when decrypting a SignMessage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptError {
    /// None of the configured keys could unwrap the content key.
    #[error("none of the {tried} configured decryption key(s) could decrypt the sign message")]
    KeyMismatch {
        /// Number of keys tried
        tried: usize,
    },
    /// The content decrypted to something that is not a valid sign message,
    /// or failed its integrity check.
    #[error("malformed sign message ciphertext: {reason}")]
    MalformedCiphertext {
        /// Description of the failure
        reason: String,
    },
    /// The recovered mime type is not one the profile allows.
    #[error("unsupported sign message mime type '{mime_type}'; expected text, text/html or text/markdown")]
    UnsupportedMimeType {
        /// The recovered marker
        mime_type: String,
    },
}

impl DecryptError {
    /// Returns the wire name of the error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::KeyMismatch { .. } => "KEY_MISMATCH",
            Self::MalformedCiphertext { .. } => "MALFORMED_CIPHERTEXT",
            Self::UnsupportedMimeType { .. } => "UNSUPPORTED_MIME_TYPE",
        }
    }
}

/// Errors raised when computing or checking a SignMessage digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    /// The message is encrypted; digests are computed over the cleartext.
    #[error("sign message is encrypted; decrypt it before computing its digest")]
    Encrypted,
    /// The message has no content.
    #[error("sign message has no content to digest")]
    EmptyMessage,
    /// The digest algorithm URI is not supported.
    #[error("unsupported digest algorithm '{uri}'")]
    UnsupportedAlgorithm {
        /// The algorithm URI
        uri: String,
    },
    /// A digest attribute value could not be parsed.
    #[error("malformed sign message digest: {reason}")]
    Malformed {
        /// Description of the format error
        reason: String,
    },
}

/// Errors raised when loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("invalid SAD configuration: {reason}")]
    Parse {
        /// Parser message
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sad_errors_map_to_codes() {
        let cases = [
            (
                SadError::MalformedToken {
                    reason: "x".into(),
                },
                SadErrorCode::Malformed,
            ),
            (SadError::MissingSignature, SadErrorCode::BadSignature),
            (
                SadError::UntrustedSigner {
                    signer: "https://other-idp.example.se".into(),
                    issuer: "https://idp.example.se".into(),
                },
                SadErrorCode::BadSignature,
            ),
            (
                SadError::UnsupportedAlgorithm {
                    algorithm: "none".into(),
                },
                SadErrorCode::BadSignature,
            ),
            (
                SadError::Expired {
                    expired_at: 0,
                    now: 10,
                    skew_secs: 0,
                },
                SadErrorCode::Expired,
            ),
            (
                SadError::IssuedInFuture {
                    issued_at: 10,
                    now: 0,
                    skew_secs: 0,
                },
                SadErrorCode::NotYetValid,
            ),
        ];

        for (err, code) in cases {
            assert_eq!(SadValidationError::from(err).code, code);
        }
    }

    #[test]
    fn codes_render_wire_names() {
        assert_eq!(SadErrorCode::AudienceMismatch.to_string(), "AUDIENCE_MISMATCH");
        assert_eq!(SadErrorCode::NoSadAttribute.as_str(), "NO_SAD_ATTRIBUTE");
    }

    #[test]
    fn validation_error_display_includes_code() {
        let err = SadValidationError::new(SadErrorCode::BadSignature, "no key matched");
        assert_eq!(
            err.to_string(),
            "SAD validation failed [BAD_SIGNATURE]: no key matched"
        );
    }

    #[test]
    fn decrypt_error_codes() {
        assert_eq!(DecryptError::KeyMismatch { tried: 1 }.code(), "KEY_MISMATCH");
        assert_eq!(
            DecryptError::UnsupportedMimeType {
                mime_type: "application/pdf".into()
            }
            .code(),
            "UNSUPPORTED_MIME_TYPE"
        );
    }
}
