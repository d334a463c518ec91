//! SAML response values and opaque handles for the XML security layer.

use chrono::{DateTime, Utc};

use crate::assertion::Assertion;
use crate::constants::STATUS_SUCCESS;

/// An enveloped XML signature as handed to an external signature verifier.
///
/// The bytes are opaque to this crate; only the verifier interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XmlSignature {
    /// Signature algorithm URI
    pub algorithm: String,
    /// The canonicalized bytes covered by the signature
    pub signed_bytes: Vec<u8>,
    /// The signature value
    pub signature_value: Vec<u8>,
}

impl XmlSignature {
    /// Creates a signature handle.
    pub fn new(
        algorithm: impl Into<String>,
        signed_bytes: impl Into<Vec<u8>>,
        signature_value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            signed_bytes: signed_bytes.into(),
            signature_value: signature_value.into(),
        }
    }
}

/// An encrypted assertion, opaque until decrypted by the XML encryption layer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncryptedAssertion {
    /// The serialized `EncryptedData`
    pub encrypted_data: Vec<u8>,
}

impl EncryptedAssertion {
    /// Wraps encrypted bytes.
    pub fn new(encrypted_data: impl Into<Vec<u8>>) -> Self {
        Self {
            encrypted_data: encrypted_data.into(),
        }
    }
}

/// Response status.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status {
    /// Top-level status code URI
    pub code: String,
    /// Second-level status code, if any
    pub sub_code: Option<String>,
    /// Status message, if any
    pub message: Option<String>,
}

impl Status {
    /// A success status.
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: STATUS_SUCCESS.to_string(),
            sub_code: None,
            message: None,
        }
    }

    /// An error status with a message.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            sub_code: None,
            message: Some(message.into()),
        }
    }

    /// Returns true for the success status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == STATUS_SUCCESS
    }
}

/// A SAML response.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Response {
    /// Response ID
    pub id: String,
    /// Entity ID of the issuer
    pub issuer: Option<String>,
    /// Destination URL
    pub destination: Option<String>,
    /// ID of the authentication request this responds to
    pub in_response_to: Option<String>,
    /// When the response was issued
    pub issue_instant: DateTime<Utc>,
    /// Status
    pub status: Status,
    /// Enveloped signature
    pub signature: Option<XmlSignature>,
    /// Plaintext assertions
    pub assertions: Vec<Assertion>,
    /// Encrypted assertions
    pub encrypted_assertions: Vec<EncryptedAssertion>,
}

impl Response {
    /// Creates a successful, unsigned response with no assertions.
    pub fn new(id: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            issuer: Some(issuer.into()),
            destination: None,
            in_response_to: None,
            issue_instant: Utc::now(),
            status: Status::success(),
            signature: None,
            assertions: Vec::new(),
            encrypted_assertions: Vec::new(),
        }
    }

    /// Sets the destination.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Sets the request ID this responds to.
    #[must_use]
    pub fn with_in_response_to(mut self, id: impl Into<String>) -> Self {
        self.in_response_to = Some(id.into());
        self
    }

    /// Sets the issue instant.
    #[must_use]
    pub fn with_issue_instant(mut self, instant: DateTime<Utc>) -> Self {
        self.issue_instant = instant;
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Sets the signature.
    #[must_use]
    pub fn with_signature(mut self, signature: XmlSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Adds a plaintext assertion.
    #[must_use]
    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    /// Adds an encrypted assertion.
    #[must_use]
    pub fn with_encrypted_assertion(mut self, assertion: EncryptedAssertion) -> Self {
        self.encrypted_assertions.push(assertion);
        self
    }
}
