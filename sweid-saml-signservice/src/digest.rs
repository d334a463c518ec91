//! The `signMessageDigest` attribute.
//!
//! An identity provider that displayed a SignMessage releases a digest of
//! it so the signature service can confirm which message the user saw. The
//! digest covers the UTF-8 bytes of the cleartext message, so it can be
//! checked by anyone holding the cleartext, with or without the ciphertext.
//! The attribute value is `<digest algorithm URI>;<base64 digest>`.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256, Sha384, Sha512};
use sweid_saml::{Attribute, names};
use tracing::debug;

use crate::error::DigestError;
use crate::sign_message::SignMessage;

/// Digest algorithms for SignMessage digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestAlgorithm {
    /// SHA-256, the default.
    #[default]
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl DigestAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [Self; 3] = [Self::Sha256, Self::Sha384, Self::Sha512];

    /// Returns the algorithm URI.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Sha256 => "http://www.w3.org/2001/04/xmlenc#sha256",
            Self::Sha384 => "http://www.w3.org/2001/04/xmldsig-more#sha384",
            Self::Sha512 => "http://www.w3.org/2001/04/xmlenc#sha512",
        }
    }

    /// Looks an algorithm up by URI.
    ///
    /// # Errors
    ///
    /// Returns `DigestError::UnsupportedAlgorithm` for an unknown URI.
    pub fn from_uri(uri: &str) -> Result<Self, DigestError> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.uri() == uri)
            .ok_or_else(|| DigestError::UnsupportedAlgorithm {
                uri: uri.to_string(),
            })
    }

    fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

/// A SignMessage digest.
///
/// ```
/// use sweid_saml_signservice::{SignMessage, SignMessageDigest, SignMessageDigestIssuer};
///
/// let message = SignMessage::cleartext("Sign the contract");
/// let digest = SignMessageDigestIssuer::new().digest(&message).unwrap();
///
/// let value = digest.to_attribute_value();
/// assert!(value.starts_with("http://www.w3.org/2001/04/xmlenc#sha256;"));
///
/// let parsed = SignMessageDigest::parse(&value).unwrap();
/// assert!(parsed.verify(&message).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignMessageDigest {
    /// The algorithm
    pub algorithm: DigestAlgorithm,
    /// The digest bytes
    pub value: Vec<u8>,
}

impl SignMessageDigest {
    /// Renders the attribute value.
    #[must_use]
    pub fn to_attribute_value(&self) -> String {
        format!("{};{}", self.algorithm.uri(), STANDARD.encode(&self.value))
    }

    /// Parses an attribute value.
    ///
    /// # Errors
    ///
    /// `Malformed` if the value is not `uri;base64`, `UnsupportedAlgorithm`
    /// for an unknown URI.
    pub fn parse(value: &str) -> Result<Self, DigestError> {
        let (uri, encoded) = value.split_once(';').ok_or_else(|| DigestError::Malformed {
            reason: "expected '<algorithm>;<base64 digest>'".to_string(),
        })?;
        let algorithm = DigestAlgorithm::from_uri(uri)?;
        let value = STANDARD.decode(encoded).map_err(|e| DigestError::Malformed {
            reason: e.to_string(),
        })?;
        if value.len() != algorithm.digest(b"").len() {
            return Err(DigestError::Malformed {
                reason: format!("digest is {} bytes, wrong length for {}", value.len(), algorithm.uri()),
            });
        }
        Ok(Self { algorithm, value })
    }

    /// Returns true if this is the digest of `message`.
    ///
    /// # Errors
    ///
    /// As [`SignMessageDigestIssuer::digest`].
    pub fn verify(&self, message: &SignMessage) -> Result<bool, DigestError> {
        let text = cleartext(message)?;
        Ok(self.algorithm.digest(text.as_bytes()) == self.value)
    }
}

impl fmt::Display for SignMessageDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_attribute_value())
    }
}

/// Issues `signMessageDigest` attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignMessageDigestIssuer {
    default_algorithm: DigestAlgorithm,
}

impl SignMessageDigestIssuer {
    /// Creates an issuer that uses SHA-256 by default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default algorithm.
    #[must_use]
    pub const fn with_default_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.default_algorithm = algorithm;
        self
    }

    /// Returns the default algorithm.
    #[must_use]
    pub const fn default_algorithm(&self) -> DigestAlgorithm {
        self.default_algorithm
    }

    /// Digests a cleartext message with the default algorithm.
    ///
    /// # Errors
    ///
    /// `Encrypted` if the message is encrypted, `EmptyMessage` if it is blank.
    pub fn digest(&self, message: &SignMessage) -> Result<SignMessageDigest, DigestError> {
        Self::digest_with(self.default_algorithm, message)
    }

    /// Digests a message with the first algorithm in the recipient's
    /// preference list that is supported, or the default if none is.
    ///
    /// # Errors
    ///
    /// As [`SignMessageDigestIssuer::digest`].
    pub fn digest_for_recipient(
        &self,
        message: &SignMessage,
        preferred: &[&str],
    ) -> Result<SignMessageDigest, DigestError> {
        let algorithm = preferred
            .iter()
            .find_map(|uri| DigestAlgorithm::from_uri(uri).ok())
            .unwrap_or(self.default_algorithm);
        Self::digest_with(algorithm, message)
    }

    /// Creates the `signMessageDigest` attribute for a message.
    ///
    /// # Errors
    ///
    /// As [`SignMessageDigestIssuer::digest`].
    pub fn create_attribute(
        &self,
        message: &SignMessage,
        preferred: &[&str],
    ) -> Result<Attribute, DigestError> {
        let digest = self.digest_for_recipient(message, preferred)?;
        Ok(Attribute::new(
            names::SIGN_MESSAGE_DIGEST,
            [digest.to_attribute_value()],
        ))
    }

    fn digest_with(
        algorithm: DigestAlgorithm,
        message: &SignMessage,
    ) -> Result<SignMessageDigest, DigestError> {
        let text = cleartext(message)?;
        debug!(algorithm = algorithm.uri(), "issuing sign message digest");
        Ok(SignMessageDigest {
            algorithm,
            value: algorithm.digest(text.as_bytes()),
        })
    }
}

fn cleartext(message: &SignMessage) -> Result<&str, DigestError> {
    match message.message() {
        None => Err(DigestError::Encrypted),
        Some(text) if text.is_empty() => Err(DigestError::EmptyMessage),
        Some(text) => Ok(text),
    }
}
