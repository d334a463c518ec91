//! Signature trust and assertion decryption capabilities.
//!
//! The processor never parses XML or certificates itself. A
//! [`SignatureTrustEngine`] decides whether an [`XmlSignature`] was made by
//! a [`TrustAnchor`] of the issuing entity, and an [`AssertionDecrypter`]
//! opens encrypted assertions.

use sweid_saml::{Assertion, EncryptedAssertion, XmlSignature};
use sweid_saml_signservice::{SigningAlgorithm, VerifyingKey};
use tracing::{debug, warn};

use crate::error::AssertionDecryptionError;

/// XML-DSig URI for RSA PKCS#1 v1.5 with SHA-256.
pub const XMLDSIG_RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
/// XML-DSig URI for RSA PKCS#1 v1.5 with SHA-384.
pub const XMLDSIG_RSA_SHA384: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384";
/// XML-DSig URI for RSA PKCS#1 v1.5 with SHA-512.
pub const XMLDSIG_RSA_SHA512: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512";
/// XML-DSig URI for Ed25519.
pub const XMLDSIG_EDDSA_ED25519: &str = "http://www.w3.org/2021/04/xmldsig-more#eddsa-ed25519";

/// Maps an XML-DSig signature method URI to a signing algorithm.
///
/// ```
/// use sweid_saml_signservice::SigningAlgorithm;
/// use sweid_saml_validation::{XMLDSIG_RSA_SHA256, signature_algorithm};
///
/// assert_eq!(signature_algorithm(XMLDSIG_RSA_SHA256), Some(SigningAlgorithm::Rs256));
/// assert_eq!(signature_algorithm("http://www.w3.org/2000/09/xmldsig#rsa-sha1"), None);
/// ```
#[must_use]
pub fn signature_algorithm(uri: &str) -> Option<SigningAlgorithm> {
    match uri {
        XMLDSIG_RSA_SHA256 => Some(SigningAlgorithm::Rs256),
        XMLDSIG_RSA_SHA384 => Some(SigningAlgorithm::Rs384),
        XMLDSIG_RSA_SHA512 => Some(SigningAlgorithm::Rs512),
        XMLDSIG_EDDSA_ED25519 => Some(SigningAlgorithm::EdDsa),
        _ => None,
    }
}

/// A key trusted to sign on behalf of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    /// Entity ID of the signer
    pub entity_id: String,
    /// The entity's signing key
    pub key: VerifyingKey,
}

impl TrustAnchor {
    /// Creates an anchor.
    pub fn new(entity_id: impl Into<String>, key: VerifyingKey) -> Self {
        Self {
            entity_id: entity_id.into(),
            key,
        }
    }
}

/// Outcome of a signature check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureVerdict {
    /// Whether a trusted key verified the signature
    pub valid: bool,
    /// Entity ID of the anchor that verified it
    pub signer: Option<String>,
}

impl SignatureVerdict {
    /// A signature verified by `signer`.
    pub fn trusted(signer: impl Into<String>) -> Self {
        Self {
            valid: true,
            signer: Some(signer.into()),
        }
    }

    /// A signature no anchor verified.
    #[must_use]
    pub const fn untrusted() -> Self {
        Self {
            valid: false,
            signer: None,
        }
    }
}

/// Decides whether a signature was made by a trusted key.
pub trait SignatureTrustEngine: Send + Sync {
    /// Checks `signature` against the keys `anchors` hold for `issuer`.
    ///
    /// A valid verdict names `issuer` as the signer; keys of other
    /// entities never make a signature valid.
    fn verify_signature(
        &self,
        signature: &XmlSignature,
        issuer: &str,
        anchors: &[TrustAnchor],
    ) -> SignatureVerdict;
}

/// Verifies signatures directly against the anchors' keys.
///
/// Only anchors whose entity ID is the issuer are tried, in order. Unknown
/// signature method URIs never verify.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorTrustEngine;

impl SignatureTrustEngine for AnchorTrustEngine {
    fn verify_signature(
        &self,
        signature: &XmlSignature,
        issuer: &str,
        anchors: &[TrustAnchor],
    ) -> SignatureVerdict {
        let Some(alg) = signature_algorithm(&signature.algorithm) else {
            warn!(algorithm = %signature.algorithm, "unsupported signature method");
            return SignatureVerdict::untrusted();
        };
        let candidates = anchors.iter().filter(|anchor| anchor.entity_id == issuer);
        let signer = candidates.clone().find(|anchor| {
            anchor
                .key
                .verify(alg, &signature.signed_bytes, &signature.signature_value)
        });
        match signer {
            Some(anchor) => {
                debug!(
                    signer = %anchor.entity_id,
                    key = %anchor.key.fingerprint(),
                    "signature verified"
                );
                SignatureVerdict::trusted(anchor.entity_id.clone())
            }
            None => {
                warn!(
                    issuer = %issuer,
                    anchors = candidates.count(),
                    %alg,
                    "no trust anchor of the issuer verified the signature"
                );
                SignatureVerdict::untrusted()
            }
        }
    }
}

/// Opens encrypted assertions with the service provider's keys.
pub trait AssertionDecrypter: Send + Sync {
    /// Decrypts one assertion.
    ///
    /// # Errors
    ///
    /// Returns an error if no key opens the assertion or its content does
    /// not parse.
    fn decrypt(&self, encrypted: &EncryptedAssertion) -> Result<Assertion, AssertionDecryptionError>;
}
