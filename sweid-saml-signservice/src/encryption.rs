//! Payload encryption for SignMessages.
//!
//! The [`PayloadEncryption`] trait is the seam to the encryption primitive.
//! [`RsaOaepAesGcm`] is the default: a fresh AES-256-GCM content key per
//! message, transported under the recipient's RSA key with RSA-OAEP
//! (SHA-256). Associated data passed to `encrypt` must be presented again
//! to `decrypt` or the content fails its integrity check.

use std::fmt;

use aes_gcm::Aes256Gcm;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use rand::RngCore;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::error::{EncryptError, PayloadDecryptError};
use crate::keys::rsa_fingerprint;

/// Key transport algorithm URI of [`RsaOaepAesGcm`].
pub const KEY_TRANSPORT_RSA_OAEP: &str = "http://www.w3.org/2009/xmlenc11#rsa-oaep";

/// Content encryption algorithm URI of [`RsaOaepAesGcm`].
pub const CONTENT_AES256_GCM: &str = "http://www.w3.org/2009/xmlenc11#aes256-gcm";

const CONTENT_KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// An encrypted payload: the wrapped content key, the nonce and the
/// ciphertext with its authentication tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    /// Key transport algorithm URI
    pub key_algorithm: String,
    /// Content encryption algorithm URI
    pub content_algorithm: String,
    /// The content key, encrypted to the recipient
    pub encrypted_key: Vec<u8>,
    /// Content encryption nonce
    pub nonce: Vec<u8>,
    /// Ciphertext including the authentication tag
    pub ciphertext: Vec<u8>,
}

/// A recipient's public encryption key.
#[derive(Clone, PartialEq, Eq)]
pub struct RecipientKey {
    key: RsaPublicKey,
}

impl RecipientKey {
    /// Wraps an RSA public key.
    #[must_use]
    pub fn from_rsa(key: RsaPublicKey) -> Self {
        Self { key }
    }

    /// Loads an RSA public key from SPKI PEM.
    ///
    /// # Errors
    ///
    /// Returns `EncryptError::EncryptionFailed` if the PEM cannot be decoded.
    pub fn from_public_key_pem(pem: &str) -> Result<Self, EncryptError> {
        RsaPublicKey::from_public_key_pem(pem)
            .map(Self::from_rsa)
            .map_err(|e| EncryptError::EncryptionFailed {
                reason: format!("invalid recipient key: {e}"),
            })
    }

    /// Returns a short hex fingerprint of the key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        rsa_fingerprint(&self.key)
    }
}

impl fmt::Debug for RecipientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipientKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// A private key able to open payloads encrypted to its [`RecipientKey`].
#[derive(Clone)]
pub struct DecryptionKey {
    key: RsaPrivateKey,
}

impl DecryptionKey {
    /// Generates a random RSA key of `bits` bits.
    ///
    /// # Errors
    ///
    /// Returns `EncryptError::EncryptionFailed` if generation fails.
    pub fn generate(bits: usize) -> Result<Self, EncryptError> {
        let mut rng = rand::thread_rng();
        RsaPrivateKey::new(&mut rng, bits)
            .map(Self::from_rsa)
            .map_err(|e| EncryptError::EncryptionFailed {
                reason: format!("key generation failed: {e}"),
            })
    }

    /// Wraps an RSA private key.
    #[must_use]
    pub fn from_rsa(key: RsaPrivateKey) -> Self {
        Self { key }
    }

    /// Loads an RSA private key from PKCS#8 PEM.
    ///
    /// # Errors
    ///
    /// Returns `EncryptError::EncryptionFailed` if the PEM cannot be decoded.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, EncryptError> {
        RsaPrivateKey::from_pkcs8_pem(pem)
            .map(Self::from_rsa)
            .map_err(|e| EncryptError::EncryptionFailed {
                reason: format!("invalid decryption key: {e}"),
            })
    }

    /// Returns the matching public key.
    #[must_use]
    pub fn recipient_key(&self) -> RecipientKey {
        RecipientKey::from_rsa(self.key.to_public_key())
    }
}

impl fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionKey")
            .field("fingerprint", &self.recipient_key().fingerprint())
            .finish_non_exhaustive()
    }
}

/// The entity a SignMessage is encrypted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Entity ID of the identity provider that displays the message
    pub entity_id: String,
    /// Its encryption key
    pub key: RecipientKey,
}

impl Recipient {
    /// Creates a recipient.
    pub fn new(entity_id: impl Into<String>, key: RecipientKey) -> Self {
        Self {
            entity_id: entity_id.into(),
            key,
        }
    }
}

/// Authenticated payload encryption to a recipient key.
pub trait PayloadEncryption: Send + Sync {
    /// Encrypts `plaintext` to `recipient`, binding `aad`.
    ///
    /// # Errors
    ///
    /// Returns `EncryptError::EncryptionFailed` if the primitive fails.
    fn encrypt(
        &self,
        plaintext: &[u8],
        aad: &[u8],
        recipient: &RecipientKey,
    ) -> Result<EncryptedPayload, EncryptError>;

    /// Decrypts `payload` with `key`, checking `aad`.
    ///
    /// # Errors
    ///
    /// - `KeyUnwrap` if `key` is not the key the payload was encrypted to
    /// - `Content` if the content fails to decrypt or authenticate
    /// - `UnsupportedAlgorithm` if the payload uses other algorithms
    fn decrypt(
        &self,
        payload: &EncryptedPayload,
        aad: &[u8],
        key: &DecryptionKey,
    ) -> Result<Vec<u8>, PayloadDecryptError>;
}

/// RSA-OAEP key transport with AES-256-GCM content encryption.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaOaepAesGcm;

impl PayloadEncryption for RsaOaepAesGcm {
    fn encrypt(
        &self,
        plaintext: &[u8],
        aad: &[u8],
        recipient: &RecipientKey,
    ) -> Result<EncryptedPayload, EncryptError> {
        let mut rng = rand::thread_rng();
        let mut content_key = [0u8; CONTENT_KEY_LEN];
        rng.fill_bytes(&mut content_key);
        let mut nonce = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce);

        let cipher = Aes256Gcm::new_from_slice(&content_key).map_err(|e| {
            EncryptError::EncryptionFailed {
                reason: e.to_string(),
            }
        })?;
        let ciphertext = cipher
            .encrypt(
                aes_gcm::Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|e| EncryptError::EncryptionFailed {
                reason: e.to_string(),
            })?;

        let encrypted_key = recipient
            .key
            .encrypt(&mut rng, Oaep::new::<Sha256>(), &content_key)
            .map_err(|e| EncryptError::EncryptionFailed {
                reason: e.to_string(),
            })?;

        Ok(EncryptedPayload {
            key_algorithm: KEY_TRANSPORT_RSA_OAEP.to_string(),
            content_algorithm: CONTENT_AES256_GCM.to_string(),
            encrypted_key,
            nonce: nonce.to_vec(),
            ciphertext,
        })
    }

    fn decrypt(
        &self,
        payload: &EncryptedPayload,
        aad: &[u8],
        key: &DecryptionKey,
    ) -> Result<Vec<u8>, PayloadDecryptError> {
        for (uri, supported) in [
            (&payload.key_algorithm, KEY_TRANSPORT_RSA_OAEP),
            (&payload.content_algorithm, CONTENT_AES256_GCM),
        ] {
            if uri != supported {
                return Err(PayloadDecryptError::UnsupportedAlgorithm { uri: uri.clone() });
            }
        }

        let content_key = key
            .key
            .decrypt(Oaep::new::<Sha256>(), &payload.encrypted_key)
            .map_err(|_| PayloadDecryptError::KeyUnwrap)?;
        if content_key.len() != CONTENT_KEY_LEN {
            return Err(PayloadDecryptError::Content {
                reason: format!("content key is {} bytes", content_key.len()),
            });
        }
        if payload.nonce.len() != NONCE_LEN {
            return Err(PayloadDecryptError::Content {
                reason: format!("nonce is {} bytes", payload.nonce.len()),
            });
        }

        let cipher = Aes256Gcm::new_from_slice(&content_key).map_err(|e| {
            PayloadDecryptError::Content {
                reason: e.to_string(),
            }
        })?;
        cipher
            .decrypt(
                aes_gcm::Nonce::from_slice(&payload.nonce),
                Payload {
                    msg: &payload.ciphertext,
                    aad,
                },
            )
            .map_err(|_| PayloadDecryptError::Content {
                reason: "authentication tag mismatch".to_string(),
            })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_with_matching_key() {
        let (key, _) = test_keys::pair();
        let payload = RsaOaepAesGcm
            .encrypt(b"message", b"aad", &key.recipient_key())
            .unwrap();

        assert_eq!(
            RsaOaepAesGcm.decrypt(&payload, b"aad", &key).unwrap(),
            b"message"
        );
        assert_eq!(payload.nonce.len(), NONCE_LEN);
    }

    #[test]
    fn other_key_cannot_unwrap() {
        let (key, other) = test_keys::pair();
        let payload = RsaOaepAesGcm
            .encrypt(b"message", b"aad", &key.recipient_key())
            .unwrap();

        assert_eq!(
            RsaOaepAesGcm.decrypt(&payload, b"aad", &other),
            Err(PayloadDecryptError::KeyUnwrap)
        );
    }

    #[test]
    fn changed_aad_fails_content_check() {
        let (key, _) = test_keys::pair();
        let payload = RsaOaepAesGcm
            .encrypt(b"message", b"aad", &key.recipient_key())
            .unwrap();

        assert!(matches!(
            RsaOaepAesGcm.decrypt(&payload, b"other", &key),
            Err(PayloadDecryptError::Content { .. })
        ));
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let (key, _) = test_keys::pair();
        let mut payload = RsaOaepAesGcm
            .encrypt(b"message", b"aad", &key.recipient_key())
            .unwrap();
        payload.content_algorithm = "http://www.w3.org/2001/04/xmlenc#aes128-cbc".into();

        assert!(matches!(
            RsaOaepAesGcm.decrypt(&payload, b"aad", &key),
            Err(PayloadDecryptError::UnsupportedAlgorithm { .. })
        ));
    }

    #[test]
    fn debug_is_redacted() {
        let (key, _) = test_keys::pair();
        let debug = format!("{key:?}");
        assert!(debug.contains(&key.recipient_key().fingerprint()));
        assert!(!debug.contains("primes"));
    }

    #[test]
    fn recipient_and_verifying_fingerprints_agree() {
        let (key, other) = test_keys::pair();
        let recipient = key.recipient_key();
        let verifying = crate::keys::VerifyingKey::from_rsa(recipient.key.clone());

        assert_eq!(recipient.fingerprint(), verifying.fingerprint());
        assert_ne!(recipient.fingerprint(), other.recipient_key().fingerprint());
    }
}
