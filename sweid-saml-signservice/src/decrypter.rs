//! SignMessage decryption.

use tracing::{debug, info, warn};

use crate::encryption::{DecryptionKey, EncryptedPayload, PayloadEncryption, RsaOaepAesGcm};
use crate::error::{DecryptError, PayloadDecryptError};
use crate::sign_message::{ProtectedMessage, SignMessage, SignMessageContent, SignMessageMimeType};

/// Decrypts SignMessages with the identity provider's keys.
///
/// Keys are tried in order; the first that unwraps the content key is
/// used. A message in the clear is returned unchanged.
///
/// # Example
///
/// ```
/// use sweid_saml_signservice::{
///     DecryptionKey, Recipient, SignMessage, SignMessageDecrypter, SignMessageEncrypter,
/// };
///
/// let idp_key = DecryptionKey::generate(1024).unwrap();
/// let recipient = Recipient::new("https://idp.example.se", idp_key.recipient_key());
/// let message = SignMessage::cleartext("Sign the contract").with_display_entity("https://idp.example.se");
/// let encrypted = SignMessageEncrypter::new().encrypt(&message, &recipient).unwrap();
///
/// let decrypted = SignMessageDecrypter::new(vec![idp_key]).decrypt(&encrypted).unwrap();
/// assert_eq!(decrypted, message);
/// ```
#[derive(Debug, Clone)]
pub struct SignMessageDecrypter<E = RsaOaepAesGcm> {
    keys: Vec<DecryptionKey>,
    engine: E,
}

impl SignMessageDecrypter {
    /// Creates a decrypter using RSA-OAEP and AES-256-GCM.
    #[must_use]
    pub fn new(keys: Vec<DecryptionKey>) -> Self {
        Self::with_engine(keys, RsaOaepAesGcm)
    }
}

impl<E: PayloadEncryption> SignMessageDecrypter<E> {
    /// Creates a decrypter over another encryption implementation.
    pub fn with_engine(keys: Vec<DecryptionKey>, engine: E) -> Self {
        Self { keys, engine }
    }

    /// Returns the number of configured keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Decrypts a message.
    ///
    /// # Errors
    ///
    /// - `KeyMismatch` if no configured key can open the message
    /// - `MalformedCiphertext` if the content fails its integrity check,
    ///   is not a well-formed protected message, or disagrees with the
    ///   message's metadata
    /// - `UnsupportedMimeType` if the recovered mime type is unknown
    pub fn decrypt(&self, message: &SignMessage) -> Result<SignMessage, DecryptError> {
        let payload = match &message.content {
            SignMessageContent::Cleartext(_) => {
                info!("no decryption required, sign message is in the clear");
                return Ok(message.clone());
            }
            SignMessageContent::Encrypted(payload) => payload,
        };

        let aad = message
            .metadata()
            .to_aad()
            .map_err(|e| malformed(e.to_string()))?;
        let plaintext = self.open(payload, &aad)?;

        let protected: ProtectedMessage = serde_json::from_slice(&plaintext)
            .map_err(|e| malformed(format!("not a protected sign message: {e}")))?;
        let mime_type = SignMessageMimeType::parse(&protected.mime_type)?;

        if protected.message.trim().is_empty() {
            return Err(malformed("decrypted message is empty".to_string()));
        }
        if mime_type != message.mime_type
            || protected.must_show != message.must_show
            || protected.display_entity != message.display_entity
        {
            return Err(malformed(
                "protected metadata does not match the sign message".to_string(),
            ));
        }

        Ok(SignMessage {
            mime_type,
            display_entity: protected.display_entity,
            must_show: protected.must_show,
            content: SignMessageContent::Cleartext(protected.message),
        })
    }

    fn open(&self, payload: &EncryptedPayload, aad: &[u8]) -> Result<Vec<u8>, DecryptError> {
        for key in &self.keys {
            match self.engine.decrypt(payload, aad, key) {
                Ok(plaintext) => {
                    debug!(key = %key.recipient_key().fingerprint(), "decrypted sign message");
                    return Ok(plaintext);
                }
                Err(PayloadDecryptError::KeyUnwrap) => {}
                Err(err) => {
                    warn!(error = %err, "sign message content did not decrypt");
                    return Err(malformed(err.to_string()));
                }
            }
        }
        warn!(tried = self.keys.len(), "no configured key could decrypt sign message");
        Err(DecryptError::KeyMismatch {
            tried: self.keys.len(),
        })
    }
}

fn malformed(reason: String) -> DecryptError {
    DecryptError::MalformedCiphertext { reason }
}
