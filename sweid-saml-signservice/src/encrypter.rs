//! SignMessage encryption.

use tracing::debug;

use crate::encryption::{PayloadEncryption, Recipient, RsaOaepAesGcm};
use crate::error::EncryptError;
use crate::sign_message::{ProtectedMessage, SignMessage, SignMessageContent};

/// Encrypts SignMessages to the identity provider that displays them.
///
/// The mime type, must-show flag and display entity are bound to the
/// ciphertext as associated data and are also repeated inside the
/// encrypted payload, so changing any of them makes decryption fail.
///
/// # Example
///
/// ```
/// use sweid_saml_signservice::{DecryptionKey, Recipient, SignMessage, SignMessageEncrypter};
///
/// let idp_key = DecryptionKey::generate(1024).unwrap();
/// let recipient = Recipient::new("https://idp.example.se", idp_key.recipient_key());
///
/// let encrypted = SignMessageEncrypter::new()
///     .encrypt(&SignMessage::cleartext("Sign the contract"), &recipient)
///     .unwrap();
///
/// assert!(encrypted.is_encrypted());
/// assert_eq!(encrypted.display_entity.as_deref(), Some("https://idp.example.se"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SignMessageEncrypter<E = RsaOaepAesGcm> {
    engine: E,
}

impl SignMessageEncrypter {
    /// Creates an encrypter using RSA-OAEP and AES-256-GCM.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: PayloadEncryption> SignMessageEncrypter<E> {
    /// Creates an encrypter over another encryption implementation.
    pub fn with_engine(engine: E) -> Self {
        Self { engine }
    }

    /// Encrypts a cleartext message to `recipient`.
    ///
    /// A message without a display entity gets the recipient's entity ID.
    ///
    /// # Errors
    ///
    /// - `AlreadyEncrypted` if the message is encrypted
    /// - `EmptyMessage` if the message is blank
    /// - `DisplayEntityMismatch` if the message names another display entity
    /// - `EncryptionFailed` if the primitive fails
    pub fn encrypt(
        &self,
        message: &SignMessage,
        recipient: &Recipient,
    ) -> Result<SignMessage, EncryptError> {
        let text = match &message.content {
            SignMessageContent::Encrypted(_) => return Err(EncryptError::AlreadyEncrypted),
            SignMessageContent::Cleartext(text) if text.trim().is_empty() => {
                return Err(EncryptError::EmptyMessage);
            }
            SignMessageContent::Cleartext(text) => text,
        };

        let display_entity = match &message.display_entity {
            Some(entity) if *entity != recipient.entity_id => {
                return Err(EncryptError::DisplayEntityMismatch {
                    display_entity: entity.clone(),
                    recipient: recipient.entity_id.clone(),
                });
            }
            Some(entity) => entity.clone(),
            None => {
                debug!(display_entity = %recipient.entity_id, "filled in sign message display entity");
                recipient.entity_id.clone()
            }
        };

        let mut encrypted = SignMessage {
            mime_type: message.mime_type,
            display_entity: Some(display_entity.clone()),
            must_show: message.must_show,
            content: SignMessageContent::Cleartext(String::new()),
        };

        let protected = ProtectedMessage {
            display_entity: Some(display_entity),
            message: text.clone(),
            mime_type: message.mime_type.as_str().to_string(),
            must_show: message.must_show,
        };
        let plaintext = serde_json::to_vec(&protected).map_err(failed)?;
        let aad = encrypted.metadata().to_aad().map_err(failed)?;

        let payload = self.engine.encrypt(&plaintext, &aad, &recipient.key)?;
        debug!(
            recipient = %recipient.entity_id,
            key = %recipient.key.fingerprint(),
            "encrypted sign message"
        );

        encrypted.content = SignMessageContent::Encrypted(payload);
        Ok(encrypted)
    }
}

fn failed(err: serde_json::Error) -> EncryptError {
    EncryptError::EncryptionFailed {
        reason: err.to_string(),
    }
}
