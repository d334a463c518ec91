//! The SignMessage shown to a user during a signature ceremony.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::encryption::EncryptedPayload;
use crate::error::DecryptError;

/// The closed set of SignMessage mime types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignMessageMimeType {
    /// Plain text.
    #[default]
    Text,
    /// Restricted HTML.
    Html,
    /// Markdown.
    Markdown,
}

impl SignMessageMimeType {
    /// Returns the wire marker.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Html => "text/html",
            Self::Markdown => "text/markdown",
        }
    }

    /// Parses a wire marker.
    ///
    /// # Errors
    ///
    /// Returns `DecryptError::UnsupportedMimeType` for any other marker.
    ///
    /// ```
    /// use sweid_saml_signservice::SignMessageMimeType;
    ///
    /// assert_eq!(SignMessageMimeType::parse("text/html").unwrap(), SignMessageMimeType::Html);
    /// assert!(SignMessageMimeType::parse("application/pdf").is_err());
    /// ```
    pub fn parse(marker: &str) -> Result<Self, DecryptError> {
        match marker {
            "text" => Ok(Self::Text),
            "text/html" => Ok(Self::Html),
            "text/markdown" => Ok(Self::Markdown),
            other => Err(DecryptError::UnsupportedMimeType {
                mime_type: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SignMessageMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignMessageMimeType {
    type Err = DecryptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The content of a SignMessage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignMessageContent {
    /// The message in the clear.
    Cleartext(String),
    /// The protected message, encrypted to the display entity.
    Encrypted(EncryptedPayload),
}

/// A SignMessage.
///
/// ```
/// use sweid_saml_signservice::{SignMessage, SignMessageMimeType};
///
/// let message = SignMessage::cleartext("I approve the transfer of 500 SEK")
///     .with_mime_type(SignMessageMimeType::Markdown)
///     .with_must_show(true);
///
/// assert_eq!(message.message(), Some("I approve the transfer of 500 SEK"));
/// assert!(!message.is_encrypted());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignMessage {
    /// Mime type of the message
    pub mime_type: SignMessageMimeType,
    /// Entity ID of the identity provider that must display the message
    pub display_entity: Option<String>,
    /// Whether the signature must fail unless the message was displayed
    pub must_show: bool,
    /// The content
    pub content: SignMessageContent,
}

impl SignMessage {
    /// Creates a plain-text cleartext message.
    pub fn cleartext(message: impl Into<String>) -> Self {
        Self {
            mime_type: SignMessageMimeType::Text,
            display_entity: None,
            must_show: false,
            content: SignMessageContent::Cleartext(message.into()),
        }
    }

    /// Sets the mime type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: SignMessageMimeType) -> Self {
        self.mime_type = mime_type;
        self
    }

    /// Sets the display entity.
    #[must_use]
    pub fn with_display_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.display_entity = Some(entity_id.into());
        self
    }

    /// Sets the must-show flag.
    #[must_use]
    pub fn with_must_show(mut self, must_show: bool) -> Self {
        self.must_show = must_show;
        self
    }

    /// Returns the cleartext message, or `None` while encrypted.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match &self.content {
            SignMessageContent::Cleartext(m) => Some(m),
            SignMessageContent::Encrypted(_) => None,
        }
    }

    /// Returns true if the content is encrypted.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        matches!(self.content, SignMessageContent::Encrypted(_))
    }

    pub(crate) fn metadata(&self) -> ProtectedMetadata<'_> {
        ProtectedMetadata {
            display_entity: self.display_entity.as_deref(),
            mime_type: self.mime_type.as_str(),
            must_show: self.must_show,
        }
    }
}

/// The metadata bound into encryption as associated data, serialized as
/// canonical JSON.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProtectedMetadata<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_entity: Option<&'a str>,
    pub mime_type: &'a str,
    pub must_show: bool,
}

impl ProtectedMetadata<'_> {
    pub(crate) fn to_aad(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// The plaintext that is encrypted: the metadata and the message.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct ProtectedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_entity: Option<String>,
    pub message: String,
    pub mime_type: String,
    pub must_show: bool,
}
