//! SAML assertion values as seen by the profile validators.
//!
//! These are read-only views over an already parsed assertion. XML
//! (un)marshalling happens elsewhere; the validators only need accessors.

use chrono::{DateTime, Utc};

use crate::attribute::{Attribute, AttributeStatement};
use crate::constants::{CONFIRMATION_METHOD_BEARER, CONFIRMATION_METHOD_HOLDER_OF_KEY};
use crate::response::XmlSignature;

/// A SAML assertion.
///
/// ```
/// use chrono::Utc;
/// use sweid_saml::{Assertion, Attribute, AttributeStatement, NameId, Subject, names};
///
/// let assertion = Assertion::new("_a1", "https://idp.example.se")
///     .with_subject(Subject::new(NameId::persistent("u-123")))
///     .with_attribute_statement(AttributeStatement::new(vec![Attribute::new(
///         names::PERSONAL_IDENTITY_NUMBER,
///         ["199001011234"],
///     )]));
///
/// assert_eq!(
///     assertion.attribute(names::PERSONAL_IDENTITY_NUMBER).and_then(|a| a.first_value()),
///     Some("199001011234")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assertion {
    /// Assertion ID
    pub id: String,
    /// Entity ID of the issuing identity provider
    pub issuer: String,
    /// When the assertion was issued
    pub issue_instant: DateTime<Utc>,
    /// The subject
    pub subject: Option<Subject>,
    /// Validity conditions
    pub conditions: Option<Conditions>,
    /// Authentication statements
    pub authn_statements: Vec<AuthnStatement>,
    /// Attribute statements
    pub attribute_statements: Vec<AttributeStatement>,
    /// Enveloped signature, if the assertion is signed
    pub signature: Option<XmlSignature>,
}

impl Assertion {
    /// Creates an assertion issued now with no statements.
    pub fn new(id: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            issuer: issuer.into(),
            issue_instant: Utc::now(),
            subject: None,
            conditions: None,
            authn_statements: Vec::new(),
            attribute_statements: Vec::new(),
            signature: None,
        }
    }

    /// Sets the issue instant.
    #[must_use]
    pub fn with_issue_instant(mut self, instant: DateTime<Utc>) -> Self {
        self.issue_instant = instant;
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Sets the conditions.
    #[must_use]
    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Adds an authentication statement.
    #[must_use]
    pub fn with_authn_statement(mut self, statement: AuthnStatement) -> Self {
        self.authn_statements.push(statement);
        self
    }

    /// Adds an attribute statement.
    #[must_use]
    pub fn with_attribute_statement(mut self, statement: AttributeStatement) -> Self {
        self.attribute_statements.push(statement);
        self
    }

    /// Sets the signature.
    #[must_use]
    pub fn with_signature(mut self, signature: XmlSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Returns the first attribute with the given name across all attribute
    /// statements.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attribute_statements.iter().find_map(|s| s.find(name))
    }

    /// Returns the authentication context class reference of the first
    /// authentication statement.
    #[must_use]
    pub fn authn_context_class_ref(&self) -> Option<&str> {
        self.authn_statements
            .first()
            .and_then(|s| s.authn_context_class_ref.as_deref())
    }

    /// Returns the subject's `NameID` value, if present.
    #[must_use]
    pub fn name_id(&self) -> Option<&str> {
        self.subject
            .as_ref()
            .and_then(|s| s.name_id.as_ref())
            .map(|n| n.value.as_str())
    }
}

/// The subject of an assertion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Subject {
    /// Name identifier
    pub name_id: Option<NameId>,
    /// Subject confirmations
    pub confirmations: Vec<SubjectConfirmation>,
}

impl Subject {
    /// Creates a subject with a name identifier and no confirmations.
    #[must_use]
    pub fn new(name_id: NameId) -> Self {
        Self {
            name_id: Some(name_id),
            confirmations: Vec::new(),
        }
    }

    /// Adds a subject confirmation.
    #[must_use]
    pub fn with_confirmation(mut self, confirmation: SubjectConfirmation) -> Self {
        self.confirmations.push(confirmation);
        self
    }
}

/// A SAML `NameID`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NameId {
    /// Identifier value
    pub value: String,
    /// Format URI, if given
    pub format: Option<String>,
}

impl NameId {
    /// Creates a name identifier.
    pub fn new(value: impl Into<String>, format: Option<&str>) -> Self {
        Self {
            value: value.into(),
            format: format.map(str::to_string),
        }
    }

    /// Creates a persistent name identifier.
    pub fn persistent(value: impl Into<String>) -> Self {
        Self::new(value, Some(crate::constants::NAMEID_FORMAT_PERSISTENT))
    }

    /// Creates a transient name identifier.
    pub fn transient(value: impl Into<String>) -> Self {
        Self::new(value, Some(crate::constants::NAMEID_FORMAT_TRANSIENT))
    }
}

/// A subject confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubjectConfirmation {
    /// Confirmation method URI
    pub method: String,
    /// Confirmation data
    pub data: Option<SubjectConfirmationData>,
}

impl SubjectConfirmation {
    /// Creates a bearer confirmation.
    #[must_use]
    pub fn bearer(data: SubjectConfirmationData) -> Self {
        Self {
            method: CONFIRMATION_METHOD_BEARER.to_string(),
            data: Some(data),
        }
    }

    /// Creates a holder-of-key confirmation.
    #[must_use]
    pub fn holder_of_key(data: SubjectConfirmationData) -> Self {
        Self {
            method: CONFIRMATION_METHOD_HOLDER_OF_KEY.to_string(),
            data: Some(data),
        }
    }

    /// Returns true for the bearer method.
    #[must_use]
    pub fn is_bearer(&self) -> bool {
        self.method == CONFIRMATION_METHOD_BEARER
    }

    /// Returns true for the holder-of-key method.
    #[must_use]
    pub fn is_holder_of_key(&self) -> bool {
        self.method == CONFIRMATION_METHOD_HOLDER_OF_KEY
    }
}

/// Subject confirmation data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubjectConfirmationData {
    /// Where the assertion may be delivered
    pub recipient: Option<String>,
    /// Time after which the subject can no longer be confirmed
    pub not_on_or_after: Option<DateTime<Utc>>,
    /// ID of the request this responds to
    pub in_response_to: Option<String>,
    /// Client address the assertion was issued to
    pub address: Option<String>,
}

impl SubjectConfirmationData {
    /// Creates confirmation data with recipient, expiry and request ID.
    pub fn new(
        recipient: impl Into<String>,
        not_on_or_after: DateTime<Utc>,
        in_response_to: impl Into<String>,
    ) -> Self {
        Self {
            recipient: Some(recipient.into()),
            not_on_or_after: Some(not_on_or_after),
            in_response_to: Some(in_response_to.into()),
            address: None,
        }
    }

    /// Sets the client address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// Assertion validity conditions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Conditions {
    /// Start of the validity window
    pub not_before: Option<DateTime<Utc>>,
    /// End of the validity window (exclusive)
    pub not_on_or_after: Option<DateTime<Utc>>,
    /// Audience restrictions; each holds a list of audiences
    pub audience_restrictions: Vec<Vec<String>>,
}

impl Conditions {
    /// Creates conditions with a validity window and a single audience.
    pub fn new(
        not_before: DateTime<Utc>,
        not_on_or_after: DateTime<Utc>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            not_before: Some(not_before),
            not_on_or_after: Some(not_on_or_after),
            audience_restrictions: vec![vec![audience.into()]],
        }
    }

    /// Returns true if any audience restriction names the audience.
    #[must_use]
    pub fn has_audience(&self, audience: &str) -> bool {
        self.audience_restrictions
            .iter()
            .any(|restriction| restriction.iter().any(|a| a == audience))
    }
}

/// An authentication statement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuthnStatement {
    /// When the user authenticated
    pub authn_instant: DateTime<Utc>,
    /// Session index
    pub session_index: Option<String>,
    /// End of the session
    pub session_not_on_or_after: Option<DateTime<Utc>>,
    /// Authentication context class reference (the LoA URI)
    pub authn_context_class_ref: Option<String>,
}

impl AuthnStatement {
    /// Creates a statement for an authentication at `authn_instant` under
    /// the given context class.
    pub fn new(authn_instant: DateTime<Utc>, authn_context_class_ref: impl Into<String>) -> Self {
        Self {
            authn_instant,
            session_index: None,
            session_not_on_or_after: None,
            authn_context_class_ref: Some(authn_context_class_ref.into()),
        }
    }

    /// Sets the session index.
    #[must_use]
    pub fn with_session_index(mut self, index: impl Into<String>) -> Self {
        self.session_index = Some(index.into());
        self
    }

    /// Sets the session end.
    #[must_use]
    pub fn with_session_not_on_or_after(mut self, instant: DateTime<Utc>) -> Self {
        self.session_not_on_or_after = Some(instant);
        self
    }
}
