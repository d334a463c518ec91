//! Error types for the profile model.

use thiserror::Error;

/// Errors raised when a level of assurance URI cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaError {
    /// The URI is not one of the profile's authentication context URIs.
    #[error(
        "unknown level of assurance URI '{uri}'; expected one of the http://id.elegnamnden.se/loa/1.0/ or http://id.swedenconnect.se/loa/1.0/ URIs"
    )]
    UnknownUri {
        /// The URI that failed to resolve
        uri: String,
    },
}

/// Errors raised when building a principal selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrincipalSelectionError {
    /// A match value had an empty attribute name.
    #[error("match value has an empty attribute name")]
    EmptyName,
    /// A match value had an empty expected value.
    #[error("match value for attribute '{name}' is empty")]
    EmptyValue {
        /// The attribute name
        name: String,
    },
    /// The same attribute was given twice.
    #[error("attribute '{name}' appears more than once in the principal selection")]
    DuplicateName {
        /// The repeated attribute name
        name: String,
    },
}

/// An assertion did not carry the attributes an attribute set or an
/// explicit request demands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributesValidationError {
    /// The assertion has no attribute statement at all.
    #[error("assertion '{assertion_id}' has no attribute statement")]
    NoAttributeStatement {
        /// ID of the assertion
        assertion_id: String,
    },
    /// An attribute required by the attribute set is missing.
    #[error(
        "attribute '{attribute}' is required by attribute set '{attribute_set}' but is not included in assertion '{assertion_id}'"
    )]
    MissingFromAttributeSet {
        /// Name of the missing attribute
        attribute: String,
        /// Identifier of the attribute set
        attribute_set: &'static str,
        /// ID of the assertion
        assertion_id: String,
    },
    /// An attribute requested with `isRequired=true` is missing.
    #[error(
        "attribute '{attribute}' is requested as required but does not appear in assertion '{assertion_id}'"
    )]
    MissingRequested {
        /// Name of the missing attribute
        attribute: String,
        /// ID of the assertion
        assertion_id: String,
    },
}

impl AttributesValidationError {
    /// Returns the name of the attribute that was missing, if any.
    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::NoAttributeStatement { .. } => None,
            Self::MissingFromAttributeSet { attribute, .. }
            | Self::MissingRequested { attribute, .. } => Some(attribute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_loa_message_names_uri() {
        let err = LoaError::UnknownUri {
            uri: "http://example.com/loa".to_string(),
        };
        assert!(err.to_string().contains("http://example.com/loa"));
    }

    #[test]
    fn attribute_accessor() {
        let err = AttributesValidationError::MissingRequested {
            attribute: "urn:oid:2.5.4.4".to_string(),
            assertion_id: "_a1".to_string(),
        };
        assert_eq!(err.attribute(), Some("urn:oid:2.5.4.4"));

        let err = AttributesValidationError::NoAttributeStatement {
            assertion_id: "_a1".to_string(),
        };
        assert_eq!(err.attribute(), None);
    }
}
