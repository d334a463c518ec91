//! Attribute sets defined by the Swedish eID Framework.
//!
//! An attribute set fixes which attributes an identity provider must release
//! (and which it should release) under a given attribute release policy. The
//! sets are process-wide read-only values; pass them by reference to
//! validators.

use tracing::{debug, info};

use crate::attribute::{AttributeStatement, AttributeTemplate, RequestedAttribute, templates};
use crate::error::AttributesValidationError;

/// An attribute set: identifier, URI and the attributes it requires and
/// recommends.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct AttributeSet {
    /// Short identifier, e.g. `ELN-AP-Pnr-01`
    pub identifier: &'static str,
    /// URI identifying the set
    pub uri: &'static str,
    /// Human readable name
    pub friendly_name: &'static str,
    /// Attributes that must be released
    pub required: &'static [AttributeTemplate],
    /// Attributes that should be released
    pub recommended: &'static [AttributeTemplate],
}

/// Pseudonym identity. No attributes are required; the persistent `NameID`
/// identifies the subject.
pub static PSEUDONYM_IDENTITY: AttributeSet = AttributeSet {
    identifier: "ELN-AP-Pseudonym-01",
    uri: "http://id.elegnamnden.se/ap/1.0/pseudonym-01",
    friendly_name: "Pseudonym Identity",
    required: &[],
    recommended: &[],
};

/// Natural person identity without a civic registration number.
pub static NATURAL_PERSON_NO_PERSONAL_ID: AttributeSet = AttributeSet {
    identifier: "ELN-AP-NaturalPerson-01",
    uri: "http://id.elegnamnden.se/ap/1.0/natural-person-01",
    friendly_name: "Natural Personal Identity without Civic Registration Number",
    required: &[
        templates::DISPLAY_NAME,
        templates::SN,
        templates::GIVEN_NAME,
    ],
    recommended: &[],
};

/// Natural person identity with a civic registration number.
pub static NATURAL_PERSON_WITH_PERSONAL_ID: AttributeSet = AttributeSet {
    identifier: "ELN-AP-Pnr-01",
    uri: "http://id.elegnamnden.se/ap/1.0/pnr-01",
    friendly_name: "Natural Personal Identity with Civic Registration Number",
    required: &[
        templates::PERSONAL_IDENTITY_NUMBER,
        templates::SN,
        templates::GIVEN_NAME,
        templates::DISPLAY_NAME,
    ],
    recommended: &[templates::DATE_OF_BIRTH],
};

/// Organizational identity for natural persons.
pub static ORGANIZATIONAL_IDENTITY: AttributeSet = AttributeSet {
    identifier: "ELN-AP-OrgPerson-01",
    uri: "http://id.elegnamnden.se/ap/1.0/org-person-01",
    friendly_name: "Organizational Identity for Natural Persons",
    required: &[
        templates::DISPLAY_NAME,
        templates::ORG_AFFILIATION,
        templates::O,
    ],
    recommended: &[templates::ORGANIZATION_IDENTIFIER],
};

/// eIDAS natural person attribute set.
pub static EIDAS_NATURAL_PERSON: AttributeSet = AttributeSet {
    identifier: "ELN-AP-eIDAS-NatPer-01",
    uri: "http://id.elegnamnden.se/ap/1.0/eidas-natural-person-01",
    friendly_name: "eIDAS Natural Person Attribute Set",
    required: &[
        templates::PRID,
        templates::PRID_PERSISTENCE,
        templates::EIDAS_PERSON_IDENTIFIER,
        templates::DATE_OF_BIRTH,
        templates::SN,
        templates::GIVEN_NAME,
        templates::TRANSACTION_IDENTIFIER,
        templates::C,
    ],
    recommended: &[
        templates::BIRTH_NAME,
        templates::PLACE_OF_BIRTH,
        templates::EIDAS_NATURAL_PERSON_ADDRESS,
        templates::GENDER,
        templates::MAPPED_PERSONAL_IDENTITY_NUMBER,
        templates::PERSONAL_IDENTITY_NUMBER_BINDING,
    ],
};

static ALL_SETS: [&AttributeSet; 5] = [
    &PSEUDONYM_IDENTITY,
    &NATURAL_PERSON_NO_PERSONAL_ID,
    &NATURAL_PERSON_WITH_PERSONAL_ID,
    &ORGANIZATIONAL_IDENTITY,
    &EIDAS_NATURAL_PERSON,
];

impl AttributeSet {
    /// Returns every attribute set the profile defines.
    #[must_use]
    pub fn all() -> &'static [&'static Self] {
        &ALL_SETS
    }

    /// Looks up an attribute set by its URI.
    ///
    /// ```
    /// use sweid_saml::AttributeSet;
    ///
    /// let set = AttributeSet::from_uri("http://id.elegnamnden.se/ap/1.0/pnr-01").unwrap();
    /// assert_eq!(set.identifier, "ELN-AP-Pnr-01");
    /// ```
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<&'static Self> {
        ALL_SETS.iter().copied().find(|set| set.uri == uri)
    }

    /// Validates that an attribute statement carries the attributes this set
    /// requires, and every attribute explicitly requested with
    /// `is_required` set.
    ///
    /// Requested attributes that are not required and missing are only
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns the first missing attribute as an
    /// `AttributesValidationError`.
    pub fn validate_attributes(
        &self,
        assertion_id: &str,
        statement: &AttributeStatement,
        explicitly_requested: &[RequestedAttribute],
    ) -> Result<(), AttributesValidationError> {
        for required in self.required {
            if !statement.contains(required.name) {
                info!(
                    attribute = required.name,
                    attribute_set = self.identifier,
                    assertion_id,
                    "required attribute missing from assertion"
                );
                return Err(AttributesValidationError::MissingFromAttributeSet {
                    attribute: required.name.to_string(),
                    attribute_set: self.identifier,
                    assertion_id: assertion_id.to_string(),
                });
            }
        }
        debug!(
            attribute_set = self.identifier,
            assertion_id, "all attributes of attribute set present"
        );

        for requested in explicitly_requested {
            if statement.contains(&requested.name) {
                continue;
            }
            if requested.is_required {
                info!(
                    attribute = requested.name.as_str(),
                    assertion_id, "required requested attribute missing from assertion"
                );
                return Err(AttributesValidationError::MissingRequested {
                    attribute: requested.name.clone(),
                    assertion_id: assertion_id.to_string(),
                });
            }
            info!(
                attribute = requested.name.as_str(),
                assertion_id, "optional requested attribute not released"
            );
        }
        Ok(())
    }
}
