//! Convenient re-exports for glob imports.
//!
//! ```rust
//! use sweid_saml::prelude::*;
//!
//! let assertion = Assertion::new("_a1", "https://idp.example.se");
//! assert!(assertion.attribute(names::SN).is_none());
//! ```

pub use crate::{
    // Assertion and response values
    Assertion, AuthnStatement, Conditions, EncryptedAssertion, NameId, Response, Status, Subject,
    SubjectConfirmation, SubjectConfirmationData, XmlSignature,
    // Attributes
    Attribute, AttributeSet, AttributeStatement, AttributeTemplate, RequestedAttribute,
    ValueFormat, names,
    // Levels of assurance
    LevelOfAssurance, LoaSet,
    // Principal selection
    MatchValue, PrincipalSelection, RequestedPrincipalSelection,
    // Errors
    AttributesValidationError, LoaError, PrincipalSelectionError,
};
