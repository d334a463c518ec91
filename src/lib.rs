//! Profile model for the Swedish eID Framework SAML deployment profile.
//!
//! This crate holds the value types the rest of the workspace validates and
//! signs: Level of Assurance URIs, the profile's attribute names and
//! attribute sets, principal selection, and read-only views of SAML
//! assertions and responses.
//!
//! # Overview
//!
//! XML parsing and the XML security primitives are not part of this crate.
//! An assertion arrives here already parsed; the types expose only the
//! accessors the profile rules need.
//!
//! # Quick Start
//!
//! ```rust
//! use sweid_saml::prelude::*;
//!
//! let loa = LevelOfAssurance::from_uri("http://id.elegnamnden.se/loa/1.0/loa3").unwrap();
//! assert_eq!(loa, LevelOfAssurance::Loa3);
//!
//! let set = AttributeSet::from_uri("http://id.elegnamnden.se/ap/1.0/pnr-01").unwrap();
//! assert!(set.required.iter().any(|t| t.name == names::PERSONAL_IDENTITY_NUMBER));
//! ```
//!
//! # Static Tables
//!
//! | Table | Lookup |
//! |-------|--------|
//! | Levels of assurance | [`LevelOfAssurance::from_uri`] |
//! | Attribute templates | [`AttributeTemplate::lookup`] |
//! | Attribute sets | [`AttributeSet::from_uri`] |
//!
//! All tables are immutable and safe to share between threads.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod assertion;
mod attribute;
mod attribute_set;
mod constants;
mod error;
mod loa;
mod principal_selection;
mod response;

pub mod prelude;

#[cfg(kani)]
mod kani_impls;

pub use assertion::{
    Assertion, AuthnStatement, Conditions, NameId, Subject, SubjectConfirmation,
    SubjectConfirmationData,
};
pub use attribute::{
    Attribute, AttributeStatement, AttributeTemplate, RequestedAttribute, ValueFormat, names,
};
pub use attribute_set::{
    AttributeSet, EIDAS_NATURAL_PERSON, NATURAL_PERSON_NO_PERSONAL_ID,
    NATURAL_PERSON_WITH_PERSONAL_ID, ORGANIZATIONAL_IDENTITY, PSEUDONYM_IDENTITY,
};
pub use constants::*;
pub use error::{AttributesValidationError, LoaError, PrincipalSelectionError};
pub use loa::{LevelOfAssurance, LoaSet};
pub use principal_selection::{
    MatchValue, PrincipalSelection, PrincipalSelectionBuilder, RequestedPrincipalSelection,
};
pub use response::{EncryptedAssertion, Response, Status, XmlSignature};
