//! Swedish eID profile validation of SAML responses and assertions.
//!
//! A service provider hands each received [`Response`](sweid_saml::Response)
//! to a [`ResponseProcessor`] together with the [`ValidationParameters`] of
//! the request it answers. The processor checks the signature, the response
//! fields, the assertion and, for signature service authentications, the
//! SAD, and either accepts the response or says where and why it stopped.
//!
//! The statement validators are also usable on their own through a
//! [`ValidationContext`]:
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use sweid_saml::{Assertion, AuthnStatement, LevelOfAssurance};
//! use sweid_saml_validation::{
//!     ValidationConfig, ValidationContext, ValidationErrorCode, ValidationParameters,
//!     ValidationResult, authn_statement,
//! };
//!
//! let config = ValidationConfig::default();
//! let params = ValidationParameters::new("https://sp.example.org", "https://sp.example.org/acs");
//! let now = Utc::now();
//! let mut ctx = ValidationContext::new(&config, &params, now);
//!
//! let assertion = Assertion::new("_a1", "https://idp.example.se")
//!     .with_authn_statement(AuthnStatement::new(now - Duration::hours(3), LevelOfAssurance::Loa3.uri()));
//!
//! assert_eq!(authn_statement::validate(&assertion, &mut ctx), ValidationResult::Invalid);
//! assert_eq!(ctx.failures()[0].code, ValidationErrorCode::AuthnTooOld);
//! ```
//!
//! # Processing States
//!
//! | State | Reached when |
//! |-------|--------------|
//! | `RECEIVED` | always |
//! | `SIGNATURE_CHECKED` | a trust anchor verified the response signature |
//! | `ASSERTION_VALIDATED` | response fields and the assertion passed |
//! | `SAD_VALIDATED` | the expected SAD passed, or none was expected |
//! | `ACCEPTED` | every step passed |
//!
//! # Strict Mode
//!
//! Strict mode, the default, rejects responses that deviate from the
//! profile's recommendations: a `NameID` format other than persistent or
//! transient, anything but a single encrypted assertion, a missing
//! `Destination`, or attribute values that break their format. Outside
//! strict mode these are reported as warnings on the accepted response.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assertion;
pub mod attribute_statement;
pub mod authn_statement;
mod config;
mod context;
mod error;
mod processor;
pub mod subject_confirmation;
mod trust;

pub use config::ValidationConfig;
pub use context::{ValidationContext, ValidationParameters, ValidationResult};
pub use error::{
    AssertionDecryptionError, ConfigError, ResponseRejection, ValidationErrorCode,
    ValidationFailure,
};
pub use processor::{ProcessedResponse, ProcessingState, ResponseProcessor};
pub use trust::{
    AnchorTrustEngine, AssertionDecrypter, SignatureTrustEngine, SignatureVerdict, TrustAnchor,
    XMLDSIG_EDDSA_ED25519, XMLDSIG_RSA_SHA256, XMLDSIG_RSA_SHA384, XMLDSIG_RSA_SHA512,
    signature_algorithm,
};

/// A prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use sweid_saml_validation::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AnchorTrustEngine, AssertionDecrypter, ProcessedResponse, ProcessingState,
        ResponseProcessor, ResponseRejection, SignatureTrustEngine, TrustAnchor, ValidationConfig,
        ValidationContext, ValidationErrorCode, ValidationFailure, ValidationParameters,
        ValidationResult,
    };
}
