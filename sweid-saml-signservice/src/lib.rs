//! Signature service extensions of the Swedish eID SAML profile.
//!
//! This crate implements the two protected payloads a signature service
//! exchanges with an identity provider:
//!
//! - **SAD** (Signed Authentication Data): a short-lived signed token
//!   binding one authentication to one signature transaction and one
//!   released attribute.
//! - **SignMessage**: the text shown to the user while signing, encrypted to
//!   the identity provider that displays it, plus the digest attribute the
//!   identity provider releases to prove it was shown.
//!
//! # Example
//!
//! ```rust
//! use sweid_saml::{Assertion, Attribute, AttributeStatement, AuthnStatement, names};
//! use sweid_saml_signservice::{SadFactory, SadValidator, SigningAlgorithm, SigningKey, TrustedKeys};
//!
//! let loa3 = "http://id.elegnamnden.se/loa/1.0/loa3";
//! let assertion = Assertion::new("_a1", "https://idp.example.se")
//!     .with_authn_statement(AuthnStatement::new(chrono::Utc::now(), loa3))
//!     .with_attribute_statement(AttributeStatement::new(vec![Attribute::new(
//!         names::PERSONAL_IDENTITY_NUMBER,
//!         ["199001011234"],
//!     )]));
//!
//! // Identity provider: issue a SAD
//! let idp_key = SigningKey::generate_ed25519();
//! let factory = SadFactory::new("https://idp.example.se", idp_key.clone(), SigningAlgorithm::EdDsa).unwrap();
//! let sad = factory
//!     .create(&assertion, "https://sp.example.org", names::PERSONAL_IDENTITY_NUMBER, loa3, 300)
//!     .unwrap()
//!     .to_string();
//!
//! // Signature service: validate it against the assertion
//! let validator = SadValidator::new(
//!     TrustedKeys::new().with_key("https://idp.example.se", idp_key.verifying_key()),
//! );
//! let claims = validator.validate(&sad, &assertion, "https://sp.example.org").unwrap();
//! assert_eq!(claims.sub, "199001011234");
//! ```
//!
//! # Token Structure
//!
//! `base64url(header).base64url(payload).base64url(signature)`, unpadded.
//! The header is `{"alg":"<alg>","typ":"JWT"}`. The payload carries the
//! claims `attr`, `aud`, `exp`, `iat`, `iss`, `jti`, `loa`, an optional
//! `seAttr` map, `sub` and `ver`, serialized as canonical JSON (sorted keys,
//! no whitespace).
//!
//! # Security Properties
//!
//! | Property | How Achieved |
//! |----------|--------------|
//! | No algorithm confusion | closed algorithm enum, key type checked against `alg`, `none` rejected |
//! | Replay binding | `jti` derived from the assertion issuer and ID |
//! | Attribute binding | `attr` and `sub` checked against the released attribute |
//! | Tamper detection | Ed25519 or RSA PKCS#1 v1.5 signature over the transmitted bytes |
//! | Message integrity | SignMessage metadata bound as AES-GCM associated data |

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod claims;
mod codec;
mod config;
mod decrypter;
mod digest;
mod encrypter;
mod encryption;
mod error;
mod factory;
mod keys;
mod proofs;
mod request;
mod sign_message;
mod signer;
mod token;
mod validator;
mod verification;
mod verifier;

pub use claims::{
    EXT_DOCUMENT_COUNT, EXT_IN_RESPONSE_TO, EXT_SIGN_REQUEST_ID, SAD_VERSION, SadClaims,
    SadClaimsBuilder,
};
pub use codec::{
    DecodedToken, SadHeader, TOKEN_TYPE, UNSIGNED, decode, decode_parts, encode, encode_with_header,
};
pub use config::SadConfig;
pub use decrypter::SignMessageDecrypter;
pub use digest::{DigestAlgorithm, SignMessageDigest, SignMessageDigestIssuer};
pub use encrypter::SignMessageEncrypter;
pub use encryption::{
    CONTENT_AES256_GCM, DecryptionKey, EncryptedPayload, KEY_TRANSPORT_RSA_OAEP, PayloadEncryption,
    Recipient, RecipientKey, RsaOaepAesGcm,
};
pub use error::{
    ConfigError, DecryptError, DigestError, EncryptError, FactoryError, PayloadDecryptError,
    RequestError, SadError, SadErrorCode, SadValidationError,
};
pub use factory::{SadFactory, transaction_id};
pub use keys::{SigningAlgorithm, SigningKey, TrustedKey, TrustedKeys, VerifyingKey};
pub use request::{Parameter, RequestParams, SadRequest, SadRequestBuilder};
pub use sign_message::{SignMessage, SignMessageContent, SignMessageMimeType};
pub use signer::{SadSigner, sign};
pub use token::SadToken;
pub use validator::SadValidator;
pub use verification::{
    check_expiry, check_issued_at, validate_audience, validate_bound_attribute, validate_issuer,
    validate_loa, validate_subject, validate_transaction,
};
pub use verifier::SadVerifier;

/// A prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use sweid_saml_signservice::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        DecryptError, DecryptionKey, EncryptError, FactoryError, Recipient, RecipientKey,
        SadClaims, SadConfig, SadError, SadErrorCode, SadFactory, SadRequest, SadToken,
        SadValidationError, SadValidator, SadVerifier, SignMessage, SignMessageDecrypter,
        SignMessageDigestIssuer, SignMessageEncrypter, SignMessageMimeType, SigningAlgorithm,
        SigningKey, TrustedKeys, VerifyingKey,
    };
}
