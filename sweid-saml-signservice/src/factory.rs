//! SAD issuance at the identity provider.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sweid_saml::{Assertion, LevelOfAssurance};
use tracing::debug;

use crate::claims::{SadClaims, SadClaimsBuilder};
use crate::config::SadConfig;
use crate::error::{FactoryError, SadError};
use crate::keys::{SigningAlgorithm, SigningKey};
use crate::request::SadRequest;
use crate::signer::SadSigner;
use crate::token::SadToken;

/// Derives the SAD transaction id for an assertion.
///
/// The id is `base64url(SHA-256(issuer || 0x00 || assertion id))`: unique
/// per assertion, and recomputable by a validator holding the assertion.
///
/// ```
/// use sweid_saml::Assertion;
/// use sweid_saml_signservice::transaction_id;
///
/// let a = Assertion::new("_a1", "https://idp.example.se");
/// let b = Assertion::new("_a2", "https://idp.example.se");
/// assert_eq!(transaction_id(&a), transaction_id(&a.clone()));
/// assert_ne!(transaction_id(&a), transaction_id(&b));
/// ```
#[must_use]
pub fn transaction_id(assertion: &Assertion) -> String {
    let mut hasher = Sha256::new();
    hasher.update(assertion.issuer.as_bytes());
    hasher.update([0u8]);
    hasher.update(assertion.id.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Issues SAD tokens bound to assertions.
///
/// # Example
///
/// ```
/// use sweid_saml::{Assertion, Attribute, AttributeStatement, names};
/// use sweid_saml_signservice::{SadFactory, SigningAlgorithm, SigningKey};
///
/// let assertion = Assertion::new("_a1", "https://idp.example.se").with_attribute_statement(
///     AttributeStatement::new(vec![Attribute::new(
///         names::PERSONAL_IDENTITY_NUMBER,
///         ["199001011234"],
///     )]),
/// );
///
/// let factory = SadFactory::new(
///     "https://idp.example.se",
///     SigningKey::generate_ed25519(),
///     SigningAlgorithm::EdDsa,
/// )
/// .unwrap();
///
/// let token = factory
///     .create(
///         &assertion,
///         "https://sign.example.se",
///         names::PERSONAL_IDENTITY_NUMBER,
///         "http://id.elegnamnden.se/loa/1.0/loa3",
///         300,
///     )
///     .unwrap();
///
/// assert_eq!(token.claims().sub, "199001011234");
/// ```
#[derive(Debug, Clone)]
pub struct SadFactory {
    idp_entity_id: String,
    signer: SadSigner,
    config: SadConfig,
}

impl SadFactory {
    /// Creates a factory for the identity provider `idp_entity_id`.
    ///
    /// # Errors
    ///
    /// Returns `SadError::UnsupportedAlgorithm` if `key` cannot sign with
    /// `algorithm`.
    pub fn new(
        idp_entity_id: impl Into<String>,
        key: SigningKey,
        algorithm: SigningAlgorithm,
    ) -> Result<Self, SadError> {
        Ok(Self {
            idp_entity_id: idp_entity_id.into(),
            signer: SadSigner::new(key, algorithm)?,
            config: SadConfig::default(),
        })
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: SadConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the identity provider entity ID.
    #[must_use]
    pub fn idp_entity_id(&self) -> &str {
        &self.idp_entity_id
    }

    /// Issues a SAD bound to `assertion` at the current time.
    ///
    /// # Errors
    ///
    /// See [`SadFactory::create_at`].
    pub fn create(
        &self,
        assertion: &Assertion,
        audience: &str,
        attribute_name: &str,
        loa: &str,
        validity_seconds: i64,
    ) -> Result<SadToken, FactoryError> {
        self.create_at(
            assertion,
            audience,
            attribute_name,
            loa,
            validity_seconds,
            Utc::now(),
        )
    }

    /// Issues a SAD bound to `assertion`, issued at `now`.
    ///
    /// `sub` is the first value of `attribute_name` in the assertion and
    /// `jti` is [`transaction_id`] of the assertion.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` if `validity_seconds <= 0`, `audience` is empty,
    ///   `loa` is not a profile LoA, or the assertion was issued by another
    ///   identity provider
    /// - `AttributeNotFound` if the assertion has no value for `attribute_name`
    pub fn create_at(
        &self,
        assertion: &Assertion,
        audience: &str,
        attribute_name: &str,
        loa: &str,
        validity_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<SadToken, FactoryError> {
        let claims = self
            .claims_for(assertion, audience, attribute_name, loa, validity_seconds, now)?
            .build()?;
        self.sign(claims)
    }

    /// Issues a SAD answering `request` at the current time.
    ///
    /// # Errors
    ///
    /// See [`SadFactory::create_for_request_at`].
    pub fn create_for_request(
        &self,
        assertion: &Assertion,
        request: &SadRequest,
        loa: &str,
    ) -> Result<SadToken, FactoryError> {
        self.create_for_request_at(assertion, request, loa, Utc::now())
    }

    /// Issues a SAD answering `request`.
    ///
    /// The audience is the request's requester, the bound attribute is the
    /// configured user id attribute and the validity is the configured
    /// default. The request ID, sign request ID and document count are
    /// copied into `seAttr`.
    ///
    /// # Errors
    ///
    /// As [`SadFactory::create_at`].
    pub fn create_for_request_at(
        &self,
        assertion: &Assertion,
        request: &SadRequest,
        loa: &str,
        now: DateTime<Utc>,
    ) -> Result<SadToken, FactoryError> {
        let validity = i64::try_from(self.config.default_validity.as_secs()).map_err(|_| {
            FactoryError::InvalidParameter {
                parameter: "default_validity",
                reason: "out of range".to_string(),
            }
        })?;
        let claims = self
            .claims_for(
                assertion,
                &request.requester_id,
                &self.config.user_id_attribute,
                loa,
                validity,
                now,
            )?
            .in_response_to(&request.id)
            .sign_request_id(&request.sign_request_id)
            .document_count(request.doc_count)
            .build()?;
        self.sign(claims)
    }

    fn claims_for(
        &self,
        assertion: &Assertion,
        audience: &str,
        attribute_name: &str,
        loa: &str,
        validity_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<SadClaimsBuilder, FactoryError> {
        let validity = u64::try_from(validity_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| FactoryError::InvalidParameter {
                parameter: "validity_seconds",
                reason: format!("must be positive, got {validity_seconds}"),
            })?;
        if audience.trim().is_empty() {
            return Err(FactoryError::InvalidParameter {
                parameter: "audience",
                reason: "must not be empty".to_string(),
            });
        }
        if LevelOfAssurance::from_uri(loa).is_err() {
            return Err(FactoryError::InvalidParameter {
                parameter: "loa",
                reason: format!("'{loa}' is not a level of assurance of the profile"),
            });
        }
        if assertion.issuer != self.idp_entity_id {
            return Err(FactoryError::InvalidParameter {
                parameter: "assertion",
                reason: format!(
                    "assertion '{}' was issued by '{}', not by '{}'",
                    assertion.id, assertion.issuer, self.idp_entity_id
                ),
            });
        }
        let subject = assertion
            .attribute(attribute_name)
            .and_then(|a| a.first_value())
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| FactoryError::AttributeNotFound {
                name: attribute_name.to_string(),
                assertion_id: assertion.id.clone(),
            })?;

        Ok(SadClaims::builder()
            .issuer(&self.idp_entity_id)
            .audience(audience)
            .subject(subject)
            .transaction_id(transaction_id(assertion))
            .loa(loa)
            .attribute(attribute_name)
            .issued_at(now)
            .validity(Duration::from_secs(validity)))
    }

    fn sign(&self, claims: SadClaims) -> Result<SadToken, FactoryError> {
        let token = self.signer.sign(&claims)?;
        debug!(
            jti = %claims.jti,
            aud = %claims.aud,
            attr = %claims.attr,
            exp = claims.exp,
            "issued SAD"
        );
        Ok(token)
    }
}
