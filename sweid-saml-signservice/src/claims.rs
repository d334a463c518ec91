//! SAD claims.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SadError;

/// SAD version produced and accepted by this crate.
pub const SAD_VERSION: &str = "1.0";

/// `seAttr` key holding the ID of the SAD request the token answers.
pub const EXT_IN_RESPONSE_TO: &str = "irt";

/// `seAttr` key holding the sign request ID.
pub const EXT_SIGN_REQUEST_ID: &str = "reqid";

/// `seAttr` key holding the number of documents to sign.
pub const EXT_DOCUMENT_COUNT: &str = "docs";

/// Claims of a Signed Authentication Data token.
///
/// The field declaration order is the serialization order, and it is the
/// byte-wise sorted order of the claim names. The codec relies on this for
/// a canonical payload.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use sweid_saml_signservice::SadClaims;
///
/// let claims = SadClaims::builder()
///     .issuer("https://idp.example.se")
///     .audience("https://sign.example.se")
///     .subject("199001011234")
///     .transaction_id("Zm9vYmFy")
///     .loa("http://id.elegnamnden.se/loa/1.0/loa3")
///     .attribute("urn:oid:1.2.752.29.4.13")
///     .validity(Duration::from_secs(300))
///     .build()
///     .unwrap();
///
/// assert_eq!(claims.exp - claims.iat, 300);
/// assert_eq!(claims.version, "1.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SadClaims {
    /// Name of the assertion attribute the SAD is bound to
    pub attr: String,
    /// Audience (the requesting signature service)
    pub aud: String,
    /// Expiry, seconds since the epoch
    pub exp: i64,
    /// Issued at, seconds since the epoch
    pub iat: i64,
    /// Issuer (the identity provider)
    pub iss: String,
    /// Transaction id
    pub jti: String,
    /// Level of assurance URI
    pub loa: String,
    /// Extension values, ordered by key
    #[serde(rename = "seAttr", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub se_attr: BTreeMap<String, String>,
    /// Subject: the value of the attribute named by `attr`
    pub sub: String,
    /// SAD version
    #[serde(rename = "ver")]
    pub version: String,
}

impl SadClaims {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> SadClaimsBuilder {
        SadClaimsBuilder::new()
    }

    /// Checks the invariants every decoded or built token must hold.
    ///
    /// # Errors
    ///
    /// Returns `SadError::InvalidClaims` if `jti` is empty or `exp` is not
    /// after `iat`.
    pub fn check_invariants(&self) -> Result<(), SadError> {
        if self.jti.is_empty() {
            return Err(SadError::InvalidClaims {
                reason: "jti must not be empty".to_string(),
            });
        }
        if self.exp <= self.iat {
            return Err(SadError::InvalidClaims {
                reason: format!("exp ({}) must be after iat ({})", self.exp, self.iat),
            });
        }
        Ok(())
    }

    /// Returns `iat` as a timestamp.
    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    /// Returns `exp` as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the `irt` extension.
    #[must_use]
    pub fn in_response_to(&self) -> Option<&str> {
        self.se_attr.get(EXT_IN_RESPONSE_TO).map(String::as_str)
    }

    /// Returns the `reqid` extension.
    #[must_use]
    pub fn sign_request_id(&self) -> Option<&str> {
        self.se_attr.get(EXT_SIGN_REQUEST_ID).map(String::as_str)
    }

    /// Returns the `docs` extension, if present and numeric.
    #[must_use]
    pub fn document_count(&self) -> Option<u32> {
        self.se_attr
            .get(EXT_DOCUMENT_COUNT)
            .and_then(|v| v.parse().ok())
    }
}

/// Builder for [`SadClaims`].
#[derive(Debug, Clone)]
pub struct SadClaimsBuilder {
    issuer: Option<String>,
    audience: Option<String>,
    subject: Option<String>,
    transaction_id: Option<String>,
    loa: Option<String>,
    attribute: Option<String>,
    issued_at: Option<DateTime<Utc>>,
    validity: Duration,
    version: String,
    se_attr: BTreeMap<String, String>,
}

impl SadClaimsBuilder {
    /// Creates a builder with a validity of five minutes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            issuer: None,
            audience: None,
            subject: None,
            transaction_id: None,
            loa: None,
            attribute: None,
            issued_at: None,
            validity: Duration::from_secs(300),
            version: SAD_VERSION.to_string(),
            se_attr: BTreeMap::new(),
        }
    }

    /// Sets `iss`.
    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Sets `aud`.
    #[must_use]
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Sets `sub`.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets `jti`.
    #[must_use]
    pub fn transaction_id(mut self, jti: impl Into<String>) -> Self {
        self.transaction_id = Some(jti.into());
        self
    }

    /// Sets `loa`.
    #[must_use]
    pub fn loa(mut self, loa: impl Into<String>) -> Self {
        self.loa = Some(loa.into());
        self
    }

    /// Sets `attr`.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute = Some(name.into());
        self
    }

    /// Sets `iat`. Defaults to the current time, truncated to seconds.
    #[must_use]
    pub fn issued_at(mut self, instant: DateTime<Utc>) -> Self {
        self.issued_at = Some(instant);
        self
    }

    /// Sets how long after `iat` the token expires.
    #[must_use]
    pub fn validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    /// Overrides `ver`.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the `irt` extension.
    #[must_use]
    pub fn in_response_to(self, id: impl Into<String>) -> Self {
        self.extension(EXT_IN_RESPONSE_TO, id)
    }

    /// Sets the `reqid` extension.
    #[must_use]
    pub fn sign_request_id(self, id: impl Into<String>) -> Self {
        self.extension(EXT_SIGN_REQUEST_ID, id)
    }

    /// Sets the `docs` extension.
    #[must_use]
    pub fn document_count(self, count: u32) -> Self {
        self.extension(EXT_DOCUMENT_COUNT, count.to_string())
    }

    /// Sets an arbitrary `seAttr` entry.
    #[must_use]
    pub fn extension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.se_attr.insert(name.into(), value.into());
        self
    }

    /// Builds the claims.
    ///
    /// # Errors
    ///
    /// Returns `SadError::MissingClaim` if a required claim is not set, or
    /// `SadError::InvalidClaims` if the validity is zero or out of range or
    /// `jti` is empty.
    pub fn build(self) -> Result<SadClaims, SadError> {
        let iss = self.issuer.ok_or(SadError::MissingClaim { claim: "iss" })?;
        let aud = self.audience.ok_or(SadError::MissingClaim { claim: "aud" })?;
        let sub = self.subject.ok_or(SadError::MissingClaim { claim: "sub" })?;
        let jti = self
            .transaction_id
            .ok_or(SadError::MissingClaim { claim: "jti" })?;
        let loa = self.loa.ok_or(SadError::MissingClaim { claim: "loa" })?;
        let attr = self.attribute.ok_or(SadError::MissingClaim { claim: "attr" })?;

        let iat = self.issued_at.unwrap_or_else(Utc::now).timestamp();
        let validity = i64::try_from(self.validity.as_secs()).map_err(|_| {
            SadError::InvalidClaims {
                reason: "validity out of range".to_string(),
            }
        })?;
        let exp = iat
            .checked_add(validity)
            .ok_or_else(|| SadError::InvalidClaims {
                reason: "validity out of range".to_string(),
            })?;

        let claims = SadClaims {
            attr,
            aud,
            exp,
            iat,
            iss,
            jti,
            loa,
            se_attr: self.se_attr,
            sub,
            version: self.version,
        };
        claims.check_invariants()?;
        Ok(claims)
    }
}

impl Default for SadClaimsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> SadClaimsBuilder {
        SadClaimsBuilder::new()
            .issuer("https://idp.example.se")
            .audience("https://sign.example.se")
            .subject("199001011234")
            .transaction_id("abc")
            .loa("http://id.elegnamnden.se/loa/1.0/loa3")
            .attribute("urn:oid:1.2.752.29.4.13")
    }

    #[test]
    fn builder_creates_valid_claims() {
        let claims = builder().build().unwrap();

        assert_eq!(claims.iss, "https://idp.example.se");
        assert_eq!(claims.exp - claims.iat, 300);
        assert!(claims.se_attr.is_empty());
    }

    #[test]
    fn builder_requires_every_claim() {
        let result = SadClaimsBuilder::new().issuer("x").build();
        assert!(matches!(
            result,
            Err(SadError::MissingClaim { claim: "aud" })
        ));
    }

    #[test]
    fn zero_validity_violates_exp_after_iat() {
        let result = builder().validity(Duration::ZERO).build();
        assert!(matches!(result, Err(SadError::InvalidClaims { .. })));
    }

    #[test]
    fn empty_jti_is_rejected() {
        let result = builder().transaction_id("").build();
        assert!(matches!(result, Err(SadError::InvalidClaims { .. })));
    }

    #[test]
    fn extensions_are_accessible() {
        let claims = builder()
            .in_response_to("_req1")
            .sign_request_id("sr-1")
            .document_count(3)
            .build()
            .unwrap();

        assert_eq!(claims.in_response_to(), Some("_req1"));
        assert_eq!(claims.sign_request_id(), Some("sr-1"));
        assert_eq!(claims.document_count(), Some(3));
    }

    #[test]
    fn explicit_issue_time() {
        let iat = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let claims = builder().issued_at(iat).build().unwrap();

        assert_eq!(claims.issued_at(), Some(iat));
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_300);
    }
}
