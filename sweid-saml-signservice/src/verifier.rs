//! SAD signature and lifetime verification.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::claims::SadClaims;
use crate::config::SadConfig;
use crate::error::SadError;
use crate::keys::{SigningAlgorithm, TrustedKey, TrustedKeys};
use crate::token::SadToken;
use crate::verification::{check_expiry, check_issued_at};

/// Verifies SAD signatures and lifetimes against a set of trusted keys.
///
/// Verification is a pure function of the token, the trusted keys and the
/// evaluation time; the verifier holds no mutable state and can be shared
/// between threads.
///
/// # Example
///
/// ```
/// use sweid_saml_signservice::{SadClaims, SadVerifier, SigningAlgorithm, SigningKey, TrustedKeys, sign};
///
/// let idp_key = SigningKey::generate_ed25519();
/// let claims = SadClaims::builder()
///     .issuer("https://idp.example.se")
///     .audience("https://sign.example.se")
///     .subject("199001011234")
///     .transaction_id("abc")
///     .loa("http://id.elegnamnden.se/loa/1.0/loa3")
///     .attribute("urn:oid:1.2.752.29.4.13")
///     .build()
///     .unwrap();
/// let token = sign(&claims, &idp_key, SigningAlgorithm::EdDsa).unwrap();
///
/// let verifier = SadVerifier::new(
///     TrustedKeys::new().with_key("https://idp.example.se", idp_key.verifying_key()),
/// );
/// assert_eq!(verifier.verify(&token.to_string()).unwrap(), claims);
/// ```
#[derive(Debug, Clone)]
pub struct SadVerifier {
    trusted: TrustedKeys,
    clock_skew: Duration,
    allowed: Vec<SigningAlgorithm>,
}

impl SadVerifier {
    /// Creates a verifier with the default skew and every supported
    /// algorithm allowed.
    #[must_use]
    pub fn new(trusted: TrustedKeys) -> Self {
        Self::from_config(trusted, &SadConfig::default())
    }

    /// Creates a verifier from configuration.
    #[must_use]
    pub fn from_config(trusted: TrustedKeys, config: &SadConfig) -> Self {
        Self {
            trusted,
            clock_skew: config.clock_skew,
            allowed: config.allowed_algorithms.clone(),
        }
    }

    /// Sets the allowed clock skew.
    #[must_use]
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }

    /// Restricts the accepted algorithms.
    #[must_use]
    pub fn with_allowed_algorithms(mut self, algorithms: Vec<SigningAlgorithm>) -> Self {
        self.allowed = algorithms;
        self
    }

    /// Returns the trusted keys.
    #[must_use]
    pub fn trusted_keys(&self) -> &TrustedKeys {
        &self.trusted
    }

    /// Returns the allowed clock skew.
    #[must_use]
    pub fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    /// Parses and verifies a compact token at the current time.
    ///
    /// # Errors
    ///
    /// See [`SadVerifier::verify_at`].
    pub fn verify(&self, compact: &str) -> Result<SadClaims, SadError> {
        self.verify_at(&SadToken::parse(compact)?, Utc::now())
    }

    /// Verifies a parsed token at `now`.
    ///
    /// Checks, in order:
    /// 1. The algorithm is allowed
    /// 2. A trusted key verifies the signature over `header.payload`
    /// 3. `exp` is not older than `now - skew`
    /// 4. `iat` is not newer than `now + skew`
    ///
    /// # Errors
    ///
    /// - `UnsupportedAlgorithm` - algorithm not in the allow-list
    /// - `SignatureInvalid` - no trusted key verifies the signature
    /// - `Expired` / `IssuedInFuture` - lifetime checks failed
    pub fn verify_at(&self, token: &SadToken, now: DateTime<Utc>) -> Result<SadClaims, SadError> {
        self.verify_signature(token)?;
        self.check_lifetime(token.claims(), now)
    }

    /// Verifies a parsed token at `now`, accepting only a signature made
    /// with a key registered under `issuer`.
    ///
    /// # Errors
    ///
    /// As [`SadVerifier::verify_at`], plus `UntrustedSigner` when only keys
    /// registered for other entities verify the signature.
    pub fn verify_issued_by_at(
        &self,
        token: &SadToken,
        issuer: &str,
        now: DateTime<Utc>,
    ) -> Result<SadClaims, SadError> {
        self.verify_signature_for(token, issuer)?;
        self.check_lifetime(token.claims(), now)
    }

    /// Verifies the signature and algorithm of a token against the keys
    /// registered under `issuer`, returning the key that verified it.
    ///
    /// # Errors
    ///
    /// `UnsupportedAlgorithm`, `SignatureInvalid` or `UntrustedSigner`.
    pub fn verify_signature_for<'a>(
        &'a self,
        token: &SadToken,
        issuer: &str,
    ) -> Result<&'a TrustedKey, SadError> {
        let signer = self.verify_signature(token)?;
        if signer.label == issuer {
            return Ok(signer);
        }
        self.trusted
            .find_signer_for(issuer, token.algorithm(), token.signing_input(), token.signature())
            .ok_or_else(|| {
                warn!(
                    jti = %token.claims().jti,
                    signer = %signer.label,
                    key = %signer.key.fingerprint(),
                    issuer = %issuer,
                    "SAD signed with a key of another entity"
                );
                SadError::UntrustedSigner {
                    signer: signer.label.clone(),
                    issuer: issuer.to_string(),
                }
            })
    }

    /// Verifies only the signature and algorithm of a token, returning the
    /// key that verified it.
    ///
    /// # Errors
    ///
    /// `UnsupportedAlgorithm` or `SignatureInvalid`.
    pub fn verify_signature<'a>(&'a self, token: &SadToken) -> Result<&'a TrustedKey, SadError> {
        let alg = token.algorithm();
        if !self.allowed.contains(&alg) {
            warn!(alg = %alg, jti = %token.claims().jti, "SAD signed with disallowed algorithm");
            return Err(SadError::UnsupportedAlgorithm {
                algorithm: alg.as_str().to_string(),
            });
        }

        match self
            .trusted
            .find_signer(alg, token.signing_input(), token.signature())
        {
            Some(signer) => {
                debug!(
                    jti = %token.claims().jti,
                    signer = %signer.label,
                    key = %signer.key.fingerprint(),
                    "SAD signature verified"
                );
                Ok(signer)
            }
            None => {
                warn!(
                    jti = %token.claims().jti,
                    alg = %alg,
                    trusted_keys = self.trusted.len(),
                    "SAD signature did not verify against any trusted key"
                );
                Err(SadError::SignatureInvalid {
                    trusted_keys: self.trusted.len(),
                })
            }
        }
    }

    fn check_lifetime(&self, claims: &SadClaims, now: DateTime<Utc>) -> Result<SadClaims, SadError> {
        let skew = self.skew_secs();
        check_expiry(claims.exp, now.timestamp(), skew)?;
        check_issued_at(claims.iat, now.timestamp(), skew)?;
        Ok(claims.clone())
    }

    fn skew_secs(&self) -> i64 {
        i64::try_from(self.clock_skew.as_secs()).unwrap_or(i64::MAX)
    }
}
