//! SAD signing.

use tracing::debug;

use crate::claims::SadClaims;
use crate::codec::{self, SadHeader};
use crate::error::SadError;
use crate::keys::{SigningAlgorithm, SigningKey};
use crate::token::SadToken;

/// Signs SAD claims with one key and algorithm.
///
/// # Example
///
/// ```
/// use sweid_saml_signservice::{SadClaims, SadSigner, SigningAlgorithm, SigningKey};
///
/// let signer = SadSigner::new(SigningKey::generate_ed25519(), SigningAlgorithm::EdDsa).unwrap();
/// let claims = SadClaims::builder()
///     .issuer("https://idp.example.se")
///     .audience("https://sign.example.se")
///     .subject("199001011234")
///     .transaction_id("abc")
///     .loa("http://id.elegnamnden.se/loa/1.0/loa3")
///     .attribute("urn:oid:1.2.752.29.4.13")
///     .build()
///     .unwrap();
///
/// let token = signer.sign(&claims).unwrap();
/// assert_eq!(token.to_string().split('.').count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct SadSigner {
    key: SigningKey,
    algorithm: SigningAlgorithm,
}

impl SadSigner {
    /// Creates a signer.
    ///
    /// # Errors
    ///
    /// Returns `SadError::UnsupportedAlgorithm` if the key cannot sign with
    /// `algorithm`.
    pub fn new(key: SigningKey, algorithm: SigningAlgorithm) -> Result<Self, SadError> {
        if !key.supports(algorithm) {
            return Err(SadError::UnsupportedAlgorithm {
                algorithm: algorithm.as_str().to_string(),
            });
        }
        Ok(Self { key, algorithm })
    }

    /// Returns the signing algorithm.
    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Returns the signing key.
    #[must_use]
    pub fn key(&self) -> &SigningKey {
        &self.key
    }

    /// Signs the claims.
    ///
    /// # Errors
    ///
    /// Returns `SadError::InvalidClaims` if the claims violate their
    /// invariants, or `SadError::SigningFailed` if the primitive fails.
    pub fn sign(&self, claims: &SadClaims) -> Result<SadToken, SadError> {
        let header = SadHeader::new(self.algorithm.as_str());
        let signing_input = codec::encode_with_header(&header, claims)?;
        let signature = self.key.sign(self.algorithm, signing_input.as_bytes())?;

        debug!(
            jti = %claims.jti,
            alg = %self.algorithm,
            key = %self.key.verifying_key().fingerprint(),
            "signed SAD"
        );

        Ok(SadToken::from_parts(
            header,
            claims.clone(),
            self.algorithm,
            signing_input,
            signature,
        ))
    }
}

/// Signs `claims` with `key` using `alg`.
///
/// # Errors
///
/// Returns `SadError::UnsupportedAlgorithm` if `key` cannot sign with `alg`,
/// and otherwise as [`SadSigner::sign`].
pub fn sign(claims: &SadClaims, key: &SigningKey, alg: SigningAlgorithm) -> Result<SadToken, SadError> {
    SadSigner::new(key.clone(), alg)?.sign(claims)
}
