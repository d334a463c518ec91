//! Signed SAD tokens.

use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::claims::SadClaims;
use crate::codec::{self, SadHeader};
use crate::error::SadError;
use crate::keys::SigningAlgorithm;

/// A signed SAD in compact form.
///
/// Immutable once created. The token keeps the signing input exactly as
/// transmitted so verification never depends on re-encoding the claims.
///
/// ```
/// use sweid_saml_signservice::{SadClaims, SadToken, SigningAlgorithm, SigningKey, sign};
///
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
/// let key = SigningKey::generate_ed25519();
/// let token = sign(&claims, &key, SigningAlgorithm::EdDsa).unwrap();
///
/// let parsed: SadToken = token.to_string().parse().unwrap();
/// assert_eq!(parsed, token);
/// assert_eq!(parsed.claims(), &claims);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SadToken {
    header: SadHeader,
    claims: SadClaims,
    algorithm: SigningAlgorithm,
    signing_input: String,
    signature: Vec<u8>,
}

impl SadToken {
    pub(crate) fn from_parts(
        header: SadHeader,
        claims: SadClaims,
        algorithm: SigningAlgorithm,
        signing_input: String,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            header,
            claims,
            algorithm,
            signing_input,
            signature,
        }
    }

    /// Parses a three-segment compact token.
    ///
    /// Only the format is checked here; use a
    /// [`SadVerifier`](crate::SadVerifier) to check the signature.
    ///
    /// # Errors
    ///
    /// - `SadError::MalformedToken` / `InvalidClaims` if the token does not decode
    /// - `SadError::MissingSignature` for a two-segment token
    /// - `SadError::UnsupportedAlgorithm` if `alg` is not a supported algorithm
    pub fn parse(compact: &str) -> Result<Self, SadError> {
        let decoded = codec::decode_parts(compact)?;
        let signature = decoded.signature.ok_or(SadError::MissingSignature)?;
        let algorithm = SigningAlgorithm::parse(&decoded.header.alg)?;
        Ok(Self {
            header: decoded.header,
            claims: decoded.claims,
            algorithm,
            signing_input: decoded.signing_input,
            signature,
        })
    }

    /// Returns the header.
    #[must_use]
    pub fn header(&self) -> &SadHeader {
        &self.header
    }

    /// Returns the claims. They are unverified until a verifier accepts the
    /// token.
    #[must_use]
    pub fn claims(&self) -> &SadClaims {
        &self.claims
    }

    /// Returns the signing algorithm named in the header.
    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Returns the `header.payload` bytes the signature covers.
    #[must_use]
    pub fn signing_input(&self) -> &[u8] {
        self.signing_input.as_bytes()
    }

    /// Returns the raw signature.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Consumes the token and returns its claims.
    #[must_use]
    pub fn into_claims(self) -> SadClaims {
        self.claims
    }
}

impl fmt::Display for SadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            self.signing_input,
            URL_SAFE_NO_PAD.encode(&self.signature)
        )
    }
}

impl FromStr for SadToken {
    type Err = SadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
