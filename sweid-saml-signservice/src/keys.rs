//! Key types and signing algorithms for SAD tokens.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::Signer as _;
use rsa::pkcs1v15;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::SadError;

/// JOSE signing algorithms accepted for SAD tokens.
///
/// ```
/// use sweid_saml_signservice::SigningAlgorithm;
///
/// assert_eq!(SigningAlgorithm::parse("RS256").unwrap(), SigningAlgorithm::Rs256);
/// assert!(SigningAlgorithm::parse("HS256").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// Ed25519.
    EdDsa,
    /// RSA PKCS#1 v1.5 with SHA-256. The profile default.
    Rs256,
    /// RSA PKCS#1 v1.5 with SHA-384.
    Rs384,
    /// RSA PKCS#1 v1.5 with SHA-512.
    Rs512,
}

impl SigningAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [Self; 4] = [Self::EdDsa, Self::Rs256, Self::Rs384, Self::Rs512];

    /// Returns the JOSE `alg` name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EdDsa => "EdDSA",
            Self::Rs256 => "RS256",
            Self::Rs384 => "RS384",
            Self::Rs512 => "RS512",
        }
    }

    /// Parses a JOSE `alg` name.
    ///
    /// # Errors
    ///
    /// Returns `SadError::UnsupportedAlgorithm` for any other name, including
    /// `none`.
    pub fn parse(name: &str) -> Result<Self, SadError> {
        Self::ALL
            .iter()
            .copied()
            .find(|alg| alg.as_str() == name)
            .ok_or_else(|| SadError::UnsupportedAlgorithm {
                algorithm: name.to_string(),
            })
    }

    const fn is_rsa(self) -> bool {
        !matches!(self, Self::EdDsa)
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = SadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for SigningAlgorithm {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for SigningAlgorithm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Clone)]
enum SigningInner {
    Ed25519(ed25519_dalek::SigningKey),
    Rsa(Box<RsaPrivateKey>),
}

/// A private key used to sign SAD tokens.
///
/// ```
/// use sweid_saml_signservice::{SigningAlgorithm, SigningKey};
///
/// let key = SigningKey::generate_ed25519();
/// assert!(key.supports(SigningAlgorithm::EdDsa));
/// assert!(!key.supports(SigningAlgorithm::Rs256));
/// ```
#[derive(Clone)]
pub struct SigningKey {
    inner: SigningInner,
}

impl SigningKey {
    /// Generates a random Ed25519 key.
    #[must_use]
    pub fn generate_ed25519() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            inner: SigningInner::Ed25519(ed25519_dalek::SigningKey::generate(&mut rng)),
        }
    }

    /// Generates a random RSA key of `bits` bits.
    ///
    /// # Errors
    ///
    /// Returns `SadError::InvalidKey` if generation fails.
    pub fn generate_rsa(bits: usize) -> Result<Self, SadError> {
        let mut rng = rand::thread_rng();
        let key = RsaPrivateKey::new(&mut rng, bits).map_err(|e| SadError::InvalidKey {
            reason: e.to_string(),
        })?;
        Ok(Self::from_rsa(key))
    }

    /// Creates an Ed25519 key from its 32-byte seed.
    #[must_use]
    pub fn from_ed25519_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            inner: SigningInner::Ed25519(ed25519_dalek::SigningKey::from_bytes(bytes)),
        }
    }

    /// Wraps an RSA private key.
    #[must_use]
    pub fn from_rsa(key: RsaPrivateKey) -> Self {
        Self {
            inner: SigningInner::Rsa(Box::new(key)),
        }
    }

    /// Loads an RSA private key from PKCS#8 PEM.
    ///
    /// # Errors
    ///
    /// Returns `SadError::InvalidKey` if the PEM cannot be decoded.
    pub fn rsa_from_pkcs8_pem(pem: &str) -> Result<Self, SadError> {
        let key = RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| SadError::InvalidKey {
            reason: e.to_string(),
        })?;
        Ok(Self::from_rsa(key))
    }

    /// Returns the matching public key.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        match &self.inner {
            SigningInner::Ed25519(k) => VerifyingKey {
                inner: VerifyingInner::Ed25519(k.verifying_key()),
            },
            SigningInner::Rsa(k) => VerifyingKey::from_rsa(k.to_public_key()),
        }
    }

    /// Returns true if the key can sign with `alg`.
    #[must_use]
    pub fn supports(&self, alg: SigningAlgorithm) -> bool {
        match self.inner {
            SigningInner::Ed25519(_) => !alg.is_rsa(),
            SigningInner::Rsa(_) => alg.is_rsa(),
        }
    }

    /// Signs `data` with `alg`.
    ///
    /// # Errors
    ///
    /// Returns `SadError::UnsupportedAlgorithm` if the key type does not
    /// match the algorithm, or `SadError::SigningFailed` if the primitive
    /// fails.
    pub fn sign(&self, alg: SigningAlgorithm, data: &[u8]) -> Result<Vec<u8>, SadError> {
        match (&self.inner, alg) {
            (SigningInner::Ed25519(k), SigningAlgorithm::EdDsa) => {
                Ok(k.sign(data).to_bytes().to_vec())
            }
            (SigningInner::Rsa(k), SigningAlgorithm::Rs256) => {
                rsa_sign(&pkcs1v15::SigningKey::<Sha256>::new(k.as_ref().clone()), data)
            }
            (SigningInner::Rsa(k), SigningAlgorithm::Rs384) => {
                rsa_sign(&pkcs1v15::SigningKey::<Sha384>::new(k.as_ref().clone()), data)
            }
            (SigningInner::Rsa(k), SigningAlgorithm::Rs512) => {
                rsa_sign(&pkcs1v15::SigningKey::<Sha512>::new(k.as_ref().clone()), data)
            }
            (SigningInner::Ed25519(_), _) | (SigningInner::Rsa(_), SigningAlgorithm::EdDsa) => {
                Err(SadError::UnsupportedAlgorithm {
                    algorithm: alg.as_str().to_string(),
                })
            }
        }
    }
}

fn rsa_sign<S>(key: &S, data: &[u8]) -> Result<Vec<u8>, SadError>
where
    S: rsa::signature::Signer<pkcs1v15::Signature>,
{
    let signature = key.try_sign(data).map_err(|e| SadError::SigningFailed {
        reason: e.to_string(),
    })?;
    Ok(rsa::signature::SignatureEncoding::to_vec(&signature))
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let public = self.verifying_key();
        f.debug_struct("SigningKey")
            .field("kind", &public.kind())
            .field("fingerprint", &public.fingerprint())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq)]
enum VerifyingInner {
    Ed25519(ed25519_dalek::VerifyingKey),
    Rsa(RsaPublicKey),
}

/// A public key used to verify SAD tokens.
///
/// Keys are identified in logs by [`VerifyingKey::fingerprint`]; the key
/// material itself is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct VerifyingKey {
    inner: VerifyingInner,
}

impl VerifyingKey {
    /// Creates an Ed25519 public key from its 32 bytes.
    ///
    /// # Errors
    ///
    /// Returns `SadError::InvalidKey` if the bytes are not a valid point.
    pub fn from_ed25519_bytes(bytes: &[u8; 32]) -> Result<Self, SadError> {
        let key = ed25519_dalek::VerifyingKey::from_bytes(bytes).map_err(|e| {
            SadError::InvalidKey {
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            inner: VerifyingInner::Ed25519(key),
        })
    }

    /// Wraps an RSA public key.
    #[must_use]
    pub fn from_rsa(key: RsaPublicKey) -> Self {
        Self {
            inner: VerifyingInner::Rsa(key),
        }
    }

    /// Loads an RSA public key from SPKI PEM.
    ///
    /// # Errors
    ///
    /// Returns `SadError::InvalidKey` if the PEM cannot be decoded.
    pub fn rsa_from_public_key_pem(pem: &str) -> Result<Self, SadError> {
        let key = RsaPublicKey::from_public_key_pem(pem).map_err(|e| SadError::InvalidKey {
            reason: e.to_string(),
        })?;
        Ok(Self::from_rsa(key))
    }

    /// Returns `"Ed25519"` or `"RSA"`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self.inner {
            VerifyingInner::Ed25519(_) => "Ed25519",
            VerifyingInner::Rsa(_) => "RSA",
        }
    }

    /// Returns true if the key can verify signatures made with `alg`.
    #[must_use]
    pub fn supports(&self, alg: SigningAlgorithm) -> bool {
        match self.inner {
            VerifyingInner::Ed25519(_) => !alg.is_rsa(),
            VerifyingInner::Rsa(_) => alg.is_rsa(),
        }
    }

    /// Returns true if `signature` is a valid `alg` signature over `data`.
    #[must_use]
    pub fn verify(&self, alg: SigningAlgorithm, data: &[u8], signature: &[u8]) -> bool {
        match (&self.inner, alg) {
            (VerifyingInner::Ed25519(k), SigningAlgorithm::EdDsa) => {
                ed25519_dalek::Signature::from_slice(signature)
                    .is_ok_and(|sig| k.verify_strict(data, &sig).is_ok())
            }
            (VerifyingInner::Rsa(k), SigningAlgorithm::Rs256) => {
                rsa_verify(&pkcs1v15::VerifyingKey::<Sha256>::new(k.clone()), data, signature)
            }
            (VerifyingInner::Rsa(k), SigningAlgorithm::Rs384) => {
                rsa_verify(&pkcs1v15::VerifyingKey::<Sha384>::new(k.clone()), data, signature)
            }
            (VerifyingInner::Rsa(k), SigningAlgorithm::Rs512) => {
                rsa_verify(&pkcs1v15::VerifyingKey::<Sha512>::new(k.clone()), data, signature)
            }
            (VerifyingInner::Ed25519(_), _) | (VerifyingInner::Rsa(_), SigningAlgorithm::EdDsa) => {
                false
            }
        }
    }

    /// Returns a short hex fingerprint: the first four bytes of the SHA-256
    /// of the public key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        match &self.inner {
            VerifyingInner::Ed25519(k) => fingerprint(&[k.as_bytes().as_slice()]),
            VerifyingInner::Rsa(k) => rsa_fingerprint(k),
        }
    }
}

fn rsa_verify<V>(key: &V, data: &[u8], signature: &[u8]) -> bool
where
    V: rsa::signature::Verifier<pkcs1v15::Signature>,
{
    pkcs1v15::Signature::try_from(signature).is_ok_and(|sig| key.verify(data, &sig).is_ok())
}

/// Hex of the first four bytes of the SHA-256 over `parts`.
fn fingerprint(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize()[..4]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Fingerprint of an RSA public key over its modulus and exponent.
pub(crate) fn rsa_fingerprint(key: &RsaPublicKey) -> String {
    fingerprint(&[
        key.n().to_bytes_be().as_slice(),
        key.e().to_bytes_be().as_slice(),
    ])
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyingKey")
            .field("kind", &self.kind())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// A verifying key with the label it was registered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedKey {
    /// Label, typically the entity ID or certificate alias
    pub label: String,
    /// The key
    pub key: VerifyingKey,
}

/// The ordered set of keys a verifier trusts.
///
/// Keys are tried in registration order. The set is read-only once built
/// and can be shared between concurrent validations.
///
/// ```
/// use sweid_saml_signservice::{SigningKey, TrustedKeys};
///
/// let idp_key = SigningKey::generate_ed25519();
/// let trusted = TrustedKeys::new().with_key("https://idp.example.se", idp_key.verifying_key());
/// assert_eq!(trusted.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedKeys {
    keys: Vec<TrustedKey>,
}

impl TrustedKeys {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key.
    pub fn add(&mut self, label: impl Into<String>, key: VerifyingKey) {
        self.keys.push(TrustedKey {
            label: label.into(),
            key,
        });
    }

    /// Adds a key, builder style.
    #[must_use]
    pub fn with_key(mut self, label: impl Into<String>, key: VerifyingKey) -> Self {
        self.add(label, key);
        self
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if no key is trusted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates over the keys in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TrustedKey> {
        self.keys.iter()
    }

    /// Returns the first key registered under `label` that verifies
    /// `signature` over `data`.
    #[must_use]
    pub fn find_signer_for(
        &self,
        label: &str,
        alg: SigningAlgorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Option<&TrustedKey> {
        self.keys
            .iter()
            .filter(|trusted| trusted.label == label)
            .find(|trusted| trusted.key.verify(alg, data, signature))
    }

    /// Returns the first key that verifies `signature` over `data`.
    #[must_use]
    pub fn find_signer(
        &self,
        alg: SigningAlgorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Option<&TrustedKey> {
        self.keys
            .iter()
            .find(|trusted| trusted.key.verify(alg, data, signature))
    }
}

#[cfg(test)]
pub(crate) mod test_keys {
    use std::sync::OnceLock;

    use super::SigningKey;

    /// A 1024-bit RSA key, generated once per test binary.
    pub fn rsa() -> SigningKey {
        static KEY: OnceLock<SigningKey> = OnceLock::new();
        KEY.get_or_init(|| SigningKey::generate_rsa(1024).unwrap())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_names_roundtrip() {
        for alg in SigningAlgorithm::ALL {
            assert_eq!(SigningAlgorithm::parse(alg.as_str()).unwrap(), alg);
        }
    }

    #[test]
    fn none_is_unsupported() {
        assert!(matches!(
            SigningAlgorithm::parse("none"),
            Err(SadError::UnsupportedAlgorithm { .. })
        ));
    }

    #[test]
    fn ed25519_sign_and_verify() {
        let key = SigningKey::generate_ed25519();
        let sig = key.sign(SigningAlgorithm::EdDsa, b"payload").unwrap();

        assert!(key
            .verifying_key()
            .verify(SigningAlgorithm::EdDsa, b"payload", &sig));
        assert!(!key
            .verifying_key()
            .verify(SigningAlgorithm::EdDsa, b"payloae", &sig));
    }

    #[test]
    fn rsa_sign_and_verify_all_digests() {
        let key = test_keys::rsa();
        for alg in [
            SigningAlgorithm::Rs256,
            SigningAlgorithm::Rs384,
            SigningAlgorithm::Rs512,
        ] {
            let sig = key.sign(alg, b"payload").unwrap();
            assert!(key.verifying_key().verify(alg, b"payload", &sig));
        }
    }

    #[test]
    fn rsa_signature_does_not_verify_under_other_digest() {
        let key = test_keys::rsa();
        let sig = key.sign(SigningAlgorithm::Rs256, b"payload").unwrap();
        assert!(!key
            .verifying_key()
            .verify(SigningAlgorithm::Rs512, b"payload", &sig));
    }

    #[test]
    fn key_type_mismatch_is_unsupported() {
        let key = SigningKey::generate_ed25519();
        let result = key.sign(SigningAlgorithm::Rs256, b"payload");
        assert!(matches!(
            result,
            Err(SadError::UnsupportedAlgorithm { .. })
        ));
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = SigningKey::from_ed25519_bytes(&[7u8; 32]);
        let debug = format!("{key:?}");
        assert!(debug.contains("Ed25519"));
        assert!(debug.contains(&key.verifying_key().fingerprint()));
        assert_eq!(key.verifying_key().fingerprint().len(), 8);
    }

    #[test]
    fn trusted_keys_find_signer_in_order() {
        let a = SigningKey::generate_ed25519();
        let b = SigningKey::generate_ed25519();
        let trusted = TrustedKeys::new()
            .with_key("a", a.verifying_key())
            .with_key("b", b.verifying_key());

        let sig = b.sign(SigningAlgorithm::EdDsa, b"data").unwrap();

        assert_eq!(
            trusted
                .find_signer(SigningAlgorithm::EdDsa, b"data", &sig)
                .map(|k| k.label.as_str()),
            Some("b")
        );
        assert!(trusted
            .find_signer(SigningAlgorithm::EdDsa, b"other", &sig)
            .is_none());
    }

    #[test]
    fn rsa_key_refuses_eddsa() {
        let key = test_keys::rsa();
        let ed = SigningKey::generate_ed25519();
        let ed_sig = ed.sign(SigningAlgorithm::EdDsa, b"payload").unwrap();
        let rsa_sig = key.sign(SigningAlgorithm::Rs256, b"payload").unwrap();

        assert!(matches!(
            key.sign(SigningAlgorithm::EdDsa, b"payload"),
            Err(SadError::UnsupportedAlgorithm { .. })
        ));
        assert!(!key
            .verifying_key()
            .verify(SigningAlgorithm::EdDsa, b"payload", &ed_sig));
        assert!(!ed
            .verifying_key()
            .verify(SigningAlgorithm::Rs256, b"payload", &rsa_sig));
    }

    #[test]
    fn signer_lookup_by_label_skips_other_entities() {
        let a = SigningKey::generate_ed25519();
        let b = SigningKey::generate_ed25519();
        let trusted = TrustedKeys::new()
            .with_key("a", a.verifying_key())
            .with_key("b", b.verifying_key())
            .with_key("c", b.verifying_key());

        let sig = b.sign(SigningAlgorithm::EdDsa, b"data").unwrap();

        assert!(trusted
            .find_signer_for("a", SigningAlgorithm::EdDsa, b"data", &sig)
            .is_none());
        assert_eq!(
            trusted
                .find_signer_for("c", SigningAlgorithm::EdDsa, b"data", &sig)
                .map(|k| k.label.as_str()),
            Some("c")
        );
    }
}
