//! Compact SAD serialization.
//!
//! A token is `base64url(header) "." base64url(payload) ["." base64url(signature)]`,
//! base64url without padding. Header and payload are canonical JSON:
//!
//! - keys in byte-wise lexicographic order
//! - no insignificant whitespace
//! - absent optional claims omitted, never `null`
//! - `iat` and `exp` as integer seconds since the epoch
//!
//! Canonical form follows from the field order of [`SadClaims`] and
//! [`SadHeader`], which `serde_json` preserves.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::claims::SadClaims;
use crate::error::SadError;

/// The `typ` every SAD header carries.
pub const TOKEN_TYPE: &str = "JWT";

/// The `alg` of an unsigned header.
pub const UNSIGNED: &str = "none";

/// The JOSE header of a SAD token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SadHeader {
    /// Signing algorithm name
    pub alg: String,
    /// Token type, always `JWT`
    pub typ: String,
}

impl SadHeader {
    /// Creates a header for `alg`.
    pub fn new(alg: impl Into<String>) -> Self {
        Self {
            alg: alg.into(),
            typ: TOKEN_TYPE.to_string(),
        }
    }

    /// Creates the header of an unsigned token.
    #[must_use]
    pub fn unsigned() -> Self {
        Self::new(UNSIGNED)
    }
}

/// A token split into its decoded parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    /// The decoded header
    pub header: SadHeader,
    /// The decoded claims
    pub claims: SadClaims,
    /// The bytes the signature covers: the first two segments as transmitted
    pub signing_input: String,
    /// The decoded signature, absent for a two-segment token
    pub signature: Option<Vec<u8>>,
}

/// Encodes claims as an unsigned `header.payload` string.
///
/// # Errors
///
/// Returns `SadError::InvalidClaims` if the claims violate their invariants.
///
/// # Example
///
/// ```
/// use sweid_saml_signservice::{SadClaims, decode, encode};
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
/// let compact = encode(&claims).unwrap();
/// assert_eq!(compact.split('.').count(), 2);
/// assert_eq!(decode(&compact).unwrap(), claims);
/// ```
pub fn encode(claims: &SadClaims) -> Result<String, SadError> {
    encode_with_header(&SadHeader::unsigned(), claims)
}

/// Encodes claims under the given header as `header.payload`.
///
/// # Errors
///
/// Returns `SadError::InvalidClaims` if the claims violate their invariants.
pub fn encode_with_header(header: &SadHeader, claims: &SadClaims) -> Result<String, SadError> {
    claims.check_invariants()?;
    let header_json = canonical_json(header)?;
    let payload_json = canonical_json(claims)?;
    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(payload_json)
    ))
}

fn canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>, SadError> {
    serde_json::to_vec(value).map_err(|e| SadError::InvalidClaims {
        reason: e.to_string(),
    })
}

/// Decodes the claims of a two- or three-segment token without checking any
/// signature.
///
/// # Errors
///
/// Returns `SadError::MalformedToken` on a wrong segment count, bad base64url
/// (padding included), invalid JSON or a missing claim, and
/// `SadError::InvalidClaims` if the claims violate their invariants.
pub fn decode(compact: &str) -> Result<SadClaims, SadError> {
    decode_parts(compact).map(|decoded| decoded.claims)
}

/// Decodes a token into header, claims, signing input and signature.
///
/// # Errors
///
/// As [`decode`]; additionally an empty signature segment is malformed.
pub fn decode_parts(compact: &str) -> Result<DecodedToken, SadError> {
    let segments: Vec<&str> = compact.split('.').collect();
    if !(2..=3).contains(&segments.len()) {
        return Err(malformed(format!(
            "expected 2 or 3 segments, found {}",
            segments.len()
        )));
    }

    let header_bytes = decode_segment("header", segments[0])?;
    let header: SadHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| malformed(format!("header: {e}")))?;
    if header.typ != TOKEN_TYPE {
        return Err(malformed(format!(
            "unexpected token type '{}', expected '{TOKEN_TYPE}'",
            header.typ
        )));
    }

    let payload_bytes = decode_segment("payload", segments[1])?;
    let claims: SadClaims = serde_json::from_slice(&payload_bytes)
        .map_err(|e| malformed(format!("payload: {e}")))?;
    claims.check_invariants()?;

    let signature = match segments.get(2) {
        None => None,
        Some(segment) if segment.is_empty() => {
            return Err(malformed("empty signature segment".to_string()));
        }
        Some(segment) => Some(decode_segment("signature", segment)?),
    };

    Ok(DecodedToken {
        header,
        claims,
        signing_input: format!("{}.{}", segments[0], segments[1]),
        signature,
    })
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>, SadError> {
    if segment.is_empty() {
        return Err(malformed(format!("empty {name} segment")));
    }
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| malformed(format!("{name} is not unpadded base64url: {e}")))
}

fn malformed(reason: String) -> SadError {
    SadError::MalformedToken { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> SadClaims {
        SadClaims::builder()
            .issuer("https://idp.example.se")
            .audience("https://sign.example.se")
            .subject("199001011234")
            .transaction_id("abc")
            .loa("http://id.elegnamnden.se/loa/1.0/loa3")
            .attribute("urn:oid:1.2.752.29.4.13")
            .issued_at(chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn payload_is_canonical_json() {
        let compact = encode(&claims()).unwrap();
        let payload = segment_json(&compact, 1);

        assert_eq!(
            payload,
            concat!(
                r#"{"attr":"urn:oid:1.2.752.29.4.13","aud":"https://sign.example.se","#,
                r#""exp":1700000300,"iat":1700000000,"iss":"https://idp.example.se","#,
                r#""jti":"abc","loa":"http://id.elegnamnden.se/loa/1.0/loa3","#,
                r#""sub":"199001011234","ver":"1.0"}"#
            )
        );
    }

    #[test]
    fn header_is_canonical_json() {
        let compact = encode(&claims()).unwrap();
        assert_eq!(segment_json(&compact, 0), r#"{"alg":"none","typ":"JWT"}"#);
    }

    #[test]
    fn extensions_are_encoded_sorted_between_loa_and_sub() {
        let mut c = claims();
        c.se_attr.insert("reqid".into(), "r1".into());
        c.se_attr.insert("docs".into(), "2".into());

        let payload = segment_json(&encode(&c).unwrap(), 1);

        assert!(payload.contains(r#""seAttr":{"docs":"2","reqid":"r1"},"sub""#));
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(encode(&claims()).unwrap(), encode(&claims()).unwrap());
    }

    #[test]
    fn rejects_wrong_segment_count() {
        for input in ["abc", "a.b.c.d", ""] {
            assert!(matches!(
                decode(input),
                Err(SadError::MalformedToken { .. })
            ));
        }
    }

    #[test]
    fn rejects_padded_base64() {
        let compact = encode(&claims()).unwrap();
        let (header, payload) = compact.split_once('.').unwrap();
        let padded = format!("{header}.{payload}==");
        assert!(matches!(
            decode(&padded),
            Err(SadError::MalformedToken { .. })
        ));
    }

    #[test]
    fn rejects_missing_claim() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"aud":"a","exp":2,"iat":1,"iss":"i","jti":"j","loa":"l","sub":"s","ver":"1.0"}"#);
        let result = decode(&format!("{header}.{payload}"));
        assert!(matches!(result, Err(SadError::MalformedToken { .. })));
    }

    #[test]
    fn rejects_null_optional_claim() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"attr":"a","aud":"a","exp":2,"iat":1,"iss":"i","jti":"j","loa":"l","seAttr":null,"sub":"s","ver":"1.0"}"#);
        assert!(decode(&format!("{header}.{payload}")).is_err());
    }

    #[test]
    fn rejects_wrong_token_type() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWS"}"#);
        let payload = encode(&claims()).unwrap();
        let payload = payload.split_once('.').unwrap().1;
        assert!(matches!(
            decode(&format!("{header}.{payload}")),
            Err(SadError::MalformedToken { .. })
        ));
    }

    #[test]
    fn rejects_empty_signature_segment() {
        let compact = format!("{}.", encode(&claims()).unwrap());
        assert!(matches!(
            decode_parts(&compact),
            Err(SadError::MalformedToken { .. })
        ));
    }

    #[test]
    fn decode_parts_keeps_signing_input() {
        let unsigned = encode(&claims()).unwrap();
        let compact = format!("{unsigned}.{}", URL_SAFE_NO_PAD.encode([1u8, 2, 3]));

        let decoded = decode_parts(&compact).unwrap();

        assert_eq!(decoded.signing_input, unsigned);
        assert_eq!(decoded.signature, Some(vec![1, 2, 3]));
        assert_eq!(decoded.header, SadHeader::unsigned());
    }

    fn segment_json(compact: &str, index: usize) -> String {
        let segment = compact.split('.').nth(index).unwrap();
        String::from_utf8(URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
    }
}
