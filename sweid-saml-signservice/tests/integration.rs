//! Integration tests for sweid-saml-signservice.

use chrono::{DateTime, Duration, Utc};
use sweid_saml::{Assertion, Attribute, AttributeStatement, AuthnStatement, names};
use sweid_saml_signservice::{
    SadErrorCode, SadFactory, SadRequest, SadToken, SadValidator, SigningAlgorithm, SigningKey,
    TrustedKeys, decode, transaction_id,
};

const IDP: &str = "https://idp.example.se";
const SP: &str = "https://sp.example.org";
const LOA3: &str = "http://id.elegnamnden.se/loa/1.0/loa3";

fn issued_at() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn assertion(id: &str) -> Assertion {
    Assertion::new(id, IDP)
        .with_authn_statement(AuthnStatement::new(issued_at(), LOA3))
        .with_attribute_statement(AttributeStatement::new(vec![
            Attribute::new(names::PERSONAL_IDENTITY_NUMBER, ["199001011234"]),
            Attribute::new(names::SN, ["Andersson"]),
        ]))
}

fn idp(key: &SigningKey) -> SadFactory {
    SadFactory::new(IDP, key.clone(), SigningAlgorithm::EdDsa).unwrap()
}

fn trusting(key: &SigningKey) -> SadValidator {
    SadValidator::new(TrustedKeys::new().with_key(IDP, key.verifying_key()))
}

#[test]
fn end_to_end_accept_then_audience_mismatch() {
    // Arrange
    let key = SigningKey::generate_ed25519();
    let a = assertion("_a1");
    let token = idp(&key)
        .create_at(&a, SP, names::PERSONAL_IDENTITY_NUMBER, LOA3, 300, issued_at())
        .unwrap()
        .to_string();
    let validator = trusting(&key);
    let now = issued_at() + Duration::seconds(100);

    // Act
    let accepted = validator.validate_at(&token, &a, SP, now);
    let rejected = validator.validate_at(&token, &a, "https://other.example.org", now);

    // Assert
    let claims = accepted.unwrap();
    assert_eq!(claims.sub, "199001011234");
    assert_eq!(claims.aud, SP);
    assert_eq!(claims.iss, IDP);
    assert_eq!(claims.loa, LOA3);
    assert_eq!(claims.exp - claims.iat, 300);
    assert_eq!(claims.jti, transaction_id(&a));
    assert_eq!(rejected.unwrap_err().code, SadErrorCode::AudienceMismatch);
}

#[test]
fn rsa_tokens_validate() {
    // Arrange
    let key = SigningKey::generate_rsa(1024).unwrap();
    let factory = SadFactory::new(IDP, key.clone(), SigningAlgorithm::Rs256).unwrap();
    let a = assertion("_a1");

    // Act
    let token = factory
        .create_at(&a, SP, names::PERSONAL_IDENTITY_NUMBER, LOA3, 300, issued_at())
        .unwrap();

    // Assert
    assert_eq!(token.algorithm(), SigningAlgorithm::Rs256);
    assert_eq!(token.header().alg, "RS256");
    let claims = trusting(&key)
        .validate_at(&token.to_string(), &a, SP, issued_at())
        .unwrap();
    assert_eq!(claims.sub, "199001011234");
}

#[test]
fn bad_signature_is_reported_before_expiry() {
    // Arrange: signed by an untrusted key and long expired
    let trusted = SigningKey::generate_ed25519();
    let rogue = SigningKey::generate_ed25519();
    let a = assertion("_a1");
    let token = idp(&rogue)
        .create_at(&a, SP, names::PERSONAL_IDENTITY_NUMBER, LOA3, 60, issued_at())
        .unwrap()
        .to_string();

    // Act
    let err = trusting(&trusted)
        .validate_at(&token, &a, SP, issued_at() + Duration::days(1))
        .unwrap_err();

    // Assert
    assert_eq!(err.code, SadErrorCode::BadSignature);
}

#[test]
fn expired_token_from_trusted_key() {
    // Arrange
    let key = SigningKey::generate_ed25519();
    let a = assertion("_a1");
    let token = idp(&key)
        .create_at(&a, SP, names::PERSONAL_IDENTITY_NUMBER, LOA3, 60, issued_at())
        .unwrap()
        .to_string();

    // Act
    let err = trusting(&key)
        .validate_at(&token, &a, SP, issued_at() + Duration::days(1))
        .unwrap_err();

    // Assert
    assert_eq!(err.code, SadErrorCode::Expired);
}

#[test]
fn other_assertion_is_a_transaction_mismatch() {
    // Arrange
    let key = SigningKey::generate_ed25519();
    let token = idp(&key)
        .create_at(
            &assertion("_a1"),
            SP,
            names::PERSONAL_IDENTITY_NUMBER,
            LOA3,
            300,
            issued_at(),
        )
        .unwrap()
        .to_string();

    // Act
    let err = trusting(&key)
        .validate_at(&token, &assertion("_a2"), SP, issued_at())
        .unwrap_err();

    // Assert
    assert_eq!(err.code, SadErrorCode::TransactionMismatch);
}

#[test]
fn attribute_withdrawn_from_assertion_is_an_attribute_mismatch() {
    // Arrange
    let key = SigningKey::generate_ed25519();
    let issued = assertion("_a1");
    let token = idp(&key)
        .create_at(&issued, SP, names::SN, LOA3, 300, issued_at())
        .unwrap()
        .to_string();
    let presented = Assertion::new("_a1", IDP)
        .with_authn_statement(AuthnStatement::new(issued_at(), LOA3))
        .with_attribute_statement(AttributeStatement::new(vec![Attribute::new(
            names::PERSONAL_IDENTITY_NUMBER,
            ["199001011234"],
        )]));

    // Act
    let err = trusting(&key)
        .validate_at(&token, &presented, SP, issued_at())
        .unwrap_err();

    // Assert
    assert_eq!(err.code, SadErrorCode::AttributeMismatch);
}

#[test]
fn garbage_is_malformed() {
    let key = SigningKey::generate_ed25519();
    let err = trusting(&key)
        .validate_at("not-a-token", &assertion("_a1"), SP, issued_at())
        .unwrap_err();
    assert_eq!(err.code, SadErrorCode::Malformed);
}

#[test]
fn sad_attribute_round_trip_through_assertion() {
    // Arrange
    let key = SigningKey::generate_ed25519();
    let request = SadRequest::builder()
        .id("_sadreq1")
        .requester_id(SP)
        .sign_request_id("f6e7d061a23293b0053dc7b038a04dad")
        .doc_count(2)
        .build()
        .unwrap();
    let base = assertion("_a1");
    let token = idp(&key)
        .create_for_request_at(&base, &request, LOA3, issued_at())
        .unwrap();
    let with_sad = base.with_attribute_statement(AttributeStatement::new(vec![Attribute::new(
        names::SAD,
        [token.to_string()],
    )]));

    // Act
    let claims = trusting(&key)
        .validate_assertion(&with_sad, &request, issued_at() + Duration::seconds(10))
        .unwrap();

    // Assert
    assert_eq!(claims.in_response_to(), Some("_sadreq1"));
    assert_eq!(claims.document_count(), Some(2));
    assert_eq!(claims.sign_request_id(), Some("f6e7d061a23293b0053dc7b038a04dad"));
}

#[test]
fn compact_form_parses_back_to_the_same_token() {
    let key = SigningKey::generate_ed25519();
    let token = idp(&key)
        .create_at(
            &assertion("_a1"),
            SP,
            names::PERSONAL_IDENTITY_NUMBER,
            LOA3,
            300,
            issued_at(),
        )
        .unwrap();
    let compact = token.to_string();

    let parsed: SadToken = compact.parse().unwrap();

    assert_eq!(parsed, token);
    assert_eq!(parsed.to_string(), compact);
    assert_eq!(&decode(&compact).unwrap(), token.claims());
}
