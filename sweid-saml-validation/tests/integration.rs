//! Integration tests for the response processor.

use std::sync::Once;

use chrono::{DateTime, Duration, Utc};
use sweid_saml::{
    Assertion, Attribute, AttributeStatement, AuthnStatement, Conditions, EncryptedAssertion,
    LevelOfAssurance, NATURAL_PERSON_WITH_PERSONAL_ID, NameId, Response, STATUS_RESPONDER, Status,
    Subject, SubjectConfirmation, SubjectConfirmationData, XmlSignature, names,
};
use sweid_saml_signservice::{
    SadConfig, SadErrorCode, SadFactory, SadRequest, SigningAlgorithm, SigningKey, TrustedKeys,
};
use sweid_saml_validation::{
    AssertionDecrypter, AssertionDecryptionError, ProcessingState, ResponseProcessor,
    TrustAnchor, ValidationConfig, ValidationErrorCode, ValidationParameters,
    XMLDSIG_EDDSA_ED25519,
};

const IDP: &str = "https://idp.example.se";
const SP: &str = "https://sp.example.org";
const ACS: &str = "https://sp.example.org/acs";
const OTHER_IDP: &str = "https://other-idp.example.se";
const REQUEST_ID: &str = "_authnreq1";
const SP_KEY_ID: &str = "sp-encryption-2024";

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// Stands in for XML encryption: the payload is the assertion as JSON,
/// prefixed with the ID of the key it was encrypted for.
struct JsonDecrypter {
    key_id: &'static str,
}

impl AssertionDecrypter for JsonDecrypter {
    fn decrypt(&self, encrypted: &EncryptedAssertion) -> Result<Assertion, AssertionDecryptionError> {
        let prefix = format!("{}:", self.key_id);
        let body = encrypted
            .encrypted_data
            .strip_prefix(prefix.as_bytes())
            .ok_or_else(|| AssertionDecryptionError {
                reason: "encrypted for another key".to_string(),
            })?;
        serde_json::from_slice(body).map_err(|e| AssertionDecryptionError {
            reason: e.to_string(),
        })
    }
}

fn encrypt(assertion: &Assertion) -> EncryptedAssertion {
    let mut data = format!("{SP_KEY_ID}:").into_bytes();
    data.extend(serde_json::to_vec(assertion).unwrap());
    EncryptedAssertion::new(data)
}

fn sign(key: &SigningKey, response: Response) -> Response {
    let signed_bytes = format!("<samlp:Response ID=\"{}\"/>", response.id).into_bytes();
    let value = key.sign(SigningAlgorithm::EdDsa, &signed_bytes).unwrap();
    response.with_signature(XmlSignature::new(XMLDSIG_EDDSA_ED25519, signed_bytes, value))
}

fn assertion(loa: LevelOfAssurance) -> Assertion {
    Assertion::new("_assertion1", IDP)
        .with_issue_instant(now())
        .with_subject(
            Subject::new(NameId::persistent("b1f4e2c0")).with_confirmation(
                SubjectConfirmation::bearer(SubjectConfirmationData::new(
                    ACS,
                    now() + Duration::minutes(5),
                    REQUEST_ID,
                )),
            ),
        )
        .with_conditions(Conditions::new(
            now() - Duration::seconds(10),
            now() + Duration::minutes(5),
            SP,
        ))
        .with_authn_statement(AuthnStatement::new(now() - Duration::seconds(20), loa.uri()))
        .with_attribute_statement(AttributeStatement::new(vec![
            Attribute::new(names::PERSONAL_IDENTITY_NUMBER, ["199001011234"]),
            Attribute::new(names::SN, ["Andersson"]),
            Attribute::new(names::GIVEN_NAME, ["Kalle"]),
            Attribute::new(names::DISPLAY_NAME, ["Kalle Andersson"]),
        ]))
}

fn response(assertion: &Assertion) -> Response {
    Response::new("_response1", IDP)
        .with_destination(ACS)
        .with_in_response_to(REQUEST_ID)
        .with_issue_instant(now())
        .with_encrypted_assertion(encrypt(assertion))
}

fn params(idp_key: &SigningKey) -> ValidationParameters {
    ValidationParameters::new(SP, ACS)
        .with_idp_entity_id(IDP)
        .with_authn_request_id(REQUEST_ID)
        .with_requested_loa(LevelOfAssurance::Loa3.uri())
        .with_required_attribute_set(&NATURAL_PERSON_WITH_PERSONAL_ID)
        .with_trust_anchor(TrustAnchor::new(IDP, idp_key.verifying_key()))
}

fn processor(config: ValidationConfig) -> ResponseProcessor {
    ResponseProcessor::new(config).with_decrypter(JsonDecrypter { key_id: SP_KEY_ID })
}

#[test]
fn valid_response_is_accepted() {
    // Arrange
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let issued = assertion(LevelOfAssurance::Loa3);
    let signed = sign(&idp_key, response(&issued));

    // Act
    let processed = processor(ValidationConfig::default())
        .process(&signed, &params(&idp_key), now())
        .unwrap();

    // Assert
    assert_eq!(processed.response_id, "_response1");
    assert_eq!(processed.assertion, issued);
    assert_eq!(processed.signer.as_deref(), Some(IDP));
    assert_eq!(processed.loa, LevelOfAssurance::Loa3);
    assert_eq!(processed.sad, None);
    assert!(processed.warnings.is_empty());
}

#[test]
fn untrusted_signature_stops_at_received() {
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let rogue = SigningKey::generate_ed25519();
    let signed = sign(&rogue, response(&assertion(LevelOfAssurance::Loa3)));

    let rejection = processor(ValidationConfig::default())
        .process(&signed, &params(&idp_key), now())
        .unwrap_err();

    assert_eq!(rejection.state, ProcessingState::Received);
    assert_eq!(rejection.code, ValidationErrorCode::BadSignature);
}

#[test]
fn response_signed_by_another_trusted_idp_is_rejected() {
    // Arrange
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let other_key = SigningKey::generate_ed25519();
    let params = params(&idp_key)
        .with_trust_anchor(TrustAnchor::new(OTHER_IDP, other_key.verifying_key()));
    let impersonated = sign(&other_key, response(&assertion(LevelOfAssurance::Loa3)));

    // Act
    let rejection = processor(ValidationConfig::default())
        .process(&impersonated, &params, now())
        .unwrap_err();

    // Assert
    assert_eq!(rejection.state, ProcessingState::Received);
    assert_eq!(rejection.code, ValidationErrorCode::BadSignature);
    assert!(rejection.message.contains(IDP));
}

#[test]
fn assertion_must_come_from_the_response_issuer() {
    // Arrange
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let other_key = SigningKey::generate_ed25519();
    let mut params = params(&idp_key)
        .with_trust_anchor(TrustAnchor::new(OTHER_IDP, other_key.verifying_key()));
    params.idp_entity_id = None;
    let mut relayed = response(&assertion(LevelOfAssurance::Loa3));
    relayed.issuer = Some(OTHER_IDP.to_string());

    // Act
    let rejection = processor(ValidationConfig::default())
        .process(&sign(&other_key, relayed), &params, now())
        .unwrap_err();

    // Assert
    assert_eq!(rejection.state, ProcessingState::SignatureChecked);
    assert_eq!(rejection.code, ValidationErrorCode::IssuerMismatch);
}

#[test]
fn assertion_signed_by_another_trusted_idp_is_rejected() {
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let other_key = SigningKey::generate_ed25519();
    let params = params(&idp_key)
        .with_trust_anchor(TrustAnchor::new(OTHER_IDP, other_key.verifying_key()));
    let bytes = b"<saml:Assertion ID=\"_assertion1\"/>".to_vec();
    let signed_elsewhere = assertion(LevelOfAssurance::Loa3).with_signature(XmlSignature::new(
        XMLDSIG_EDDSA_ED25519,
        bytes.clone(),
        other_key.sign(SigningAlgorithm::EdDsa, &bytes).unwrap(),
    ));

    let rejection = processor(ValidationConfig::default())
        .process(&sign(&idp_key, response(&signed_elsewhere)), &params, now())
        .unwrap_err();

    assert_eq!(rejection.state, ProcessingState::SignatureChecked);
    assert_eq!(rejection.code, ValidationErrorCode::BadSignature);
}

#[test]
fn error_status_is_rejected_after_signature_check() {
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let failed = Response::new("_response1", IDP)
        .with_destination(ACS)
        .with_in_response_to(REQUEST_ID)
        .with_issue_instant(now())
        .with_status(Status::error(STATUS_RESPONDER, "user cancelled"));
    let signed = sign(&idp_key, failed);

    let rejection = processor(ValidationConfig::default())
        .process(&signed, &params(&idp_key), now())
        .unwrap_err();

    assert_eq!(rejection.state, ProcessingState::SignatureChecked);
    assert_eq!(rejection.code, ValidationErrorCode::StatusNotSuccess);
    assert!(rejection.message.contains("user cancelled"));
}

#[test]
fn response_fields_are_checked() {
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let issued = assertion(LevelOfAssurance::Loa3);
    let run = |response: Response| {
        processor(ValidationConfig::default())
            .process(&sign(&idp_key, response), &params(&idp_key), now())
            .unwrap_err()
            .code
    };

    assert_eq!(
        run(response(&issued).with_destination("https://sp.example.org/other")),
        ValidationErrorCode::DestinationMismatch
    );
    assert_eq!(
        run(response(&issued).with_in_response_to("_authnreq2")),
        ValidationErrorCode::InResponseToMismatch
    );
    assert_eq!(
        run(response(&issued).with_issue_instant(now() - Duration::minutes(10))),
        ValidationErrorCode::ResponseExpired
    );
    assert_eq!(
        run(response(&issued).with_issue_instant(now() + Duration::minutes(10))),
        ValidationErrorCode::ResponseIssuedInFuture
    );
}

#[test]
fn plain_assertion_is_rejected_in_strict_mode_only() {
    // Arrange
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let plain = Response::new("_response1", IDP)
        .with_destination(ACS)
        .with_in_response_to(REQUEST_ID)
        .with_issue_instant(now())
        .with_assertion(assertion(LevelOfAssurance::Loa3));
    let signed = sign(&idp_key, plain);

    // Act
    let strict = processor(ValidationConfig::default()).process(&signed, &params(&idp_key), now());
    let lenient = processor(ValidationConfig::default().with_strict(false)).process(
        &signed,
        &params(&idp_key),
        now(),
    );

    // Assert
    let rejection = strict.unwrap_err();
    assert_eq!(rejection.state, ProcessingState::SignatureChecked);
    assert_eq!(rejection.code, ValidationErrorCode::UnexpectedAssertions);
    let processed = lenient.unwrap();
    assert_eq!(processed.warnings.len(), 1);
    assert!(processed.warnings[0].contains("UNEXPECTED_ASSERTIONS"));
}

#[test]
fn undecryptable_assertion_is_rejected() {
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let signed = sign(&idp_key, response(&assertion(LevelOfAssurance::Loa3)));

    let wrong_key = ResponseProcessor::new(ValidationConfig::default())
        .with_decrypter(JsonDecrypter { key_id: "sp-encryption-2019" })
        .process(&signed, &params(&idp_key), now())
        .unwrap_err();
    let no_decrypter = ResponseProcessor::new(ValidationConfig::default())
        .process(&signed, &params(&idp_key), now())
        .unwrap_err();

    assert_eq!(wrong_key.code, ValidationErrorCode::AssertionDecryptionFailed);
    assert!(wrong_key.message.contains("another key"));
    assert_eq!(no_decrypter.code, ValidationErrorCode::AssertionDecryptionFailed);
}

#[test]
fn assertion_for_another_audience_is_rejected() {
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let elsewhere = assertion(LevelOfAssurance::Loa3).with_conditions(Conditions::new(
        now() - Duration::seconds(10),
        now() + Duration::minutes(5),
        "https://other.example.org",
    ));

    let rejection = processor(ValidationConfig::default())
        .process(&sign(&idp_key, response(&elsewhere)), &params(&idp_key), now())
        .unwrap_err();

    assert_eq!(rejection.state, ProcessingState::SignatureChecked);
    assert_eq!(rejection.code, ValidationErrorCode::AudienceMismatch);
}

#[test]
fn signed_assertion_must_verify() {
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let rogue = SigningKey::generate_ed25519();
    let bytes = b"<saml:Assertion ID=\"_assertion1\"/>".to_vec();
    let forged = assertion(LevelOfAssurance::Loa3).with_signature(XmlSignature::new(
        XMLDSIG_EDDSA_ED25519,
        bytes.clone(),
        rogue.sign(SigningAlgorithm::EdDsa, &bytes).unwrap(),
    ));

    let rejection = processor(ValidationConfig::default())
        .process(&sign(&idp_key, response(&forged)), &params(&idp_key), now())
        .unwrap_err();

    assert_eq!(rejection.code, ValidationErrorCode::BadSignature);
    assert_eq!(rejection.state, ProcessingState::SignatureChecked);
}

#[test]
fn unrequested_loa_is_rejected() {
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let signed = sign(&idp_key, response(&assertion(LevelOfAssurance::Loa2)));

    let rejection = processor(ValidationConfig::default())
        .process(&signed, &params(&idp_key), now())
        .unwrap_err();

    assert_eq!(rejection.code, ValidationErrorCode::LoaNotRequested);
}

#[test]
fn loa4_requires_holder_of_key() {
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let signed = sign(&idp_key, response(&assertion(LevelOfAssurance::Loa4)));
    let params = params(&idp_key).with_requested_loa(LevelOfAssurance::Loa4.uri());

    let rejection = processor(ValidationConfig::default())
        .process(&signed, &params, now())
        .unwrap_err();

    assert_eq!(rejection.code, ValidationErrorCode::HolderOfKeyRequired);
}

// ============================================================================
// SIGNATURE SERVICE AUTHENTICATION
// ============================================================================

fn sad_request() -> SadRequest {
    SadRequest::builder()
        .id("_sadreq1")
        .requester_id(SP)
        .sign_request_id("f6e7d061a23293b0053dc7b038a04dad")
        .doc_count(1)
        .build()
        .unwrap()
}

fn with_sad(base: Assertion, sad_key: &SigningKey) -> Assertion {
    with_sad_issued_at(base, sad_key, now())
}

fn with_sad_issued_at(base: Assertion, sad_key: &SigningKey, issued_at: DateTime<Utc>) -> Assertion {
    let sad = SadFactory::new(IDP, sad_key.clone(), SigningAlgorithm::EdDsa)
        .unwrap()
        .create_for_request_at(&base, &sad_request(), LevelOfAssurance::Loa3.uri(), issued_at)
        .unwrap();
    base.with_attribute_statement(AttributeStatement::new(vec![Attribute::new(
        names::SAD,
        [sad.to_string()],
    )]))
}

#[test]
fn expected_sad_is_validated_and_returned() {
    // Arrange
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let sad_key = SigningKey::generate_ed25519();
    let issued = with_sad(assertion(LevelOfAssurance::Loa3), &sad_key);
    let params = params(&idp_key).with_sad_request(
        sad_request(),
        TrustedKeys::new().with_key(IDP, sad_key.verifying_key()),
    );

    // Act
    let processed = processor(ValidationConfig::default())
        .process(&sign(&idp_key, response(&issued)), &params, now())
        .unwrap();

    // Assert
    let sad = processed.sad.unwrap();
    assert_eq!(sad.sub, "199001011234");
    assert_eq!(sad.aud, SP);
    assert_eq!(sad.in_response_to(), Some("_sadreq1"));
}

#[test]
fn sad_from_untrusted_key_stops_after_assertion() {
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let issued = with_sad(assertion(LevelOfAssurance::Loa3), &SigningKey::generate_ed25519());
    let params = params(&idp_key).with_sad_request(
        sad_request(),
        TrustedKeys::new().with_key(IDP, SigningKey::generate_ed25519().verifying_key()),
    );

    let rejection = processor(ValidationConfig::default())
        .process(&sign(&idp_key, response(&issued)), &params, now())
        .unwrap_err();

    assert_eq!(rejection.state, ProcessingState::AssertionValidated);
    assert_eq!(rejection.code, ValidationErrorCode::Sad(SadErrorCode::BadSignature));
    assert_eq!(rejection.code.as_str(), "BAD_SIGNATURE");
}

#[test]
fn missing_sad_is_reported() {
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let params = params(&idp_key).with_sad_request(sad_request(), TrustedKeys::new());

    let rejection = processor(ValidationConfig::default())
        .process(
            &sign(&idp_key, response(&assertion(LevelOfAssurance::Loa3))),
            &params,
            now(),
        )
        .unwrap_err();

    assert_eq!(rejection.code, ValidationErrorCode::Sad(SadErrorCode::NoSadAttribute));
}

#[test]
fn sad_lifetime_uses_the_sad_clock_skew() {
    // Arrange: the SAD expired 20 seconds ago, inside the assertion skew
    // but outside the default SAD skew
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let sad_key = SigningKey::generate_ed25519();
    let issued = with_sad_issued_at(
        assertion(LevelOfAssurance::Loa3),
        &sad_key,
        now() - Duration::seconds(320),
    );
    let params = params(&idp_key).with_sad_request(
        sad_request(),
        TrustedKeys::new().with_key(IDP, sad_key.verifying_key()),
    );
    let response = sign(&idp_key, response(&issued));

    // Act
    let default_skew = processor(ValidationConfig::default()).process(&response, &params, now());
    let wide_skew = processor(ValidationConfig::default())
        .with_sad_config(SadConfig::default().with_clock_skew(std::time::Duration::from_secs(30)))
        .process(&response, &params, now());

    // Assert
    let rejection = default_skew.unwrap_err();
    assert_eq!(rejection.state, ProcessingState::AssertionValidated);
    assert_eq!(rejection.code, ValidationErrorCode::Sad(SadErrorCode::Expired));
    assert!(wide_skew.unwrap().sad.is_some());
}

#[test]
fn sad_algorithm_allow_list_is_applied() {
    init_tracing();
    let idp_key = SigningKey::generate_ed25519();
    let sad_key = SigningKey::generate_ed25519();
    let issued = with_sad(assertion(LevelOfAssurance::Loa3), &sad_key);
    let params = params(&idp_key).with_sad_request(
        sad_request(),
        TrustedKeys::new().with_key(IDP, sad_key.verifying_key()),
    );

    let rejection = processor(ValidationConfig::default())
        .with_sad_config(
            SadConfig::default().with_allowed_algorithms(vec![SigningAlgorithm::Rs256]),
        )
        .process(&sign(&idp_key, response(&issued)), &params, now())
        .unwrap_err();

    assert_eq!(rejection.code, ValidationErrorCode::Sad(SadErrorCode::BadSignature));
}
