//! Criterion benchmarks for the SAD lifecycle.

use std::time::Duration;

use chrono::DateTime;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use sweid_saml::{Assertion, Attribute, AttributeStatement, AuthnStatement, names};
use sweid_saml_signservice::{
    SadClaims, SadFactory, SadToken, SadValidator, SadVerifier, SigningAlgorithm, SigningKey, TrustedKeys,
    decode, encode, sign,
};

const IDP: &str = "https://idp.example.se";
const SP: &str = "https://sp.example.org";
const LOA3: &str = "http://id.elegnamnden.se/loa/1.0/loa3";
const IAT: i64 = 1_700_000_000;

fn claims(extensions: usize) -> SadClaims {
    let mut builder = SadClaims::builder()
        .issuer(IDP)
        .audience(SP)
        .subject("199001011234")
        .transaction_id("pcqnVrYdkUOuNZnkYOoWv5qEgUqFdmbeCl7fjK4m3W8")
        .loa(LOA3)
        .attribute(names::PERSONAL_IDENTITY_NUMBER)
        .issued_at(DateTime::from_timestamp(IAT, 0).unwrap())
        .validity(Duration::from_secs(300));
    for i in 0..extensions {
        builder = builder.extension(format!("ext{i}"), format!("value-{i}"));
    }
    builder.build().unwrap()
}

fn keys() -> [(&'static str, SigningKey, SigningAlgorithm); 2] {
    [
        ("EdDSA", SigningKey::generate_ed25519(), SigningAlgorithm::EdDsa),
        (
            "RS256",
            SigningKey::generate_rsa(2048).unwrap(),
            SigningAlgorithm::Rs256,
        ),
    ]
}

/// Benchmark: canonical encoding and decoding with growing `seAttr` blocks
fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    for extensions in [0usize, 3, 16] {
        let claims = claims(extensions);
        let compact = encode(&claims).unwrap();
        group.throughput(Throughput::Bytes(compact.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", extensions), &claims, |b, c| {
            b.iter(|| encode(black_box(c)));
        });
        group.bench_with_input(BenchmarkId::new("decode", extensions), &compact, |b, s| {
            b.iter(|| decode(black_box(s)));
        });
    }

    group.finish();
}

/// Benchmark: signing and verification per algorithm
fn bench_sign_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature");
    let claims = claims(3);
    let now = DateTime::from_timestamp(IAT + 10, 0).unwrap();

    for (name, key, alg) in keys() {
        let token = sign(&claims, &key, alg).unwrap();
        let verifier = SadVerifier::new(TrustedKeys::new().with_key(IDP, key.verifying_key()));

        group.bench_function(BenchmarkId::new("sign", name), |b| {
            b.iter(|| sign(black_box(&claims), &key, alg));
        });
        group.bench_with_input(BenchmarkId::new("verify", name), &token, |b, t| {
            b.iter(|| verifier.verify_at(black_box(t), now));
        });
    }

    group.finish();
}

/// Benchmark: verification cost as the trust set grows and the signer is last
fn bench_trust_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("trust_set");
    let signer = SigningKey::generate_ed25519();
    let compact = sign(&claims(0), &signer, SigningAlgorithm::EdDsa)
        .unwrap()
        .to_string();
    let now = DateTime::from_timestamp(IAT + 10, 0).unwrap();

    for size in [1usize, 8, 32] {
        let mut trusted = TrustedKeys::new();
        for i in 1..size {
            trusted.add(format!("other-{i}"), SigningKey::generate_ed25519().verifying_key());
        }
        trusted.add(IDP, signer.verifying_key());
        let verifier = SadVerifier::new(trusted);
        let token: SadToken = compact.parse().unwrap();

        group.bench_with_input(BenchmarkId::new("keys", size), &token, |b, t| {
            b.iter(|| verifier.verify_at(black_box(t), now));
        });
    }

    group.finish();
}

/// Benchmark: full validation against the bound assertion
fn bench_validate(c: &mut Criterion) {
    let key = SigningKey::generate_ed25519();
    let assertion = Assertion::new("_a1", IDP)
        .with_authn_statement(AuthnStatement::new(
            DateTime::from_timestamp(IAT, 0).unwrap(),
            LOA3,
        ))
        .with_attribute_statement(AttributeStatement::new(vec![Attribute::new(
            names::PERSONAL_IDENTITY_NUMBER,
            ["199001011234"],
        )]));
    let token = SadFactory::new(IDP, key.clone(), SigningAlgorithm::EdDsa)
        .unwrap()
        .create_at(
            &assertion,
            SP,
            names::PERSONAL_IDENTITY_NUMBER,
            LOA3,
            300,
            DateTime::from_timestamp(IAT, 0).unwrap(),
        )
        .unwrap()
        .to_string();
    let validator = SadValidator::new(TrustedKeys::new().with_key(IDP, key.verifying_key()));
    let now = DateTime::from_timestamp(IAT + 100, 0).unwrap();

    c.bench_function("validate", |b| {
        b.iter(|| validator.validate_at(black_box(&token), &assertion, SP, now));
    });
}

criterion_group!(
    benches,
    bench_codec,
    bench_sign_verify,
    bench_trust_set,
    bench_validate,
);
criterion_main!(benches);
