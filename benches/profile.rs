//! Criterion benchmarks for the profile lookup tables and attribute rules.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use sweid_saml::{
    Attribute, AttributeSet, AttributeStatement, AttributeTemplate, LevelOfAssurance,
    PrincipalSelection, RequestedAttribute, ValueFormat, names,
};

/// Benchmark: LoA URI resolution, first and last table entries
fn bench_loa_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("loa_lookup");
    let all = LevelOfAssurance::all();
    let cases = [
        ("first", all[0].uri()),
        ("last", all[all.len() - 1].uri()),
        ("unknown", "http://id.elegnamnden.se/loa/1.0/loa9"),
    ];

    for (name, uri) in cases {
        group.bench_with_input(BenchmarkId::new("from_uri", name), &uri, |b, uri| {
            b.iter(|| LevelOfAssurance::from_uri(black_box(uri)));
        });
    }

    group.finish();
}

/// Benchmark: attribute value format checks
fn bench_value_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_format");
    let cases = [
        ("pnr", ValueFormat::PersonalIdentityNumber, "199001011234"),
        ("date", ValueFormat::Date, "1990-01-01"),
        ("country", ValueFormat::CountryCode, "SE"),
        ("scoped", ValueFormat::Scoped, "kalle@example.se"),
    ];

    for (name, format, value) in cases {
        group.throughput(Throughput::Bytes(value.len() as u64));
        group.bench_with_input(BenchmarkId::new("check", name), &value, |b, value| {
            b.iter(|| format.check(black_box(value)));
        });
    }

    group.finish();
}

fn statement(extra: usize) -> AttributeStatement {
    let mut attributes = vec![
        Attribute::new(names::PERSONAL_IDENTITY_NUMBER, ["199001011234"]),
        Attribute::new(names::SN, ["Andersson"]),
        Attribute::new(names::GIVEN_NAME, ["Kalle"]),
        Attribute::new(names::DISPLAY_NAME, ["Kalle Andersson"]),
    ];
    let templates = AttributeTemplate::all();
    for template in templates.iter().cycle().take(extra) {
        attributes.push(Attribute::new(template.name, ["value"]));
    }
    AttributeStatement::new(attributes)
}

/// Benchmark: attribute set validation as the released statement grows
fn bench_attribute_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("attribute_set");
    let Some(set) = AttributeSet::from_uri("http://id.elegnamnden.se/ap/1.0/pnr-01") else {
        return;
    };
    let requested = [
        RequestedAttribute::new(names::DATE_OF_BIRTH, false),
        RequestedAttribute::new(names::MAIL, false),
    ];

    for extra in [0usize, 8, 32] {
        let statement = statement(extra);
        group.bench_with_input(BenchmarkId::new("validate", extra), &statement, |b, s| {
            b.iter(|| set.validate_attributes("_a1", black_box(s), &requested));
        });
    }

    group.finish();
}

/// Benchmark: principal selection matching
fn bench_principal_selection(c: &mut Criterion) {
    let Ok(selection) = PrincipalSelection::builder()
        .match_value(names::PERSONAL_IDENTITY_NUMBER, "199001011234")
        .match_value(names::SN, "Andersson")
        .build()
    else {
        return;
    };
    let statement = statement(16);

    c.bench_function("principal_selection/matches", |b| {
        b.iter(|| selection.matches(black_box(&statement)));
    });
}

criterion_group!(
    benches,
    bench_loa_lookup,
    bench_value_format,
    bench_attribute_set,
    bench_principal_selection,
);
criterion_main!(benches);
