use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use keystore_sql::{validate_identifier, XmlDocument};

fn identifier_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_identifier");

    for (label, name) in [
        ("default", "DataProtection".to_string()),
        ("unicode", "Schlüssel_密钥".to_string()),
        ("max_length", format!("k{}", "e".repeat(127))),
        ("rejected", "keys; DROP TABLE users".to_string()),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &name, |b, name| {
            b.iter(|| validate_identifier(black_box(name)))
        });
    }

    group.finish();
}

fn xml_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("xml_parse");

    for value_count in [1, 16, 256] {
        let mut text = String::from("<key id=\"bench\" version=\"1\"><descriptor>");
        for i in 0..value_count {
            text.push_str(&format!("<value n=\"{}\">q3xYq/2Yjzh9Hf6kQ3E7pA==</value>", i));
        }
        text.push_str("</descriptor></key>");

        group.bench_with_input(BenchmarkId::from_parameter(value_count), &text, |b, text| {
            b.iter(|| XmlDocument::parse(black_box(text.as_str())))
        });
    }

    group.finish();
}

criterion_group!(benches, identifier_benchmark, xml_benchmark);
criterion_main!(benches);
