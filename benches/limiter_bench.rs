use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use crpt_api_client::document::{
    CreateDocumentBody, Product, ProductDocument, DOCUMENT_FORMAT_MANUAL,
    DOC_TYPE_INTRODUCE_GOODS,
};
use crpt_api_client::limiter::RateLimiter;

fn bench_uncontended_acquire(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    // Capacity large enough that the bench never drains the window.
    let limiter = rt
        .block_on(async {
            RateLimiter::new(
                Duration::from_secs(3600),
                tokio::sync::Semaphore::MAX_PERMITS,
            )
        })
        .unwrap();

    c.bench_function("uncontended_acquire", |b| {
        b.to_async(&rt).iter(|| async {
            limiter.acquire().await.unwrap();
        });
    });

    limiter.shutdown();
}

fn bench_envelope_encoding(c: &mut Criterion) {
    let document = ProductDocument {
        participant_inn: "1234567890".into(),
        production_date: "2025-08-01".into(),
        usage_type: "SOME_TYPE".into(),
        owner_inn: Some("1234567890".into()),
        producer_inn: Some("1234567890".into()),
        production_type: None,
        products: Some(vec![Product {
            certificate_document: None,
            tnved_code: Some("6401".into()),
            uit_code: Some("010463003407002921gJWCc6".into()),
        }]),
    };

    c.bench_function("encode_document_envelope", |b| {
        b.iter(|| {
            let doc_json = serde_json::to_vec(black_box(&document)).unwrap();
            let body = CreateDocumentBody {
                document_format: DOCUMENT_FORMAT_MANUAL,
                product_document: BASE64.encode(doc_json),
                product_group: "milk".to_string(),
                signature: "sig".to_string(),
                doc_type: DOC_TYPE_INTRODUCE_GOODS,
            };
            black_box(serde_json::to_vec(&body).unwrap())
        })
    });
}

criterion_group!(benches, bench_uncontended_acquire, bench_envelope_encoding);
criterion_main!(benches);
