//! Performance benchmarks for classification and registry churn.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use loxhaus::{
    classify_message, ChannelSink, EventSource, EventStream, RegistryConfig, SubscriptionRegistry,
};
use tokio_util::sync::CancellationToken;

/// Source whose streams never yield.
struct Silent;

impl EventSource for Silent {
    fn listen(&self, _topic: &str, _cancel: CancellationToken) -> EventStream {
        Box::pin(tokio_stream::pending())
    }
}

/// Benchmark error text classification
fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    let cases = [
        ("terminal", "permission denied for key user/1"),
        ("rate_limited", "429 Too Many Requests"),
        ("with_hint", "rate limited. Try again in 12 seconds"),
    ];

    for (name, text) in cases {
        group.bench_with_input(BenchmarkId::new("message", name), &text, |b, text| {
            b.iter(|| black_box(classify_message(black_box(text))));
        });
    }

    group.finish();
}

/// Benchmark subscribe/replace/unsubscribe cycles across topic counts
fn bench_registry_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_churn");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    for topics in [1, 16, 128] {
        group.bench_with_input(BenchmarkId::new("topics", topics), &topics, |b, &topics| {
            let (sink, _receiver) = ChannelSink::new();
            let registry = SubscriptionRegistry::with_runtime(
                runtime.handle().clone(),
                Silent,
                sink,
                RegistryConfig::default(),
            );
            let names: Vec<String> = (0..topics).map(|i| format!("topic-{}", i)).collect();

            b.iter(|| {
                for name in &names {
                    registry.subscribe(name).unwrap();
                    registry.subscribe(name).unwrap();
                }
                black_box(registry.active_topics());
                registry.unsubscribe_all();
            });

            runtime.block_on(registry.drain());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_registry_churn);

criterion_main!(benches);
