//! Gateway benchmarks: measures decision overhead excluding the backend.
//!
//! - rule-based classification of short and long prompts
//! - routing a classification (table lookup + reasoning chain)
//! - cache key derivation and cache get/put
//! - full miss and hit paths through `Gateway` with a zero-delay echo worker

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio::runtime::Runtime;

use prompt_gateway::{
    CacheKey, ClassifierMode, EchoWorker, Gateway, ModelRouter, ResponseCache,
    RuleBasedClassifier,
};

const SHORT: &str = "What is 2+2?";
const MEDIUM: &str = "Solve the integral of x^2 * e^x dx step by step";

fn long_prompt() -> String {
    "Design a comprehensive, fault-tolerant architecture for a distributed \
     payment system and compare the trade-offs of each component. "
        .repeat(20)
}

// ---------------------------------------------------------------------------
// Bench: classification
// ---------------------------------------------------------------------------

fn bench_classify(c: &mut Criterion) {
    let classifier = RuleBasedClassifier::new();
    let long = long_prompt();
    let mut group = c.benchmark_group("classify_rule_based");
    for (name, prompt) in [("short", SHORT), ("medium", MEDIUM), ("long", long.as_str())] {
        group.bench_with_input(BenchmarkId::from_parameter(name), prompt, |b, p| {
            b.iter(|| black_box(classifier.evaluate(black_box(p))))
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Bench: routing
// ---------------------------------------------------------------------------

fn bench_route(c: &mut Criterion) {
    let router = ModelRouter::default();
    let classification = RuleBasedClassifier::new().evaluate(MEDIUM);
    c.bench_function("route_classification", |b| {
        b.iter(|| black_box(router.route(black_box(&classification))))
    });
}

// ---------------------------------------------------------------------------
// Bench: cache
// ---------------------------------------------------------------------------

fn bench_cache(c: &mut Criterion) {
    c.bench_function("cache_key_sha256", |b| {
        b.iter(|| black_box(CacheKey::new(black_box(MEDIUM), ClassifierMode::RuleBased)))
    });

    let cache: ResponseCache<u64> = ResponseCache::new(100, Duration::from_secs(1800));
    let keys: Vec<CacheKey> = (0..100)
        .map(|i| CacheKey::new(&format!("prompt {i}"), ClassifierMode::RuleBased))
        .collect();
    for (i, key) in keys.iter().enumerate() {
        cache.put(key.clone(), i as u64);
    }

    c.bench_function("cache_get_hit", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % keys.len();
            black_box(cache.get(&keys[i]))
        })
    });

    c.bench_function("cache_put_evicting", |b| {
        let mut i = 0_u64;
        b.iter(|| {
            i += 1;
            let key = CacheKey::new(&format!("new prompt {i}"), ClassifierMode::RuleBased);
            cache.put(key, i);
        })
    });
}

// ---------------------------------------------------------------------------
// Bench: full gateway paths
// ---------------------------------------------------------------------------

fn bench_gateway(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let gateway = Gateway::new(
        ModelRouter::default(),
        Arc::new(EchoWorker::new()),
        ResponseCache::default(),
    );

    c.bench_function("gateway_cache_hit", |b| {
        rt.block_on(async {
            let _ = gateway.handle_route(SHORT, ClassifierMode::RuleBased).await;
        });
        b.to_async(&rt).iter(|| async {
            black_box(gateway.handle_route(SHORT, ClassifierMode::RuleBased).await.is_ok())
        })
    });

    c.bench_function("gateway_miss_echo_worker", |b| {
        let mut i = 0_u64;
        b.to_async(&rt).iter(|| {
            i += 1;
            let prompt = format!("{MEDIUM} variant {i}");
            let gateway = &gateway;
            async move {
                black_box(
                    gateway
                        .handle_route(&prompt, ClassifierMode::RuleBased)
                        .await
                        .is_ok(),
                )
            }
        })
    });
}

criterion_group!(benches, bench_classify, bench_route, bench_cache, bench_gateway);
criterion_main!(benches);
