use criterion::{black_box, criterion_group, criterion_main, Criterion};
use score_engine::{
    cache::{MemoryCache, SqliteCache},
    store::MemoryStore,
    CacheEntry, EngineConfig, GameResult, LocalCache, ScoreEngine,
};
use std::sync::Arc;

fn setup_cache() -> SqliteCache {
    let cache = SqliteCache::new(":memory:").unwrap();

    // Populate with test data
    for i in 0..100 {
        cache.set(&format!("player{}", i), 30, CacheEntry::new(i as f64, Some(i)));
    }

    cache
}

fn bench_cache_get(c: &mut Criterion) {
    let cache = setup_cache();

    c.bench_function("cache_get_hit", |b| {
        b.iter(|| black_box(cache.get("player50", 30)));
    });

    c.bench_function("cache_get_miss", |b| {
        b.iter(|| black_box(cache.get("nobody", 30)));
    });
}

fn bench_cache_set(c: &mut Criterion) {
    let cache = setup_cache();

    c.bench_function("cache_set", |b| {
        b.iter(|| cache.set(black_box("player50"), 30, CacheEntry::new(99.0, Some(50))));
    });
}

fn bench_submit_fast_path(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let engine = ScoreEngine::with_parts(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryCache::new()),
        EngineConfig::default(),
    );
    runtime
        .block_on(engine.submit(&GameResult::new("ava", 30, 100.0)))
        .unwrap();

    let result = GameResult::new("ava", 30, 50.0);
    c.bench_function("submit_not_better_cached", |b| {
        b.to_async(&runtime).iter(|| async { black_box(engine.submit(&result).await.unwrap()) });
    });
}

criterion_group!(benches, bench_cache_get, bench_cache_set, bench_submit_fast_path);
criterion_main!(benches);
