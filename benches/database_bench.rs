// Seen-set database benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use criterion::async_executor::AsyncExecutor;
use mangafix::model::ArchiveRef;
use tokio::runtime::Runtime;

mod common;

struct TokioExecutor(Runtime);

impl AsyncExecutor for TokioExecutor {
    fn block_on<T>(&self, future: impl std::future::Future<Output = T>) -> T {
        self.0.block_on(future)
    }
}

fn bench_insert_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("db_insert_batch");
    for size in [500, 5_000, 50_000] {
        let archives = common::generate_archives(size);

        group.bench_with_input(
            BenchmarkId::new("archives", size),
            &archives,
            |b, archives| {
                b.to_async(TokioExecutor(Runtime::new().unwrap())).iter(|| async {
                    let db = common::setup_bench_db().await;
                    db.insert_batch(archives).await.unwrap();
                    black_box(db)
                });
            },
        );
    }
    group.finish();
}

fn bench_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("db_contains");
    let archives = common::generate_archives(10_000);

    // Populated once; only the lookup is measured
    let rt = Runtime::new().unwrap();
    let db = rt.block_on(async {
        let db = common::setup_bench_db().await;
        db.insert_batch(&archives).await.unwrap();
        db
    });
    let missing = ArchiveRef::new("/manga/missing.cbz");

    // Benchmark lookup of a recorded archive
    group.bench_function("lookup_existing", |b| {
        b.to_async(&rt).iter(|| async { black_box(db.contains(&archives[5_000]).await.unwrap()) });
    });

    // Benchmark lookup of an unknown archive
    group.bench_function("lookup_missing", |b| {
        b.to_async(&rt).iter(|| async { black_box(db.contains(&missing).await.unwrap()) });
    });

    group.finish();
}

criterion_group!(benches, bench_insert_batch, bench_contains);
criterion_main!(benches);
