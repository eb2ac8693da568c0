// Shared benchmark helpers
#![allow(dead_code)]

use mangafix::model::ArchiveRef;
use mangafix::repository::Database;

/// Generate archive references spread over a handful of series
pub fn generate_archives(count: usize) -> Vec<ArchiveRef> {
    (0..count)
        .map(|i| ArchiveRef::new(format!("/manga/Series {}/Chapter {:05}.cbz", i % 100, i)))
        .collect()
}

/// Create in-memory database for benchmarks
pub async fn setup_bench_db() -> Database {
    let db = Database::in_memory().await.unwrap();
    db.init_schema().await.unwrap();
    db
}
