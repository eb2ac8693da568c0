//! Seen-set trait for persistence abstraction
//!
//! Decouples the scan loop from the database so it can be tested against
//! in-memory stores with injected failures.

use std::future::Future;

use anyhow::Result;

use crate::model::ArchiveRef;

/// Durable record of archives that need no further work.
///
/// Stores are cheap to clone and shared between worker tasks. Any error is
/// fatal for the running scan.
pub trait SeenStore: Clone + Send + Sync + 'static {
    /// Point lookup; must not serialize against other lookups
    fn contains(&self, archive: &ArchiveRef) -> impl Future<Output = Result<bool>> + Send;

    /// Record all archives atomically, ignoring ones already present
    fn insert_batch(&self, archives: &[ArchiveRef]) -> impl Future<Output = Result<()>> + Send;
}
