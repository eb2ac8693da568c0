//! Archive scanner
//!
//! Walks a library tree and makes sure every `.cbz` carries a ComicInfo.xml.
//!
//! # Architecture
//!
//! - **walk**: candidate enumeration
//! - **progress**: progress reporting abstraction
//! - **store**: seen-set persistence trait
//! - **db_store**: database implementation of SeenStore
//! - **scanner**: dispatch loop, batching and flushing (this module)
//!
//! Workers never touch shared state: each task returns its outcome and the
//! single harvesting loop owns the pending batch.

mod db_store;
mod progress;
mod store;
mod walk;

pub use progress::{
    ConsoleProgress, IndicatifProgress, MilestoneProgress, NoopProgress, ProgressHandle,
    ProgressReporter,
};
pub use store::SeenStore;
pub use walk::{Candidates, find_archives};

use anyhow::{Context, Result};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

use crate::logging::MUTATION_TARGET;
use crate::model::{ArchiveRef, COMIC_INFO_ENTRY, Outcome, ScanSummary};

use super::archive::{ArchiveError, ArchiveMutator};

/// Archives recorded per seen-set transaction
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Completions between progress updates
const PROGRESS_SAMPLE: u64 = 10;

/// Result of one worker: the fatal store error is the outer layer, the
/// per-archive failure the inner one.
type TaskResult = (ArchiveRef, Result<Result<Outcome, ArchiveError>>);

/// Number of workers matching the host's parallelism
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

/// Evaluate a single archive: seen-set lookup first, then the mutator on
/// the blocking pool.
///
/// Returns `Err` only for store failures. Archive failures come back as the
/// inner `Err` so the caller can keep going.
pub async fn process_archive<S, M>(
    store: &S,
    mutator: Arc<M>,
    archive: &ArchiveRef,
) -> Result<Result<Outcome, ArchiveError>>
where
    S: SeenStore,
    M: ArchiveMutator,
{
    if store.contains(archive).await? {
        return Ok(Ok(Outcome::AlreadySeen));
    }

    let target = archive.clone();
    let outcome = tokio::task::spawn_blocking(move || mutator.ensure_descriptor(&target))
        .await
        .unwrap_or_else(|_| Err(ArchiveError::Worker { path: archive.path().to_path_buf() }));
    Ok(outcome)
}

/// Scans a library root and tags archives missing a descriptor
pub struct ArchiveScanner {
    root: PathBuf,
    batch_size: usize,
    workers: usize,
    verbose: bool,
    progress: Arc<dyn ProgressReporter>,
}

impl ArchiveScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            workers: default_workers(),
            verbose: true,
            progress: Arc::new(ConsoleProgress),
        }
    }

    /// Create a quiet scanner (no console output, used by tests)
    pub fn quiet(root: impl Into<PathBuf>) -> Self {
        Self {
            verbose: false,
            progress: Arc::new(NoopProgress),
            ..Self::new(root)
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run one full pass over the root.
    ///
    /// Returns `Err` only when the seen-set fails; everything recorded before
    /// the failure stays committed.
    pub async fn scan<S, M>(&self, store: &S, mutator: Arc<M>) -> Result<ScanSummary>
    where
        S: SeenStore,
        M: ArchiveMutator,
    {
        let started = Instant::now();
        let mut summary = ScanSummary::default();

        // Phase 1: enumerate
        let found = find_archives(&self.root);
        summary.candidates = found.archives.len() as u64;
        summary.errors += found.unreadable;
        self.log(&format!("Total files found: {}", summary.candidates));

        // Phase 2: drop archives the seen-set already knows
        let mut pending = Vec::with_capacity(found.archives.len());
        for archive in found.archives {
            if store.contains(&archive).await? {
                summary.skipped += 1;
            } else {
                pending.push(archive);
            }
        }

        if pending.is_empty() {
            self.log("Nothing new to process");
            return Ok(summary);
        }
        self.log(&format!("Total files to process: {}", pending.len()));

        // Phase 3: dispatch and harvest in completion order
        let pb = self.progress.start("Processing", pending.len() as u64);
        let mut queue = pending.into_iter();
        let mut tasks: JoinSet<TaskResult> = JoinSet::new();
        let mut batch: Vec<ArchiveRef> = Vec::with_capacity(self.batch_size);
        let mut unreported = 0;

        loop {
            while tasks.len() < self.workers {
                let Some(archive) = queue.next() else { break };
                let store = store.clone();
                let mutator = Arc::clone(&mutator);
                tasks.spawn(async move {
                    let result = process_archive(&store, mutator, &archive).await;
                    (archive, result)
                });
            }

            let Some(joined) = tasks.join_next().await else { break };
            let (archive, result) = joined.context("Archive task aborted")?;

            match result? {
                Ok(outcome) => {
                    if outcome.mutated() {
                        tracing::info!(target: MUTATION_TARGET, "Added {} to {}", COMIC_INFO_ENTRY, archive);
                    }
                    summary.record(outcome);
                    if outcome != Outcome::AlreadySeen {
                        batch.push(archive);
                    }
                    if batch.len() >= self.batch_size {
                        flush(store, &mut batch).await?;
                    }
                }
                Err(e) => {
                    summary.errors += 1;
                    tracing::warn!(error = %e, "Archive left for the next scan");
                }
            }

            unreported += 1;
            if unreported == PROGRESS_SAMPLE {
                pb.inc(unreported);
                unreported = 0;
            }
        }

        // Phase 4: flush the remainder regardless of size
        flush(store, &mut batch).await?;
        pb.inc(unreported);
        pb.finish();

        tracing::debug!(
            processed = summary.processed,
            mutated = summary.mutated,
            errors = summary.errors,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan pass finished"
        );
        Ok(summary)
    }

    fn log(&self, msg: &str) {
        if self.verbose {
            eprintln!("{}", msg);
        }
    }
}

async fn flush<S: SeenStore>(store: &S, batch: &mut Vec<ArchiveRef>) -> Result<()> {
    if batch.is_empty() {
        return Ok(());
    }
    store.insert_batch(batch).await?;
    tracing::debug!(count = batch.len(), "Recorded batch in seen-set");
    batch.clear();
    Ok(())
}
