// Shared test fixtures for integration tests
// Functions here are used across different test files
#![allow(dead_code)]

use anyhow::Result;
use mangafix::model::{ArchiveRef, Outcome};
use mangafix::repository::{ArchiveError, ArchiveMutator, ComicInfoMutator, Database, SeenStore};
use rustc_hash::FxHashSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Create an in-memory test database
pub async fn create_test_db() -> Database {
    let db = Database::in_memory().await.unwrap();
    db.init_schema().await.unwrap();
    db
}

/// Create a file-backed test database in `dir`, allowing concurrent lookups
pub async fn create_db_in_dir(dir: &Path) -> Database {
    let db = Database::open(&dir.join("processed_files.db"), 8).await.unwrap();
    db.init_schema().await.unwrap();
    db
}

/// Library root and state directory side by side
pub fn create_library() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let manga = dir.path().join("manga");
    let data = dir.path().join("data");
    fs::create_dir_all(&manga).unwrap();
    fs::create_dir_all(&data).unwrap();
    (dir, manga, data)
}

/// Write a .cbz with the given entries, creating parent directories
pub fn write_cbz(path: &Path, entries: &[(&str, &[u8])]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

/// Write a .cbz holding a single page and no descriptor
pub fn write_untagged(path: &Path) {
    write_cbz(path, &[("001.jpg", b"\xff\xd8page")]);
}

/// Entry names in archive order
pub fn entry_names(path: &Path) -> Vec<String> {
    let zip = ZipArchive::new(File::open(path).unwrap()).unwrap();
    zip.file_names().map(str::to_string).collect()
}

/// Read one entry as text
pub fn read_entry(path: &Path, name: &str) -> Option<String> {
    let mut zip = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entry = zip.by_name(name).ok()?;
    let mut out = String::new();
    entry.read_to_string(&mut out).unwrap();
    Some(out)
}

/// Real mutator that records every archive it is asked to open
#[derive(Default)]
pub struct CountingMutator {
    inner: ComicInfoMutator,
    opened: Mutex<Vec<ArchiveRef>>,
}

impl CountingMutator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    pub fn opened(&self) -> Vec<ArchiveRef> {
        self.opened.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.opened.lock().unwrap().clear();
    }
}

impl ArchiveMutator for CountingMutator {
    fn ensure_descriptor(&self, archive: &ArchiveRef) -> Result<Outcome, ArchiveError> {
        self.opened.lock().unwrap().push(archive.clone());
        self.inner.ensure_descriptor(archive)
    }
}

/// Mutator whose write always fails, as a full disk would
#[derive(Default)]
pub struct FailingWriteMutator {
    attempts: Mutex<Vec<ArchiveRef>>,
}

impl FailingWriteMutator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn attempts(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

impl ArchiveMutator for FailingWriteMutator {
    fn ensure_descriptor(&self, archive: &ArchiveRef) -> Result<Outcome, ArchiveError> {
        self.attempts.lock().unwrap().push(archive.clone());
        Err(ArchiveError::Write {
            path: archive.path().to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::StorageFull, "no space left on device"),
        })
    }
}

/// In-memory seen-set recording batch sizes, with switchable insert failures
#[derive(Clone, Default)]
pub struct MemoryStore {
    seen: Arc<Mutex<FxHashSet<ArchiveRef>>>,
    batches: Arc<Mutex<Vec<usize>>>,
    fail_inserts: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn with(archives: &[ArchiveRef]) -> Self {
        let store = Self::default();
        store.seen.lock().unwrap().extend(archives.iter().cloned());
        store
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn has(&self, archive: &ArchiveRef) -> bool {
        self.seen.lock().unwrap().contains(archive)
    }
}

impl SeenStore for MemoryStore {
    async fn contains(&self, archive: &ArchiveRef) -> Result<bool> {
        Ok(self.has(archive))
    }

    async fn insert_batch(&self, archives: &[ArchiveRef]) -> Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            anyhow::bail!("simulated seen-set failure");
        }
        self.batches.lock().unwrap().push(archives.len());
        self.seen.lock().unwrap().extend(archives.iter().cloned());
        Ok(())
    }
}
