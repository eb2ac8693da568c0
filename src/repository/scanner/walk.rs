//! Candidate enumeration

use rustc_hash::FxHashSet;
use std::path::Path;
use walkdir::WalkDir;

use crate::model::ArchiveRef;
use crate::util::is_archive_name;

/// Archives found under a root, plus the count of entries that could not be read
#[derive(Debug, Default)]
pub struct Candidates {
    pub archives: Vec<ArchiveRef>,
    pub unreadable: u64,
}

/// Recursively collect regular `.cbz` files under `root`.
///
/// Unreadable directories or entries are logged and skipped. Order follows
/// the directory walk and is not meaningful.
pub fn find_archives(root: &Path) -> Candidates {
    let mut seen = FxHashSet::default();
    let mut candidates = Candidates::default();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable entry");
                candidates.unreadable += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        if !is_archive_name(&entry.file_name().to_string_lossy()) {
            continue;
        }

        let archive = ArchiveRef::new(entry.path());
        if seen.insert(archive.clone()) {
            candidates.archives.push(archive);
        }
    }

    candidates
}
