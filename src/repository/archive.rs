//! In-place descriptor insertion for `.cbz` archives

use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::model::{ArchiveRef, COMIC_INFO_ENTRY, ComicInfo, Outcome};

/// Failure confined to a single archive. The scan goes on and the archive is
/// retried on the next pass.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read zip structure of {}: {source}", .path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed writing ComicInfo.xml into {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("worker for {} panicked", .path.display())]
    Worker { path: PathBuf },
}

impl ArchiveError {
    fn write(archive: &ArchiveRef, source: impl Into<io::Error>) -> Self {
        ArchiveError::Write { path: archive.path().to_path_buf(), source: source.into() }
    }
}

/// Ensures an archive carries a descriptor entry.
///
/// Implementations do blocking I/O and are run on the blocking pool.
pub trait ArchiveMutator: Send + Sync + 'static {
    /// Returns [`Outcome::AlreadyTagged`] or [`Outcome::Tagged`]
    fn ensure_descriptor(&self, archive: &ArchiveRef) -> Result<Outcome, ArchiveError>;
}

/// Writes a synthesized `ComicInfo.xml` into archives that lack one.
///
/// The new archive is built in a sibling temp file and renamed over the
/// original, so an interrupted write never leaves a truncated archive behind.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComicInfoMutator;

impl ComicInfoMutator {
    pub fn new() -> Self {
        Self
    }

    /// Rebuild the archive with the descriptor in a temp file under
    /// `staging_dir`, then rename it over the original. The original is not
    /// written to before the rename.
    fn append_descriptor(
        &self,
        archive: &ArchiveRef,
        mut original: File,
        xml: &[u8],
        staging_dir: &Path,
    ) -> Result<(), ArchiveError> {
        let path = archive.path();
        let permissions = original
            .metadata()
            .map_err(|e| ArchiveError::write(archive, e))?
            .permissions();

        let mut staged = NamedTempFile::new_in(staging_dir).map_err(|e| ArchiveError::write(archive, e))?;
        original
            .seek(SeekFrom::Start(0))
            .and_then(|_| io::copy(&mut original, staged.as_file_mut()))
            .map_err(|e| ArchiveError::write(archive, e))?;
        drop(original);

        let mut writer = ZipWriter::new_append(staged.as_file_mut())
            .map_err(|e| ArchiveError::Zip { path: path.to_path_buf(), source: e })?;
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer
            .start_file(COMIC_INFO_ENTRY, options)
            .map_err(|e| ArchiveError::write(archive, e))?;
        writer.write_all(xml).map_err(|e| ArchiveError::write(archive, e))?;
        writer.finish().map_err(|e| ArchiveError::write(archive, e))?;

        staged.as_file().sync_all().map_err(|e| ArchiveError::write(archive, e))?;
        fs::set_permissions(staged.path(), permissions).map_err(|e| ArchiveError::write(archive, e))?;
        staged.persist(path).map_err(|e| ArchiveError::write(archive, e.error))?;
        Ok(())
    }
}

impl ArchiveMutator for ComicInfoMutator {
    fn ensure_descriptor(&self, archive: &ArchiveRef) -> Result<Outcome, ArchiveError> {
        let path = archive.path();

        // Opening for write surfaces locked and read-only archives up front
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| ArchiveError::Open { path: path.to_path_buf(), source: e })?;

        let has_descriptor = {
            let zip = ZipArchive::new(&file)
                .map_err(|e| ArchiveError::Zip { path: path.to_path_buf(), source: e })?;
            zip.file_names().any(|name| name == COMIC_INFO_ENTRY)
        };
        if has_descriptor {
            return Ok(Outcome::AlreadyTagged);
        }

        // Same directory as the archive so the final rename stays atomic
        let staging_dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let xml = ComicInfo::for_archive(archive).to_xml();
        self.append_descriptor(archive, file, &xml, staging_dir)?;
        Ok(Outcome::Tagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn write_cbz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    fn read_entry(path: &Path, name: &str) -> Option<String> {
        let mut zip = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut entry = zip.by_name(name).ok()?;
        let mut out = String::new();
        entry.read_to_string(&mut out).unwrap();
        Some(out)
    }

    #[test]
    fn test_tags_archive_without_descriptor() {
        let dir = TempDir::new().unwrap();
        let series = dir.path().join("SeriesA");
        fs::create_dir(&series).unwrap();
        let path = series.join("ch1.cbz");
        write_cbz(&path, &[("001.jpg", b"page")]);

        let outcome = ComicInfoMutator.ensure_descriptor(&ArchiveRef::new(&path)).unwrap();
        assert_eq!(outcome, Outcome::Tagged);

        let xml = read_entry(&path, COMIC_INFO_ENTRY).unwrap();
        assert_eq!(xml, "<ComicInfo><Title>ch1</Title><Series>SeriesA</Series></ComicInfo>");
        assert_eq!(read_entry(&path, "001.jpg").as_deref(), Some("page"));
    }

    #[test]
    fn test_leaves_tagged_archive_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ch2.cbz");
        write_cbz(&path, &[("001.jpg", b"page"), (COMIC_INFO_ENTRY, b"<ComicInfo/>")]);
        let before = fs::read(&path).unwrap();

        let outcome = ComicInfoMutator.ensure_descriptor(&ArchiveRef::new(&path)).unwrap();
        assert_eq!(outcome, Outcome::AlreadyTagged);
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_second_call_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ch1.cbz");
        write_cbz(&path, &[("001.jpg", b"page")]);
        let archive = ArchiveRef::new(&path);

        assert_eq!(ComicInfoMutator.ensure_descriptor(&archive).unwrap(), Outcome::Tagged);
        let after_first = fs::read(&path).unwrap();

        assert_eq!(ComicInfoMutator.ensure_descriptor(&archive).unwrap(), Outcome::AlreadyTagged);
        assert_eq!(fs::read(&path).unwrap(), after_first);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let dir = TempDir::new().unwrap();
        let archive = ArchiveRef::new(dir.path().join("missing.cbz"));
        let err = ComicInfoMutator.ensure_descriptor(&archive).unwrap_err();
        assert!(matches!(err, ArchiveError::Open { .. }));
    }

    #[test]
    fn test_corrupt_file_is_zip_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.cbz");
        fs::write(&path, b"not a zip file").unwrap();
        let err = ComicInfoMutator.ensure_descriptor(&ArchiveRef::new(&path)).unwrap_err();
        assert!(matches!(err, ArchiveError::Zip { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"not a zip file");
    }

    #[test]
    fn test_failed_staging_leaves_original_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ch1.cbz");
        write_cbz(&path, &[("001.jpg", b"page")]);
        let before = fs::read(&path).unwrap();
        let archive = ArchiveRef::new(&path);

        let file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        let xml = ComicInfo::for_archive(&archive).to_xml();
        let err = ComicInfoMutator
            .append_descriptor(&archive, file, &xml, &dir.path().join("gone"))
            .unwrap_err();

        assert!(matches!(err, ArchiveError::Write { path: ref failed, .. } if failed == archive.path()));
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        assert_eq!(read_entry(&path, COMIC_INFO_ENTRY), None);
    }
}
