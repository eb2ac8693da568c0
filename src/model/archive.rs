use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::util::{series_name, title_name};

/// Seen-set key of an archive.
///
/// UTF-8 paths are stored as text. Anything else keeps its raw OS bytes so
/// that two distinct paths can never share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKey<'a> {
    Text(&'a str),
    Raw(&'a [u8]),
}

impl<'a> ArchiveKey<'a> {
    /// Key bytes; text and raw keys never overlap since raw keys are not UTF-8
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            ArchiveKey::Text(text) => text.as_bytes(),
            ArchiveKey::Raw(bytes) => bytes,
        }
    }
}

/// A `.cbz` archive identified by its lexically normalized path.
///
/// The normalized path is the identity key for the seen-set: two references
/// are equal iff their normalized paths are equal. No filesystem access is
/// performed, so a moved or renamed archive is a different reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchiveRef(PathBuf);

impl ArchiveRef {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(normalize(path.as_ref()))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Key stored in the seen-set
    pub fn as_key(&self) -> ArchiveKey<'_> {
        let os = self.0.as_os_str();
        match os.to_str() {
            Some(text) => ArchiveKey::Text(text),
            None => ArchiveKey::Raw(os.as_encoded_bytes()),
        }
    }

    /// Base name of the immediate parent directory
    pub fn series_name(&self) -> String {
        series_name(&self.0)
    }

    /// File name without its extension
    pub fn title_name(&self) -> String {
        title_name(&self.0)
    }
}

impl fmt::Display for ArchiveRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for ArchiveRef {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

/// Drop `.` components and redundant separators. `..` is kept as-is since
/// resolving it lexically is wrong in the presence of symlinks.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
