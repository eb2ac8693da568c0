use std::path::Path;

/// Archive extension, compared case-insensitively
pub const ARCHIVE_EXTENSION: &str = "cbz";

/// Returns true if the file name ends in `.cbz` (any case).
///
/// A bare `.cbz` (hidden file with no stem) is not an archive.
pub fn is_archive_name(file_name: &str) -> bool {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION),
        _ => false,
    }
}

/// Base name of the path's parent directory, or an empty string at the root
pub fn series_name(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File name with its last extension removed
pub fn title_name(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
