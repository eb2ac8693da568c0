mod archive;
mod comic_info;
mod summary;

pub use archive::{ArchiveKey, ArchiveRef};
pub use comic_info::{COMIC_INFO_ENTRY, ComicInfo, synthesize};
pub use summary::{Outcome, ScanSummary};
