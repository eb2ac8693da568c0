mod archive;
mod database;
mod scanner;

pub use archive::{ArchiveError, ArchiveMutator, ComicInfoMutator};
pub use database::Database;
pub use scanner::{
    ArchiveScanner, Candidates, ConsoleProgress, DEFAULT_BATCH_SIZE, IndicatifProgress,
    MilestoneProgress, NoopProgress, ProgressHandle, ProgressReporter, SeenStore,
    default_workers, find_archives, process_archive,
};

// Re-export the schema version for callers who need it
pub const SCHEMA_VERSION: &str = "1";
