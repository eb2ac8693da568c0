use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mangafix", about = "Add missing ComicInfo.xml to .cbz archives")]
pub struct Cli {
    /// Library root scanned for .cbz archives
    #[arg(long, env = "MANGA_DIR", default_value = "/manga")]
    pub manga_dir: PathBuf,

    /// State directory holding the seen-set database and the log file
    #[arg(long, env = "DATA_DIR", default_value = "/data")]
    pub data_dir: PathBuf,

    /// Run a single pass and exit instead of rescanning forever
    #[arg(long)]
    pub once: bool,

    /// Seconds between passes in continuous mode
    #[arg(long, default_value_t = 300)]
    pub interval: u64,

    /// Archives recorded per seen-set transaction
    #[arg(long, default_value_t = mangafix::repository::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Concurrent archive workers (defaults to the number of CPUs)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Print the single-pass summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Mirror all log output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}
