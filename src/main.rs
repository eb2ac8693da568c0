mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

use cli::Cli;
use mangafix::config::Config;
use mangafix::logging::{LogFile, LogSettings, init_logging, rotate_log};
use mangafix::model::ScanSummary;
use mangafix::repository::{ArchiveScanner, ComicInfoMutator, Database, NoopProgress, default_workers};
use mangafix::status::StatusIndicator;
use mangafix::util::format_interval;

const BANNER: &str = "Manga Metadata Fixer";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Fail fast before touching anything on disk
    let config = Config::new(&cli.manga_dir, &cli.data_dir)?;

    let log = LogFile::open(&config.log_path())?;
    rotate_log(&log)?;
    // Continuous mode also echoes each mutation on stdout for container logs
    init_logging(log.clone(), LogSettings::new(cli.verbose, !cli.once))?;

    clear_console();
    eprintln!("{}", BANNER);
    eprintln!("Manga directory: {}", config.manga_dir.display());
    eprintln!("Log file location: {}", config.log_path().display());

    let removed = Database::recover(&config.data_dir)?;
    if removed > 0 {
        tracing::warn!(removed, "Removed stale database lock files from a previous run");
    }

    let workers = cli.workers.unwrap_or_else(default_workers);
    // One extra connection for the coordinator's pre-filter and flushes
    let db = Database::open(&config.db_path(), workers as u32 + 1).await?;
    db.init_schema().await?;

    let scanner = ArchiveScanner::new(&config.manga_dir)
        .batch_size(cli.batch_size)
        .workers(workers);
    let mutator = Arc::new(ComicInfoMutator::new());

    if cli.once {
        let result = run_once(&scanner, &db, mutator, cli.json).await;
        db.close().await;
        result
    } else {
        let interval = Duration::from_secs(cli.interval);
        run_forever(scanner, &db, mutator, &log, interval).await
    }
}

/// Single pass: process everything once and report
async fn run_once(
    scanner: &ArchiveScanner,
    db: &Database,
    mutator: Arc<ComicInfoMutator>,
    json: bool,
) -> Result<()> {
    let summary = scanner.scan(db, mutator).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary).context("Failed to encode summary")?);
    } else {
        print_summary(&summary);
        println!("First scan complete!");
    }
    Ok(())
}

/// Continuous mode: rescan forever with a fixed delay between passes.
/// A pass always runs to completion before the delay starts.
async fn run_forever(
    scanner: ArchiveScanner,
    db: &Database,
    mutator: Arc<ComicInfoMutator>,
    log: &LogFile,
    interval: Duration,
) -> Result<()> {
    let scanner = scanner.verbose(false).with_progress(Arc::new(NoopProgress));

    loop {
        rotate_log(log)?;
        eprintln!("{} - Scanning...", BANNER);

        let indicator = StatusIndicator::start("Scanning New Manga");
        let result = scanner.scan(db, Arc::clone(&mutator)).await;
        indicator.stop().await;
        let summary = result?;

        if summary.mutated > 0 || summary.errors > 0 {
            print_summary(&summary);
        }
        eprintln!(
            "Scan complete. Next run in {}. Log: {}",
            format_interval(interval),
            log.path().display()
        );

        tokio::time::sleep(interval).await;
    }
}

fn print_summary(summary: &ScanSummary) {
    println!(
        "Archives: {} found, {} already recorded, {} checked, {} tagged, {} errors",
        summary.candidates, summary.skipped, summary.processed, summary.mutated, summary.errors
    );
}

/// Clear the screen on an interactive terminal; no-op when piped
fn clear_console() {
    let mut stdout = io::stdout();
    if stdout.is_terminal() {
        let _ = execute!(stdout, Clear(ClearType::All), MoveTo(0, 0));
    }
}
