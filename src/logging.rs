//! Tracing setup and the mutation log file.
//!
//! The log file is append-only and deleted once it grows past
//! [`MAX_LOG_SIZE`]. Size is only checked at the start of a pass, never
//! mid-write.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use time::macros::format_description;
use tracing::{Level, Subscriber};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::util::format_size;

/// Log file size that triggers deletion at the start of a pass
pub const MAX_LOG_SIZE: u64 = 50 * 1024 * 1024;

const DEFAULT_LOG_FILTER: &str = "mangafix=info";

/// Target of the one-line-per-mutation events
pub const MUTATION_TARGET: &str = "mangafix::mutation";

struct LogFileInner {
    path: PathBuf,
    file: File,
}

/// Shared handle to the append-only log file.
///
/// Cloning is cheap; every clone writes to the same file. Usable directly as
/// a tracing writer.
#[derive(Clone)]
pub struct LogFile {
    inner: Arc<Mutex<LogFileInner>>,
}

impl LogFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = open_append(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(LogFileInner { path: path.to_path_buf(), file })),
        })
    }

    /// Delete and reopen the file if it is larger than `limit`.
    /// Returns the size of the deleted file.
    pub fn rotate_if_oversized(&self, limit: u64) -> Result<Option<u64>> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("log writer lock poisoned"))?;

        let size = inner.file.metadata()?.len();
        if size <= limit {
            return Ok(None);
        }

        let _ = inner.file.flush();
        match fs::remove_file(&inner.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).context("Failed to delete oversized log file"),
        }
        inner.file = open_append(&inner.path)
            .with_context(|| format!("Failed to reopen log file: {}", inner.path.display()))?;
        Ok(Some(size))
    }

    pub fn path(&self) -> PathBuf {
        match self.inner.lock() {
            Ok(inner) => inner.path.clone(),
            Err(poisoned) => poisoned.into_inner().path.clone(),
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        guard.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        guard.file.flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogFile {
    type Writer = LogFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Rotate the log file if needed and tell the operator about it
pub fn rotate_log(log: &LogFile) -> Result<()> {
    if let Some(size) = log.rotate_if_oversized(MAX_LOG_SIZE)? {
        eprintln!(
            "Log file exceeds {} ({}). Deleted {}",
            format_size(MAX_LOG_SIZE),
            format_size(size),
            log.path().display()
        );
    }
    Ok(())
}

/// Initialize tracing with the log file and console output.
///
/// See [`subscriber`] for the layers; `RUST_LOG` is read here.
pub fn init_logging(log: LogFile, settings: LogSettings) -> Result<()> {
    subscriber(log, settings.with_env())
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(())
}

/// Console and filter options for [`subscriber`]
#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    /// Mirror the file log on stderr instead of warnings only
    pub verbose: bool,
    /// Print each mutation line on stdout (continuous mode)
    pub echo_mutations: bool,
    /// Extra filter directives, `RUST_LOG` syntax
    pub directives: Option<String>,
}

impl LogSettings {
    pub fn new(verbose: bool, echo_mutations: bool) -> Self {
        Self { verbose, echo_mutations, directives: None }
    }

    fn with_env(mut self) -> Self {
        self.directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        self
    }
}

/// Filter for the log file: `mangafix=info` plus any extra directives.
/// Mutation lines are enabled last so no extra directive can drop them.
pub fn file_filter(directives: Option<&str>) -> EnvFilter {
    let mut filter = DEFAULT_LOG_FILTER.to_string();
    if let Some(extra) = directives.map(str::trim).filter(|d| !d.is_empty()) {
        filter.push(',');
        filter.push_str(extra);
    }
    // A later directive for the same target replaces an earlier one
    filter.push_str(&format!(",{}=info", MUTATION_TARGET));
    EnvFilter::builder().parse_lossy(filter)
}

/// Build the subscriber: file layer (no ANSI), stderr layer, and the
/// optional stdout echo of mutation lines.
pub fn subscriber(log: LogFile, settings: LogSettings) -> impl Subscriber + Send + Sync + 'static {
    let timer = UtcTime::new(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"));
    let directives = settings.directives.as_deref();

    let console_filter = if settings.verbose {
        file_filter(directives)
    } else {
        EnvFilter::new("warn")
    };

    let echo = settings.echo_mutations.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_timer(timer.clone())
            .with_target(false)
            .with_filter(Targets::new().with_target(MUTATION_TARGET, Level::INFO))
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log)
                .with_timer(timer.clone())
                .with_target(false)
                .with_ansi(false)
                .with_filter(file_filter(directives)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_timer(timer)
                .with_target(false)
                .with_filter(console_filter),
        )
        .with(echo)
}
