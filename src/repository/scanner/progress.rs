//! Progress reporting abstraction
//!
//! Decouples the scan loop from console concerns (indicatif).

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::util::milestone;

/// A handle to an active progress bar
pub trait ProgressHandle: Send + Sync {
    fn inc(&self, n: u64);
    fn finish(&self);
}

/// Factory for creating progress handles
pub trait ProgressReporter: Send + Sync {
    fn start(&self, label: &str, total: u64) -> Box<dyn ProgressHandle>;
}

/// Indicatif-based progress reporter for interactive terminals
pub struct IndicatifProgress;

impl ProgressReporter for IndicatifProgress {
    fn start(&self, label: &str, total: u64) -> Box<dyn ProgressHandle> {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{} [{{bar:40.cyan/blue}}] {{percent}}% ({{pos}}/{{len}})",
                    label
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Box::new(IndicatifHandle(pb))
    }
}

struct IndicatifHandle(ProgressBar);

impl ProgressHandle for IndicatifHandle {
    fn inc(&self, n: u64) {
        self.0.inc(n);
    }

    fn finish(&self) {
        self.0.finish();
    }
}

/// No-op progress reporter for tests and continuous mode
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _label: &str, _total: u64) -> Box<dyn ProgressHandle> {
        Box::new(NoopHandle)
    }
}

struct NoopHandle;

impl ProgressHandle for NoopHandle {
    fn inc(&self, _n: u64) {}
    fn finish(&self) {}
}

/// Line-based reporter for non-interactive output (containers, pipes).
///
/// Prints one line each time progress crosses a 10% milestone.
pub struct MilestoneProgress;

impl ProgressReporter for MilestoneProgress {
    fn start(&self, label: &str, total: u64) -> Box<dyn ProgressHandle> {
        Box::new(MilestoneHandle {
            label: label.to_string(),
            total,
            position: AtomicU64::new(0),
            // Nothing printed yet
            last_milestone: AtomicU64::new(u64::MAX),
        })
    }
}

struct MilestoneHandle {
    label: String,
    total: u64,
    position: AtomicU64,
    last_milestone: AtomicU64,
}

impl MilestoneHandle {
    /// Returns the milestone to print, if `position` crossed a new one
    fn advance(&self, n: u64) -> Option<(u64, u64)> {
        let position = self.position.fetch_add(n, Ordering::Relaxed) + n;
        let pct = milestone(position, self.total);
        let previous = self.last_milestone.swap(pct, Ordering::Relaxed);
        (previous != pct).then_some((pct, position))
    }
}

impl ProgressHandle for MilestoneHandle {
    fn inc(&self, n: u64) {
        if let Some((pct, position)) = self.advance(n) {
            eprintln!("{}: {}% ({}/{})", self.label, pct, position.min(self.total), self.total);
        }
    }

    fn finish(&self) {}
}

/// Picks the indicatif bar on a terminal and milestone lines otherwise
pub struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn start(&self, label: &str, total: u64) -> Box<dyn ProgressHandle> {
        if std::io::stderr().is_terminal() {
            IndicatifProgress.start(label, total)
        } else {
            MilestoneProgress.start(label, total)
        }
    }
}
