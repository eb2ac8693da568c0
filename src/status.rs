//! Foreground "scanning" indicator for continuous mode.
//!
//! Purely cosmetic: it runs on its own task, owns its spinner, and is told to
//! stop through a channel once the pass is done.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const FRAME_INTERVAL: Duration = Duration::from_millis(500);

/// Running indicator; call [`StatusIndicator::stop`] to clear it
pub struct StatusIndicator {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl StatusIndicator {
    /// Start animating `message` on stderr. Does nothing visible when stderr
    /// is not a terminal.
    pub fn start(message: &str) -> Self {
        Self::spawn(message.to_string(), std::io::stderr().is_terminal())
    }

    fn spawn(message: String, animate: bool) -> Self {
        let (stop, mut stopped) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            if !animate {
                let _ = stopped.await;
                return;
            }

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{msg}{spinner}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["", ".", "..", "...", ""]),
            );
            spinner.set_message(message);

            let mut ticker = tokio::time::interval(FRAME_INTERVAL);
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => spinner.tick(),
                }
            }
            spinner.finish_and_clear();
        });

        Self { stop, task }
    }

    /// Stop the animation and wait for the line to be cleared
    pub async fn stop(self) {
        let _ = self.stop.send(());
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_without_terminal() {
        let indicator = StatusIndicator::spawn("Scanning".to_string(), false);
        tokio::time::timeout(Duration::from_secs(5), indicator.stop())
            .await
            .expect("indicator did not stop");
    }

    #[tokio::test]
    async fn test_stop_while_animating() {
        let indicator = StatusIndicator::spawn("Scanning".to_string(), true);
        tokio::time::sleep(Duration::from_millis(20)).await;
        tokio::time::timeout(Duration::from_secs(5), indicator.stop())
            .await
            .expect("indicator did not stop");
    }
}
