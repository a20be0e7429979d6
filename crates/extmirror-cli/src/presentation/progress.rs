//! Progress bar driven by pipeline events.

use std::io::{self, IsTerminal};
use std::time::Duration;

use extmirror_core::{DownloadEvent, DownloadEventEmitterPort};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const MAX_LABEL: usize = 40;

/// [`DownloadEventEmitterPort`] that renders a batch as one progress bar.
///
/// Warnings (missing extensions, unmatched filters, failed tasks) are
/// printed above the bar so they stay visible after it is cleared.
pub struct ProgressEmitter {
    bar: ProgressBar,
}

impl ProgressEmitter {
    /// Draw to stderr when it is a terminal, otherwise stay silent.
    pub fn new() -> Self {
        let target = if io::stderr().is_terminal() {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        Self::with_draw_target(target)
    }

    /// An emitter that never draws.
    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(None, target);
        bar.set_style(spinner_style());
        bar.set_message("Querying marketplace");
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// Clear the bar once the batch is over.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn warn(&self, line: String) {
        if self.bar.is_hidden() {
            eprintln!("{line}");
        } else {
            self.bar.println(line);
        }
    }

    #[cfg(test)]
    fn position(&self) -> (u64, Option<u64>) {
        (self.bar.position(), self.bar.length())
    }
}

impl Default for ProgressEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadEventEmitterPort for ProgressEmitter {
    fn emit(&self, event: DownloadEvent) {
        match event {
            DownloadEvent::BatchStarted { tasks } => {
                self.bar.set_style(bar_style());
                self.bar.set_length(tasks as u64);
                self.bar.set_position(0);
                self.bar.set_message("Downloading");
            }
            DownloadEvent::ExtensionMissing { ext_id } => {
                self.warn(format!("⚠️  Extension not found: {ext_id}"));
            }
            DownloadEvent::NoMatchingVersion { ext_id } => {
                self.warn(format!("⚠️  No version of {ext_id} matches the filters"));
            }
            DownloadEvent::TaskStarted { ext_id, .. } => {
                self.bar.set_message(format_label(&ext_id));
            }
            DownloadEvent::TaskCompleted { .. } => self.bar.inc(1),
            DownloadEvent::TaskFailed {
                ext_id,
                version,
                platform,
                error,
            } => {
                self.warn(format!("✗ {ext_id} {version} ({platform}): {error}"));
                self.bar.inc(1);
            }
            DownloadEvent::BatchFinished { .. } => self.bar.set_message("Done"),
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{bar:28.cyan/blue} {pos:>4}/{len:4} {msg}")
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn format_label(raw: &str) -> String {
    if raw.chars().count() <= MAX_LABEL {
        return raw.to_string();
    }
    let mut buf: String = raw.chars().take(MAX_LABEL - 1).collect();
    buf.push('…');
    buf
}
