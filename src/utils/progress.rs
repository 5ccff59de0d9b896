use crate::domain::model::RunSummary;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[cfg(feature = "cli")]
use indicatif::{ProgressBar, ProgressStyle};

/// Rows-completed counter for one run, safe to poll from another task.
#[derive(Default)]
pub struct RunProgress {
    total: AtomicUsize,
    completed: AtomicUsize,
    summary: Mutex<Option<RunSummary>>,
    #[cfg(feature = "cli")]
    bar: Option<ProgressBar>,
}

impl RunProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same counter, mirrored on a terminal progress bar.
    #[cfg(feature = "cli")]
    pub fn with_progress_bar() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} rows ({per_sec})",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }

        Self {
            bar: Some(bar),
            ..Self::default()
        }
    }

    pub(crate) fn start(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        #[cfg(feature = "cli")]
        if let Some(bar) = &self.bar {
            bar.set_length(total as u64);
            bar.set_position(0);
        }
    }

    pub(crate) fn advance(&self, rows: usize) {
        self.completed.fetch_add(rows, Ordering::SeqCst);
        #[cfg(feature = "cli")]
        if let Some(bar) = &self.bar {
            bar.inc(rows as u64);
        }
    }

    pub(crate) fn finish(&self, summary: RunSummary) {
        if let Ok(mut slot) = self.summary.lock() {
            *slot = Some(summary);
        }
        #[cfg(feature = "cli")]
        if let Some(bar) = &self.bar {
            bar.finish();
        }
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Timing of the last finished run, if any.
    pub fn summary(&self) -> Option<RunSummary> {
        self.summary.lock().ok().and_then(|slot| *slot)
    }
}
