//! Progress reporting for folder scans.
//!
//! This module provides the [`ScanProgress`] callback trait the scanner
//! reports through, and [`Progress`], an indicatif-backed implementation
//! that draws a determinate bar on stderr.
//!
//! # Accessible Mode
//!
//! When accessible mode is enabled the bar uses ASCII characters only and
//! no colours, which reads better with screen readers.

use std::path::Path;
use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

use crate::scanner::ScanSummary;

/// Progress callback for folder scans.
///
/// `on_file_scanned` is called once per file, whether the file was kept or
/// filtered out, with `scanned` strictly increasing by one from 1 to
/// `total`. No call is made for an empty folder.
pub trait ScanProgress: Send + Sync {
    /// Called once the folder has been enumerated.
    ///
    /// # Arguments
    ///
    /// * `folder` - Root of the scan
    /// * `total` - Number of video files that will be processed
    fn on_scan_start(&self, folder: &Path, total: usize);

    /// Called after each file has been processed.
    ///
    /// # Arguments
    ///
    /// * `scanned` - Number of files processed so far (1-based)
    /// * `total` - Total number of files
    /// * `path` - File that was just processed
    fn on_file_scanned(&self, scanned: usize, total: usize, path: &Path);

    /// Called when the scan finishes or is interrupted.
    fn on_scan_end(&self, _summary: &ScanSummary) {}
}

/// Terminal progress bar for scans.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
    accessible: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use randvid::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self::with_accessible(quiet, false)
    }

    /// Create a new progress reporter with accessible mode.
    #[must_use]
    pub fn with_accessible(quiet: bool, accessible: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
            accessible,
        }
    }

    /// Check if accessible mode is enabled.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    fn style(&self) -> ProgressStyle {
        if self.accessible {
            ProgressStyle::with_template(
                "Loading {prefix}: [{bar:40}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
        } else {
            ProgressStyle::with_template(
                "Loading {prefix}: [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
        }
    }
}

impl ScanProgress for Progress {
    fn on_scan_start(&self, folder: &Path, total: usize) {
        if self.quiet {
            return;
        }
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| folder.display().to_string());

        let pb = ProgressBar::new(total as u64);
        pb.set_style(self.style());
        pb.set_prefix(name);
        if let Ok(mut bar) = self.bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_file_scanned(&self, scanned: usize, _total: usize, path: &Path) {
        if self.quiet {
            return;
        }
        if let Ok(bar) = self.bar.lock() {
            if let Some(pb) = bar.as_ref() {
                pb.set_position(scanned as u64);
                pb.set_message(truncate_path(&path.to_string_lossy(), 30));
            }
        }
    }

    fn on_scan_end(&self, summary: &ScanSummary) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.bar.lock().ok().and_then(|mut bar| bar.take()) {
            if summary.interrupted {
                pb.abandon_with_message("interrupted");
            } else {
                pb.finish_and_clear();
            }
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len >= max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
