//! Recursive video discovery.
//!
//! # Overview
//!
//! [`VideoWalker`] enumerates every file under a root folder whose extension
//! is one of the recognized video container extensions. The whole list is
//! collected up front so the scanner knows the total before probing starts
//! and can report determinate progress.
//!
//! Entries are visited in file-name order within each directory, so two
//! walks of an unchanged tree yield the same sequence.
//!
//! # Example
//!
//! ```no_run
//! use randvid::scanner::{VideoWalker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = VideoWalker::new(Path::new("/home/user/Videos"), WalkerConfig::default());
//! let videos = walker.collect().unwrap_or_default();
//! println!("Found {} videos", videos.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::ScanError;

/// Extensions recognized as video containers (compared case-insensitively).
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov"];

/// Configuration for directory walking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkerConfig {
    /// Lowercase extensions without the leading dot.
    pub extensions: Vec<String>,

    /// Follow symbolic links during traversal.
    /// walkdir detects symlink loops and reports them as errors.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|e| (*e).to_string())
                .collect(),
            follow_symlinks: false,
            skip_hidden: false,
        }
    }
}

impl WalkerConfig {
    /// Replace the recognized extensions.
    ///
    /// Leading dots are stripped and case is folded, so `".MP4"` and `"mp4"`
    /// are equivalent.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }
}

/// Whether `path` has one of the given extensions (case-insensitive).
#[must_use]
pub fn is_video_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|ext| extensions.iter().any(|e| *e == ext))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Directory walker that yields video files only.
#[derive(Debug)]
pub struct VideoWalker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl VideoWalker {
    /// Create a new walker for the given root.
    #[must_use]
    pub fn new(root: &Path, config: WalkerConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set, the walk stops early and returns what it has
    /// collected so far.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the tree and collect every video file, in walk order.
    ///
    /// Unreadable entries below the root are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] or [`ScanError::NotADirectory`] if the
    /// root itself is unusable.
    pub fn collect(&self) -> Result<Vec<PathBuf>, ScanError> {
        let metadata = std::fs::metadata(&self.root).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScanError::NotFound(self.root.clone()),
            _ => ScanError::Io {
                path: self.root.clone(),
                source: e,
            },
        })?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        let skip_hidden = self.config.skip_hidden;
        let walk = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| !(skip_hidden && is_hidden(e)));

        let mut videos = Vec::new();
        for entry in walk {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    log::warn!("Cannot access {}: {}", path.display(), e);
                    continue;
                }
            };

            if !is_regular_file(&entry) {
                continue;
            }
            if is_video_file(entry.path(), &self.config.extensions) {
                videos.push(entry.into_path());
            } else {
                log::trace!("Not a video: {}", entry.path().display());
            }
        }

        log::debug!(
            "Walker found {} videos under {}",
            videos.len(),
            self.root.display()
        );
        Ok(videos)
    }
}

/// A file, or a symlink to one. Links to directories are only descended into
/// when the walker follows links, so they are never files here.
fn is_regular_file(entry: &DirEntry) -> bool {
    if !entry.file_type().is_symlink() {
        return entry.file_type().is_file();
    }
    match std::fs::metadata(entry.path()) {
        Ok(target) => target.is_file(),
        Err(e) => {
            log::debug!("Skipping broken link {}: {}", entry.path().display(), e);
            false
        }
    }
}
