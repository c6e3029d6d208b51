//! Scanner module for folder traversal, probing and filtering.
//!
//! This module provides functionality for:
//! - Recursive discovery of video files by extension
//! - Cache-aware probing of duration and orientation
//! - Orientation and maximum-length filtering
//! - Stable cache-key normalization
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and video file discovery
//! - [`probe`]: External duration/dimension probing collaborators
//! - [`folder`]: The [`FolderScanner`] that ties walking, cache and filters together
//! - [`path_utils`]: Cache-key normalization
//!
//! # Example
//!
//! ```no_run
//! use randvid::cache::MediaInfoCache;
//! use randvid::scanner::{FolderScanner, OrientationFilter, ScanRequest, ScannerConfig};
//!
//! let mut cache = MediaInfoCache::load("/tmp/media_info_cache.json");
//! let scanner = FolderScanner::with_ffprobe("ffprobe", ScannerConfig::default());
//!
//! let request = ScanRequest::new("/home/user/Videos")
//!     .with_orientation(OrientationFilter::Vertical)
//!     .with_max_length(30);
//! let summary = scanner.scan(&request, &mut cache);
//! println!("{} of {} videos matched", summary.videos.len(), summary.total_files);
//! ```

pub mod folder;
pub mod path_utils;
pub mod probe;
pub mod walker;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheEntry, Orientation};

// Re-export main types
pub use folder::{FolderScanner, ScannerConfig};
pub use probe::{DimensionProbe, DurationProbe, FfprobeProber, ProbeError};
pub use walker::{is_video_file, VideoWalker, WalkerConfig, DEFAULT_VIDEO_EXTENSIONS};

/// Which orientations a scan keeps.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OrientationFilter {
    /// Keep vertical videos only
    Vertical,
    /// Keep horizontal videos only
    Horizontal,
    /// Keep everything, including videos of unknown orientation
    #[default]
    #[serde(alias = "all")]
    #[value(alias = "all")]
    Both,
}

impl OrientationFilter {
    /// Whether a video with the given orientation passes this filter.
    ///
    /// [`Orientation::Unknown`] only passes [`OrientationFilter::Both`].
    #[must_use]
    pub fn matches(self, orientation: Orientation) -> bool {
        match self {
            Self::Both => true,
            Self::Vertical => orientation == Orientation::Vertical,
            Self::Horizontal => orientation == Orientation::Horizontal,
        }
    }
}

impl fmt::Display for OrientationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertical => write!(f, "vertical"),
            Self::Horizontal => write!(f, "horizontal"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// Parameters of one scan. Immutable once the scan starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    /// Folder to scan recursively
    pub root: PathBuf,
    /// Orientation filter
    pub orientation: OrientationFilter,
    /// Maximum duration in seconds; 0 means unlimited
    pub max_length_secs: u64,
    /// Re-probe every file regardless of cache freshness
    pub force_reload: bool,
}

impl ScanRequest {
    /// Create an unfiltered, cache-respecting request for `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            orientation: OrientationFilter::Both,
            max_length_secs: 0,
            force_reload: false,
        }
    }

    /// Set the orientation filter.
    #[must_use]
    pub fn with_orientation(mut self, orientation: OrientationFilter) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the maximum length in seconds (0 = unlimited).
    #[must_use]
    pub fn with_max_length(mut self, secs: u64) -> Self {
        self.max_length_secs = secs;
        self
    }

    /// Force re-probing of every file.
    #[must_use]
    pub fn with_force_reload(mut self, force: bool) -> Self {
        self.force_reload = force;
        self
    }

    /// Whether a probed video passes both the orientation and length filters.
    #[must_use]
    pub fn accepts(&self, entry: &CacheEntry) -> bool {
        if !self.orientation.matches(entry.orientation) {
            return false;
        }
        self.max_length_secs == 0 || entry.duration_seconds <= self.max_length_secs as f64
    }
}

/// Outcome of a scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSummary {
    /// Normalized paths of the videos that passed both filters, in walk order
    pub videos: Vec<PathBuf>,
    /// Number of video files found under the root
    pub total_files: usize,
    /// Number of files processed before completion or cancellation
    pub scanned_files: usize,
    /// Files whose cached entry was reused
    pub cache_hits: usize,
    /// Files that were (re-)probed
    pub probed_files: usize,
    /// Probed files for which at least one probe failed
    pub probe_failures: usize,
    /// Whether the scan was stopped before every file was processed
    pub interrupted: bool,
    /// Wall-clock duration of the scan
    pub duration: Duration,
}

/// Errors that can occur while enumerating a folder.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a path.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
