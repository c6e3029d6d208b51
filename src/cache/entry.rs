//! Cache entry definitions.
//!
//! The on-disk store is a JSON object keyed by normalized file path, so the
//! path itself is not repeated inside the entry:
//!
//! ```json
//! {
//!   "/videos/clip.mp4": { "duration": 12.5, "orientation": "Vertical", "mtime": 1718000000.25 }
//! }
//! ```

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Duration recorded for files whose length could not be probed.
///
/// Large enough that any length-limited scan filters the file out, while an
/// unlimited scan still keeps it.
pub const DURATION_SENTINEL: f64 = 999_999.0;

/// Frame orientation of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Height is greater than or equal to width.
    Vertical,
    /// Width is strictly greater than height.
    Horizontal,
    /// Frame dimensions could not be read. Only matches unfiltered scans.
    #[serde(alias = "All", alias = "Both")]
    Unknown,
}

impl Orientation {
    /// Classify a frame by its dimensions.
    ///
    /// Square frames count as vertical. Zero-sized frames are treated as
    /// unreadable.
    #[must_use]
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            Self::Unknown
        } else if width > height {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertical => write!(f, "vertical"),
            Self::Horizontal => write!(f, "horizontal"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Probe results for a single video file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Probed duration in seconds, or [`DURATION_SENTINEL`] if probing failed.
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
    /// Frame orientation.
    pub orientation: Orientation,
    /// Modification time of the file when it was probed, in seconds since
    /// the Unix epoch.
    #[serde(rename = "mtime")]
    pub modified_time: f64,
}

impl CacheEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(duration_seconds: f64, orientation: Orientation, modified_time: f64) -> Self {
        Self {
            duration_seconds,
            orientation,
            modified_time,
        }
    }

    /// Whether this entry still describes a file whose current
    /// modification time is `mtime`.
    ///
    /// Timestamps are compared exactly: both sides come from the same
    /// conversion of the filesystem's mtime, and JSON round-trips `f64`
    /// without loss.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_fresh(&self, mtime: f64) -> bool {
        self.modified_time == mtime
    }

    /// Whether duration probing failed for this file.
    #[must_use]
    pub fn is_unprobed(&self) -> bool {
        self.duration_seconds >= DURATION_SENTINEL
    }
}

/// Convert a [`SystemTime`] into fractional seconds since the Unix epoch.
///
/// Times before the epoch come out negative so they still compare stably.
#[must_use]
pub fn mtime_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}
