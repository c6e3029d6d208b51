//! JSON output for scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated_at": "2025-01-01T12:00:00Z",
//!   "folder": "/home/user/Videos",
//!   "filters": { "orientation": "vertical", "max_length_secs": 30 },
//!   "videos": [
//!     { "path": "/home/user/Videos/a.mp4", "duration_seconds": 10.0,
//!       "duration": "0:10", "orientation": "Vertical" }
//!   ],
//!   "summary": {
//!     "total_files": 3, "matched_files": 1, "cache_hits": 0,
//!     "probed_files": 3, "probe_failures": 0, "scan_duration_ms": 41,
//!     "interrupted": false, "exit_code": 0, "exit_code_name": "RV000"
//!   }
//! }
//! ```

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{MediaInfoCache, Orientation};
use crate::error::ExitCode;
use crate::output::format_duration;
use crate::scanner::{OrientationFilter, ScanRequest, ScanSummary};

/// One matched video.
#[derive(Debug, Clone, Serialize)]
pub struct JsonVideo {
    /// Normalized path
    pub path: String,
    /// Duration in seconds; `null` if the file could not be probed
    pub duration_seconds: Option<f64>,
    /// Formatted duration
    pub duration: String,
    /// Orientation; `null` if missing from the cache
    pub orientation: Option<Orientation>,
}

/// Filters the scan was run with.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFilters {
    /// Orientation filter
    pub orientation: OrientationFilter,
    /// Maximum length in seconds (0 = unlimited)
    pub max_length_secs: u64,
}

/// Scan counters.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Video files found under the folder
    pub total_files: usize,
    /// Videos that passed the filters
    pub matched_files: usize,
    /// Cached entries reused
    pub cache_hits: usize,
    /// Files probed
    pub probed_files: usize,
    /// Files with at least one failed probe
    pub probe_failures: usize,
    /// Scan wall-clock time in milliseconds
    pub scan_duration_ms: u64,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "RV000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Build from a scan summary and the exit code of the run.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            matched_files: summary.videos.len(),
            cache_hits: summary.cache_hits,
            probed_files: summary.probed_files,
            probe_failures: summary.probe_failures,
            scan_duration_ms: summary.duration.as_millis() as u64,
            interrupted: summary.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// When the document was produced
    pub generated_at: DateTime<Utc>,
    /// Scanned folder
    pub folder: String,
    /// Filters applied
    pub filters: JsonFilters,
    /// Matched videos, in the order given
    pub videos: Vec<JsonVideo>,
    /// Counters
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document.
    ///
    /// `videos` is usually `summary.videos`, possibly shuffled. Metadata is
    /// looked up in `cache`.
    #[must_use]
    pub fn new(
        request: &ScanRequest,
        videos: &[impl AsRef<Path>],
        summary: &ScanSummary,
        cache: &MediaInfoCache,
        exit_code: ExitCode,
    ) -> Self {
        let videos = videos
            .iter()
            .map(|p| {
                let path = p.as_ref();
                let entry = cache.lookup_path(path);
                let duration_seconds = entry
                    .filter(|e| !e.is_unprobed())
                    .map(|e| e.duration_seconds);
                JsonVideo {
                    path: path.to_string_lossy().into_owned(),
                    duration: duration_seconds.map_or_else(|| "unknown".to_string(), format_duration),
                    duration_seconds,
                    orientation: entry.map(|e| e.orientation),
                }
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            folder: request.root.to_string_lossy().into_owned(),
            filters: JsonFilters {
                orientation: request.orientation,
                max_length_secs: request.max_length_secs,
            },
            videos,
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the document followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
