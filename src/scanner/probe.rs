//! Media probing via external tools.
//!
//! The scanner never decodes video itself. It asks two collaborators:
//!
//! - a [`DurationProbe`] for the container duration in seconds, and
//! - a [`DimensionProbe`] for the first video stream's frame size.
//!
//! [`FfprobeProber`] implements both by running `ffprobe` as a subprocess.
//! Tests substitute in-memory fakes.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::cache::{CacheEntry, Orientation, DURATION_SENTINEL};

/// Name of the ffprobe executable, which is platform-dependent.
#[cfg(windows)]
pub const FFPROBE_EXECUTABLE_NAME: &str = "ffprobe.exe";
#[cfg(not(windows))]
pub const FFPROBE_EXECUTABLE_NAME: &str = "ffprobe";

/// Errors produced while probing a single file.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The probing tool could not be started.
    #[error("failed to run {binary}: {source}")]
    Spawn {
        /// Executable that was invoked
        binary: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The probing tool exited unsuccessfully.
    #[error("probe of {path} exited with status {status:?}")]
    Failed {
        /// File being probed
        path: PathBuf,
        /// Exit code, if the process was not killed by a signal
        status: Option<i32>,
    },

    /// The tool's output could not be interpreted.
    #[error("unexpected probe output for {path}: {output:?}")]
    Parse {
        /// File being probed
        path: PathBuf,
        /// Trimmed stdout of the tool
        output: String,
    },
}

/// Reads a media file's duration.
pub trait DurationProbe: Send + Sync {
    /// Duration of `path` in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] if the duration cannot be determined.
    fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError>;
}

/// Reads a video file's frame dimensions.
pub trait DimensionProbe: Send + Sync {
    /// `(width, height)` of the first video stream of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] if the file has no readable video stream.
    fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32), ProbeError>;
}

/// Probe both duration and orientation, degrading failures to sentinels.
///
/// A duration failure yields [`DURATION_SENTINEL`], a dimension failure
/// yields [`Orientation::Unknown`]. The second value reports whether any
/// probe failed.
pub fn probe_entry(
    duration_probe: &dyn DurationProbe,
    dimension_probe: &dyn DimensionProbe,
    path: &Path,
    mtime: f64,
) -> (CacheEntry, bool) {
    let mut failed = false;

    let duration = match duration_probe.probe_duration(path) {
        Ok(d) => d,
        Err(e) => {
            log::debug!("Duration probe failed: {}", e);
            failed = true;
            DURATION_SENTINEL
        }
    };

    let orientation = match dimension_probe.probe_dimensions(path) {
        Ok((w, h)) => Orientation::from_dimensions(w, h),
        Err(e) => {
            log::debug!("Dimension probe failed: {}", e);
            failed = true;
            Orientation::Unknown
        }
    };

    (CacheEntry::new(duration, orientation, mtime), failed)
}

/// Prober backed by the `ffprobe` command-line tool.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    binary: PathBuf,
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new(FFPROBE_EXECUTABLE_NAME)
    }
}

impl FfprobeProber {
    /// Create a prober that runs the given executable.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The executable this prober runs.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn run(&self, path: &Path, args: &[&str]) -> Result<String, ProbeError> {
        let output = Command::new(&self.binary)
            .args(["-v", "error"])
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|source| ProbeError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                path: path.to_path_buf(),
                status: output.status.code(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl DurationProbe for FfprobeProber {
    fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError> {
        let out = self.run(
            path,
            &[
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ],
        )?;
        parse_duration(&out).ok_or_else(|| ProbeError::Parse {
            path: path.to_path_buf(),
            output: out,
        })
    }
}

impl DimensionProbe for FfprobeProber {
    fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32), ProbeError> {
        let out = self.run(
            path,
            &[
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "csv=s=x:p=0",
            ],
        )?;
        parse_dimensions(&out).ok_or_else(|| ProbeError::Parse {
            path: path.to_path_buf(),
            output: out,
        })
    }
}

/// Parse ffprobe's `format=duration` output (e.g. `"12.345000"`).
///
/// `N/A`, negative and non-finite values are rejected.
#[must_use]
pub fn parse_duration(output: &str) -> Option<f64> {
    let value: f64 = output.lines().next()?.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Parse ffprobe's `WIDTHxHEIGHT` csv output (e.g. `"1920x1080"`).
///
/// Some ffprobe builds append a trailing separator; empty fields are
/// skipped. Zero dimensions are rejected.
#[must_use]
pub fn parse_dimensions(output: &str) -> Option<(u32, u32)> {
    let line = output.lines().next()?;
    let mut parts = line.split('x').map(str::trim).filter(|s| !s.is_empty());
    let width: u32 = parts.next()?.parse().ok()?;
    let height: u32 = parts.next()?.parse().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}
