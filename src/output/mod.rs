//! Renderings of a scan result.
//!
//! - [`json`]: machine-readable document with per-video metadata
//! - [`m3u`]: extended M3U playlist for external players
//!
//! Plain text output (one path per line) needs no formatter and is written
//! directly by the binary.

pub mod json;
pub mod m3u;

pub use json::JsonOutput;
pub use m3u::M3uOutput;

use crate::cache::DURATION_SENTINEL;

/// Format a duration in seconds as `M:SS`, or `H:MM:SS` from one hour up.
///
/// Fractions are truncated. Unprobed durations render as `unknown`.
///
/// ```
/// use randvid::output::format_duration;
///
/// assert_eq!(format_duration(9.9), "0:09");
/// assert_eq!(format_duration(754.0), "12:34");
/// assert_eq!(format_duration(3725.0), "1:02:05");
/// ```
#[must_use]
pub fn format_duration(secs: f64) -> String {
    if !secs.is_finite() || secs >= DURATION_SENTINEL {
        return "unknown".to_string();
    }
    format_hms(secs.max(0.0) as u64)
}

fn format_hms(total: u64) -> String {
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Human-readable maximum length, `no limit` for 0.
#[must_use]
pub fn format_max_length(secs: u64) -> String {
    if secs == 0 {
        "no limit".to_string()
    } else {
        format_hms(secs)
    }
}
