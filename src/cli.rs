//! Command-line interface definitions for randvid.
//!
//! # Example
//!
//! ```bash
//! # Vertical clips of at most 30 seconds, shuffled
//! randvid scan ~/Videos --orientation vertical --max-length 30 --shuffle
//!
//! # Write an M3U playlist of everything under ten minutes
//! randvid scan ~/Videos --max-length 10:00 --output m3u > short.m3u
//!
//! # Forget cached results for a folder and re-probe it
//! randvid reload ~/Videos
//!
//! # Inspect the cache
//! randvid cache stats
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::scanner::OrientationFilter;

/// Random video playlist builder.
///
/// randvid scans a folder for videos, filters them by orientation and
/// maximum length, and prints them (optionally shuffled). Probe results are
/// cached per file and reused until the file changes.
#[derive(Debug, Parser)]
#[command(name = "randvid")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (defaults to the per-user config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a folder and list the videos that pass the filters
    Scan(ScanArgs),
    /// Drop cached results for a folder, then re-probe every video in it
    Reload(ScanArgs),
    /// Inspect or maintain the media info cache
    Cache(CacheArgs),
}

/// Arguments shared by `scan` and `reload`.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Folder to scan recursively (defaults to `home_folder` from the config)
    #[arg(value_name = "FOLDER")]
    pub path: Option<PathBuf>,

    /// Keep only videos of this orientation
    #[arg(long, value_enum)]
    pub orientation: Option<OrientationFilter>,

    /// Maximum video length
    ///
    /// Seconds (`90`), `M:SS` (`1:30`) or `H:MM:SS`. `0`, `none` or
    /// `unlimited` disable the limit.
    #[arg(long, value_name = "LENGTH", value_parser = parse_max_length)]
    pub max_length: Option<u64>,

    /// Re-probe every file, ignoring cached results
    #[arg(long)]
    pub force_reload: bool,

    /// Shuffle the result
    #[arg(long)]
    pub shuffle: bool,

    /// Seed for a reproducible shuffle
    #[arg(long, value_name = "N", requires = "shuffle")]
    pub seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Path to the media info cache
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// ffprobe executable used for probing
    #[arg(long, value_name = "PATH")]
    pub ffprobe: Option<PathBuf>,

    /// Number of files probed in parallel (1 = sequential)
    #[arg(long, value_name = "N")]
    pub probe_threads: Option<usize>,

    /// Recognized video extensions (can be specified multiple times)
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Follow symbolic links during the walk
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,
}

/// Arguments for the cache subcommand.
#[derive(Debug, Args)]
pub struct CacheArgs {
    /// Path to the media info cache
    #[arg(long, global = true, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Cache operation
    #[command(subcommand)]
    pub action: CacheCommand,
}

/// Cache maintenance operations.
#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Show entry counts
    Stats,
    /// Remove every entry
    Clear,
    /// Remove the entries for files inside a folder
    Invalidate {
        /// Folder whose entries are dropped
        #[arg(value_name = "FOLDER")]
        folder: PathBuf,
    },
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One path per line
    #[default]
    Text,
    /// JSON document with paths, durations and counts
    Json,
    /// Extended M3U playlist
    M3u,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::M3u => write!(f, "m3u"),
        }
    }
}

/// Parse a maximum-length setting into seconds (0 = unlimited).
///
/// Accepts plain seconds, `M:SS` and `H:MM:SS`. The words `none`,
/// `no limit`, `nolimit` and `unlimited` (any case) mean no limit.
///
/// # Examples
///
/// ```
/// use randvid::cli::parse_max_length;
///
/// assert_eq!(parse_max_length("45").unwrap(), 45);
/// assert_eq!(parse_max_length("1:30").unwrap(), 90);
/// assert_eq!(parse_max_length("1:00:00").unwrap(), 3600);
/// assert_eq!(parse_max_length("No Limit").unwrap(), 0);
/// ```
///
/// # Errors
///
/// Returns an error for empty input, non-numeric fields, or minutes/seconds
/// fields of 60 or more.
pub fn parse_max_length(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Length cannot be empty".to_string());
    }

    let lower = s.to_lowercase();
    if matches!(lower.as_str(), "none" | "no limit" | "nolimit" | "unlimited") {
        return Ok(0);
    }

    let fields: Vec<&str> = s.split(':').collect();
    let numbers = fields
        .iter()
        .map(|f| {
            let f = f.trim();
            if f.is_empty() || !f.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("Invalid length: '{s}'"));
            }
            f.parse::<u64>()
                .map_err(|_| format!("Length out of range: '{s}'"))
        })
        .collect::<Result<Vec<u64>, String>>()?;

    let sixty = |v: u64, what: &str| {
        if v < 60 {
            Ok(v)
        } else {
            Err(format!("{what} must be below 60 in '{s}'"))
        }
    };

    let total = match numbers.as_slice() {
        [secs] => Some(*secs),
        [mins, secs] => {
            let secs = sixty(*secs, "Seconds")?;
            mins.checked_mul(60).and_then(|m| m.checked_add(secs))
        }
        [hours, mins, secs] => {
            let mins = sixty(*mins, "Minutes")?;
            let secs = sixty(*secs, "Seconds")?;
            hours
                .checked_mul(3600)
                .and_then(|h| h.checked_add(mins * 60 + secs))
        }
        _ => return Err(format!("Invalid length: '{s}' (use S, M:SS or H:MM:SS)")),
    };
    total.ok_or_else(|| format!("Length out of range: '{s}'"))
}
