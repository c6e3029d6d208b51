//! RandVid - random video playlists with a persistent scan cache.
//!
//! The core is the folder scanner: it walks a directory tree, probes each
//! video's duration and orientation with `ffprobe`, caches the results keyed
//! by normalized path, and re-probes a file only when its modification time
//! changes. Around it sit a background worker, a shuffling playlist, and a
//! small CLI.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod playlist;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod worker;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cli::{CacheArgs, CacheCommand, Cli, Commands, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::{format_max_length, JsonOutput, M3uOutput};
use crate::playlist::Playlist;
use crate::progress::Progress;
use crate::scanner::{FolderScanner, ScanRequest};
use crate::worker::ScanWorker;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error for unusable configuration, a cache that cannot be
/// located or (for cache maintenance) written, or a failed worker.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet, cli.no_color);
    let config = Config::load(cli.config.as_deref());
    log::debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Scan(args) => run_scan(args, config, cli.quiet, cli.no_color, false),
        Commands::Reload(args) => run_scan(args, config, cli.quiet, cli.no_color, true),
        Commands::Cache(args) => run_cache(args, config),
    }
}

fn run_scan(
    args: ScanArgs,
    mut config: Config,
    quiet: bool,
    no_color: bool,
    reload: bool,
) -> Result<ExitCode> {
    config.apply_scan_args(&args);
    config.validate()?;

    let folder = args
        .path
        .clone()
        .or_else(|| config.home_folder.clone())
        .context("No folder given and no home_folder configured")?;

    let handler = signal::install_handler().context("Failed to install signal handler")?;
    let cache = config.open_cache()?;

    let mut scanner_config = config
        .scanner_config()
        .with_shutdown_flag(handler.get_flag());
    if !quiet && args.output == OutputFormat::Text {
        scanner_config = scanner_config
            .with_progress_callback(Arc::new(Progress::with_accessible(false, no_color)));
    }
    let prober = Arc::new(config.prober());
    let scanner = FolderScanner::new(prober.clone(), prober, scanner_config);

    let request = ScanRequest::new(&folder)
        .with_orientation(config.orientation)
        .with_max_length(config.max_length)
        .with_force_reload(args.force_reload);

    let handle = if reload {
        ScanWorker::spawn_reload(scanner, cache, request.clone())
    } else {
        ScanWorker::spawn(scanner, cache, request.clone())
    }
    .context("Failed to start scan")?;
    let (summary, cache) = handle.wait().context("Scan failed")?;

    let exit_code = if summary.interrupted {
        ExitCode::Interrupted
    } else if summary.videos.is_empty() {
        ExitCode::NoVideos
    } else {
        ExitCode::Success
    };

    let playlist = match (args.shuffle, args.seed) {
        (true, Some(seed)) => {
            Playlist::shuffled(summary.videos.clone(), &mut StdRng::seed_from_u64(seed))
        }
        (true, None) => Playlist::shuffled_random(summary.videos.clone()),
        (false, _) => Playlist::new(summary.videos.clone()),
    };

    if playlist.is_empty() {
        log::warn!("No videos to play in {}", folder.display());
    } else {
        log::info!(
            "{} videos ({}, max length {})",
            playlist.len(),
            request.orientation,
            format_max_length(request.max_length_secs)
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => {
            for video in playlist.videos() {
                writeln!(out, "{}", video.display())?;
            }
        }
        OutputFormat::Json => {
            JsonOutput::new(&request, playlist.videos(), &summary, &cache, exit_code)
                .write_to(&mut out, true)
                .context("Failed to write JSON output")?;
        }
        OutputFormat::M3u => {
            M3uOutput::new(playlist.videos(), &cache)
                .write_to(&mut out)
                .context("Failed to write M3U output")?;
        }
    }
    out.flush()?;

    Ok(exit_code)
}

fn run_cache(args: CacheArgs, mut config: Config) -> Result<ExitCode> {
    if let Some(path) = args.cache {
        config.cache_path = Some(path);
    }
    let mut cache = config.open_cache()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.action {
        CacheCommand::Stats => {
            let stats = cache.stats();
            writeln!(out, "Cache:      {}", cache.path().display())?;
            writeln!(out, "Entries:    {}", stats.entries)?;
            writeln!(out, "Vertical:   {}", stats.vertical)?;
            writeln!(out, "Horizontal: {}", stats.horizontal)?;
            writeln!(out, "Unknown:    {}", stats.unknown)?;
            writeln!(out, "Unprobed:   {}", stats.unprobed)?;
        }
        CacheCommand::Clear => {
            let removed = cache.len();
            cache.clear();
            cache.persist().context("Failed to save media info cache")?;
            writeln!(out, "Removed {removed} cache entries")?;
        }
        CacheCommand::Invalidate { folder } => {
            let removed = cache.remove_prefix(&folder);
            cache.persist().context("Failed to save media info cache")?;
            writeln!(
                out,
                "Removed {removed} cache entries under {}",
                folder.display()
            )?;
        }
    }

    Ok(ExitCode::Success)
}
