//! Logging setup on top of the `log` facade and `env_logger`.
//!
//! Level selection, highest priority first:
//!
//! 1. `RUST_LOG`, if set
//! 2. `--quiet`: errors only
//! 3. `-v`: debug, `-vv`: trace
//! 4. otherwise info
//!
//! Debug builds prefix each line with a timestamp (and the module path when
//! verbose); release builds print level and message only.

use std::env;
use std::io::Write;

use env_logger::{Builder, WriteStyle};
use log::LevelFilter;

/// Initialize logging from the CLI verbosity flags.
///
/// Calling it a second time in the same process is harmless: the first
/// logger stays installed and the call is ignored.
///
/// # Arguments
///
/// * `verbose` - `-v` count (0 = info, 1 = debug, 2+ = trace)
/// * `quiet` - Only report errors (ignored when `RUST_LOG` is set)
/// * `no_color` - Never emit ANSI colour codes
pub fn init_logging(verbose: u8, quiet: bool, no_color: bool) {
    let use_env = env::var("RUST_LOG").is_ok();
    let mut builder = Builder::new();

    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }
    if no_color {
        builder.write_style(WriteStyle::Never);
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return;
    }
    if use_env {
        log::debug!("Logging configured from RUST_LOG");
    } else {
        log::debug!(
            "Logging initialized at level: {:?}",
            determine_level(verbose, quiet)
        );
    }
}

fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let style = buf.default_level_style(level);
            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {style}{:<5}{style:#} [{}] {}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {style}{:<5}{style:#} {}",
                    timestamp,
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
        });
    }
}
