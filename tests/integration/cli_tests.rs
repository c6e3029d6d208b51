use super::common::{env_lock, touch};
use clap::Parser;
use randvid::cache::{CacheEntry, MediaInfoCache, Orientation};
use randvid::cli::Cli;
use randvid::error::ExitCode;
use randvid::scanner::path_utils::path_key;
use std::path::Path;
use tempfile::tempdir;

/// Run the CLI with a throwaway config file and a missing ffprobe, so every
/// probe fails deterministically.
fn run(tmp: &Path, args: &[&str]) -> ExitCode {
    let config = tmp.join("none.toml");
    let config = config.to_str().unwrap();
    let mut argv = vec!["randvid", "-q", "--config", config];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    randvid::run_app(cli).unwrap()
}

#[test]
fn test_scan_with_unprobeable_files_succeeds_unfiltered() {
    let _lock = env_lock();
    let tmp = tempdir().unwrap();
    let videos = tmp.path().join("videos");
    touch(&videos, "a.mp4");
    touch(&videos, "b.mkv");
    let cache = tmp.path().join("cache.json");

    let code = run(
        tmp.path(),
        &[
            "scan",
            videos.to_str().unwrap(),
            "--cache",
            cache.to_str().unwrap(),
            "--ffprobe",
            "/nonexistent/ffprobe",
        ],
    );

    assert_eq!(code, ExitCode::Success);
    let cache = MediaInfoCache::load(&cache);
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.stats().unprobed, 2);
}

#[test]
fn test_scan_length_limit_excludes_unprobeable_files() {
    let _lock = env_lock();
    let tmp = tempdir().unwrap();
    let videos = tmp.path().join("videos");
    touch(&videos, "a.mp4");
    let cache = tmp.path().join("cache.json");

    let code = run(
        tmp.path(),
        &[
            "scan",
            videos.to_str().unwrap(),
            "--cache",
            cache.to_str().unwrap(),
            "--ffprobe",
            "/nonexistent/ffprobe",
            "--max-length",
            "1:30",
            "--output",
            "json",
        ],
    );

    assert_eq!(code, ExitCode::NoVideos);
}

#[test]
fn test_scan_uses_fresh_cache_entries_without_probing() {
    let _lock = env_lock();
    let tmp = tempdir().unwrap();
    let videos = tmp.path().join("videos");
    let clip = touch(&videos, "clip.mp4");
    let cache_path = tmp.path().join("cache.json");

    let mtime = randvid::cache::mtime_seconds(clip.metadata().unwrap().modified().unwrap());
    let mut cache = MediaInfoCache::new(&cache_path);
    cache.upsert(path_key(&clip), CacheEntry::new(12.0, Orientation::Horizontal, mtime));
    cache.persist().unwrap();

    let code = run(
        tmp.path(),
        &[
            "scan",
            videos.to_str().unwrap(),
            "--cache",
            cache_path.to_str().unwrap(),
            "--ffprobe",
            "/nonexistent/ffprobe",
            "--orientation",
            "horizontal",
            "--max-length",
            "20",
            "--output",
            "m3u",
        ],
    );

    assert_eq!(code, ExitCode::Success);
    let entry = *MediaInfoCache::load(&cache_path).lookup_path(&clip).unwrap();
    assert_eq!(entry.duration_seconds, 12.0);
}

#[test]
fn test_reload_subcommand_reprobes() {
    let _lock = env_lock();
    let tmp = tempdir().unwrap();
    let videos = tmp.path().join("videos");
    let clip = touch(&videos, "clip.mp4");
    let cache_path = tmp.path().join("cache.json");

    let mtime = randvid::cache::mtime_seconds(clip.metadata().unwrap().modified().unwrap());
    let mut cache = MediaInfoCache::new(&cache_path);
    cache.upsert(path_key(&clip), CacheEntry::new(12.0, Orientation::Horizontal, mtime));
    cache.persist().unwrap();

    let code = run(
        tmp.path(),
        &[
            "reload",
            videos.to_str().unwrap(),
            "--cache",
            cache_path.to_str().unwrap(),
            "--ffprobe",
            "/nonexistent/ffprobe",
            "--orientation",
            "horizontal",
        ],
    );

    // The fresh probe fails, so the clip loses its orientation.
    assert_eq!(code, ExitCode::NoVideos);
    let entry = *MediaInfoCache::load(&cache_path).lookup_path(&clip).unwrap();
    assert!(entry.is_unprobed());
    assert_eq!(entry.orientation, Orientation::Unknown);
}

#[test]
fn test_cache_subcommands() {
    let _lock = env_lock();
    let tmp = tempdir().unwrap();
    let cache_path = tmp.path().join("cache.json");
    let mut cache = MediaInfoCache::new(&cache_path);
    cache.upsert("/v/one/a.mp4", CacheEntry::new(1.0, Orientation::Vertical, 1.0));
    cache.upsert("/v/one/b.mp4", CacheEntry::new(2.0, Orientation::Vertical, 1.0));
    cache.upsert("/v/two/c.mp4", CacheEntry::new(3.0, Orientation::Horizontal, 1.0));
    cache.persist().unwrap();
    let cache_arg = cache_path.to_str().unwrap();

    assert_eq!(
        run(tmp.path(), &["cache", "--cache", cache_arg, "stats"]),
        ExitCode::Success
    );
    assert_eq!(MediaInfoCache::load(&cache_path).len(), 3);

    assert_eq!(
        run(tmp.path(), &["cache", "--cache", cache_arg, "invalidate", "/v/one"]),
        ExitCode::Success
    );
    let remaining = MediaInfoCache::load(&cache_path);
    assert_eq!(remaining.len(), 1);
    assert!(remaining.lookup("/v/two/c.mp4").is_some());

    assert_eq!(
        run(tmp.path(), &["cache", "--cache", cache_arg, "clear"]),
        ExitCode::Success
    );
    assert!(MediaInfoCache::load(&cache_path).is_empty());
}

#[test]
fn test_scan_without_folder_or_home_fails() {
    let _lock = env_lock();
    let tmp = tempdir().unwrap();
    let config = tmp.path().join("none.toml");
    let cli = Cli::try_parse_from([
        "randvid",
        "-q",
        "--config",
        config.to_str().unwrap(),
        "scan",
    ])
    .unwrap();

    let err = randvid::run_app(cli).unwrap_err();
    assert!(err.to_string().contains("No folder given"));
}

#[test]
fn test_seed_requires_shuffle() {
    assert!(Cli::try_parse_from(["randvid", "scan", "/v", "--seed", "3"]).is_err());
    assert!(Cli::try_parse_from(["randvid", "scan", "/v", "--shuffle", "--seed", "3"]).is_ok());
}
