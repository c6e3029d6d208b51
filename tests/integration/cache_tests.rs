use super::common::{abc_folder, file_names, scanner};
use randvid::cache::{CacheEntry, MediaInfoCache, Orientation};
use randvid::scanner::path_utils::path_key;
use randvid::scanner::{OrientationFilter, ScanRequest};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_scan_persists_cache_file() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let cache_path = cache_dir.path().join("data").join("media_info_cache.json");
    let prober = abc_folder(dir.path());

    let mut cache = MediaInfoCache::load(&cache_path);
    scanner(&prober).scan(&ScanRequest::new(dir.path()), &mut cache);

    let content = fs::read_to_string(&cache_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    let map = value.as_object().unwrap();
    assert_eq!(map.len(), 3);

    let key = path_key(&dir.path().join("b.mp4"));
    assert_eq!(map[&key]["duration"], 40.0);
    assert_eq!(map[&key]["orientation"], "Horizontal");
    assert!(map[&key]["mtime"].is_f64());
}

#[test]
fn test_corrupted_cache_forces_full_probe() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let cache_path = cache_dir.path().join("cache.json");
    fs::write(&cache_path, "{\"truncated\": {\"duration\": 1").unwrap();
    let prober = abc_folder(dir.path());

    let mut cache = MediaInfoCache::load(&cache_path);
    assert!(cache.is_empty());
    let summary = scanner(&prober).scan(&ScanRequest::new(dir.path()), &mut cache);

    assert_eq!(summary.probed_files, 3);
    assert_eq!(MediaInfoCache::load(&cache_path).len(), 3);
}

#[test]
fn test_persist_failure_does_not_affect_result() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    // A directory where the cache file should be makes every write fail.
    let cache_path = cache_dir.path().join("occupied");
    fs::create_dir(&cache_path).unwrap();
    let prober = abc_folder(dir.path());

    let mut cache = MediaInfoCache::load(&cache_path);
    let summary = scanner(&prober).scan(
        &ScanRequest::new(dir.path()).with_orientation(OrientationFilter::Vertical),
        &mut cache,
    );

    assert_eq!(file_names(&summary.videos), vec!["a.mp4", "c.mp4"]);
    assert_eq!(cache.len(), 3);
    assert!(cache.persist().is_err());
}

#[test]
fn test_atomic_persist_leaves_no_temp_files() {
    let cache_dir = tempdir().unwrap();
    let cache_path = cache_dir.path().join("cache.json");
    let mut cache = MediaInfoCache::new(&cache_path);
    cache.upsert("/v/a.mp4", CacheEntry::new(1.0, Orientation::Vertical, 5.0));

    cache.persist().unwrap();
    cache.upsert("/v/b.mp4", CacheEntry::new(2.0, Orientation::Horizontal, 5.0));
    cache.persist().unwrap();

    let names: Vec<String> = fs::read_dir(cache_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["cache.json"]);
    assert_eq!(MediaInfoCache::load(&cache_path).len(), 2);
}

#[test]
fn test_legacy_orientation_names_are_read() {
    let cache_dir = tempdir().unwrap();
    let cache_path = cache_dir.path().join("cache.json");
    fs::write(
        &cache_path,
        r#"{
            "/v/a.mp4": {"duration": 3.5, "orientation": "Vertical", "mtime": 10.0},
            "/v/b.mp4": {"duration": 999999, "orientation": "All", "mtime": 11.5}
        }"#,
    )
    .unwrap();

    let cache = MediaInfoCache::load(&cache_path);
    assert_eq!(cache.len(), 2);
    let b = cache.lookup("/v/b.mp4").unwrap();
    assert_eq!(b.orientation, Orientation::Unknown);
    assert!(b.is_unprobed());
    assert!(b.is_fresh(11.5));
}

#[test]
fn test_entries_outside_scanned_folder_survive() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let cache_path = cache_dir.path().join("cache.json");
    let prober = abc_folder(dir.path());

    let mut cache = MediaInfoCache::new(&cache_path);
    cache.upsert(
        "/elsewhere/keep.mp4",
        CacheEntry::new(7.0, Orientation::Horizontal, 1.0),
    );
    scanner(&prober).scan(&ScanRequest::new(dir.path()), &mut cache);

    let reloaded = MediaInfoCache::load(&cache_path);
    assert_eq!(reloaded.len(), 4);
    assert!(reloaded.lookup("/elsewhere/keep.mp4").is_some());
}

#[test]
fn test_stats_after_scan() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let prober = abc_folder(dir.path());
    super::common::touch(dir.path(), "broken.avi");

    let mut cache = MediaInfoCache::new(cache_dir.path().join("cache.json"));
    scanner(&prober).scan(&ScanRequest::new(dir.path()), &mut cache);

    let stats = cache.stats();
    assert_eq!(stats.entries, 4);
    assert_eq!(stats.vertical, 2);
    assert_eq!(stats.horizontal, 1);
    assert_eq!(stats.unknown, 1);
    assert_eq!(stats.unprobed, 1);
}
