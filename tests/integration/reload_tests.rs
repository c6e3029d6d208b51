use super::common::{abc_folder, file_names, scanner, touch};
use filetime::{set_file_mtime, FileTime};
use randvid::cache::{CacheEntry, MediaInfoCache, Orientation};
use randvid::scanner::path_utils::path_key;
use randvid::scanner::ScanRequest;
use tempfile::tempdir;

#[test]
fn test_reload_replaces_stale_entries_with_fresh_probes() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let cache_path = cache_dir.path().join("cache.json");
    let prober = abc_folder(dir.path());

    // Stale garbage for every file: wrong values and wrong mtimes.
    let mut cache = MediaInfoCache::new(&cache_path);
    for name in ["a.mp4", "b.mp4", "c.mp4"] {
        cache.upsert(
            path_key(&dir.path().join(name)),
            CacheEntry::new(1.0, Orientation::Unknown, 42.0),
        );
    }
    cache.persist().unwrap();

    let mut cache = MediaInfoCache::load(&cache_path);
    let summary = scanner(&prober).reload(&ScanRequest::new(dir.path()), &mut cache);

    assert_eq!(summary.probed_files, 3);
    assert_eq!(prober.duration_calls(), 3);

    let persisted = MediaInfoCache::load(&cache_path);
    let b = persisted.lookup_path(&dir.path().join("b.mp4")).unwrap();
    assert_eq!(b.duration_seconds, 40.0);
    assert_eq!(b.orientation, Orientation::Horizontal);
    assert!(!b.is_fresh(42.0));
}

#[test]
fn test_force_reload_over_fresh_but_wrong_entries() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let prober = abc_folder(dir.path());
    let a = dir.path().join("a.mp4");
    set_file_mtime(&a, FileTime::from_unix_time(500, 0)).unwrap();

    // The entry is fresh by mtime, so only a forced scan can correct it.
    let mut cache = MediaInfoCache::new(cache_dir.path().join("cache.json"));
    cache.upsert(path_key(&a), CacheEntry::new(99.0, Orientation::Horizontal, 500.0));

    scanner(&prober).scan(&ScanRequest::new(dir.path()), &mut cache);
    assert_eq!(cache.lookup_path(&a).unwrap().duration_seconds, 99.0);

    scanner(&prober).scan(
        &ScanRequest::new(dir.path()).with_force_reload(true),
        &mut cache,
    );
    let entry = cache.lookup_path(&a).unwrap();
    assert_eq!(entry.duration_seconds, 10.0);
    assert_eq!(entry.orientation, Orientation::Vertical);
}

#[test]
fn test_reload_only_touches_its_folder() {
    let root = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let videos = root.path().join("videos");
    let sibling = root.path().join("videos2");
    let prober = abc_folder(&videos);
    prober.set("other.mp4", 5.0, (100, 100));
    touch(&sibling, "other.mp4");

    let mut cache = MediaInfoCache::new(cache_dir.path().join("cache.json"));
    scanner(&prober).scan(&ScanRequest::new(&sibling), &mut cache);
    scanner(&prober).scan(&ScanRequest::new(&videos), &mut cache);
    assert_eq!(cache.len(), 4);
    prober.reset_counts();

    let summary = scanner(&prober).reload(&ScanRequest::new(&videos), &mut cache);

    assert_eq!(file_names(&summary.videos), vec!["a.mp4", "b.mp4", "c.mp4"]);
    assert_eq!(prober.duration_calls(), 3);
    assert!(!prober.probed_names().contains(&"other.mp4".to_string()));
    assert!(cache.lookup_path(&sibling.join("other.mp4")).is_some());
}

#[test]
fn test_remove_prefix_then_plain_scan_reprobes() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let prober = abc_folder(dir.path());
    let mut cache = MediaInfoCache::new(cache_dir.path().join("cache.json"));

    scanner(&prober).scan(&ScanRequest::new(dir.path()), &mut cache);
    let removed = cache.remove_prefix(dir.path());
    assert_eq!(removed, 3);
    assert!(cache.is_empty());

    prober.reset_counts();
    scanner(&prober).scan(&ScanRequest::new(dir.path()), &mut cache);
    assert_eq!(prober.duration_calls(), 3);
}

#[test]
fn test_remove_prefix_accepts_relative_spelling() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let prober = abc_folder(dir.path());
    let mut cache = MediaInfoCache::new(cache_dir.path().join("cache.json"));
    scanner(&prober).scan(&ScanRequest::new(dir.path()), &mut cache);

    let dotted = dir.path().join(".").join("sub").join("..");
    assert_eq!(cache.remove_prefix(&dotted), 3);
}
