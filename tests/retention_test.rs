use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use lazymaint::retention::{self, trim, trim_except};

const KB: u64 = 1024;

/// Write `size` bytes at `path` and backdate its mtime by `age_secs`
fn write_aged(path: &Path, size: u64, age_secs: u64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![b'x'; size as usize]).unwrap();
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
}

// ─── Trimming ────────────────────────────────────────────────────────────────

#[test]
fn test_within_budget_is_untouched() {
    let dir = TempDir::new().unwrap();
    write_aged(&dir.path().join("a.bin"), 20 * KB, 300);
    write_aged(&dir.path().join("b.bin"), 15 * KB, 200);
    write_aged(&dir.path().join("c.bin"), 5 * KB, 100);

    let report = trim(dir.path(), 50 * KB);

    assert_eq!(report.size_before, 40 * KB);
    assert_eq!(report.size_after, 40 * KB);
    assert_eq!(report.files_removed, 0);
    assert!(dir.path().join("a.bin").exists());
    assert!(dir.path().join("b.bin").exists());
    assert!(dir.path().join("c.bin").exists());
}

#[test]
fn test_oldest_files_removed_first() {
    let dir = TempDir::new().unwrap();
    write_aged(&dir.path().join("a.bin"), 20 * KB, 300);
    write_aged(&dir.path().join("b.bin"), 15 * KB, 200);
    write_aged(&dir.path().join("c.bin"), 5 * KB, 100);

    let report = trim(dir.path(), 10 * KB);

    assert!(!dir.path().join("a.bin").exists());
    assert!(!dir.path().join("b.bin").exists());
    assert!(dir.path().join("c.bin").exists());
    assert_eq!(report.files_removed, 2);
    assert_eq!(report.bytes_freed, 35 * KB);
    assert_eq!(report.size_after, 5 * KB);
    assert!(report.failures.is_empty());
}

#[test]
fn test_equal_sized_files_trimmed_to_newest() {
    let dir = TempDir::new().unwrap();
    write_aged(&dir.path().join("a"), 40 * KB, 300);
    write_aged(&dir.path().join("b"), 40 * KB, 200);
    write_aged(&dir.path().join("c"), 40 * KB, 100);

    let report = trim(dir.path(), 50 * KB);

    assert!(!dir.path().join("a").exists());
    assert!(!dir.path().join("b").exists());
    assert!(dir.path().join("c").exists());
    assert_eq!(report.size_after, 40 * KB);
}

#[test]
fn test_stops_as_soon_as_budget_reached() {
    let dir = TempDir::new().unwrap();
    write_aged(&dir.path().join("old.bin"), 30 * KB, 500);
    write_aged(&dir.path().join("mid.bin"), 10 * KB, 400);
    write_aged(&dir.path().join("new.bin"), 10 * KB, 10);

    let report = trim(dir.path(), 25 * KB);

    assert_eq!(report.files_removed, 1);
    assert!(!dir.path().join("old.bin").exists());
    assert!(dir.path().join("mid.bin").exists());
    assert!(dir.path().join("new.bin").exists());
    assert_eq!(retention::measure(dir.path()), 20 * KB);
}

#[test]
fn test_trim_is_idempotent() {
    let dir = TempDir::new().unwrap();
    for (i, age) in [600, 500, 400, 300, 200].iter().enumerate() {
        write_aged(&dir.path().join(format!("f{}.bin", i)), 8 * KB, *age);
    }

    let first = trim(dir.path(), 20 * KB);
    assert_eq!(first.files_removed, 3);

    let second = trim(dir.path(), 20 * KB);
    assert_eq!(second.files_removed, 0);
    assert_eq!(second.size_before, first.size_after);
}

#[test]
fn test_live_log_is_never_deleted() {
    let dir = TempDir::new().unwrap();
    write_aged(&dir.path().join("kodi.log"), 40 * KB, 10_000);
    write_aged(&dir.path().join("cache.dat"), 10 * KB, 100);

    let report = trim(dir.path(), 0);

    assert!(dir.path().join("kodi.log").exists());
    assert!(!dir.path().join("cache.dat").exists());
    assert_eq!(report.files_removed, 1);
    // Still over budget because only the log remains
    assert_eq!(report.size_after, 40 * KB);
}

#[test]
fn test_custom_reserved_names() {
    let dir = TempDir::new().unwrap();
    write_aged(&dir.path().join("keep.me"), 10 * KB, 900);
    write_aged(&dir.path().join("drop.me"), 10 * KB, 100);

    trim_except(dir.path(), 0, &["keep.me"]);

    assert!(dir.path().join("keep.me").exists());
    assert!(!dir.path().join("drop.me").exists());
}

#[test]
fn test_nested_files_and_empty_dirs_pruned() {
    let dir = TempDir::new().unwrap();
    write_aged(&dir.path().join("0/abc.jpg"), 12 * KB, 900);
    write_aged(&dir.path().join("1/def.jpg"), 12 * KB, 800);
    write_aged(&dir.path().join("2/ghi.jpg"), 4 * KB, 10);

    let report = trim(dir.path(), 5 * KB);

    assert_eq!(report.files_removed, 2);
    assert!(!dir.path().join("0").exists());
    assert!(!dir.path().join("1").exists());
    assert!(dir.path().join("2/ghi.jpg").exists());
    assert!(report.dirs_pruned >= 2);
    assert!(dir.path().exists(), "root itself is kept");
}

#[test]
fn test_missing_root_is_noop() {
    let dir = TempDir::new().unwrap();
    let report = trim(&dir.path().join("absent"), 0);
    assert_eq!(report.size_before, 0);
    assert_eq!(report.files_removed, 0);
    assert!(report.failures.is_empty());
}

// ─── Clearing ────────────────────────────────────────────────────────────────

#[test]
fn test_clear_empties_but_keeps_root() {
    let dir = TempDir::new().unwrap();
    let packages = dir.path().join("packages");
    write_aged(&packages.join("plugin.video.x-1.0.zip"), 3 * KB, 10);
    write_aged(&packages.join("nested/deeper/file"), 2 * KB, 10);

    let report = retention::clear(&packages).unwrap();

    assert!(packages.is_dir());
    assert_eq!(fs::read_dir(&packages).unwrap().count(), 0);
    assert_eq!(report.items_removed, 2);
    assert_eq!(report.bytes_freed, 5 * KB);
}

#[test]
fn test_clear_except_keeps_named_children() {
    let dir = TempDir::new().unwrap();
    let addons = dir.path().join("addons");
    write_aged(&addons.join("script.lazymaintenance/addon.xml"), KB, 10);
    write_aged(&addons.join("plugin.video.other/addon.xml"), KB, 10);

    let report = retention::clear_except(&addons, &["script.lazymaintenance"]).unwrap();

    assert_eq!(report.items_removed, 1);
    assert!(addons.join("script.lazymaintenance/addon.xml").exists());
    assert!(!addons.join("plugin.video.other").exists());
}

#[test]
fn test_clear_missing_root_is_noop() {
    let dir = TempDir::new().unwrap();
    let report = retention::clear(&dir.path().join("nope")).unwrap();
    assert_eq!(report.items_removed, 0);
}

#[test]
fn test_clear_refuses_protected_root() {
    let result = retention::clear(Path::new("/usr"));
    assert!(result.is_err());
}

#[test]
fn test_measure_counts_nested_bytes() {
    let dir = TempDir::new().unwrap();
    write_aged(&dir.path().join("a"), 3 * KB, 0);
    write_aged(&dir.path().join("x/y/z"), 7 * KB, 0);
    assert_eq!(retention::measure(dir.path()), 10 * KB);
    assert_eq!(retention::measure(&dir.path().join("missing")), 0);
}

#[cfg(unix)]
#[test]
fn test_measure_skips_unreadable_subtree() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    write_aged(&dir.path().join("visible.bin"), 3 * KB, 0);
    let locked = dir.path().join("locked");
    write_aged(&locked.join("hidden.bin"), 5 * KB, 0);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can still list the directory
    let expected = if fs::read_dir(&locked).is_ok() {
        8 * KB
    } else {
        3 * KB
    };
    let measured = retention::measure(dir.path());

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    assert_eq!(measured, expected);
}
