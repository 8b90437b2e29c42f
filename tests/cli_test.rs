use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn lazymaint() -> Command {
    Command::cargo_bin("lazymaint").unwrap()
}

/// Command pointed at a scratch Kodi home and config file
fn lazymaint_in(dir: &Path) -> Command {
    let mut cmd = lazymaint();
    cmd.env_remove("LAZYMAINT_KODI_HOME")
        .arg("--home")
        .arg(dir.join("kodi"))
        .arg("--config-file")
        .arg(dir.join("config.toml"));
    cmd
}

fn write(path: &Path, len: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![b'z'; len]).unwrap();
}

fn populate(dir: &Path) {
    let home = dir.join("kodi");
    write(&home.join("temp/kodi.log"), 128);
    write(&home.join("temp/kodi.old.log"), 128);
    write(&home.join("addons/plugin.video.demo/addon.xml"), 32);
    write(&home.join("addons/packages/plugin.video.demo-1.0.zip"), 256);
    write(&home.join("userdata/guisettings.xml"), 32);
    write(&home.join("userdata/Thumbnails/0/a.jpg"), 512);
    write(&home.join("userdata/Database/Textures13.db"), 64);
    write(&home.join("media/splash.png"), 16);
}

// ─── Help & version ──────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    lazymaint()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Kodi"))
        .stdout(predicate::str::contains("soft-clean"))
        .stdout(predicate::str::contains("hard-clean"))
        .stdout(predicate::str::contains("backup"))
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("fresh-start"));
}

#[test]
fn test_version_flag() {
    lazymaint()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lazymaint"));
}

#[test]
fn test_invalid_subcommand() {
    lazymaint().arg("defrag").assert().failure();
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[test]
fn test_status_json_output() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());

    lazymaint_in(dir.path())
        .args(["status", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Thumbnails\""))
        .stdout(predicate::str::contains("\"size_bytes\": 512"));
}

// ─── Trim ────────────────────────────────────────────────────────────────────

#[test]
fn test_trim_directory_quiet() {
    let dir = TempDir::new().unwrap();
    let cache = dir.path().join("cache");
    write(&cache.join("a.bin"), 4096);
    write(&cache.join("b.bin"), 4096);

    lazymaint_in(dir.path())
        .arg("trim")
        .arg(&cache)
        .args(["--budget-mb", "0", "--format", "quiet"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("0  2  8192"));

    assert!(cache.is_dir());
    assert_eq!(fs::read_dir(&cache).unwrap().count(), 0);
}

#[test]
fn test_trim_with_huge_budget_keeps_everything() {
    let dir = TempDir::new().unwrap();
    let cache = dir.path().join("cache");
    write(&cache.join("a.bin"), 4096);
    let huge = u64::MAX.to_string();

    lazymaint_in(dir.path())
        .arg("trim")
        .arg(&cache)
        .args(["--budget-mb", huge.as_str(), "--format", "quiet"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("4096  0  0"));

    assert!(cache.join("a.bin").exists());
}

#[test]
fn test_trim_refuses_protected_path() {
    let dir = TempDir::new().unwrap();
    lazymaint_in(dir.path())
        .args(["trim", "/usr", "--budget-mb", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("protected path"));
}

// ─── Cleaning ────────────────────────────────────────────────────────────────

#[test]
fn test_soft_clean_quiet() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());

    lazymaint_in(dir.path())
        .args(["soft-clean", "--budget-mb", "0", "--format", "quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("success  Soft Clean"));

    let home = dir.path().join("kodi");
    assert!(home.join("temp/kodi.log").exists());
    assert!(!home.join("temp/kodi.old.log").exists());
    assert!(!home.join("addons/packages/plugin.video.demo-1.0.zip").exists());
}

#[test]
fn test_hard_clean_declined_on_stdin() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());

    lazymaint_in(dir.path())
        .args(["hard-clean", "--format", "quiet"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("declined  Hard Clean"));

    assert!(dir
        .path()
        .join("kodi/userdata/Database/Textures13.db")
        .exists());
}

#[test]
fn test_hard_clean_with_yes() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());

    lazymaint_in(dir.path())
        .args(["hard-clean", "-y", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"success\""));

    assert!(!dir
        .path()
        .join("kodi/userdata/Database/Textures13.db")
        .exists());
}

// ─── Backup / Restore ────────────────────────────────────────────────────────

#[test]
fn test_backup_and_restore_round_trip() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());
    let backups = dir.path().join("backups");
    fs::create_dir_all(&backups).unwrap();

    lazymaint_in(dir.path())
        .args(["backup", "--name", "snap", "--format", "quiet"])
        .arg("--dest")
        .arg(&backups)
        .assert()
        .success()
        .stdout(predicate::str::contains("success  Backup"));
    assert!(backups.join("snap.zip").is_file());

    let settings = dir.path().join("kodi/userdata/guisettings.xml");
    fs::remove_file(&settings).unwrap();

    lazymaint_in(dir.path())
        .arg("restore")
        .arg(backups.join("snap.zip"))
        .args(["-y", "--format", "quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("success  Restore"));
    assert!(settings.exists());
}

#[test]
fn test_backup_without_destination_fails() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());

    lazymaint_in(dir.path())
        .arg("backup")
        .assert()
        .failure()
        .stderr(predicate::str::contains("backup_dir"));
}

#[test]
fn test_restore_missing_archive_fails() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());

    lazymaint_in(dir.path())
        .arg("restore")
        .arg(dir.path().join("missing.zip"))
        .args(["-y", "--format", "quiet"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("failed  Restore"));
}

// ─── Log ─────────────────────────────────────────────────────────────────────

#[test]
fn test_log_read() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("kodi/temp/kodi.log");
    fs::create_dir_all(log.parent().unwrap()).unwrap();
    fs::write(&log, "NOTICE: Starting Kodi\n").unwrap();

    lazymaint_in(dir.path())
        .args(["log", "read"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Starting Kodi"));
}

// ─── Config ──────────────────────────────────────────────────────────────────

#[test]
fn test_config_init_set_show() {
    let dir = TempDir::new().unwrap();

    lazymaint_in(dir.path())
        .args(["config", "init"])
        .assert()
        .success();
    assert!(dir.path().join("config.toml").exists());

    lazymaint_in(dir.path())
        .args(["config", "set", "soft_clean_budget_mb", "12"])
        .assert()
        .success();

    lazymaint_in(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("soft_clean_budget_mb = 12"));
}

#[test]
fn test_config_set_unknown_key() {
    let dir = TempDir::new().unwrap();
    lazymaint_in(dir.path())
        .args(["config", "set", "no_such_key", "1"])
        .assert()
        .failure();
}

// ─── Completions ─────────────────────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    lazymaint()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lazymaint"));
}
