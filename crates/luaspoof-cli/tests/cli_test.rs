//! Integration tests for the luaspoof CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

/// A `luaspoof` invocation isolated from the user's configuration
fn luaspoof(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("luaspoof").unwrap();
    cmd.env("NO_COLOR", "1").env("XDG_CONFIG_HOME", home);
    cmd
}

fn crc32(data: &[u8]) -> u32 {
    luaspoof_format::crc32(data)
}

#[test]
fn test_help_command() {
    let dir = tempfile::tempdir().unwrap();
    luaspoof(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("compress"))
        .stdout(predicate::str::contains("decompress"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("forge"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_command() {
    let dir = tempfile::tempdir().unwrap();
    luaspoof(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("luaspoof"));
}

#[test]
fn test_invalid_command() {
    let dir = tempfile::tempdir().unwrap();
    luaspoof(dir.path())
        .arg("invalid")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_compress_then_decompress_directory() {
    let dir = tempfile::tempdir().unwrap();
    let work = dir.path().join("lua");
    fs::create_dir(&work).unwrap();
    fs::write(work.join("3149245302.src.lua"), b"print(\"hi\")").unwrap();
    fs::write(work.join("0.src.lua"), b"return 1").unwrap();
    fs::write(work.join("readme.txt"), b"not lua").unwrap();

    luaspoof(dir.path())
        .arg("compress")
        .arg(&work)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 processed, 1 skipped, 0 failed"))
        .stderr(predicate::str::contains("Compressing '0.src.lua'"));

    assert!(work.join("3149245302.lua").exists());
    assert!(work.join("0.lua").exists());

    fs::remove_file(work.join("3149245302.src.lua")).unwrap();
    fs::remove_file(work.join("0.src.lua")).unwrap();

    luaspoof(dir.path())
        .arg("decompress")
        .arg(&work)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 processed"));

    let hi = fs::read(work.join("3149245302.src.lua")).unwrap();
    assert!(hi.starts_with(b"print(\"hi\")"));
    assert_eq!(crc32(&hi), 3_149_245_302);

    let one = fs::read(work.join("0.src.lua")).unwrap();
    assert_eq!(&one[..8], b"return 1");
    assert_eq!(one.len(), 12);
    assert_eq!(crc32(&one), 0);
}

#[test]
fn test_decompress_does_not_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("7.src.lua");
    fs::write(&source, b"return 7").unwrap();

    luaspoof(dir.path())
        .arg("compress")
        .arg(&source)
        .assert()
        .success();

    fs::write(&source, b"edited").unwrap();

    luaspoof(dir.path())
        .arg("decompress")
        .arg(dir.path().join("7.lua"))
        .assert()
        .success()
        .stdout(predicate::str::contains("0 processed, 1 skipped"));
    assert_eq!(fs::read(&source).unwrap(), b"edited");

    luaspoof(dir.path())
        .args(["decompress", "--force"])
        .arg(dir.path().join("7.lua"))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 processed"));
    assert!(fs::read(&source).unwrap().starts_with(b"return 7"));
}

#[test]
fn test_failed_file_sets_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("5.lua"), b"too short").unwrap();

    luaspoof(dir.path())
        .arg("decompress")
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 failed"))
        .stderr(predicate::str::contains("1 of 1 files failed"));

    assert!(!dir.path().join("5.src.lua").exists());
}

#[test]
fn test_missing_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    luaspoof(dir.path())
        .arg("compress")
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("neither a file nor a directory"));
}

#[test]
fn test_json_report() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("1.src.lua"), b"return 1").unwrap();

    luaspoof(dir.path())
        .args(["--format", "json", "compress"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"processed":1,"skipped":0,"failed":0}"#,
        ));
}

#[test]
fn test_inspect_json() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("3735928559.src.lua"), b"return {}").unwrap();

    luaspoof(dir.path())
        .arg("compress")
        .arg(dir.path())
        .assert()
        .success();

    luaspoof(dir.path())
        .args(["inspect", "-o", "json"])
        .arg(dir.path().join("3735928559.lua"))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""asserted_checksum":3735928559"#))
        .stdout(predicate::str::contains(r#""lzma_properties":93"#))
        .stdout(predicate::str::contains(r#""dict_size":65536"#))
        .stdout(predicate::str::contains(r#""recorded_size":13"#))
        .stdout(predicate::str::contains(r#""checksum_matches":true"#));
}

#[test]
fn test_inspect_text() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("42.src.lua"), b"return 42").unwrap();

    luaspoof(dir.path())
        .arg("compress")
        .arg(dir.path().join("42.src.lua"))
        .assert()
        .success();

    luaspoof(dir.path())
        .arg("inspect")
        .arg(dir.path().join("42.lua"))
        .assert()
        .success()
        .stdout(predicate::str::contains("0x0000002a"))
        .stdout(predicate::str::contains("Checksum matches"));
}

#[test]
fn test_forge_output() {
    let dir = tempfile::tempdir().unwrap();
    luaspoof(dir.path())
        .args(["forge", "0xb47da00b", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("96aaa4d9"));

    luaspoof(dir.path())
        .args(["-o", "json", "forge", "0", "3735928559"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""suffix":"c3d82406""#));
}

#[test]
fn test_forge_rejects_bad_crc() {
    let dir = tempfile::tempdir().unwrap();
    luaspoof(dir.path())
        .args(["forge", "4294967296", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a 32-bit CRC"));
}

#[test]
fn test_config_file_overrides_suffixes() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    fs::write(&config, "source_suffix = \".raw\"\noutput_suffix = \".bin\"\n").unwrap();
    fs::write(dir.path().join("9.raw"), b"return 9").unwrap();
    fs::write(dir.path().join("8.src.lua"), b"return 8").unwrap();

    luaspoof(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("compress")
        .arg(dir.path())
        .assert()
        .success();

    assert!(dir.path().join("9.bin").exists());
    assert!(!dir.path().join("8.lua").exists());
}

#[test]
fn test_config_show_and_path() {
    let dir = tempfile::tempdir().unwrap();
    luaspoof(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dict_size = 65536"))
        .stdout(predicate::str::contains("source_suffix = \".src.lua\""));

    luaspoof(dir.path())
        .args(["--format", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"\{.*\}").unwrap());

    luaspoof(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("luaspoof.toml"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    luaspoof(dir.path())
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
