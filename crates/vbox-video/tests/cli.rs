//! Exit status and output of the `vbox-video` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const TELEMETRY: &str = "[header]\ntime\n\n[column names]\ntime\n\n[data]\n101500.00\n101500.50\n";

fn session(videos: &[&str]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let telemetry = dir.path().join("telemetry.vbo");
    fs::write(&telemetry, TELEMETRY).unwrap();
    for name in videos {
        fs::write(dir.path().join(name), b"").unwrap();
    }
    (dir, telemetry)
}

/// Run the binary with a config path that does not exist, so defaults apply.
fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vbox-video"))
        .arg("--config")
        .arg(dir.join("absent.toml"))
        .arg("--quiet")
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn insert_succeeds_with_exit_zero() {
    let (dir, telemetry) = session(&["RACE0007.MP4"]);

    let out = run(dir.path(), &["insert", path_arg(&telemetry)]);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Linked RACE0007.MP4"));
    assert!(fs::read_to_string(&telemetry).unwrap().contains("[avi]"));
}

#[test]
fn insert_json_report() {
    let (dir, telemetry) = session(&["RACE0007.MP4"]);

    let out = run(
        dir.path(),
        &["insert", path_arg(&telemetry), "--offset-sec", "2", "--json"],
    );
    assert_eq!(out.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["video"]["name"], "RACE0007.MP4");
    assert_eq!(report["data_rows"], 2);
    assert_eq!(report["written"], true);
}

#[test]
fn no_video_exits_with_code_3() {
    let (dir, telemetry) = session(&[]);

    let out = run(dir.path(), &["insert", path_arg(&telemetry)]);
    assert_eq!(out.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&out.stderr).contains("no video found"));
    assert_eq!(fs::read_to_string(&telemetry).unwrap(), TELEMETRY);
}

#[test]
fn ambiguous_match_exits_with_code_4() {
    let (dir, telemetry) = session(&["RACE0007.MP4", "RACE0008.MP4"]);

    let out = run(dir.path(), &["insert", path_arg(&telemetry)]);
    assert_eq!(out.status.code(), Some(4));
    assert_eq!(fs::read_to_string(&telemetry).unwrap(), TELEMETRY);
}

#[test]
fn already_referenced_exits_with_code_5_unless_overwrite() {
    let (dir, telemetry) = session(&["RACE0007.MP4"]);

    assert_eq!(
        run(dir.path(), &["insert", path_arg(&telemetry)]).status.code(),
        Some(0)
    );
    let first = fs::read(&telemetry).unwrap();

    let out = run(dir.path(), &["insert", path_arg(&telemetry)]);
    assert_eq!(out.status.code(), Some(5));
    assert_eq!(fs::read(&telemetry).unwrap(), first);

    let out = run(dir.path(), &["insert", path_arg(&telemetry), "--overwrite"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(fs::read(&telemetry).unwrap(), first);
}

#[test]
fn missing_telemetry_exits_with_code_6() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.vbo");

    let out = run(dir.path(), &["insert", path_arg(&missing)]);
    assert_eq!(out.status.code(), Some(6));
}

#[test]
fn find_reports_video_without_writing() {
    let (dir, telemetry) = session(&["GOPR0042.MP4"]);

    let out = run(dir.path(), &["find", path_arg(&telemetry), "--json"]);
    assert_eq!(out.status.code(), Some(0));
    let found: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(found["video"]["prefix"], "GOPR");
    assert_eq!(found["video"]["number"], "0042");
    assert!(found["existing_reference"].is_null());
    assert_eq!(fs::read_to_string(&telemetry).unwrap(), TELEMETRY);
}

#[test]
fn configured_extension_is_used() {
    let (dir, telemetry) = session(&["CLIP3.MOV", "RACE0007.MP4"]);
    let config = dir.path().join("config.toml");
    fs::write(&config, "[video]\nextension = \"MOV\"\n").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_vbox-video"))
        .arg("--config")
        .arg(&config)
        .args(["find", path_arg(&telemetry)])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("CLIP3.MOV"));
}

#[test]
fn invalid_config_exits_with_code_10() {
    let (dir, telemetry) = session(&["RACE0007.MP4"]);
    let config = dir.path().join("config.toml");
    fs::write(&config, "[video]\nextension = \"\"\n").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_vbox-video"))
        .arg("--config")
        .arg(&config)
        .args(["insert", path_arg(&telemetry)])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(10));
    assert_eq!(fs::read_to_string(&telemetry).unwrap(), TELEMETRY);
}

#[test]
fn unwritable_output_exits_with_code_7() {
    let (dir, telemetry) = session(&["RACE0007.MP4"]);
    let output = dir.path().join("missing").join("out.vbo");

    let out = run(
        dir.path(),
        &["insert", path_arg(&telemetry), "-o", path_arg(&output)],
    );
    assert_eq!(out.status.code(), Some(7));
    assert_eq!(fs::read_to_string(&telemetry).unwrap(), TELEMETRY);
}

#[test]
fn malformed_telemetry_exits_with_code_8() {
    let (dir, telemetry) = session(&["RACE0007.MP4"]);
    fs::write(&telemetry, "[header]\ntime\n").unwrap();

    let out = run(dir.path(), &["insert", path_arg(&telemetry)]);
    assert_eq!(out.status.code(), Some(8));
    assert!(String::from_utf8_lossy(&out.stderr).contains("missing [data] section"));
    assert_eq!(fs::read_to_string(&telemetry).unwrap(), "[header]\ntime\n");
}

#[test]
fn invalid_video_name_exits_with_code_9() {
    let (dir, telemetry) = session(&["RACE0007.MP4"]);

    let out = run(
        dir.path(),
        &["insert", path_arg(&telemetry), "--video", "race0007.mp4"],
    );
    assert_eq!(out.status.code(), Some(9));
    assert_eq!(fs::read_to_string(&telemetry).unwrap(), TELEMETRY);
}

#[test]
fn non_finite_offset_is_a_usage_error() {
    let (dir, telemetry) = session(&["RACE0007.MP4"]);

    for value in ["NaN", "inf"] {
        let out = run(
            dir.path(),
            &["insert", path_arg(&telemetry), "--offset-sec", value],
        );
        assert_eq!(out.status.code(), Some(2), "accepted {value}");
    }
    assert_eq!(fs::read_to_string(&telemetry).unwrap(), TELEMETRY);
}

#[test]
fn validate_checks_only_the_named_file() {
    let dir = TempDir::new().unwrap();
    let broken = dir.path().join("broken.toml");
    fs::write(&broken, "[video]\nextension = \"\"\n").unwrap();
    let good = dir.path().join("good.toml");
    fs::write(&good, "[insert]\non_existing = \"overwrite\"\n").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_vbox-video"))
        .arg("--config")
        .arg(&broken)
        .args(["config", "validate", "--file", path_arg(&good)])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Configuration is valid."));

    let out = Command::new(env!("CARGO_BIN_EXE_vbox-video"))
        .arg("--config")
        .arg(&broken)
        .args(["config", "validate"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(10));
}
