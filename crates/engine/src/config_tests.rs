// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
fn empty_file_is_defaults() {
    let config = EngineConfig::parse(Path::new("c.toml"), "").unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.tick_interval(), Duration::from_millis(500));
    assert_eq!(config.checksum, ChecksumType::Md5);
}

#[test]
fn full_file_parses() {
    let text = r#"
tmp_dir = "/scratch"
tick_interval_ms = 100
checksum = "sha256"
session_log = "/var/log/burner.log"
speed = 8

[tools]
wodim = "/opt/bin/wodim"

[mirrors]
"http://example.org/iso/" = "/srv/iso"
"#;
    let config = EngineConfig::parse(Path::new("c.toml"), text).unwrap();
    assert_eq!(config.tmp_dir, PathBuf::from("/scratch"));
    assert_eq!(config.tick_interval(), Duration::from_millis(100));
    assert_eq!(config.checksum, ChecksumType::Sha256);
    assert_eq!(config.speed, Some(8));
    assert_eq!(config.tool("wodim"), PathBuf::from("/opt/bin/wodim"));
    assert_eq!(config.tool("genisoimage"), PathBuf::from("genisoimage"));
}

#[test]
fn unknown_key_is_rejected() {
    let err = EngineConfig::parse(Path::new("c.toml"), "tmpdir = \"/x\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("c.toml"));
}

#[test]
fn missing_file_is_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn mirror_uses_longest_prefix_and_decodes() {
    let mut config = EngineConfig::default();
    config.mirrors.insert("http://example.org/".into(), PathBuf::from("/srv/all"));
    config.mirrors.insert("http://example.org/iso/".into(), PathBuf::from("/srv/iso"));

    assert_eq!(
        config.mirror_for("http://example.org/iso/My%20Disc.iso"),
        Some(PathBuf::from("/srv/iso/My Disc.iso"))
    );
    assert_eq!(config.mirror_for("http://example.org/readme"), Some(PathBuf::from("/srv/all/readme")));
    assert_eq!(config.mirror_for("ftp://elsewhere/file"), None);
}

#[yare::parameterized(
    encoded_root = { "http://archive.example.org/iso/%2Fetc%2Fshadow" },
    parent = { "http://archive.example.org/iso/../../etc/shadow" },
    encoded_parent = { "http://archive.example.org/iso/disc/%2E%2E/%2E%2E/%2E%2E/etc/shadow" },
)]
fn mirror_path_stays_inside_its_directory(uri: &str) {
    let mut config = EngineConfig::default();
    config.mirrors.insert("http://archive.example.org/iso/".into(), PathBuf::from("/srv/mirror"));
    assert_eq!(config.mirror_for(uri), None);
}

#[test]
fn mirror_prefix_alone_is_the_directory() {
    let mut config = EngineConfig::default();
    config.mirrors.insert("http://archive.example.org/iso/".into(), PathBuf::from("/srv/mirror"));
    assert_eq!(config.mirror_for("http://archive.example.org/iso/"), Some(PathBuf::from("/srv/mirror")));
    assert_eq!(
        config.mirror_for("http://archive.example.org/iso/./disc/a.iso"),
        Some(PathBuf::from("/srv/mirror/disc/a.iso"))
    );
}

#[test]
#[serial]
fn env_overrides_apply() {
    std::env::set_var("BURNER_TMPDIR", "/fast");
    std::env::set_var("BURNER_TICK_MS", "25");
    let config = EngineConfig::default().with_env_overrides();
    std::env::remove_var("BURNER_TMPDIR");
    std::env::remove_var("BURNER_TICK_MS");

    assert_eq!(config.tmp_dir, PathBuf::from("/fast"));
    assert_eq!(config.tick_interval_ms, 25);
}
