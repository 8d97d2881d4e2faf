// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn config_path_prefers_override() {
    std::env::set_var("BURNER_CONFIG", "/etc/burner.toml");
    assert_eq!(config_path(), Some(PathBuf::from("/etc/burner.toml")));
    std::env::remove_var("BURNER_CONFIG");
}

#[test]
#[serial]
fn config_path_falls_back_to_config_dir() {
    std::env::remove_var("BURNER_CONFIG");
    if let Some(path) = config_path() {
        assert!(path.ends_with("burner/config.toml"));
    }
}

#[test]
#[serial]
fn tick_interval_parses_millis() {
    std::env::set_var("BURNER_TICK_MS", "20");
    assert_eq!(tick_interval(), Some(Duration::from_millis(20)));
    std::env::set_var("BURNER_TICK_MS", "0");
    assert_eq!(tick_interval(), None);
    std::env::set_var("BURNER_TICK_MS", "fast");
    assert_eq!(tick_interval(), None);
    std::env::remove_var("BURNER_TICK_MS");
}

#[test]
#[serial]
fn tmp_dir_ignores_empty() {
    std::env::set_var("BURNER_TMPDIR", "");
    assert_eq!(tmp_dir(), None);
    std::env::set_var("BURNER_TMPDIR", "/scratch");
    assert_eq!(tmp_dir(), Some(PathBuf::from("/scratch")));
    std::env::remove_var("BURNER_TMPDIR");
}
