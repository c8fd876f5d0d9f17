//! Unit tests for configuration loading and root folder resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate REEL_ROOT_FOLDER are marked with #[serial].

use reel_common::config::{
    load_or_default, load_toml_config, prepare_root_folder, resolve_root_folder, TomlConfig,
    DATABASE_FILE_NAME, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("config.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn test_full_toml_config_parses() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
root_folder = "/srv/reel"
port = 8080
tmdb_api_key = "abc123"
tmdb_base_url = "http://127.0.0.1:9999/3"

[logging]
level = "debug"

[import]
page_delay_ms = 50
max_pages = 10
"#,
    );

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/reel")));
    assert_eq!(config.port, Some(8080));
    assert_eq!(config.tmdb_api_key.as_deref(), Some("abc123"));
    assert_eq!(config.tmdb_base_url.as_deref(), Some("http://127.0.0.1:9999/3"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.import.page_delay_ms, 50);
    assert_eq!(config.import.max_pages, 10);
}

#[test]
fn test_partial_toml_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "port = 5999\n");

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.port, Some(5999));
    assert!(config.root_folder.is_none());
    assert!(config.tmdb_api_key.is_none());
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.import.page_delay_ms, 250);
    assert_eq!(config.import.max_pages, 500);
}

#[test]
fn test_invalid_toml_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "port = \"not a number\"\n");

    let err = load_toml_config(&path).unwrap_err();
    assert!(matches!(err, reel_common::Error::Config(_)));
}

#[test]
fn test_explicit_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(load_or_default(Some(&missing)).is_err());
}

#[test]
#[serial]
fn test_cli_argument_has_highest_priority() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(Some(Path::new("/from/cli")), ROOT_FOLDER_ENV, &toml);
    assert_eq!(resolved, PathBuf::from("/from/cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(None, ROOT_FOLDER_ENV, &toml);
    assert_eq!(resolved, PathBuf::from("/from/env"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_toml_used_without_cli_or_env() {
    env::remove_var(ROOT_FOLDER_ENV);
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(None, ROOT_FOLDER_ENV, &toml);
    assert_eq!(resolved, PathBuf::from("/from/toml"));
}

#[test]
#[serial]
fn test_default_root_folder_when_nothing_configured() {
    env::remove_var(ROOT_FOLDER_ENV);
    let resolved = resolve_root_folder(None, ROOT_FOLDER_ENV, &TomlConfig::default());
    assert!(!resolved.as_os_str().is_empty());
    assert!(resolved.to_string_lossy().contains("reel"));
}

#[test]
fn test_prepare_root_folder_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("reel");

    let db_path = prepare_root_folder(&root).unwrap();
    assert!(root.is_dir());
    assert_eq!(db_path, root.join(DATABASE_FILE_NAME));
}
