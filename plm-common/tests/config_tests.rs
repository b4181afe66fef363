//! Configuration resolution tests
//!
//! Tests that touch `PLM_CONFIG` or `PLM_ROOT` are marked `#[serial]` so
//! they never race on the process environment.

use plm_common::config::{
    get_default_root_folder, load_or_default, resolve_config_path, resolve_root_folder,
    write_toml_config, TomlConfig, CONFIG_ENV_VAR, ROOT_ENV_VAR,
};
use plm_common::Error;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_root_env_beats_toml() {
    env::set_var(ROOT_ENV_VAR, "/from/env");
    let config = TomlConfig {
        library_root: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let root = resolve_root_folder(None, &config);
    env::remove_var(ROOT_ENV_VAR);

    assert_eq!(root, PathBuf::from("/from/env"));
}

#[test]
#[serial]
fn test_cli_root_beats_env() {
    env::set_var(ROOT_ENV_VAR, "/from/env");
    let root = resolve_root_folder(Some(Path::new("/from/cli")), &TomlConfig::default());
    env::remove_var(ROOT_ENV_VAR);

    assert_eq!(root, PathBuf::from("/from/cli"));
}

#[test]
#[serial]
fn test_toml_root_used_without_overrides() {
    env::remove_var(ROOT_ENV_VAR);
    let config = TomlConfig {
        library_root: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/from/toml"));
}

#[test]
#[serial]
fn test_default_root_when_nothing_set() {
    env::remove_var(ROOT_ENV_VAR);
    let root = resolve_root_folder(None, &TomlConfig::default());

    assert_eq!(root, get_default_root_folder());
    assert!(!root.as_os_str().is_empty());
}

#[test]
#[serial]
fn test_blank_root_env_is_ignored() {
    env::set_var(ROOT_ENV_VAR, "   ");
    let config = TomlConfig {
        library_root: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let root = resolve_root_folder(None, &config);
    env::remove_var(ROOT_ENV_VAR);

    assert_eq!(root, PathBuf::from("/from/toml"));
}

#[test]
#[serial]
fn test_config_env_names_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.toml");
    let config = TomlConfig {
        min_confidence: Some(85.0),
        acoustid_api_key: Some("key-123".to_string()),
        ..Default::default()
    };
    write_toml_config(&config, &path).unwrap();

    env::set_var(CONFIG_ENV_VAR, &path);
    let resolved = resolve_config_path(None, "plm-mr");
    let loaded = load_or_default(None, "plm-mr");
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(path));
    let loaded = loaded.unwrap();
    assert_eq!(loaded.min_confidence, Some(85.0));
    assert_eq!(loaded.acoustid_api_key.as_deref(), Some("key-123"));
}

#[test]
#[serial]
fn test_explicit_missing_file_is_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("absent.toml");

    let err = load_or_default(Some(&missing), "plm-mr").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn test_cli_config_beats_env() {
    let temp_dir = TempDir::new().unwrap();
    let cli_path = temp_dir.path().join("cli.toml");
    let env_path = temp_dir.path().join("env.toml");
    write_toml_config(
        &TomlConfig {
            catalogs: Some(vec!["itunes".to_string()]),
            ..Default::default()
        },
        &cli_path,
    )
    .unwrap();
    write_toml_config(&TomlConfig::default(), &env_path).unwrap();

    env::set_var(CONFIG_ENV_VAR, &env_path);
    let loaded = load_or_default(Some(&cli_path), "plm-mr");
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(loaded.unwrap().catalogs, Some(vec!["itunes".to_string()]));
}

#[test]
fn test_logging_section_parses() {
    let config: TomlConfig = toml::from_str(
        r#"
        database_path = "/var/lib/plm/catalog.db"

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.database_path, Some(PathBuf::from("/var/lib/plm/catalog.db")));
}
