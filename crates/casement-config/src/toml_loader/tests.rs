//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use casement_common::ConfigError;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_casement_config.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[window]
default_width = 1280

[ipc]
queue_warn_depth = 64
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.window.default_width, 1280);
    assert_eq!(config.ipc.queue_warn_depth, 64);
    // Defaults preserved
    assert_eq!(config.window.default_height, 600);
    assert_eq!(config.display.menu_bar_height, 25);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let result = load_from_path(&path);
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn out_of_range_values_still_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[content]\nrender_timeout_ms = 1\n").unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.content.render_timeout_ms, 1);
    assert!(crate::validation::validate(&config).is_err());
}

#[test]
fn default_template_parses_and_validates() {
    let config: crate::HostConfig = toml::from_str(default_config_toml()).unwrap();
    assert!(crate::validation::validate(&config).is_ok());
    assert_eq!(config.window.titlebar_height, 28);
}

#[test]
fn create_default_config_writes_loadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.content.user_agent, "Casement/0.1");
}

#[test]
fn default_config_path_ends_with_casement() {
    if let Ok(path) = default_config_path() {
        assert!(path.ends_with("casement/config.toml"));
    }
}
