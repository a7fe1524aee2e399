//! Tests for layered settings loading

use std::fs;

use rstest::rstest;
use tempfile::TempDir;

use knotree::application::ApplicationError;
use knotree::config::Settings;
use knotree::domain::LayoutEngine;

#[test]
fn given_explicit_file_when_load_then_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("knotree.toml");
    fs::write(&path, "[layout]\nrow_spacing = 120.0\ntop_margin = 20.0\n").unwrap();

    let settings = Settings::load_layers(None, Some(&path), None).unwrap();

    assert_eq!(settings.layout.row_spacing, 120.0);
    assert_eq!(settings.layout.top_margin, 20.0);
    assert_eq!(settings.layout.engine(), LayoutEngine::new(120.0, 20.0));
}

#[test]
fn given_missing_explicit_file_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();

    let result = Settings::load_layers(None, Some(&dir.path().join("absent.toml")), None);

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_invalid_value_in_file_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("knotree.toml");
    fs::write(&path, "[layout]\nmin_width = -5.0\n").unwrap();

    let result = Settings::load_layers(None, Some(&path), None);

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_env_var_when_load_then_it_wins_over_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("knotree.toml");
    fs::write(&path, "[log]\nrecent_entries = 20\n").unwrap();
    std::env::set_var("KNOTREE_ENVTEST_LOG__RECENT_ENTRIES", "3");

    let result = Settings::load_layers(None, Some(&path), Some("KNOTREE_ENVTEST"));
    std::env::remove_var("KNOTREE_ENVTEST_LOG__RECENT_ENTRIES");

    assert_eq!(result.unwrap().log.recent_entries, 3);
}

#[test]
fn given_global_and_explicit_files_when_load_then_explicit_wins_per_key() {
    let dir = TempDir::new().unwrap();
    let global = dir.path().join("global.toml");
    let explicit = dir.path().join("explicit.toml");
    fs::write(&global, "[layout]\nrow_spacing = 80.0\ntop_margin = 5.0\n").unwrap();
    fs::write(&explicit, "[layout]\nrow_spacing = 120.0\n").unwrap();

    let settings = Settings::load_layers(Some(&global), Some(&explicit), None).unwrap();

    assert_eq!(settings.layout.row_spacing, 120.0);
    assert_eq!(settings.layout.top_margin, 5.0);
}

#[test]
fn given_missing_global_file_when_load_then_defaults() {
    let dir = TempDir::new().unwrap();

    let settings = Settings::load_layers(Some(&dir.path().join("none.toml")), None, None).unwrap();

    assert_eq!(settings, Settings::default());
}

#[rstest]
#[case("[layout]\nwidth_per_node = 50.0\n", 50.0)]
#[case("", 75.0)]
fn given_toml_when_from_toml_then_unset_keys_keep_defaults(#[case] content: &str, #[case] per_node: f64) {
    let settings = Settings::from_toml(content).unwrap();

    assert_eq!(settings.layout.width_per_node, per_node);
    assert_eq!(settings.layout.min_width, 900.0);
}

#[test]
fn given_settings_when_to_toml_then_parses_back_to_same_value() {
    let settings = Settings::default();

    let text = settings.to_toml().unwrap();

    assert!(text.contains("[layout]"));
    assert_eq!(Settings::from_toml(&text).unwrap(), settings);
}
