use std::path::PathBuf;

use liftoff_core::settings::{DEFAULT_BUFFER_SIZE, Settings, SettingsStore};
use tempfile::TempDir;

#[test]
fn load_missing_returns_defaults() {
    let temp = TempDir::new().unwrap();
    let store = SettingsStore::from_path(temp.path().join("liftoff.toml"));

    let settings = store.load().unwrap();

    assert_eq!(settings, Settings::default());
    assert_eq!(settings.buffer_size, DEFAULT_BUFFER_SIZE);
    assert!(!settings.skip_app_output);
    assert!(settings.gallery_dir.ends_with("apps"));
}

#[test]
fn missing_keys_take_default_values() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("liftoff.toml");
    std::fs::write(&path, "skip_app_output = true\nlogging_level = \"debug\"\n").unwrap();

    let settings = SettingsStore::from_path(path).load().unwrap();

    assert!(settings.skip_app_output);
    assert_eq!(settings.log_directive(), "debug");
    assert_eq!(settings.buffer_size, DEFAULT_BUFFER_SIZE);
}

#[test]
fn save_then_load_roundtrip() {
    let temp = TempDir::new().unwrap();
    let store = SettingsStore::from_path(temp.path().join("nested").join("liftoff.toml"));

    let settings = Settings {
        gallery_dir: PathBuf::from("/srv/liftoff/apps"),
        buffer_size: 4096,
        logging_level: "warning".to_string(),
        skip_app_output: true,
    };

    store.save(&settings).unwrap();
    assert_eq!(store.load().unwrap(), settings);
}

#[test]
fn invalid_values_are_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("liftoff.toml");
    std::fs::write(&path, "buffer_size = 0\n").unwrap();

    assert!(SettingsStore::from_path(path.clone()).load().is_err());

    std::fs::write(&path, "buffer_size = \"large\"\n").unwrap();
    assert!(SettingsStore::from_path(path).load().is_err());
}
