//! Integration-level unit tests for the SettingsEngine public API.
//!
//! These tests exercise the SettingsEngine through its public trait interface,
//! validating default loading, typed updates, reset and environment overrides.

use linkvault::services::settings_engine::{
    SettingKey, SettingsEngine, SettingsEngineTrait, ENV_ANON_KEY, ENV_LOG, ENV_URL,
};
use linkvault::types::errors::SettingsError;
use linkvault::types::settings::{Backend, ClientSettings, LogFormat};
use rstest::rstest;
use tempfile::TempDir;

/// Helper: create a SettingsEngine backed by a temp directory that lives for the
/// duration of the test (the caller holds the `TempDir` handle).
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    SettingsEngine::new(Some(dir.path().join("settings.json")))
}

/// Without a config file the client starts on the local backend.
#[test]
fn test_load_defaults_when_no_config_file_exists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let settings = engine.load().unwrap();

    assert_eq!(settings, ClientSettings::default());
    assert_eq!(settings.remote.backend, Backend::Local);
    assert_eq!(settings.logging.level, "info");
    assert_eq!(settings.logging.format, LogFormat::Pretty);
    assert!(!engine.config_path().exists(), "loading never creates the file");
}

#[test]
fn test_set_value_persists_changes() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine.set_value(SettingKey::Url, "https://demo.supabase.co/").unwrap();
        engine.set_value(SettingKey::Backend, "Supabase").unwrap();
        engine.set_value(SettingKey::LogFormat, "json").unwrap();
    }

    let mut engine2 = engine_in_temp(&dir);
    let loaded = engine2.load().unwrap();
    assert_eq!(loaded.remote.url, "https://demo.supabase.co");
    assert_eq!(loaded.remote.backend, Backend::Supabase);
    assert_eq!(loaded.logging.format, LogFormat::Json);
    assert_eq!(engine2.get_value(SettingKey::Backend), "supabase");
}

#[rstest]
#[case(SettingKey::Backend, "cloud")]
#[case(SettingKey::Url, "not a url")]
#[case(SettingKey::Url, "file:///tmp/vault")]
#[case(SettingKey::LogFormat, "yaml")]
#[case(SettingKey::LogLevel, "linkvault=loud")]
fn test_set_value_rejects_invalid_values(#[case] key: SettingKey, #[case] value: &str) {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    assert!(matches!(engine.set_value(key, value), Err(SettingsError::InvalidValue(_))));
    assert_eq!(*engine.get_settings(), ClientSettings::default());
    assert!(!engine.config_path().exists());
}

#[test]
fn test_hosted_backend_requires_url() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    assert!(engine.set_value(SettingKey::Backend, "supabase").is_err());

    engine.set_value(SettingKey::Url, "https://demo.supabase.co").unwrap();
    engine.set_value(SettingKey::Backend, "supabase").unwrap();
    assert!(engine.set_value(SettingKey::Url, "").is_err());
    assert_eq!(engine.get_settings().remote.url, "https://demo.supabase.co");
}

#[test]
fn test_blank_database_path_means_default_location() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    engine.set_value(SettingKey::DatabasePath, "/srv/vault.db").unwrap();
    assert_eq!(engine.get_settings().storage.database_path.as_deref(), Some("/srv/vault.db"));

    engine.set_value(SettingKey::DatabasePath, "  ").unwrap();
    assert_eq!(engine.get_settings().storage.database_path, None);
}

#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine.set_value(SettingKey::LogLevel, "linkvault=debug").unwrap();
        assert_eq!(engine.get_settings().logging.level, "linkvault=debug");

        engine.reset().unwrap();
        assert_eq!(*engine.get_settings(), ClientSettings::default());
    }

    let mut engine2 = engine_in_temp(&dir);
    assert_eq!(engine2.load().unwrap(), ClientSettings::default());
}

#[test]
fn test_load_malformed_json_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();

    let mut engine = engine_in_temp(&dir);
    assert!(matches!(engine.load(), Err(SettingsError::SerializationError(_))));
}

#[test]
fn test_overrides_apply_on_top_of_file() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();
    engine.set_value(SettingKey::AnonKey, "from-file").unwrap();

    engine.apply_overrides_from(|key| match key {
        k if k == ENV_URL => Some("https://override.supabase.co".to_string()),
        k if k == ENV_LOG => Some("   ".to_string()),
        _ => None,
    });

    let settings = engine.get_settings();
    assert_eq!(settings.remote.backend, Backend::Supabase);
    assert_eq!(settings.remote.url, "https://override.supabase.co");
    assert_eq!(settings.remote.anon_key, "from-file");
    assert_eq!(settings.logging.level, "info");
    assert!(engine.is_overridden(SettingKey::Url));
    assert!(engine.is_overridden(SettingKey::Backend));
    assert!(!engine.is_overridden(SettingKey::AnonKey));
}

#[test]
fn test_overrides_survive_updates_but_are_never_saved() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();
    engine.apply_overrides_from(|key| match key {
        k if k == ENV_URL => Some("https://override.supabase.co".to_string()),
        k if k == ENV_ANON_KEY => Some("env-key".to_string()),
        _ => None,
    });

    engine.set_value(SettingKey::LogLevel, "debug").unwrap();
    assert_eq!(engine.get_settings().remote.anon_key, "env-key");
    assert_eq!(engine.get_settings().logging.level, "debug");
    assert_eq!(engine.stored_settings().remote.url, "");

    let mut fresh = engine_in_temp(&dir);
    let loaded = fresh.load().unwrap();
    assert_eq!(loaded.remote.backend, Backend::Local);
    assert_eq!(loaded.remote.anon_key, "");
    assert_eq!(loaded.logging.level, "debug");
}
