// LinkVault Settings Engine
// The config file holds what the user chose with `linkvault config set`.
// LINKVAULT_* environment variables shape the effective settings only and are
// never written back.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use reqwest::Url;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::{Backend, ClientSettings, LogFormat};

/// Overrides the record store base URL and selects the hosted backend.
pub const ENV_URL: &str = "LINKVAULT_URL";
/// Overrides the anonymous API key.
pub const ENV_ANON_KEY: &str = "LINKVAULT_ANON_KEY";
/// Overrides the log filter directive.
pub const ENV_LOG: &str = "LINKVAULT_LOG";

/// A single configurable value, addressed as `section.field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Backend,
    Url,
    AnonKey,
    DatabasePath,
    LogLevel,
    LogFormat,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::Backend,
        SettingKey::Url,
        SettingKey::AnonKey,
        SettingKey::DatabasePath,
        SettingKey::LogLevel,
        SettingKey::LogFormat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backend => "remote.backend",
            Self::Url => "remote.url",
            Self::AnonKey => "remote.anon_key",
            Self::DatabasePath => "storage.database_path",
            Self::LogLevel => "logging.level",
            Self::LogFormat => "logging.format",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s.trim())
            .ok_or_else(|| SettingsError::InvalidKey(s.to_string()))
    }
}

fn invalid(key: SettingKey, reason: impl fmt::Display) -> SettingsError {
    SettingsError::InvalidValue(format!("{}: {}", key, reason))
}

fn parse_backend(value: &str) -> Result<Backend, SettingsError> {
    match value.to_ascii_lowercase().as_str() {
        "supabase" => Ok(Backend::Supabase),
        "local" => Ok(Backend::Local),
        other => Err(invalid(SettingKey::Backend, format!("expected supabase or local, got '{}'", other))),
    }
}

fn parse_base_url(value: &str) -> Result<String, SettingsError> {
    if value.is_empty() {
        return Ok(String::new());
    }
    let url = Url::parse(value).map_err(|e| invalid(SettingKey::Url, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(SettingKey::Url, "only http and https are supported"));
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_log_format(value: &str) -> Result<LogFormat, SettingsError> {
    match value.to_ascii_lowercase().as_str() {
        "pretty" => Ok(LogFormat::Pretty),
        "json" => Ok(LogFormat::Json),
        other => Err(invalid(SettingKey::LogFormat, format!("expected pretty or json, got '{}'", other))),
    }
}

/// Values taken from the environment, layered over the stored settings.
#[derive(Debug, Clone, Default)]
struct EnvOverrides {
    url: Option<String>,
    anon_key: Option<String>,
    level: Option<String>,
}

impl EnvOverrides {
    fn covers(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::Backend | SettingKey::Url => self.url.is_some(),
            SettingKey::AnonKey => self.anon_key.is_some(),
            SettingKey::LogLevel => self.level.is_some(),
            SettingKey::DatabasePath | SettingKey::LogFormat => false,
        }
    }

    fn apply(&self, settings: &mut ClientSettings) {
        if let Some(url) = &self.url {
            settings.remote.url = url.clone();
            settings.remote.backend = Backend::Supabase;
        }
        if let Some(key) = &self.anon_key {
            settings.remote.anon_key = key.clone();
        }
        if let Some(level) = &self.level {
            settings.logging.level = level.clone();
        }
    }
}

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    /// Reads the config file. A missing file yields defaults.
    fn load(&mut self) -> Result<ClientSettings, SettingsError>;
    /// Writes the stored settings, without environment overrides.
    fn save(&self) -> Result<(), SettingsError>;
    /// Effective settings: the file plus environment overrides.
    fn get_settings(&self) -> &ClientSettings;
    fn get_value(&self, key: SettingKey) -> String;
    /// Validates `value`, stores it and saves the file.
    fn set_value(&mut self, key: SettingKey, value: &str) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn config_path(&self) -> &Path;
}

/// Settings engine persisting `ClientSettings` as JSON on disk.
pub struct SettingsEngine {
    config_path: PathBuf,
    stored: ClientSettings,
    overrides: EnvOverrides,
    effective: ClientSettings,
}

impl SettingsEngine {
    /// Uses `path_override` or `<config dir>/settings.json`.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let config_path = path_override.unwrap_or_else(|| platform::get_config_dir().join("settings.json"));
        Self {
            config_path,
            stored: ClientSettings::default(),
            overrides: EnvOverrides::default(),
            effective: ClientSettings::default(),
        }
    }

    /// Settings as they are (or will be) in the config file.
    pub fn stored_settings(&self) -> &ClientSettings {
        &self.stored
    }

    /// Whether the effective value of `key` comes from the environment.
    pub fn is_overridden(&self, key: SettingKey) -> bool {
        self.overrides.covers(key)
    }

    /// Applies `LINKVAULT_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides read through `lookup`. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        self.overrides = EnvOverrides {
            url: get(ENV_URL),
            anon_key: get(ENV_ANON_KEY),
            level: get(ENV_LOG),
        };
        if let Some(url) = &self.overrides.url {
            debug!(url = %url, "record store URL overridden from environment");
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        let mut effective = self.stored.clone();
        self.overrides.apply(&mut effective);
        self.effective = effective;
    }
}

impl SettingsEngineTrait for SettingsEngine {
    fn load(&mut self) -> Result<ClientSettings, SettingsError> {
        self.stored = if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)
                .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;
            let settings = serde_json::from_str(&content)
                .map_err(|e| SettingsError::SerializationError(format!("Failed to parse config file: {}", e)))?;
            debug!(path = %self.config_path.display(), "settings loaded");
            settings
        } else {
            ClientSettings::default()
        };
        self.recompute();
        Ok(self.effective.clone())
    }

    fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SettingsError::IoError(format!("Failed to create config directory: {}", e)))?;
        }
        let json = serde_json::to_string_pretty(&self.stored)
            .map_err(|e| SettingsError::SerializationError(format!("Failed to serialize settings: {}", e)))?;
        fs::write(&self.config_path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))
    }

    fn get_settings(&self) -> &ClientSettings {
        &self.effective
    }

    fn get_value(&self, key: SettingKey) -> String {
        let s = &self.effective;
        match key {
            SettingKey::Backend => match s.remote.backend {
                Backend::Supabase => "supabase".to_string(),
                Backend::Local => "local".to_string(),
            },
            SettingKey::Url => s.remote.url.clone(),
            SettingKey::AnonKey => s.remote.anon_key.clone(),
            SettingKey::DatabasePath => s.storage.database_path.clone().unwrap_or_default(),
            SettingKey::LogLevel => s.logging.level.clone(),
            SettingKey::LogFormat => match s.logging.format {
                LogFormat::Pretty => "pretty".to_string(),
                LogFormat::Json => "json".to_string(),
            },
        }
    }

    fn set_value(&mut self, key: SettingKey, value: &str) -> Result<(), SettingsError> {
        let value = value.trim();
        let mut next = self.stored.clone();
        match key {
            SettingKey::Backend => next.remote.backend = parse_backend(value)?,
            SettingKey::Url => next.remote.url = parse_base_url(value)?,
            SettingKey::AnonKey => next.remote.anon_key = value.to_string(),
            SettingKey::DatabasePath => {
                next.storage.database_path = (!value.is_empty()).then(|| value.to_string());
            }
            SettingKey::LogLevel => {
                EnvFilter::try_new(value).map_err(|e| invalid(key, e))?;
                next.logging.level = value.to_string();
            }
            SettingKey::LogFormat => next.logging.format = parse_log_format(value)?,
        }

        if next.remote.backend == Backend::Supabase && next.remote.url.is_empty() {
            return Err(invalid(key, "the supabase backend needs remote.url"));
        }

        self.stored = next;
        self.save()?;
        self.recompute();
        info!(key = %key, "setting updated");
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.stored = ClientSettings::default();
        self.save()?;
        self.recompute();
        info!("settings reset to defaults");
        Ok(())
    }

    fn config_path(&self) -> &Path {
        &self.config_path
    }
}
