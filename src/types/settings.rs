use serde::{Deserialize, Serialize};

/// Top-level client settings container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientSettings {
    pub remote: RemoteSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

/// Which record store implementation the client talks to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Backend {
    /// Hosted Supabase-style service over HTTPS.
    Supabase,
    /// SQLite-backed store in the local database file.
    Local,
}

/// Connection settings for the record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteSettings {
    pub backend: Backend,
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public anonymous API key sent as the `apikey` header.
    pub anon_key: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Local,
            url: String::new(),
            anon_key: String::new(),
        }
    }
}

/// Local persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// Database file; `None` means `<data dir>/linkvault.db`.
    #[serde(default)]
    pub database_path: Option<String>,
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `"info"` or `"linkvault=debug"`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
