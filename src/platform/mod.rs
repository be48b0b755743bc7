// LinkVault platform abstraction
// Resolves where the client keeps its settings file and local database.
//
// Uses `cfg(target_os)` to pick the platform implementation at compile time.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
use linux as os;

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
use macos as os;

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
use windows as os;

/// File name of the local database inside the data directory.
pub const DATABASE_FILE: &str = "linkvault.db";

/// Which per-user directory is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirKind {
    Config,
    Data,
}

/// Returns the platform-specific configuration directory for LinkVault.
///
/// - **Linux**: `$XDG_CONFIG_HOME/linkvault` or `~/.config/linkvault`
/// - **macOS**: `~/Library/Application Support/LinkVault`
/// - **Windows**: `%APPDATA%/LinkVault`
pub fn get_config_dir() -> PathBuf {
    os::app_dir(DirKind::Config)
}

/// Returns the platform-specific data directory for LinkVault.
///
/// - **Linux**: `$XDG_DATA_HOME/linkvault` or `~/.local/share/linkvault`
/// - **macOS / Windows**: same as the config directory
pub fn get_data_dir() -> PathBuf {
    os::app_dir(DirKind::Data)
}

/// Default location of the SQLite database.
pub fn default_database_path() -> PathBuf {
    get_data_dir().join(DATABASE_FILE)
}
