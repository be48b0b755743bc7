// LinkVault platform paths for macOS
// Config and data: ~/Library/Application Support/LinkVault

use std::env;
use std::path::PathBuf;

use super::DirKind;

pub fn app_dir(_kind: DirKind) -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
        .join("Library")
        .join("Application Support")
        .join("LinkVault")
}
