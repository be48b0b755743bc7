// LinkVault platform paths for Windows
// Config and data: %APPDATA%/LinkVault

use std::env;
use std::path::PathBuf;

use super::DirKind;

pub fn app_dir(_kind: DirKind) -> PathBuf {
    let appdata = env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("LinkVault")
}
