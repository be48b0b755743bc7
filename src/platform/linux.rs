// LinkVault platform paths for Linux
// Config: $XDG_CONFIG_HOME/linkvault, default ~/.config/linkvault
// Data:   $XDG_DATA_HOME/linkvault, default ~/.local/share/linkvault

use std::env;
use std::path::PathBuf;

use super::DirKind;

const APP_DIR: &str = "linkvault";

pub fn app_dir(kind: DirKind) -> PathBuf {
    let (xdg_var, fallback): (&str, &[&str]) = match kind {
        DirKind::Config => ("XDG_CONFIG_HOME", &[".config"]),
        DirKind::Data => ("XDG_DATA_HOME", &[".local", "share"]),
    };

    if let Ok(xdg) = env::var(xdg_var) {
        return PathBuf::from(xdg).join(APP_DIR);
    }
    let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
    let mut path = PathBuf::from(home);
    path.extend(fallback);
    path.join(APP_DIR)
}
