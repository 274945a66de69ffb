//! Default path resolution for application data files.
//!
//! Follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/testdeck/config.toml`, fallback
//!   `$HOME/.config/testdeck/config.toml`
//! - Registry document: `$XDG_DATA_HOME/testdeck/registry.json`, fallback
//!   `$HOME/.local/share/testdeck/registry.json`
//! - Port-discovery file: alongside the registry, `api.port`
//!
//! These are defaults only; the store always takes its path by injection, so
//! tests point isolated instances at temporary directories instead.

use std::path::PathBuf;

const APP_DIR: &str = "testdeck";

fn config_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join(APP_DIR));
    }
    std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config").join(APP_DIR))
}

fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
        return Some(PathBuf::from(xdg).join(APP_DIR));
    }
    std::env::var_os("HOME").map(|h| {
        PathBuf::from(h)
            .join(".local")
            .join("share")
            .join(APP_DIR)
    })
}

/// `config.toml` location, or `None` when neither XDG nor HOME is set.
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Default location of the registry document.
pub fn registry_file() -> Option<PathBuf> {
    data_dir().map(|d| d.join("registry.json"))
}

/// Plain-text file holding the decimal port of the running API process, used
/// by collaborators to locate it without a fixed port.
pub fn port_file() -> Option<PathBuf> {
    data_dir().map(|d| d.join("api.port"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_share_the_data_dir() {
        if std::env::var_os("HOME").is_none() && std::env::var_os("XDG_DATA_HOME").is_none() {
            return;
        }
        let registry = registry_file().unwrap();
        let port = port_file().unwrap();
        assert_eq!(registry.parent(), port.parent());
        assert_eq!(registry.file_name().unwrap(), "registry.json");
        assert_eq!(port.file_name().unwrap(), "api.port");
    }
}
