//! Optional server configuration from `~/.config/testdeck/config.toml`.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Host address the API binds to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port the API binds to; 0 picks a free port (the port-discovery file
    /// tells collaborators which one).
    #[serde(default)]
    pub port: u16,
    /// Override for the registry document location.
    #[serde(default)]
    pub registry_path: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 0,
            registry_path: None,
        }
    }
}

/// Load the config file, falling back to defaults if it is missing or does
/// not parse.
pub fn load() -> Config {
    let Some(path) = crate::paths::config_file() else {
        return Config::default();
    };

    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return Config::default(),
    };

    match toml::from_str::<Config>(&contents) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to parse config at {}: {e}", path.display());
            Config::default()
        }
    }
}
