use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub stations: StationsConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// External player invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Executable name (looked up on PATH) or path.
    #[serde(default = "default_executable")]
    pub executable: String,
    /// Arguments inserted before `-quiet`, e.g. `["-cache", "1024"]`.
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Volume gauge level shown right after a station starts, before the
    /// player reports its own level.
    #[serde(default = "default_volume")]
    pub default_volume: u16,
}

/// Station catalog source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationsConfig {
    /// Local catalog file (CSV `name,url` or `.m3u`).
    #[serde(default = "default_stations_path")]
    pub path: PathBuf,
    /// Downloaded into `path` when the file does not exist yet.
    #[serde(default = "default_remote_url")]
    pub remote_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    /// Show the diagnostic log pane.
    #[serde(default)]
    pub debug: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            extra_args: Vec::new(),
            default_volume: default_volume(),
        }
    }
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            path: default_stations_path(),
            remote_url: default_remote_url(),
        }
    }
}

fn default_executable() -> String {
    platform::player_binary_name().to_string()
}

fn default_volume() -> u16 {
    25
}

fn default_stations_path() -> PathBuf {
    platform::config_dir().join("stations.csv")
}

fn default_remote_url() -> String {
    "https://raw.githubusercontent.com/coderholic/pyradio/master/pyradio/stations.csv".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.stations.path = platform::expand_home(&config.stations.path);
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
