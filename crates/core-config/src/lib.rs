//! Configuration loading and parsing.
//!
//! Parses `gridspeak.toml` (or an override path provided by the binary). Every section and
//! field is optional; absent values fall back to the defaults below. Unknown fields are
//! ignored so older binaries tolerate newer files.
//!
//! Base URL precedence is resolved by `Config::resolve_base_url`:
//! CLI flag > `GRIDSPEAK_API_URL` environment variable > file > default.

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "gridspeak.toml";
pub const API_URL_ENV: &str = "GRIDSPEAK_API_URL";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    #[serde(default = "BackendConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "BackendConfig::default_health_interval_secs")]
    pub health_interval_secs: u64,
    /// Absent means requests may hang indefinitely (a stuck request keeps the grid loading).
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            health_interval_secs: Self::default_health_interval_secs(),
            request_timeout_ms: None,
        }
    }
}

impl BackendConfig {
    fn default_base_url() -> String {
        "http://localhost:8000".to_string()
    }
    const fn default_health_interval_secs() -> u64 {
        30
    }

    /// Health interval clamped to at least one second so a zero in the file cannot spin.
    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    /// When true only the most recently issued request may update the grid.
    #[serde(default = "GenerationConfig::default_true")]
    pub suppress_stale_responses: bool,
    /// Fire the `/api/generate-cache` hint after each applied fetch.
    #[serde(default = "GenerationConfig::default_true")]
    pub warm_cache: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            suppress_stale_responses: true,
            warm_cache: true,
        }
    }
}

impl GenerationConfig {
    const fn default_true() -> bool {
        true
    }
}

/// Key names per activation. Parsing into concrete key codes lives in `core-input`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct KeysConfig {
    #[serde(default = "KeysConfig::default_right")]
    pub right: Vec<String>,
    #[serde(default = "KeysConfig::default_down")]
    pub down: Vec<String>,
    #[serde(default = "KeysConfig::default_select")]
    pub select: Vec<String>,
    #[serde(default = "KeysConfig::default_quit")]
    pub quit: Vec<String>,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            right: Self::default_right(),
            down: Self::default_down(),
            select: Self::default_select(),
            quit: Self::default_quit(),
        }
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl KeysConfig {
    // Digits mirror the clench indicator numbering: 1 right, 2 down, 3 select.
    fn default_right() -> Vec<String> {
        names(&["1", "l", "Right"])
    }
    fn default_down() -> Vec<String> {
        names(&["2", "j", "Down"])
    }
    fn default_select() -> Vec<String> {
        names(&["3", "Enter", "Space"])
    }
    fn default_quit() -> Vec<String> {
        names(&["q", "Esc"])
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub keys: KeysConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub source: Option<PathBuf>,
    pub file: ConfigFile,
}

/// Best-effort config path: working directory first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("gridspeak").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_absent_using_defaults");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config {
                source: Some(path),
                file,
            })
        }
        Err(err) => {
            // A broken file must not keep the user from communicating; run on defaults.
            warn!(target: "config", path = %path.display(), error = %err, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Resolve the backend base URL from CLI override, environment, and file, in that order.
    /// Trailing slashes are stripped so endpoint joins stay canonical.
    pub fn resolve_base_url(&self, cli: Option<&str>, env: Option<&str>) -> String {
        let chosen = cli
            .filter(|s| !s.trim().is_empty())
            .or(env.filter(|s| !s.trim().is_empty()))
            .unwrap_or(self.file.backend.base_url.as_str());
        chosen.trim().trim_end_matches('/').to_string()
    }

    /// Convenience wrapper reading `GRIDSPEAK_API_URL` from the process environment.
    pub fn base_url_with_env(&self, cli: Option<&str>) -> String {
        let env = std::env::var(API_URL_ENV).ok();
        self.resolve_base_url(cli, env.as_deref())
    }
}
