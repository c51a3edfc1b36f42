use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PulseError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub http_addr: String,
    pub api_key: String,
    /// Accept requests without a key, logging a warning. Local dev only.
    pub allow_anonymous: bool,
    /// How long after a session ends a commit is still attributable to it.
    pub correlation_window: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let data_root = env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(home).join(".local/share"));

        Self {
            db_path: data_root.join("agentpulse/agentpulse.duckdb"),
            http_addr: "127.0.0.1:8787".to_string(),
            api_key: "dev_local_key".to_string(),
            allow_anonymous: false,
            correlation_window: Duration::from_secs(5 * 60),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        let config_path = config_file_path();
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides();
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        let env_overrides = load_env_overrides();
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    db_path: Option<PathBuf>,
    http_addr: Option<String>,
    api_key: Option<String>,
    allow_anonymous: Option<bool>,
    correlation_window: Option<String>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("AGENTPULSE_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("agentpulse/config.toml")
}

fn load_file_overrides(path: &PathBuf) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| PulseError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| PulseError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> ConfigOverrides {
    ConfigOverrides {
        db_path: env::var("AGENTPULSE_DB_PATH").ok().map(PathBuf::from),
        http_addr: env::var("AGENTPULSE_HTTP_ADDR").ok(),
        api_key: env::var("AGENTPULSE_API_KEY").ok(),
        allow_anonymous: env::var("AGENTPULSE_ALLOW_ANON")
            .ok()
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes")),
        correlation_window: env::var("AGENTPULSE_CORRELATION_WINDOW").ok(),
    }
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.db_path {
        cfg.db_path = v;
    }
    if let Some(v) = overrides.http_addr {
        cfg.http_addr = v;
    }
    if let Some(v) = overrides.api_key {
        cfg.api_key = v;
    }
    if let Some(v) = overrides.allow_anonymous {
        cfg.allow_anonymous = v;
    }
    if let Some(v) = overrides.correlation_window {
        cfg.correlation_window = humantime::parse_duration(&v).map_err(|e| {
            PulseError::Config(format!("bad correlation_window in {source}: {e} (value={v})"))
        })?;
    }
    Ok(())
}
