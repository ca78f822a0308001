//! Dashboard configuration loading.
//!
//! Precedence, lowest to highest: built-in defaults, config file, environment,
//! command-line flags (applied by the binary).
//!
//! The config file is the same `nightwatch.toml` the server reads. Dashboard
//! keys may sit at top level or under `[dashboard]`; the server's
//! `[nightwatch]` host/port are used to derive the API URL when no URL is set.

use crate::error::ConfigError;
use crate::storage::StorageConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const CONFIG_ENV: &str = "NIGHTWATCH_CONFIG";
pub const URL_ENV: &str = "NIGHTWATCH_URL";
pub const HOST_ENV: &str = "NIGHTWATCH_HOST";
pub const PORT_ENV: &str = "NIGHTWATCH_PORT";
pub const DATA_DIR_ENV: &str = "NIGHTWATCH_DATA_DIR";
pub const XDG_CONFIG_ENV: &str = "XDG_CONFIG_HOME";

const CONFIG_FILE_NAME: &str = "nightwatch.toml";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8037;
const DEFAULT_HEALTH_INTERVAL_MS: u64 = 3000;
const DEFAULT_SHIFT_INTERVAL_MS: u64 = 5000;
const DEFAULT_TASK_INTERVAL_MS: u64 = 5000;
const DEFAULT_NOTICE_TTL_MS: u64 = 2600;

#[derive(Debug, Clone, PartialEq)]
pub struct DashConfig {
    pub base_url: String,
    pub health_interval: Duration,
    pub shift_interval: Duration,
    pub task_interval: Duration,
    pub notice_ttl: Duration,
    pub data_dir: PathBuf,
    /// File the config was read from, if any.
    pub source: Option<PathBuf>,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            base_url: server_url(DEFAULT_HOST, DEFAULT_PORT),
            health_interval: Duration::from_millis(DEFAULT_HEALTH_INTERVAL_MS),
            shift_interval: Duration::from_millis(DEFAULT_SHIFT_INTERVAL_MS),
            task_interval: Duration::from_millis(DEFAULT_TASK_INTERVAL_MS),
            notice_ttl: Duration::from_millis(DEFAULT_NOTICE_TTL_MS),
            data_dir: StorageConfig::default().root().to_path_buf(),
            source: None,
        }
    }
}

impl DashConfig {
    pub fn storage(&self) -> StorageConfig {
        StorageConfig::with_root(self.data_dir.clone())
    }

    /// Replaces the API URL (e.g. from a `--url` flag) and re-validates.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = base_url.to_string();
        self.validate()
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        let url = self.base_url.trim().trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must start with http:// or https://: {}",
                self.base_url
            )));
        }
        self.base_url = url;

        for (name, value) in [
            ("health_interval_ms", self.health_interval),
            ("shift_interval_ms", self.shift_interval),
            ("task_interval_ms", self.task_interval),
            ("notice_ttl_ms", self.notice_ttl),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Invalid(format!("{} must be greater than 0", name)));
            }
        }
        Ok(self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// File Layout
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Clone, Deserialize)]
struct DashSection {
    base_url: Option<String>,
    health_interval_ms: Option<u64>,
    shift_interval_ms: Option<u64>,
    task_interval_ms: Option<u64>,
    notice_ttl_ms: Option<u64>,
    data_dir: Option<PathBuf>,
}

impl DashSection {
    fn merge(self, over: DashSection) -> DashSection {
        DashSection {
            base_url: over.base_url.or(self.base_url),
            health_interval_ms: over.health_interval_ms.or(self.health_interval_ms),
            shift_interval_ms: over.shift_interval_ms.or(self.shift_interval_ms),
            task_interval_ms: over.task_interval_ms.or(self.task_interval_ms),
            notice_ttl_ms: over.notice_ttl_ms.or(self.notice_ttl_ms),
            data_dir: over.data_dir.or(self.data_dir),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    dashboard: Option<DashSection>,
    #[serde(default)]
    nightwatch: Option<ServerSection>,
    #[serde(flatten)]
    top: DashSection,
}

fn server_url(host: &str, port: u16) -> String {
    format!("http://{}:{}", host, port)
}

fn apply_file(mut config: DashConfig, file: ConfigFile) -> DashConfig {
    let section = file.top.merge(file.dashboard.unwrap_or_default());

    if let Some(url) = section.base_url {
        config.base_url = url;
    } else if let Some(server) = file.nightwatch {
        if server.host.is_some() || server.port.is_some() {
            config.base_url = server_url(
                server.host.as_deref().unwrap_or(DEFAULT_HOST),
                server.port.unwrap_or(DEFAULT_PORT),
            );
        }
    }
    if let Some(ms) = section.health_interval_ms {
        config.health_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = section.shift_interval_ms {
        config.shift_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = section.task_interval_ms {
        config.task_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = section.notice_ttl_ms {
        config.notice_ttl = Duration::from_millis(ms);
    }
    if let Some(dir) = section.data_dir {
        config.data_dir = dir;
    }
    config
}

fn apply_env(mut config: DashConfig, lookup: &dyn Fn(&str) -> Option<String>) -> Result<DashConfig, ConfigError> {
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = non_empty(URL_ENV) {
        config.base_url = url;
    } else {
        let host = non_empty(HOST_ENV);
        let port = non_empty(PORT_ENV);
        if host.is_some() || port.is_some() {
            let port = match port {
                Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                    ConfigError::Invalid(format!("{} is not a valid port: {}", PORT_ENV, raw))
                })?,
                None => DEFAULT_PORT,
            };
            config.base_url = server_url(host.as_deref().unwrap_or(DEFAULT_HOST), port);
        }
    }

    if let Some(dir) = non_empty(DATA_DIR_ENV) {
        config.data_dir = PathBuf::from(dir);
    }
    Ok(config)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════════════════════════

/// Finds the config file: explicit path, then `NIGHTWATCH_CONFIG`, then
/// `./nightwatch.toml`, then `$XDG_CONFIG_HOME/nightwatch/nightwatch.toml`
/// (`~/.config` when unset, on every platform).
///
/// Only the explicit path and the env path are returned when missing, so that
/// a typo surfaces as a read error instead of silently using defaults.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    lookup: &dyn Fn(&str) -> Option<String>,
    cwd: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = lookup(CONFIG_ENV).filter(|value| !value.trim().is_empty()) {
        return Some(PathBuf::from(path));
    }
    if let Some(candidate) = cwd.map(|dir| dir.join(CONFIG_FILE_NAME)) {
        if candidate.exists() {
            return Some(candidate);
        }
    }
    let candidate = user_config_dir(lookup)?.join("nightwatch").join(CONFIG_FILE_NAME);
    candidate.exists().then_some(candidate)
}

fn user_config_dir(lookup: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    match lookup(XDG_CONFIG_ENV).filter(|value| !value.trim().is_empty()) {
        Some(dir) => Some(PathBuf::from(dir)),
        None => dirs::home_dir().map(|home| home.join(".config")),
    }
}

/// Parses a config file body on top of the defaults.
pub fn parse_config(content: &str, path: &Path) -> Result<DashConfig, ConfigError> {
    let file: ConfigFile = toml::from_str(content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        details: err.to_string(),
    })?;
    let mut config = apply_file(DashConfig::default(), file);
    config.source = Some(path.to_path_buf());
    Ok(config)
}

/// Loads configuration with an injectable environment.
pub fn load_config_with(
    explicit: Option<&Path>,
    lookup: &dyn Fn(&str) -> Option<String>,
    cwd: Option<&Path>,
) -> Result<DashConfig, ConfigError> {
    let config = match resolve_config_path(explicit, lookup, cwd) {
        Some(path) => {
            let content = fs_err::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "Loaded dashboard config");
            parse_config(&content, &path)?
        }
        None => DashConfig::default(),
    };

    apply_env(config, lookup)?.validate()
}

/// Loads configuration from the process environment and working directory.
pub fn load_config(explicit: Option<&Path>) -> Result<DashConfig, ConfigError> {
    let cwd = std::env::current_dir().ok();
    load_config_with(explicit, &|key| std::env::var(key).ok(), cwd.as_deref())
}
