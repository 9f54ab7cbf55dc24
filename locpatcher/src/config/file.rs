//! `config.ini` handling.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::net::{NetworkConfig, DEFAULT_TIMEOUT_SECS, USER_AGENT};
use crate::sync::{
    RetryPolicy, SyncConfig, DEFAULT_BASE_DELAY, DEFAULT_MANIFEST_URL, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_REMOTE_HOST,
};

/// Settings file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Tracked-file list name inside the config directory.
pub const TRACKED_FILES_NAME: &str = "tracked_files.txt";

/// Log file name inside the log directory.
pub const LOG_FILE_NAME: &str = "locpatcher.log";

/// Largest accepted `network.timeout_secs` (one day).
const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Largest accepted `retry.base_delay_secs` (one hour).
const MAX_BASE_DELAY_SECS: f64 = 60.0 * 60.0;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// `[patcher]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatcherSettings {
    /// Game installation root. `None` until the user picks one.
    pub working_dir: Option<PathBuf>,
    pub manifest_url: String,
    pub remote_host: String,
}

impl Default for PatcherSettings {
    fn default() -> Self {
        Self {
            working_dir: None,
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            remote_host: DEFAULT_REMOTE_HOST.to_string(),
        }
    }
}

/// `[network]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// `[retry]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_secs: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_secs: DEFAULT_BASE_DELAY.as_secs_f64(),
        }
    }
}

/// User configuration, as stored in `config.ini`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub patcher: PatcherSettings,
    pub network: NetworkSettings,
    pub retry: RetrySettings,
}

impl ConfigFile {
    /// Load configuration from the default path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// Missing keys keep their defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        Self::from_ini(&ini)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        self.to_ini()
            .write_to_file(path)
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Engine configuration for the configured installation.
    ///
    /// `working_dir` overrides the stored directory (e.g. a `--dir` flag).
    /// Returns `None` when neither is set.
    pub fn sync_config(&self, working_dir: Option<&Path>) -> Option<SyncConfig> {
        let root = working_dir
            .map(Path::to_path_buf)
            .or_else(|| self.patcher.working_dir.clone())?;

        // Fields are public, so values set in code skip the load-time bounds.
        let base_delay = Duration::try_from_secs_f64(
            self.retry.base_delay_secs.clamp(0.0, MAX_BASE_DELAY_SECS),
        )
        .unwrap_or(DEFAULT_BASE_DELAY);
        let retry = RetryPolicy::new(self.retry.max_attempts, base_delay);

        Some(
            SyncConfig::new(root)
                .with_manifest_url(self.patcher.manifest_url.clone())
                .with_remote_host(self.patcher.remote_host.clone())
                .with_retry(retry),
        )
    }

    /// HTTP client settings.
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig::default()
            .with_timeout(Duration::from_secs(
                self.network.timeout_secs.clamp(1, MAX_TIMEOUT_SECS),
            ))
            .with_user_agent(self.network.user_agent.clone())
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigFileError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("patcher")) {
            if let Some(v) = section.get("working_dir") {
                let v = v.trim();
                if !v.is_empty() {
                    config.patcher.working_dir = Some(PathBuf::from(v));
                }
            }
            if let Some(v) = section.get("manifest_url") {
                config.patcher.manifest_url = parse_url("patcher", "manifest_url", v)?;
            }
            if let Some(v) = section.get("remote_host") {
                config.patcher.remote_host = parse_url("patcher", "remote_host", v)?;
            }
        }

        if let Some(section) = ini.section(Some("network")) {
            if let Some(v) = section.get("timeout_secs") {
                config.network.timeout_secs = match v.trim().parse::<u64>() {
                    Ok(secs) if secs > 0 && secs <= MAX_TIMEOUT_SECS => secs,
                    _ => {
                        return Err(invalid(
                            "network",
                            "timeout_secs",
                            v,
                            "must be a whole number of seconds between 1 and 86400",
                        ))
                    }
                };
            }
            if let Some(v) = section.get("user_agent") {
                let v = v.trim();
                if !v.is_empty() {
                    config.network.user_agent = v.to_string();
                }
            }
        }

        if let Some(section) = ini.section(Some("retry")) {
            if let Some(v) = section.get("max_attempts") {
                config.retry.max_attempts = match v.trim().parse::<u32>() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        return Err(invalid(
                            "retry",
                            "max_attempts",
                            v,
                            "must be a whole number of at least 1",
                        ))
                    }
                };
            }
            if let Some(v) = section.get("base_delay_secs") {
                config.retry.base_delay_secs = match v.trim().parse::<f64>() {
                    Ok(secs) if (0.0..=MAX_BASE_DELAY_SECS).contains(&secs) => secs,
                    _ => {
                        return Err(invalid(
                            "retry",
                            "base_delay_secs",
                            v,
                            "must be a number of seconds between 0 and 3600",
                        ))
                    }
                };
            }
        }

        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let working_dir = self
            .patcher
            .working_dir
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut ini = Ini::new();
        ini.with_section(Some("patcher"))
            .set("working_dir", working_dir)
            .set("manifest_url", self.patcher.manifest_url.as_str())
            .set("remote_host", self.patcher.remote_host.as_str());
        ini.with_section(Some("network"))
            .set("timeout_secs", self.network.timeout_secs.to_string())
            .set("user_agent", self.network.user_agent.as_str());
        ini.with_section(Some("retry"))
            .set("max_attempts", self.retry.max_attempts.to_string())
            .set("base_delay_secs", self.retry.base_delay_secs.to_string());
        ini
    }
}

fn parse_url(section: &str, key: &str, value: &str) -> Result<String, ConfigFileError> {
    let v = value.trim();
    if v.starts_with("http://") || v.starts_with("https://") {
        Ok(v.to_string())
    } else {
        Err(invalid(section, key, value, "must be an http:// or https:// URL"))
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Get the path to the config directory.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("locpatcher")
}

/// Get the path to the config file.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Get the path to the tracked-file list.
pub fn tracked_files_path() -> PathBuf {
    config_directory().join(TRACKED_FILES_NAME)
}

/// Get the directory log files are written to.
pub fn log_directory() -> PathBuf {
    config_directory().join("logs")
}
