//! Configuration for the tailon dashboard.
//!
//! A TOML file under the platform config directory, overridable from the
//! environment (`TAILON_*`), translated into `tailon_core`'s runtime
//! `RemoteConfig` and `DashboardSettings`. The TUI layers its CLI flags on
//! top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tailon_core::{DashboardSettings, RemoteConfig, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for tailon_core::CoreError {
    fn from(err: ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Server root URL (e.g., "http://localhost:8080").
    #[serde(default = "default_server")]
    pub server: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Where the TUI writes its trace log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    #[serde(default)]
    pub dashboard: Dashboard,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: default_server(),
            timeout_secs: default_timeout(),
            insecure: false,
            ca_cert: None,
            log_file: None,
            dashboard: Dashboard::default(),
        }
    }
}

/// `[dashboard]` table: pacing and buffer sizes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Dashboard {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_refresh_delay")]
    pub refresh_delay_ms: u64,

    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_confirm_window")]
    pub confirm_window_secs: u64,

    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            refresh_delay_ms: default_refresh_delay(),
            settle_delay_ms: default_settle_delay(),
            confirm_window_secs: default_confirm_window(),
            log_capacity: default_log_capacity(),
        }
    }
}

fn default_server() -> String {
    "http://localhost:8080".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    30
}
fn default_refresh_delay() -> u64 {
    1000
}
fn default_settle_delay() -> u64 {
    300
}
fn default_confirm_window() -> u64 {
    15
}
fn default_log_capacity() -> usize {
    500
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "tailon", "tailon").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tailon");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TAILON_").split("__"))
}

/// Load and validate the config from `path` + environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    config.validate()?;
    Ok(config)
}

/// Load and validate the config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Validation and translation ──────────────────────────────────────

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server_url()?;
        if self.dashboard.log_capacity == 0 {
            return Err(ConfigError::Validation {
                field: "dashboard.log_capacity".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.dashboard.poll_interval_secs == 0 {
            return Err(ConfigError::Validation {
                field: "dashboard.poll_interval_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    fn server_url(&self) -> Result<url::Url, ConfigError> {
        let url: url::Url = self.server.parse().map_err(|_| ConfigError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {}", self.server),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "server".into(),
                reason: format!("expected an http(s) URL, got '{}'", self.server),
            });
        }
        Ok(url)
    }

    /// Build the core's connection config.
    pub fn to_remote_config(&self) -> Result<RemoteConfig, ConfigError> {
        let tls = if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        Ok(RemoteConfig {
            url: self.server_url()?,
            tls,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }

    pub fn dashboard_settings(&self) -> DashboardSettings {
        let d = &self.dashboard;
        DashboardSettings {
            poll_interval: Duration::from_secs(d.poll_interval_secs),
            refresh_delay: Duration::from_millis(d.refresh_delay_ms),
            settle_delay: Duration::from_millis(d.settle_delay_ms),
            confirm_window: Duration::from_secs(d.confirm_window_secs),
            log_capacity: d.log_capacity,
            ..DashboardSettings::default()
        }
    }
}
