// Wire types for the tailon REST API.
//
// These mirror the JSON the server emits. Optional fields cover both the
// `omitempty` tags and the policy-driven redaction of `config.env`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state reported for an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Running,
    Stopping,
    NotRunning,
    /// Anything newer servers may add.
    #[serde(other)]
    Unknown,
}

/// Static launch configuration of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    /// `None` when the server redacted the environment.
    #[serde(default)]
    pub env: Option<Vec<String>>,
    #[serde(default)]
    pub working_dir: Option<String>,
}

/// Identity attached to a state change, as resolved by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub login_name: Option<String>,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// One entry of the `GET /apps` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationResponse {
    #[serde(default)]
    pub config: AppConfig,
    pub state: LifecycleState,
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default)]
    pub last_exit_code: Option<i32>,
    #[serde(default)]
    pub state_changed_by: Option<User>,
    #[serde(default)]
    pub state_changed_at: Option<DateTime<Utc>>,
}

/// Body returned by the start/stop/restart endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub status: String,
}

/// Structured payload of one log-stream event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}
