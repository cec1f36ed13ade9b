// ── Runtime connection and dashboard configuration ──
//
// These types describe *how* to reach the server and how the dashboard
// paces itself. They never touch disk; `tailon-config` builds them from
// the TOML file and environment, and the TUI hands them in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Where the server lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Server root (e.g. `http://localhost:8080`); `/api/v1` is appended.
    pub url: Url,
    pub tls: TlsVerification,
    /// Per-request timeout. Log streams only use it for connecting.
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Pacing of the dashboard's deadlines and buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSettings {
    /// Background snapshot poll.
    pub poll_interval: Duration,
    /// Delay between a successful action and the follow-up refresh.
    pub refresh_delay: Duration,
    /// Delay between expanding a card and opening its log stream.
    pub settle_delay: Duration,
    /// How long a destructive action waits for its confirming trigger.
    pub confirm_window: Duration,
    /// Lines kept per log stream.
    pub log_capacity: usize,
    /// Cadence of the elapsed-time display.
    pub runtime_tick: Duration,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            refresh_delay: Duration::from_millis(1000),
            settle_delay: Duration::from_millis(300),
            confirm_window: Duration::from_secs(15),
            log_capacity: 500,
            runtime_tick: Duration::from_secs(1),
        }
    }
}
