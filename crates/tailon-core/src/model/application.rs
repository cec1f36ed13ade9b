// ── Application domain types ──

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Full server snapshot keyed (and therefore ordered) by application name.
pub type Snapshot = BTreeMap<String, ApplicationState>;

/// Server-reported state of one managed application, immutable per fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationState {
    pub name: String,
    pub lifecycle: Lifecycle,
    /// When (and by whom) the lifecycle last changed, if the server knows.
    pub state_change: Option<StateChange>,
    pub config: LaunchConfig,
}

/// Process lifecycle. Data that only makes sense in one state lives in
/// that variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Running { pid: Option<u32> },
    Stopping,
    NotRunning { last_exit_code: Option<i32> },
}

impl Lifecycle {
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub fn pid(self) -> Option<u32> {
        match self {
            Self::Running { pid } => pid,
            _ => None,
        }
    }
}

/// A lifecycle transition. Attribution cannot exist without a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub at: DateTime<Utc>,
    pub by: Option<Actor>,
}

/// Identity the server attributed an action (or this session) to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub display_name: String,
    pub login_name: Option<String>,
    pub is_anonymous: bool,
}

impl Actor {
    /// Best human-readable name: display name, then login name, then id.
    pub fn name(&self) -> &str {
        if !self.display_name.is_empty() {
            return &self.display_name;
        }
        match self.login_name.as_deref() {
            Some(login) if !login.is_empty() => login,
            _ => &self.id,
        }
    }
}

/// Static launch configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchConfig {
    pub path: String,
    pub args: Vec<String>,
    /// `KEY=value` entries; `None` when the server redacted them.
    pub env: Option<Vec<String>>,
    pub working_dir: Option<String>,
}

impl LaunchConfig {
    /// `path arg1 arg2 …` as a single display string.
    pub fn command_line(&self) -> String {
        std::iter::once(self.path.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(display: &str, login: Option<&str>) -> Actor {
        Actor {
            id: "u-17".into(),
            display_name: display.into(),
            login_name: login.map(Into::into),
            is_anonymous: false,
        }
    }

    #[test]
    fn actor_name_fallback_chain() {
        assert_eq!(actor("Ada", Some("ada@example.com")).name(), "Ada");
        assert_eq!(actor("", Some("ada@example.com")).name(), "ada@example.com");
        assert_eq!(actor("", None).name(), "u-17");
        assert_eq!(actor("", Some("")).name(), "u-17");
    }

    #[test]
    fn command_line_joins_path_and_args() {
        let config = LaunchConfig {
            path: "/usr/bin/python3".into(),
            args: vec!["-m".into(), "http.server".into()],
            ..LaunchConfig::default()
        };
        assert_eq!(config.command_line(), "/usr/bin/python3 -m http.server");
    }

    #[test]
    fn pid_only_while_running() {
        assert_eq!(Lifecycle::Running { pid: Some(9) }.pid(), Some(9));
        assert_eq!(Lifecycle::Stopping.pid(), None);
        assert!(!Lifecycle::NotRunning { last_exit_code: None }.is_running());
    }
}
