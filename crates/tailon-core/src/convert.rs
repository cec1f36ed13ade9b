// ── API-to-domain type conversions ──
//
// Bridges raw `tailon_api` response types into `tailon_core::model`.
// The wire format allows combinations the domain forbids (a pid on a
// stopped process, an actor without a timestamp); those are normalized
// away here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use tailon_api::{ApplicationResponse, LifecycleState, LogEntry, User};

use crate::error::CoreError;
use crate::model::{
    Actor, ApplicationState, LaunchConfig, Lifecycle, LineKind, LineSource, LogLine, Snapshot,
    StateChange,
};

// ── Applications ───────────────────────────────────────────────────

impl From<User> for Actor {
    fn from(u: User) -> Self {
        Actor {
            id: u.id,
            display_name: u.display_name,
            login_name: u.login_name,
            is_anonymous: u.is_anonymous,
        }
    }
}

fn lifecycle(resp: &ApplicationResponse, name: &str) -> Lifecycle {
    match resp.state {
        LifecycleState::Running => Lifecycle::Running { pid: resp.pid },
        LifecycleState::Stopping => Lifecycle::Stopping,
        LifecycleState::NotRunning => Lifecycle::NotRunning {
            last_exit_code: resp.last_exit_code,
        },
        LifecycleState::Unknown => {
            warn!(app = %name, "unrecognised lifecycle state, treating as not running");
            Lifecycle::NotRunning {
                last_exit_code: resp.last_exit_code,
            }
        }
    }
}

/// Convert one entry of the `GET /apps` mapping.
pub fn application(name: String, resp: ApplicationResponse) -> ApplicationState {
    let lifecycle = lifecycle(&resp, &name);

    let state_change = resp.state_changed_at.map(|at| StateChange {
        at,
        by: resp.state_changed_by.map(Actor::from),
    });

    ApplicationState {
        name,
        lifecycle,
        state_change,
        config: LaunchConfig {
            path: resp.config.path,
            args: resp.config.args.unwrap_or_default(),
            env: resp.config.env,
            working_dir: resp.config.working_dir,
        },
    }
}

/// Convert the full `GET /apps` mapping. Keys are authoritative for names.
pub fn snapshot(raw: BTreeMap<String, ApplicationResponse>) -> Snapshot {
    raw.into_iter()
        .map(|(name, resp)| (name.clone(), application(name, resp)))
        .collect()
}

// ── Log lines ──────────────────────────────────────────────────────

impl From<LogEntry> for LogLine {
    fn from(entry: LogEntry) -> Self {
        LogLine {
            timestamp: entry.timestamp,
            message: entry.message,
            level: entry.level.as_deref().and_then(|l| l.parse().ok()),
            source: LineSource::from_wire(entry.source.as_deref()),
            kind: LineKind::Output,
        }
    }
}

/// Decode a pushed `data:` payload as a structured log entry.
pub fn decode_log_line(payload: &str) -> Result<LogLine, CoreError> {
    serde_json::from_str::<LogEntry>(payload)
        .map(LogLine::from)
        .map_err(|e| CoreError::Decode {
            message: e.to_string(),
        })
}

/// Decode a payload, falling back to a plain stdout line stamped `now`.
pub fn log_line_or_plain(payload: String, now: DateTime<Utc>) -> LogLine {
    decode_log_line(&payload).unwrap_or_else(|_| LogLine::plain(payload, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tailon_api::AppConfig;

    use crate::model::LogLevel;

    fn user() -> User {
        User {
            id: "u1".into(),
            display_name: "Ada".into(),
            login_name: Some("ada@example.com".into()),
            node: Some("laptop".into()),
            is_anonymous: false,
        }
    }

    fn response(state: LifecycleState) -> ApplicationResponse {
        ApplicationResponse {
            config: AppConfig {
                name: Some("web".into()),
                path: "/srv/web".into(),
                args: Some(vec!["--port".into(), "80".into()]),
                env: None,
                working_dir: None,
            },
            state,
            pid: Some(77),
            last_exit_code: Some(2),
            state_changed_by: Some(user()),
            state_changed_at: Some(Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap()),
        }
    }

    #[test]
    fn running_keeps_pid_and_drops_exit_code() {
        let app = application("web".into(), response(LifecycleState::Running));
        assert_eq!(app.lifecycle, Lifecycle::Running { pid: Some(77) });
        assert_eq!(app.config.args, vec!["--port".to_string(), "80".to_string()]);
        assert!(app.config.env.is_none());
    }

    #[test]
    fn not_running_keeps_exit_code_and_drops_pid() {
        let app = application("web".into(), response(LifecycleState::NotRunning));
        assert_eq!(app.lifecycle, Lifecycle::NotRunning { last_exit_code: Some(2) });
        assert_eq!(app.lifecycle.pid(), None);
    }

    #[test]
    fn actor_without_timestamp_is_dropped() {
        let mut resp = response(LifecycleState::Stopping);
        resp.state_changed_at = None;
        let app = application("web".into(), resp);
        assert_eq!(app.state_change, None);
    }

    #[test]
    fn actor_with_timestamp_is_kept() {
        let app = application("web".into(), response(LifecycleState::Running));
        let change = app.state_change.unwrap();
        assert_eq!(change.by.unwrap().name(), "Ada");
    }

    #[test]
    fn snapshot_uses_map_keys_as_names() {
        let mut raw = BTreeMap::new();
        raw.insert("api".to_string(), response(LifecycleState::Running));
        let snap = snapshot(raw);
        assert_eq!(snap["api"].name, "api");
    }

    #[test]
    fn structured_payload_decodes() {
        let line = decode_log_line(
            r#"{"timestamp":"2026-01-01T10:00:00Z","message":"boot","level":"warning","source":"stderr"}"#,
        )
        .unwrap();
        assert_eq!(line.message, "boot");
        assert_eq!(line.level, Some(LogLevel::Warn));
        assert_eq!(line.source, LineSource::Stderr);
    }

    #[test]
    fn plain_payload_falls_back_to_stdout() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        assert!(matches!(decode_log_line("not json"), Err(CoreError::Decode { .. })));
        let line = log_line_or_plain("not json".into(), now);
        assert_eq!(line, LogLine::plain("not json", now));
    }
}
