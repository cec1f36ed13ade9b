// ── Application view model ──
//
// Pure derivation of everything a card header shows from the server
// state and the current wall-clock time. Recomputed on every update and
// on the card's one-second runtime tick.

use chrono::{DateTime, Utc};
use strum::Display;

use crate::model::{ApplicationState, Lifecycle};

/// Coarse status used for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum StatusClass {
    Running,
    Stopping,
    Stopped,
}

/// Derived presentation state of one card header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    /// e.g. `Running (PID: 4242)`, `Stopped (1)`.
    pub status_label: String,
    pub status: StatusClass,
    /// Time since the last state change, if known.
    pub elapsed: Option<String>,
    /// e.g. `Started by Ada`; absent for anonymous or unknown actors.
    pub attribution: Option<String>,
    /// Elapsed and attribution joined, or a placeholder.
    pub runtime_line: String,
}

/// Human-readable duration of a millisecond delta. Negative deltas clamp
/// to zero.
pub fn format_duration(millis: i64) -> String {
    let seconds = millis.max(0) / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{days}d {}h {}m", hours % 24, minutes % 60)
    } else if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else if minutes > 0 {
        format!("{minutes}m {}s", seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

fn status_label(lifecycle: Lifecycle) -> (String, StatusClass) {
    match lifecycle {
        Lifecycle::Running { pid: Some(pid) } => {
            (format!("Running (PID: {pid})"), StatusClass::Running)
        }
        Lifecycle::Running { pid: None } => ("Running".to_owned(), StatusClass::Running),
        Lifecycle::Stopping => ("Stopping".to_owned(), StatusClass::Stopping),
        Lifecycle::NotRunning {
            last_exit_code: Some(code),
        } if code != 0 => (format!("Stopped ({code})"), StatusClass::Stopped),
        Lifecycle::NotRunning { .. } => ("Stopped".to_owned(), StatusClass::Stopped),
    }
}

pub fn derive(app: &ApplicationState, now: DateTime<Utc>) -> CardView {
    let (status_label, status) = status_label(app.lifecycle);

    let elapsed = app.state_change.as_ref().map(|change| {
        let duration = format_duration((now - change.at).num_milliseconds());
        match app.lifecycle {
            Lifecycle::Running { .. } => format!("Running for {duration}"),
            Lifecycle::Stopping => format!("Stopping for {duration}"),
            Lifecycle::NotRunning { .. } => format!("Stopped {duration} ago"),
        }
    });

    let attribution = app
        .state_change
        .as_ref()
        .and_then(|change| change.by.as_ref())
        .filter(|actor| !actor.is_anonymous)
        .map(|actor| {
            let name = actor.name();
            match app.lifecycle {
                Lifecycle::Running { .. } => format!("Started by {name}"),
                Lifecycle::Stopping => format!("Being stopped by {name}"),
                Lifecycle::NotRunning { .. } => format!("Stopped by {name}"),
            }
        });

    let items: Vec<&str> = elapsed.iter().chain(attribution.iter()).map(String::as_str).collect();
    let runtime_line = if items.is_empty() {
        match app.lifecycle {
            Lifecycle::NotRunning { .. } => "Not running".to_owned(),
            _ => "No runtime information available".to_owned(),
        }
    } else {
        items.join(" \u{2022} ")
    };

    CardView {
        status_label,
        status,
        elapsed,
        attribution,
        runtime_line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use pretty_assertions::assert_eq;

    use crate::model::{Actor, LaunchConfig, StateChange};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn app(lifecycle: Lifecycle, change: Option<StateChange>) -> ApplicationState {
        ApplicationState {
            name: "web".into(),
            lifecycle,
            state_change: change,
            config: LaunchConfig::default(),
        }
    }

    fn changed(secs_ago: i64, by: Option<Actor>) -> Option<StateChange> {
        Some(StateChange {
            at: now() - TimeDelta::seconds(secs_ago),
            by,
        })
    }

    fn ada(anonymous: bool) -> Actor {
        Actor {
            id: "u1".into(),
            display_name: "Ada".into(),
            login_name: None,
            is_anonymous: anonymous,
        }
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(45_000), "45s");
        assert_eq!(format_duration(125_000), "2m 5s");
        assert_eq!(format_duration(3_700_000), "1h 1m");
        assert_eq!(format_duration(90_000_000), "1d 1h 0m");
        assert_eq!(format_duration(999), "0s");
        assert_eq!(format_duration(-5_000), "0s");
    }

    #[test]
    fn running_with_pid_and_actor() {
        let view = derive(
            &app(Lifecycle::Running { pid: Some(4242) }, changed(45, Some(ada(false)))),
            now(),
        );
        assert_eq!(view.status_label, "Running (PID: 4242)");
        assert_eq!(view.status, StatusClass::Running);
        assert_eq!(view.runtime_line, "Running for 45s \u{2022} Started by Ada");
    }

    #[test]
    fn stopped_with_nonzero_exit_code() {
        let view = derive(
            &app(Lifecycle::NotRunning { last_exit_code: Some(1) }, changed(125, None)),
            now(),
        );
        assert_eq!(view.status_label, "Stopped (1)");
        assert_eq!(view.runtime_line, "Stopped 2m 5s ago");
    }

    #[test]
    fn zero_exit_code_is_not_shown() {
        let view = derive(&app(Lifecycle::NotRunning { last_exit_code: Some(0) }, None), now());
        assert_eq!(view.status_label, "Stopped");
        assert_eq!(view.runtime_line, "Not running");
    }

    #[test]
    fn anonymous_actor_is_omitted() {
        let view = derive(&app(Lifecycle::Stopping, changed(3700, Some(ada(true)))), now());
        assert_eq!(view.attribution, None);
        assert_eq!(view.runtime_line, "Stopping for 1h 1m");
    }

    #[test]
    fn stopping_attribution_wording() {
        let view = derive(&app(Lifecycle::Stopping, changed(1, Some(ada(false)))), now());
        assert_eq!(view.attribution.as_deref(), Some("Being stopped by Ada"));
    }

    #[test]
    fn no_information_placeholder() {
        let view = derive(&app(Lifecycle::Running { pid: None }, None), now());
        assert_eq!(view.status_label, "Running");
        assert_eq!(view.runtime_line, "No runtime information available");
    }

    #[test]
    fn future_timestamp_clamps_to_zero() {
        let view = derive(&app(Lifecycle::Running { pid: None }, changed(-30, None)), now());
        assert_eq!(view.elapsed.as_deref(), Some("Running for 0s"));
    }
}
