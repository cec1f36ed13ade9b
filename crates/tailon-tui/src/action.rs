//! All possible UI actions. Actions are the sole mechanism for state mutation.

use tailon_core::{Actor, AppAction, CoreError, Notice, NoticeKind, Snapshot};

use crate::screen::ScreenId;

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl From<Notice> for Notification {
    fn from(notice: Notice) -> Self {
        let level = match notice.kind {
            NoticeKind::Success => NotificationLevel::Success,
            NoticeKind::Error => NotificationLevel::Error,
        };
        Self {
            message: notice.message,
            level,
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    ToggleHelp,

    // ── Data Events (from the data bridge) ────────────────────────
    SnapshotLoaded(Result<Snapshot, CoreError>),
    /// Current user; `None` when `/whoami` failed.
    WhoamiLoaded(Option<Actor>),
    /// Ask the data bridge for an immediate fetch.
    RequestRefresh,

    // ── Application Control ───────────────────────────────────────
    /// A trigger got through a card's guard; run it against the server.
    ExecuteAction { app: String, action: AppAction },
    ActionFinished {
        app: String,
        action: AppAction,
        result: Result<(), CoreError>,
    },

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_maps_to_notification_level() {
        let ok: Notification = Notice::success("Successfully started web").into();
        assert_eq!(ok.level, NotificationLevel::Success);
        assert_eq!(ok.message, "Successfully started web");

        let err: Notification = Notice::error("Failed to stop web: boom").into();
        assert_eq!(err.level, NotificationLevel::Error);
    }
}
