// ── Application actions ──

use strum::{Display, EnumIter, IntoStaticStr};

use crate::model::Lifecycle;

/// A mutation the user can request on one application.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum AppAction {
    Start,
    Stop,
    Restart,
    /// Kill a process that is stuck in `stopping`.
    ForceStop,
}

impl AppAction {
    /// Destructive actions that need a second, confirming trigger.
    pub fn requires_confirmation(self) -> bool {
        matches!(self, Self::Stop | Self::Restart)
    }

    pub fn is_available(self, lifecycle: Lifecycle) -> bool {
        match self {
            Self::Start => matches!(lifecycle, Lifecycle::NotRunning { .. }),
            Self::Stop | Self::Restart => lifecycle.is_running(),
            Self::ForceStop => matches!(lifecycle, Lifecycle::Stopping),
        }
    }

    /// Actions offered in `lifecycle`, in display order.
    pub fn available(lifecycle: Lifecycle) -> &'static [AppAction] {
        match lifecycle {
            Lifecycle::Running { .. } => &[Self::Stop, Self::Restart],
            Lifecycle::Stopping => &[Self::ForceStop],
            Lifecycle::NotRunning { .. } => &[Self::Start],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Stop => "Stop",
            Self::Restart => "Restart",
            Self::ForceStop => "Force Stop",
        }
    }

    /// Label while waiting for the confirming trigger.
    pub fn confirm_label(self) -> Option<&'static str> {
        match self {
            Self::Stop => Some("Confirm Stop"),
            Self::Restart => Some("Confirm Restart"),
            Self::Start | Self::ForceStop => None,
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Start => "started",
            Self::Stop => "stopped",
            Self::Restart => "restarted",
            Self::ForceStop => "force stopped",
        }
    }
}
