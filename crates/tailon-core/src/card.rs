// ── Application card ──
//
// One expandable unit per application: header view model, confirmation
// guard, busy flag, and (after the first expansion) a details panel with
// its log stream. All timers are deadlines on the card and fire from
// `tick`.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::action::AppAction;
use crate::config::DashboardSettings;
use crate::confirm::{Confirmations, TriggerOutcome};
use crate::log_stream::{LogStream, StreamSource};
use crate::model::ApplicationState;
use crate::time::Moment;
use crate::view::{self, CardView};

/// Expanded-only content, created lazily and kept across collapses.
#[derive(Debug)]
pub struct DetailsPanel {
    app: ApplicationState,
    logs: LogStream,
}

impl DetailsPanel {
    pub fn app(&self) -> &ApplicationState {
        &self.app
    }

    pub fn logs(&self) -> &LogStream {
        &self.logs
    }
}

pub struct ApplicationCard {
    app: ApplicationState,
    view: CardView,
    expanded: bool,
    details: Option<DetailsPanel>,
    confirmations: Confirmations,
    busy: Option<AppAction>,
    settle_at: Option<Instant>,
    runtime_at: Option<Instant>,
    settings: DashboardSettings,
    source: Arc<dyn StreamSource>,
}

impl std::fmt::Debug for ApplicationCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationCard")
            .field("app", &self.app.name)
            .field("expanded", &self.expanded)
            .field("busy", &self.busy)
            .field("details", &self.details)
            .finish_non_exhaustive()
    }
}

impl ApplicationCard {
    pub fn new(
        app: ApplicationState,
        source: Arc<dyn StreamSource>,
        settings: DashboardSettings,
        now: Moment,
    ) -> Self {
        let mut card = Self {
            view: view::derive(&app, now.wall),
            app,
            expanded: false,
            details: None,
            confirmations: Confirmations::new(settings.confirm_window),
            busy: None,
            settle_at: None,
            runtime_at: None,
            settings,
            source,
        };
        card.arm_runtime_tick(now.instant);
        card
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.app.name
    }

    pub fn app(&self) -> &ApplicationState {
        &self.app
    }

    pub fn view(&self) -> &CardView {
        &self.view
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn details(&self) -> Option<&DetailsPanel> {
        self.details.as_ref()
    }

    /// The action currently in flight, if any.
    pub fn busy(&self) -> Option<AppAction> {
        self.busy
    }

    pub fn is_confirming(&self, action: AppAction) -> bool {
        self.confirmations.is_confirming(action)
    }

    pub fn is_streaming(&self) -> bool {
        self.details.as_ref().is_some_and(|d| d.logs.is_active())
    }

    // ── Expansion ────────────────────────────────────────────────────

    pub fn expand(&mut self, now: Moment) {
        if self.expanded {
            return;
        }
        self.expanded = true;

        if self.details.is_none() {
            self.details = Some(DetailsPanel {
                app: self.app.clone(),
                logs: LogStream::new(
                    self.app.name.clone(),
                    Arc::clone(&self.source),
                    self.settings.log_capacity,
                ),
            });
        }

        self.settle_at = Some(now.instant + self.settings.settle_delay);
        debug!(app = %self.app.name, "card expanded");
    }

    pub fn collapse(&mut self) {
        if !self.expanded {
            return;
        }
        self.expanded = false;
        self.settle_at = None;
        if let Some(details) = self.details.as_mut() {
            details.logs.stop();
        }
        debug!(app = %self.app.name, "card collapsed");
    }

    // ── Updates ──────────────────────────────────────────────────────

    /// Replace the server state in place; transient confirmations reset,
    /// expansion and streaming survive.
    pub fn update_app(&mut self, app: ApplicationState, now: Moment) {
        if let Some(details) = self.details.as_mut() {
            details.app = app.clone();
        }
        self.app = app;
        self.confirmations.clear_all();
        self.view = view::derive(&self.app, now.wall);
        self.arm_runtime_tick(now.instant);
    }

    /// Release every deadline and connection.
    pub fn destroy(&mut self) {
        self.confirmations.clear_all();
        self.settle_at = None;
        self.runtime_at = None;
        if let Some(details) = self.details.as_mut() {
            details.logs.stop();
        }
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Process a trigger. Returns the action to execute, if any; the card
    /// is then busy until [`finish`](Self::finish).
    pub fn trigger(&mut self, action: AppAction, now: Moment) -> Option<AppAction> {
        if self.busy.is_some() || !action.is_available(self.app.lifecycle) {
            return None;
        }

        match self.confirmations.trigger(action, now.instant) {
            TriggerOutcome::Armed => None,
            TriggerOutcome::Execute => {
                self.busy = Some(action);
                Some(action)
            }
        }
    }

    /// Clear the busy flag after `action` completed. No-op when the card
    /// is not busy with that action.
    pub fn finish(&mut self, action: AppAction) -> bool {
        if self.busy == Some(action) {
            self.busy = None;
            true
        } else {
            false
        }
    }

    pub fn clear_logs(&mut self, now: Moment) -> bool {
        match self.details.as_mut() {
            Some(details) => {
                details.logs.clear(now.wall);
                true
            }
            None => false,
        }
    }

    // ── Time ─────────────────────────────────────────────────────────

    /// Fire due deadlines. Returns whether anything visible changed.
    pub fn tick(&mut self, now: Moment) -> bool {
        let mut changed = self.confirmations.expire(now.instant);

        if self.settle_at.is_some_and(|at| at <= now.instant) {
            self.settle_at = None;
            if let Some(details) = self.details.as_mut() {
                details.logs.start(now.wall);
                changed = true;
            }
        }

        if self.runtime_at.is_some_and(|at| at <= now.instant) {
            let view = view::derive(&self.app, now.wall);
            changed |= view != self.view;
            self.view = view;
            self.arm_runtime_tick(now.instant);
        }

        changed
    }

    /// Drain the log stream's queued events.
    pub fn pump(&mut self, now: Moment) -> bool {
        self.details
            .as_mut()
            .is_some_and(|details| details.logs.pump(now.wall) > 0)
    }

    /// Earliest pending deadline, for hosts that sleep until the next one.
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.settle_at, self.runtime_at, self.confirmations.next_deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    fn arm_runtime_tick(&mut self, now: Instant) {
        self.runtime_at = self
            .app
            .state_change
            .as_ref()
            .map(|_| now + self.settings.runtime_tick);
    }
}
