// ── Dashboard controller ──
//
// Owns the card set and reconciles fresh snapshots against it. A change
// in the set of names tears everything down and rebuilds; otherwise only
// cards whose state changed are updated in place, so expansion, open
// streams and pending confirmations of the rest are left alone.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::action::AppAction;
use crate::card::ApplicationCard;
use crate::config::DashboardSettings;
use crate::error::CoreError;
use crate::log_stream::StreamSource;
use crate::model::Snapshot;
use crate::time::Moment;

const LOAD_FAILED: &str = "Failed to load applications";
const REFRESH_FAILED: &str = "Failed to refresh applications";

/// What the dashboard body shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardView {
    /// Before the first load completes.
    Loading,
    Ready,
    /// Initial load failed; retry is offered.
    Error(String),
}

/// How a successful snapshot was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Rebuilt,
    Updated { changed: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient, user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Result of one host tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardTick {
    /// A post-action refresh deadline fired; the host should fetch.
    pub refresh_due: bool,
    /// Some card changed and needs a redraw.
    pub changed: bool,
}

pub struct Dashboard {
    cards: BTreeMap<String, ApplicationCard>,
    expanded: Option<String>,
    view: DashboardView,
    source: Arc<dyn StreamSource>,
    settings: DashboardSettings,
    pending_refreshes: Vec<Instant>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("cards", &self.cards.keys().collect::<Vec<_>>())
            .field("expanded", &self.expanded)
            .field("view", &self.view)
            .field("pending_refreshes", &self.pending_refreshes.len())
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    pub fn new(source: Arc<dyn StreamSource>, settings: DashboardSettings) -> Self {
        Self {
            cards: BTreeMap::new(),
            expanded: None,
            view: DashboardView::Loading,
            source,
            settings,
            pending_refreshes: Vec::new(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Cards ordered by name.
    pub fn cards(&self) -> impl Iterator<Item = &ApplicationCard> {
        self.cards.values()
    }

    pub fn card(&self, name: &str) -> Option<&ApplicationCard> {
        self.cards.get(name)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn expanded(&self) -> Option<&ApplicationCard> {
        self.expanded.as_deref().and_then(|name| self.cards.get(name))
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Apply the initial (or retried) full fetch.
    ///
    /// On failure the cards are left untouched and the view switches to
    /// the error state.
    pub fn load(
        &mut self,
        fetched: Result<Snapshot, CoreError>,
        now: Moment,
    ) -> Result<Reconciliation, CoreError> {
        match fetched {
            Ok(snapshot) => {
                self.rebuild(snapshot, now);
                self.view = DashboardView::Ready;
                Ok(Reconciliation::Rebuilt)
            }
            Err(e) => {
                warn!(error = %e, "initial load failed");
                self.view = DashboardView::Error(LOAD_FAILED.to_owned());
                Err(e)
            }
        }
    }

    /// Reconcile a fresh fetch against the current cards.
    ///
    /// On failure the current view is kept; callers surface
    /// [`Dashboard::refresh_failed`] as a notification.
    pub fn refresh(
        &mut self,
        fetched: Result<Snapshot, CoreError>,
        now: Moment,
    ) -> Result<Reconciliation, CoreError> {
        if self.view != DashboardView::Ready {
            return self.load(fetched, now);
        }

        let snapshot = fetched.inspect_err(|e| warn!(error = %e, "refresh failed"))?;

        let current: BTreeSet<&str> = self.cards.keys().map(String::as_str).collect();
        let fresh: BTreeSet<&str> = snapshot.keys().map(String::as_str).collect();
        if current != fresh {
            info!(
                before = current.len(),
                after = fresh.len(),
                "application set changed, rebuilding"
            );
            self.rebuild(snapshot, now);
            return Ok(Reconciliation::Rebuilt);
        }

        let mut changed = 0;
        for (name, app) in snapshot {
            if let Some(card) = self.cards.get_mut(&name) {
                if card.app() != &app {
                    debug!(app = %name, "application state changed");
                    card.update_app(app, now);
                    changed += 1;
                }
            }
        }
        Ok(Reconciliation::Updated { changed })
    }

    /// Notification shown when a refresh fails.
    pub fn refresh_failed() -> Notice {
        Notice::error(REFRESH_FAILED)
    }

    fn rebuild(&mut self, snapshot: Snapshot, now: Moment) {
        self.teardown();
        self.cards = snapshot
            .into_iter()
            .map(|(name, app)| {
                let card =
                    ApplicationCard::new(app, Arc::clone(&self.source), self.settings, now);
                (name, card)
            })
            .collect();
    }

    /// Destroy every card, releasing streams and deadlines.
    pub fn teardown(&mut self) {
        for card in self.cards.values_mut() {
            card.destroy();
        }
        self.cards.clear();
        self.expanded = None;
    }

    // ── Expansion ────────────────────────────────────────────────────

    /// Expand `name` (collapsing any other card) or collapse it if it is
    /// the expanded one. Returns `false` for unknown names.
    pub fn toggle(&mut self, name: &str, now: Moment) -> bool {
        if !self.cards.contains_key(name) {
            return false;
        }

        if self.expanded.as_deref() == Some(name) {
            if let Some(card) = self.cards.get_mut(name) {
                card.collapse();
            }
            self.expanded = None;
            return true;
        }

        if let Some(previous) = self.expanded.take() {
            if let Some(card) = self.cards.get_mut(&previous) {
                card.collapse();
            }
        }
        if let Some(card) = self.cards.get_mut(name) {
            card.expand(now);
            self.expanded = Some(name.to_owned());
        }
        true
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Route a trigger to a card. Returns the action the host should
    /// execute remotely, if the trigger got through the card's guard.
    pub fn trigger(&mut self, name: &str, action: AppAction, now: Moment) -> Option<AppAction> {
        let fired = self.cards.get_mut(name)?.trigger(action, now);
        if let Some(action) = fired {
            info!(app = %name, %action, "executing action");
        }
        fired
    }

    /// Record the completion of an action. Always clears the busy flag of
    /// the card (if it still exists) and returns the notification to show.
    pub fn finish_action(
        &mut self,
        name: &str,
        action: AppAction,
        result: Result<(), CoreError>,
        now: Moment,
    ) -> Notice {
        if let Some(card) = self.cards.get_mut(name) {
            card.finish(action);
        }

        match result {
            Ok(()) => {
                self.pending_refreshes
                    .push(now.instant + self.settings.refresh_delay);
                Notice::success(format!("Successfully {} {name}", action.past_tense()))
            }
            Err(CoreError::Action { message, .. }) => {
                Notice::error(format!("Failed to {action} {name}: {message}"))
            }
            Err(e) => Notice::error(format!("Failed to {action} {name}: {e}")),
        }
    }

    pub fn clear_logs(&mut self, name: &str, now: Moment) -> bool {
        self.cards
            .get_mut(name)
            .is_some_and(|card| card.clear_logs(now))
    }

    // ── Time ─────────────────────────────────────────────────────────

    /// Fire due deadlines on every card and the dashboard itself.
    pub fn tick(&mut self, now: Moment) -> DashboardTick {
        let mut changed = false;
        for card in self.cards.values_mut() {
            changed |= card.tick(now);
        }

        let before = self.pending_refreshes.len();
        self.pending_refreshes.retain(|at| *at > now.instant);
        let refresh_due = self.pending_refreshes.len() != before;

        DashboardTick {
            refresh_due,
            changed,
        }
    }

    /// Drain queued stream events of every card.
    pub fn pump_streams(&mut self, now: Moment) -> bool {
        let mut changed = false;
        for card in self.cards.values_mut() {
            changed |= card.pump(now);
        }
        changed
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.cards
            .values()
            .filter_map(ApplicationCard::next_deadline)
            .chain(self.pending_refreshes.iter().copied())
            .min()
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.teardown();
    }
}
