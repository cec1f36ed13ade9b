// ── Action confirmation state machine ──
//
// Per-card guard for destructive actions: the first trigger arms a
// confirmation with an expiry, a second trigger before the expiry lets
// the action through. Expiries are deadlines on the entry itself, so
// clearing an entry also cancels its expiry.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::action::AppAction;

/// An armed confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    pub since: Instant,
    pub expires_at: Instant,
}

/// What a trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A confirmation was armed; nothing executes yet.
    Armed,
    /// The action should execute now.
    Execute,
}

#[derive(Debug, Clone)]
pub struct Confirmations {
    entries: BTreeMap<AppAction, Pending>,
    window: Duration,
}

impl Confirmations {
    pub fn new(window: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            window,
        }
    }

    /// Process a trigger of `action` at `now`.
    ///
    /// Due expiries are applied first, so a trigger at or after the expiry
    /// instant starts a new confirmation instead of confirming.
    pub fn trigger(&mut self, action: AppAction, now: Instant) -> TriggerOutcome {
        self.expire(now);

        if !action.requires_confirmation() {
            return TriggerOutcome::Execute;
        }

        if self.entries.remove(&action).is_some() {
            debug!(%action, "confirmation accepted");
            return TriggerOutcome::Execute;
        }

        self.entries.insert(
            action,
            Pending {
                since: now,
                expires_at: now + self.window,
            },
        );
        debug!(%action, "confirmation armed");
        TriggerOutcome::Armed
    }

    /// Silently revert every confirmation whose expiry is due. Returns
    /// whether anything changed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.entries.len();
        self.entries.retain(|_, pending| pending.expires_at > now);
        self.entries.len() != before
    }

    pub fn is_confirming(&self, action: AppAction) -> bool {
        self.entries.contains_key(&action)
    }

    pub fn get(&self, action: AppAction) -> Option<&Pending> {
        self.entries.get(&action)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry together with its expiry.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Earliest pending expiry.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().map(|p| p.expires_at).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(15);

    #[test]
    fn second_trigger_within_window_executes() {
        let t0 = Instant::now();
        let mut c = Confirmations::new(WINDOW);

        assert_eq!(c.trigger(AppAction::Stop, t0), TriggerOutcome::Armed);
        assert!(c.is_confirming(AppAction::Stop));

        let t1 = t0 + Duration::from_millis(14_900);
        assert_eq!(c.trigger(AppAction::Stop, t1), TriggerOutcome::Execute);
        assert!(c.is_empty());
    }

    #[test]
    fn expiry_reverts_silently() {
        let t0 = Instant::now();
        let mut c = Confirmations::new(WINDOW);
        c.trigger(AppAction::Stop, t0);

        assert!(!c.expire(t0 + Duration::from_millis(14_999)));
        assert!(c.expire(t0 + WINDOW));
        assert!(!c.is_confirming(AppAction::Stop));
    }

    #[test]
    fn trigger_at_expiry_instant_rearms() {
        let t0 = Instant::now();
        let mut c = Confirmations::new(WINDOW);
        c.trigger(AppAction::Restart, t0);

        let t1 = t0 + WINDOW;
        assert_eq!(c.trigger(AppAction::Restart, t1), TriggerOutcome::Armed);
        assert_eq!(c.get(AppAction::Restart).map(|p| p.since), Some(t1));
    }

    #[test]
    fn start_and_force_stop_execute_immediately() {
        let t0 = Instant::now();
        let mut c = Confirmations::new(WINDOW);
        assert_eq!(c.trigger(AppAction::Start, t0), TriggerOutcome::Execute);
        assert_eq!(c.trigger(AppAction::ForceStop, t0), TriggerOutcome::Execute);
        assert!(c.is_empty());
    }

    #[test]
    fn entries_are_independent_per_action() {
        let t0 = Instant::now();
        let mut c = Confirmations::new(WINDOW);
        c.trigger(AppAction::Stop, t0);
        c.trigger(AppAction::Restart, t0 + Duration::from_secs(5));

        assert_eq!(c.next_deadline(), Some(t0 + WINDOW));
        c.expire(t0 + WINDOW);
        assert!(!c.is_confirming(AppAction::Stop));
        assert!(c.is_confirming(AppAction::Restart));

        c.clear_all();
        assert_eq!(c.next_deadline(), None);
    }
}
