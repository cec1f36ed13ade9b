//! Data bridge: connects the [`Controller`] to TUI actions.
//!
//! Runs as a background task: performs the initial snapshot load, then
//! polls on a fixed interval and serves on-demand fetches (retry key,
//! post-action refresh) requested over a channel. Every result is
//! forwarded as an [`Action`] through the TUI's action channel.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tailon_core::Controller;

use crate::action::Action;

/// Run the data bridge until cancelled or the TUI drops its receiver.
///
/// The first poll tick fires immediately and doubles as the initial load.
/// An on-demand fetch restarts the poll period.
pub async fn spawn_data_bridge(
    controller: Controller,
    poll_interval: Duration,
    action_tx: mpsc::UnboundedSender<Action>,
    mut refresh_rx: mpsc::UnboundedReceiver<()>,
    cancel: CancellationToken,
) {
    tokio::spawn(report_whoami(
        controller.clone(),
        action_tx.clone(),
        cancel.clone(),
    ));

    let mut poll = tokio::time::interval(poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(()) = refresh_rx.recv() => {
                debug!("on-demand refresh");
                poll.reset();
            }

            _ = poll.tick() => {
                debug!("poll refresh");
            }
        }

        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = controller.fetch_snapshot() => result,
        };
        if let Err(ref e) = result {
            warn!(error = %e, "snapshot fetch failed");
        }
        if action_tx.send(Action::SnapshotLoaded(result)).is_err() {
            break;
        }
    }

    debug!("data bridge shut down");
}

/// Resolve the current user once; failures fall back to anonymous.
async fn report_whoami(
    controller: Controller,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let actor = tokio::select! {
        () = cancel.cancelled() => return,
        result = controller.whoami() => result,
    };
    let actor = actor
        .inspect_err(|e| warn!(error = %e, "whoami failed"))
        .ok();
    let _ = action_tx.send(Action::WhoamiLoaded(actor));
}
