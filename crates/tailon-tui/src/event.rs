//! Event system: crossterm event reader running in a background tokio task.
//!
//! Besides key presses and resizes the reader paces the dashboard with two
//! synthetic events. `Tick` fires the core's deadlines (confirmation expiry,
//! the settle delay before a log stream opens, post-action refreshes, the
//! one-second runtime line). `Render` pumps open log streams into their card
//! buffers and redraws.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tailon_core::DashboardSettings;

/// Events produced by the terminal event reader.
#[derive(Debug)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// Terminal was resized; redraw.
    Resize,
    /// Deadline tick: confirmations, settle/refresh delays, runtimes.
    Tick,
    /// Drain log streams and redraw (~30 FPS).
    Render,
}

/// Pacing of the synthetic `Tick` and `Render` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRates {
    pub tick: Duration,
    pub render: Duration,
}

impl EventRates {
    const TICK: Duration = Duration::from_millis(250);
    const MIN_TICK: Duration = Duration::from_millis(10);
    const RENDER: Duration = Duration::from_millis(33);

    /// The deadline tick runs at 4 Hz unless a shorter settle delay is
    /// configured, in which case it matches that delay.
    pub fn for_settings(settings: &DashboardSettings) -> Self {
        Self {
            tick: settings.settle_delay.clamp(Self::MIN_TICK, Self::TICK),
            render: Self::RENDER,
        }
    }
}

/// Reads terminal events in a background task and sends them over a channel.
pub struct EventReader {
    rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventReader {
    /// Spawn the background event reader.
    pub fn new(rates: EventRates) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut event_stream = EventStream::new();
            let mut tick_interval = tokio::time::interval(rates.tick);
            let mut render_interval = tokio::time::interval(rates.render);

            // Don't burst ticks if we fall behind
            tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            render_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                let event = tokio::select! {
                    () = task_cancel.cancelled() => break,

                    _ = tick_interval.tick() => Event::Tick,

                    _ = render_interval.tick() => Event::Render,

                    Some(Ok(crossterm_event)) = event_stream.next() => {
                        match crossterm_event {
                            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                                Event::Key(key)
                            }
                            CrosstermEvent::Resize(..) => Event::Resize,
                            // Release/repeat, paste, mouse and focus are unused
                            _ => continue,
                        }
                    }
                };

                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx, cancel }
    }

    /// Receive the next event. Returns `None` if the reader has stopped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Signal the background reader to stop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_tick_at_four_hertz() {
        let rates = EventRates::for_settings(&DashboardSettings::default());
        assert_eq!(rates.tick, Duration::from_millis(250));
        assert_eq!(rates.render, Duration::from_millis(33));
    }

    #[test]
    fn short_settle_delay_tightens_the_tick() {
        let settings = DashboardSettings {
            settle_delay: Duration::from_millis(100),
            ..DashboardSettings::default()
        };
        assert_eq!(
            EventRates::for_settings(&settings).tick,
            Duration::from_millis(100)
        );

        let settings = DashboardSettings {
            settle_delay: Duration::ZERO,
            ..DashboardSettings::default()
        };
        assert_eq!(
            EventRates::for_settings(&settings).tick,
            Duration::from_millis(10)
        );
    }
}
