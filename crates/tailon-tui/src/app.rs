//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tailon_core::{Actor, AppAction, Controller, DashboardSettings};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventRates, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::{Tui, window_title};

/// How long a toast stays on screen.
const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// Server reachability as seen by the TUI, from the last snapshot fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Failing,
}

/// Status-bar name for the `/whoami` result.
pub fn user_label(actor: Option<&Actor>) -> String {
    match actor {
        Some(actor) if !actor.is_anonymous => actor.name().to_owned(),
        _ => "anonymous".to_owned(),
    }
}

/// Top-level application state and event loop.
pub struct App {
    /// Current active screen.
    active_screen: ScreenId,
    /// All screen components, keyed by ScreenId.
    screens: HashMap<ScreenId, Box<dyn Component>>,
    /// Whether the app should keep running.
    running: bool,
    /// Connection status indicator.
    connection_status: ConnectionStatus,
    /// Current user, once `/whoami` answered (or failed).
    user: Option<String>,
    /// Help overlay visibility.
    help_visible: bool,
    /// Action sender; components can dispatch actions through this.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver; the main loop drains this.
    action_rx: mpsc::UnboundedReceiver<Action>,
    controller: Controller,
    settings: DashboardSettings,
    /// On-demand fetch requests to the data bridge.
    refresh_tx: mpsc::UnboundedSender<()>,
    /// Handed to the data bridge when the loop starts.
    refresh_rx: Option<mpsc::UnboundedReceiver<()>>,
    /// Cancellation token for the data bridge task.
    data_cancel: CancellationToken,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
}

impl App {
    pub fn new(controller: Controller, settings: DashboardSettings) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();

        let screens = create_screens(
            Arc::new(controller.clone()),
            settings,
            controller.base_url().as_str(),
        )
        .into_iter()
        .collect();

        Self {
            active_screen: ScreenId::Dashboard,
            screens,
            running: true,
            connection_status: ConnectionStatus::default(),
            user: None,
            help_visible: false,
            action_tx,
            action_rx,
            controller,
            settings,
            refresh_tx,
            refresh_rx: Some(refresh_rx),
            data_cancel: CancellationToken::new(),
            notification: None,
        }
    }

    /// Initialize all screen components with the action sender.
    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
            screen.set_focused(false);
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    /// Run the main event loop. This is the heart of the TUI.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter(&window_title(self.controller.base_url().as_str()))?;
        self.init_screens()?;

        if let Some(refresh_rx) = self.refresh_rx.take() {
            tokio::spawn(crate::data_bridge::spawn_data_bridge(
                self.controller.clone(),
                self.settings.poll_interval,
                self.action_tx.clone(),
                refresh_rx,
                self.data_cancel.clone(),
            ));
        }

        let mut events = EventReader::new(EventRates::for_settings(&self.settings));

        info!("TUI event loop started");

        while self.running {
            // 1. Wait for the next event
            let Some(event) = events.next().await else {
                break;
            };

            // 2. Map event → action(s)
            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize | Event::Render => {
                    self.action_tx.send(Action::Render)?;
                }
                Event::Tick => {
                    self.action_tx.send(Action::Tick)?;
                }
            }

            // 3. Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        // Cancel the data bridge; dropping the screens closes every stream
        self.data_cancel.cancel();
        events.stop();
        self.screens.clear();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key event to an action. Global keys are handled here;
    /// screen-specific keys are delegated to the active screen component.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            // In help mode, Esc or ? closes help
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        if let Some(action) = self.global_action(key) {
            return Ok(Some(action));
        }

        // Delegate to active screen component
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }

        Ok(None)
    }

    fn global_action(&self, key: KeyEvent) -> Option<Action> {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::NONE, KeyCode::Char('q')) => Some(Action::Quit),

            (_, KeyCode::Char('?')) => Some(Action::ToggleHelp),

            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='9')) => c
                .to_digit(10)
                .and_then(|n| u8::try_from(n).ok())
                .and_then(ScreenId::from_number)
                .map(Action::SwitchScreen),

            (KeyModifiers::NONE, KeyCode::Tab) => {
                Some(Action::SwitchScreen(self.active_screen.next()))
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                Some(Action::SwitchScreen(self.active_screen.prev()))
            }

            _ => None,
        }
    }

    /// Process a single action: update app state and propagate to components.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(false);
                    }
                    self.active_screen = *target;
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(true);
                        debug!(component = screen.id(), "focused");
                    }
                }
            }

            Action::ToggleHelp => {
                self.help_visible = !self.help_visible;
            }

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() >= NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
                self.broadcast(action)?;
            }

            Action::Render => self.broadcast(action)?,

            Action::SnapshotLoaded(result) => {
                self.connection_status = if result.is_ok() {
                    ConnectionStatus::Connected
                } else {
                    ConnectionStatus::Failing
                };
                self.broadcast(action)?;
            }

            Action::WhoamiLoaded(actor) => {
                self.user = Some(user_label(actor.as_ref()));
            }

            Action::RequestRefresh => {
                if self.refresh_tx.send(()).is_err() {
                    warn!("data bridge gone, refresh dropped");
                }
            }

            Action::ExecuteAction { app, action } => {
                self.execute(app.clone(), *action);
            }

            Action::ActionFinished { .. } => self.broadcast(action)?,

            Action::Notify(n) => {
                self.notification = Some((n.clone(), Instant::now()));
            }
        }
        Ok(())
    }

    /// Data and clock updates go to ALL screens so they stay in sync.
    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    /// Spawn an action execution task. Sends `ActionFinished` on completion.
    fn execute(&self, app: String, action: AppAction) {
        let controller = self.controller.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = controller.execute(&app, action).await;
            if let Err(ref e) = result {
                warn!(app = %app, %action, error = %e, "action failed");
            }
            let _ = tx.send(Action::ActionFinished {
                app,
                action,
                result,
            });
        });
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Layout: [screen content] [tab bar] [status bar]
        let [content_area, tab_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, content_area);
        }

        self.render_tab_bar(frame, tab_area);
        self.render_status_bar(frame, status_area);

        // Overlays on top (order matters: last = topmost)
        if let Some((ref notif, _)) = self.notification {
            Self::render_notification(frame, area, notif);
        }

        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(
                    format!(" {} {} ", id.number(), id.label()),
                    style,
                ))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );

        frame.render_widget(tabs, area);
    }

    /// Bottom status bar: connection, current user, key hints.
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let connection_indicator = match self.connection_status {
            ConnectionStatus::Connected => {
                Span::styled("● connected", Style::default().fg(theme::SUCCESS_GREEN))
            }
            ConnectionStatus::Failing => {
                Span::styled("○ unreachable", Style::default().fg(theme::ERROR_RED))
            }
            ConnectionStatus::Connecting => {
                Span::styled("◐ connecting", Style::default().fg(theme::ELECTRIC_YELLOW))
            }
        };

        let user = Span::styled(
            format!(" │ {}", self.user.as_deref().unwrap_or("…")),
            Style::default().fg(theme::LIGHT_BLUE),
        );
        let hints = Span::styled(" │ ? help  r refresh  q quit", theme::key_hint());

        let line = Line::from(vec![Span::raw(" "), connection_indicator, user, hints]);

        frame.render_widget(Paragraph::new(line), area);
    }

    /// Render the help overlay centered on screen.
    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        fn entry(key: &'static str, text: &'static str) -> Line<'static> {
            Line::from(vec![
                Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
                Span::styled(text, theme::key_hint()),
            ])
        }
        fn heading(text: &'static str) -> Line<'static> {
            Line::from(Span::styled(
                format!("  {text}"),
                Style::default().fg(theme::NEON_CYAN),
            ))
        }

        let help_width = 56u16.min(area.width.saturating_sub(4));
        let help_height = 21u16.min(area.height.saturating_sub(4));

        let x = (area.width.saturating_sub(help_width)) / 2;
        let y = (area.height.saturating_sub(help_height)) / 2;

        let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

        frame.render_widget(Clear, help_area);

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));

        let help_text = vec![
            Line::from(""),
            heading("Navigation"),
            entry("1-2 Tab", "Switch screen"),
            entry("j/k ↑/↓", "Move selection"),
            entry("Enter", "Expand / collapse"),
            entry("Esc", "Collapse"),
            Line::from(""),
            heading("Applications"),
            entry("s", "Start"),
            entry("x", "Stop (press twice)"),
            entry("R", "Restart (press twice)"),
            entry("f", "Force stop"),
            entry("c", "Clear logs"),
            entry("r", "Refresh / retry"),
            Line::from(""),
            heading("Global"),
            entry("?", "This help"),
            entry("q Ctrl+c", "Quit"),
            Line::from(""),
            Line::from(Span::styled("  Esc or ? to close", theme::key_hint())),
        ];

        frame.render_widget(Paragraph::new(help_text).block(block), help_area);
    }

    /// Render a notification toast in the bottom-right corner.
    fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
        let msg_len = u16::try_from(notif.message.chars().count()).unwrap_or(u16::MAX);
        let width = msg_len
            .saturating_add(6)
            .clamp(20, 60)
            .min(area.width);
        let height = 3u16;

        let x = area.width.saturating_sub(width + 1);
        let y = area.height.saturating_sub(height + 2); // above status bar
        let toast_area = Rect::new(area.x + x, area.y + y, width, height);

        let (border_color, icon) = match notif.level {
            NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
            NotificationLevel::Error => (theme::ERROR_RED, "✗"),
        };

        frame.render_widget(Clear, toast_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(theme::BG_DARK));

        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
            Span::styled(notif.message.clone(), Style::default().fg(theme::DIM_WHITE)),
        ]);
        frame.render_widget(Paragraph::new(line).block(block), toast_area);
    }
}

#[cfg(test)]
mod tests {
    use tailon_core::{Notice, RemoteConfig};

    use super::*;

    fn app() -> App {
        let url = "http://127.0.0.1:9".parse().unwrap();
        let controller = Controller::new(&RemoteConfig::new(url)).unwrap();
        App::new(controller, DashboardSettings::default())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn anonymous_fallback() {
        assert_eq!(user_label(None), "anonymous");

        let mut actor = Actor {
            id: "u-1".into(),
            display_name: "Ada".into(),
            login_name: None,
            is_anonymous: false,
        };
        assert_eq!(user_label(Some(&actor)), "Ada");

        actor.is_anonymous = true;
        assert_eq!(user_label(Some(&actor)), "anonymous");
    }

    #[test]
    fn global_keys() {
        let app = app();
        assert!(matches!(
            app.global_action(key(KeyCode::Char('q'))),
            Some(Action::Quit)
        ));
        assert!(matches!(
            app.global_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        ));
        assert!(matches!(
            app.global_action(key(KeyCode::Char('2'))),
            Some(Action::SwitchScreen(ScreenId::Docs))
        ));
        assert!(app.global_action(key(KeyCode::Char('7'))).is_none());
        assert!(matches!(
            app.global_action(key(KeyCode::Tab)),
            Some(Action::SwitchScreen(ScreenId::Docs))
        ));
        // Screen keys fall through
        assert!(app.global_action(key(KeyCode::Char('x'))).is_none());
    }

    #[test]
    fn help_captures_input() {
        let mut app = app();
        app.process_action(&Action::ToggleHelp).unwrap();
        assert!(app.handle_key_event(key(KeyCode::Char('q'))).unwrap().is_none());
        assert!(matches!(
            app.handle_key_event(key(KeyCode::Esc)).unwrap(),
            Some(Action::ToggleHelp)
        ));
    }

    #[test]
    fn connection_status_follows_fetches() {
        let mut app = app();
        assert_eq!(app.connection_status, ConnectionStatus::Connecting);

        app.process_action(&Action::SnapshotLoaded(Err(tailon_core::CoreError::Fetch {
            message: "down".into(),
            status: None,
        })))
        .unwrap();
        assert_eq!(app.connection_status, ConnectionStatus::Failing);

        app.process_action(&Action::SnapshotLoaded(Ok(tailon_core::Snapshot::new())))
            .unwrap();
        assert_eq!(app.connection_status, ConnectionStatus::Connected);
    }

    #[test]
    fn notifications_replace_and_expire() {
        let mut app = app();
        app.process_action(&Action::Notify(Notice::success("one").into()))
            .unwrap();
        app.process_action(&Action::Notify(Notice::error("two").into()))
            .unwrap();
        assert_eq!(app.notification.as_ref().unwrap().0.message, "two");

        app.process_action(&Action::Tick).unwrap();
        assert!(app.notification.is_some());

        app.notification.as_mut().unwrap().1 =
            Instant::now().checked_sub(NOTIFICATION_TTL).unwrap();
        app.process_action(&Action::Tick).unwrap();
        assert!(app.notification.is_none());
    }

    #[test]
    fn refresh_requests_reach_the_bridge() {
        let mut app = app();
        app.process_action(&Action::RequestRefresh).unwrap();
        assert!(app.refresh_rx.as_mut().unwrap().try_recv().is_ok());
    }
}
