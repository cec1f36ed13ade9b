//! Dashboard screen: one card per managed application.
//!
//! Wraps the core [`Dashboard`]: keys route to expansion and action
//! triggers, ticks drive its deadlines, and snapshot/action results from
//! the app loop are reconciled into it.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tracing::debug;

use tailon_core::{
    AppAction, ApplicationCard, CoreError, Dashboard, DashboardSettings, DashboardView, Lifecycle,
    Moment, Snapshot, StreamSource,
};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::{log_panel, status_indicator};

/// Outer height of a collapsed card (border + two lines).
const CARD_HEIGHT: u16 = 4;
/// Environment entries shown before eliding the rest.
const MAX_ENV_LINES: usize = 6;

/// Key bound to each application action.
pub fn action_key(action: AppAction) -> char {
    match action {
        AppAction::Start => 's',
        AppAction::Stop => 'x',
        AppAction::Restart => 'R',
        AppAction::ForceStop => 'f',
    }
}

pub fn action_for_key(key: char) -> Option<AppAction> {
    match key {
        's' => Some(AppAction::Start),
        'x' => Some(AppAction::Stop),
        'R' => Some(AppAction::Restart),
        'f' => Some(AppAction::ForceStop),
        _ => None,
    }
}

/// Progress label shown while an action is in flight.
fn busy_label(action: AppAction) -> &'static str {
    match action {
        AppAction::Start => "Starting...",
        AppAction::Stop | AppAction::ForceStop => "Stopping...",
        AppAction::Restart => "Restarting...",
    }
}

pub struct DashboardScreen {
    focused: bool,
    dashboard: Dashboard,
    selected: usize,
    throbber: ThrobberState,
}

impl DashboardScreen {
    pub fn new(source: Arc<dyn StreamSource>, settings: DashboardSettings) -> Self {
        Self {
            focused: true,
            dashboard: Dashboard::new(source, settings),
            selected: 0,
            throbber: ThrobberState::default(),
        }
    }

    fn selected_card(&self) -> Option<&ApplicationCard> {
        self.dashboard.cards().nth(self.selected)
    }

    fn selected_name(&self) -> Option<String> {
        self.selected_card().map(|card| card.name().to_owned())
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.dashboard.len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = self.selected.saturating_add_signed(delta).min(len - 1);
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.dashboard.len().saturating_sub(1));
    }

    /// Trigger `action` on the selected card; a trigger that passes the
    /// card's guard becomes an execution request.
    fn trigger(&mut self, action: AppAction) -> Option<Action> {
        let name = self.selected_name()?;
        self.dashboard
            .trigger(&name, action, Moment::now())
            .map(|action| Action::ExecuteAction { app: name, action })
    }

    /// Clears the expanded card's logs, else the selected card's.
    fn clear_logs(&mut self) {
        let target = self
            .dashboard
            .expanded()
            .map(|card| card.name().to_owned())
            .or_else(|| self.selected_name());
        if let Some(name) = target {
            self.dashboard.clear_logs(&name, Moment::now());
        }
    }

    fn on_snapshot(&mut self, fetched: &Result<Snapshot, CoreError>) -> Option<Action> {
        let was_ready = *self.dashboard.view() == DashboardView::Ready;
        let outcome = self.dashboard.refresh(fetched.clone(), Moment::now());
        self.clamp_selection();
        match outcome {
            Ok(reconciliation) => {
                debug!(?reconciliation, "snapshot applied");
                None
            }
            Err(_) if was_ready => Some(Action::Notify(Dashboard::refresh_failed().into())),
            Err(_) => None,
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_message(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
        let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        let top = area.height.saturating_sub(height) / 2;
        let centered = Rect::new(area.x, area.y + top, area.width, height.min(area.height));
        frame.render_widget(Paragraph::new(lines), centered);
    }

    fn render_loading(&self, frame: &mut Frame, area: Rect) {
        let throbber = Throbber::default()
            .style(Style::default().fg(theme::NEON_CYAN))
            .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
        let line = Line::from(vec![
            throbber.to_symbol_span(&self.throbber),
            Span::styled(" Loading applications...", Style::default().fg(theme::DIM_WHITE)),
        ]);
        Self::render_message(frame, area, vec![line.centered()]);
    }

    fn render_error(frame: &mut Frame, area: Rect, message: &str) {
        let lines = vec![
            Line::from(Span::styled(
                message.to_owned(),
                Style::default()
                    .fg(theme::ERROR_RED)
                    .add_modifier(Modifier::BOLD),
            ))
            .centered(),
            Line::from(""),
            Line::from(vec![
                Span::styled("r ", theme::key_hint_key()),
                Span::styled("retry", theme::key_hint()),
            ])
            .centered(),
        ];
        Self::render_message(frame, area, lines);
    }

    fn render_empty(frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(Span::styled("No Applications Configured", theme::title_style())).centered(),
            Line::from(""),
            Line::from(Span::styled(
                "There are no applications configured in your TailOn instance.",
                theme::table_row(),
            ))
            .centered(),
            Line::from(Span::styled(
                "To add applications, update your configuration file and restart the service.",
                theme::key_hint(),
            ))
            .centered(),
        ];
        Self::render_message(frame, area, lines);
    }

    fn render_cards(&self, frame: &mut Frame, area: Rect) {
        // An expanded selection scrolls to the top, keeping one card of context
        let offset = if self.selected_card().is_some_and(ApplicationCard::is_expanded) {
            self.selected.saturating_sub(1)
        } else {
            let per_page = usize::from((area.height / CARD_HEIGHT).max(1));
            (self.selected + 1).saturating_sub(per_page)
        };

        let cards: Vec<(usize, &ApplicationCard)> =
            self.dashboard.cards().enumerate().skip(offset).collect();
        let mut constraints: Vec<Constraint> = cards
            .iter()
            .map(|(_, card)| {
                if card.is_expanded() {
                    Constraint::Fill(1)
                } else {
                    Constraint::Length(CARD_HEIGHT)
                }
            })
            .collect();
        if !cards.iter().any(|(_, card)| card.is_expanded()) {
            constraints.push(Constraint::Fill(1));
        }
        let areas = Layout::vertical(constraints).split(area);

        for ((idx, card), card_area) in cards.into_iter().zip(areas.iter()) {
            if card_area.height == 0 {
                break;
            }
            self.render_card(frame, *card_area, card, idx == self.selected);
        }
    }

    fn render_card(&self, frame: &mut Frame, area: Rect, card: &ApplicationCard, selected: bool) {
        let view = card.view();
        let border = if selected && self.focused {
            theme::border_focused()
        } else {
            theme::border_default()
        };
        let name_style = if selected {
            theme::table_selected()
        } else {
            theme::title_style()
        };

        let mut block = Block::default()
            .title(Line::from(vec![
                Span::raw(" "),
                status_indicator::status_span(view.status),
                Span::raw(" "),
                Span::styled(card.name().to_owned(), name_style),
                Span::raw(" "),
            ]))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border);
        if selected && !card.is_expanded() {
            block = block.title_bottom(Span::styled(
                format!(" {} ", log_panel::PLACEHOLDER),
                theme::key_hint(),
            ));
        }

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut header = vec![Span::styled(
            format!("{}  ", view.status_label),
            Style::default().fg(theme::status_color(view.status)),
        )];
        header.extend(self.action_hints(card));
        let summary = vec![
            Line::from(header),
            Line::from(Span::styled(view.runtime_line.clone(), theme::key_hint())),
        ];

        // Details outlive a collapse; only an expanded card lays them out
        let Some(details) = card.details().filter(|_| card.is_expanded()) else {
            frame.render_widget(Paragraph::new(summary), inner);
            return;
        };

        let detail_lines = Self::detail_lines(card);
        let detail_height = u16::try_from(detail_lines.len()).unwrap_or(u16::MAX);
        let [summary_area, details_area, logs_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(detail_height),
            Constraint::Min(3),
        ])
        .areas(inner);

        frame.render_widget(Paragraph::new(summary), summary_area);
        frame.render_widget(Paragraph::new(detail_lines), details_area);
        log_panel::render(frame, logs_area, details.logs());
    }

    /// Key hints for the actions offered in the card's lifecycle.
    fn action_hints(&self, card: &ApplicationCard) -> Vec<Span<'static>> {
        let mut spans = Vec::new();
        for &action in AppAction::available(card.app().lifecycle) {
            let key = action_key(action);
            if card.busy() == Some(action) {
                let throbber =
                    Throbber::default().throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
                spans.push(throbber.to_symbol_span(&self.throbber));
                spans.push(Span::styled(
                    format!("{} ", busy_label(action)),
                    Style::default().fg(theme::ELECTRIC_PURPLE),
                ));
            } else if card.is_confirming(action) {
                let label = action.confirm_label().unwrap_or(action.label());
                spans.push(Span::styled(format!(" {key} {label} "), theme::key_hint_confirm()));
                spans.push(Span::raw(" "));
            } else if card.busy().is_some() {
                spans.push(Span::styled(
                    format!("{key} {}  ", action.label()),
                    theme::key_hint().add_modifier(Modifier::DIM),
                ));
            } else {
                spans.push(Span::styled(format!("{key} "), theme::key_hint_key()));
                spans.push(Span::styled(format!("{}  ", action.label()), theme::key_hint()));
            }
        }
        spans
    }

    fn detail_lines(card: &ApplicationCard) -> Vec<Line<'static>> {
        fn row(label: &str, value: String) -> Line<'static> {
            Line::from(vec![
                Span::styled(format!("{label:<10}"), theme::key_hint()),
                Span::styled(value, theme::table_row()),
            ])
        }

        let app = card.app();
        let mut lines = vec![row("Command", app.config.command_line())];
        if let Some(ref dir) = app.config.working_dir {
            lines.push(row("Workdir", dir.clone()));
        }
        match app.lifecycle {
            Lifecycle::Running { pid: Some(pid) } => lines.push(row("PID", pid.to_string())),
            Lifecycle::NotRunning {
                last_exit_code: Some(code),
            } => lines.push(row("Exit code", code.to_string())),
            _ => {}
        }
        if let Some(ref env) = app.config.env {
            for (i, entry) in env.iter().take(MAX_ENV_LINES).enumerate() {
                let label = if i == 0 { "Env" } else { "" };
                lines.push(row(label, entry.clone()));
            }
            if env.len() > MAX_ENV_LINES {
                lines.push(row("", format!("… {} more", env.len() - MAX_ENV_LINES)));
            }
        }
        lines
    }
}

impl Component for DashboardScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                Ok(None)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                Ok(None)
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(name) = self.selected_name() {
                    self.dashboard.toggle(&name, Moment::now());
                }
                Ok(None)
            }
            KeyCode::Esc => {
                if let Some(name) = self.dashboard.expanded().map(|c| c.name().to_owned()) {
                    self.dashboard.toggle(&name, Moment::now());
                }
                Ok(None)
            }
            KeyCode::Char('c') => {
                self.clear_logs();
                Ok(None)
            }
            KeyCode::Char('r') => Ok(Some(Action::RequestRefresh)),
            KeyCode::Char(c) => Ok(action_for_key(c).and_then(|action| self.trigger(action))),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Tick => {
                self.throbber.calc_next();
                let tick = self.dashboard.tick(Moment::now());
                if tick.refresh_due {
                    return Ok(Some(Action::RequestRefresh));
                }
            }
            Action::Render => {
                self.dashboard.pump_streams(Moment::now());
            }
            Action::SnapshotLoaded(fetched) => return Ok(self.on_snapshot(fetched)),
            Action::ActionFinished {
                app,
                action,
                result,
            } => {
                let notice =
                    self.dashboard
                        .finish_action(app, *action, result.clone(), Moment::now());
                return Ok(Some(Action::Notify(Notification::from(notice))));
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Applications ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match self.dashboard.view() {
            DashboardView::Loading => self.render_loading(frame, inner),
            DashboardView::Error(message) => Self::render_error(frame, inner, message),
            DashboardView::Ready if self.dashboard.is_empty() => Self::render_empty(frame, inner),
            DashboardView::Ready => self.render_cards(frame, inner),
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "Dashboard"
    }
}
