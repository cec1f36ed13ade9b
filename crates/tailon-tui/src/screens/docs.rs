//! Docs screen: reference of the server endpoints the dashboard consumes.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

/// `(method, path, description)` rows, relative to the API base URL.
pub const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/apps", "All applications keyed by name"),
    ("GET", "/apps/{name}", "One application"),
    ("POST", "/apps/{name}/start", "Start a stopped application"),
    ("POST", "/apps/{name}/stop", "Stop a running application"),
    ("POST", "/apps/{name}/stop?force=true", "Kill an application stuck stopping"),
    ("POST", "/apps/{name}/restart", "Restart a running application"),
    ("GET", "/apps/{name}/logs?stream=true", "Live log stream (text/event-stream)"),
    ("GET", "/whoami", "Identity of the current user"),
];

pub struct DocsScreen {
    focused: bool,
    server: String,
    scroll: u16,
}

impl DocsScreen {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            focused: false,
            server: server.into(),
            scroll: 0,
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(vec![
                Span::styled("  Base URL  ", theme::key_hint()),
                Span::styled(self.server.clone(), Style::default().fg(theme::LIGHT_BLUE)),
            ]),
            Line::from(""),
        ];
        for &(method, path, description) in ENDPOINTS {
            let method_color = if method == "GET" {
                theme::SUCCESS_GREEN
            } else {
                theme::CORAL
            };
            lines.push(Line::from(vec![
                Span::styled(format!("  {method:<5}"), Style::default().fg(method_color)),
                Span::styled(path.to_owned(), theme::title_style()),
            ]));
            lines.push(Line::from(Span::styled(
                format!("         {description}"),
                theme::table_row(),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Log entries are JSON {message, timestamp, level?, source?} or plain text.",
            theme::key_hint(),
        )));
        lines
    }

    fn max_scroll(&self) -> u16 {
        u16::try_from(self.lines().len().saturating_sub(1)).unwrap_or(u16::MAX)
    }
}

impl Component for DocsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll = self.scroll.saturating_add(1).min(self.max_scroll());
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            KeyCode::Char('g') => self.scroll = 0,
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" API Reference ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        frame.render_widget(
            Paragraph::new(self.lines())
                .block(block)
                .scroll((self.scroll, 0)),
            area,
        );
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "Docs"
    }
}
