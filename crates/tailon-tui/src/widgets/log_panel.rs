//! Live log panel: tails the newest buffered lines of a card's stream.

use chrono::Local;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use tailon_core::{LineKind, LineSource, LogLine, LogStream, StreamStatus};

use crate::theme;

/// Shown in place of the panel while a card is collapsed.
pub const PLACEHOLDER: &str = "Enter to expand and view live logs...";

/// Render the panel for `logs` into `area`, newest line at the bottom.
pub fn render(frame: &mut Frame, area: Rect, logs: &LogStream) {
    let (status_label, status_color) = match logs.status() {
        StreamStatus::Connected => ("● live", theme::SUCCESS_GREEN),
        StreamStatus::Connecting => ("◐ connecting", theme::ELECTRIC_YELLOW),
        StreamStatus::Reconnecting => ("◐ reconnecting", theme::ELECTRIC_YELLOW),
        StreamStatus::Idle => ("○ idle", theme::BORDER_GRAY),
    };

    let block = Block::default()
        .title(Line::from(vec![
            Span::styled(" Live Logs ", theme::title_style()),
            Span::styled(format!("{status_label} "), Style::default().fg(status_color)),
        ]))
        .title_bottom(Line::from(vec![
            Span::styled(" c ", theme::key_hint_key()),
            Span::styled("clear ", theme::key_hint()),
            Span::styled(
                format!("{}/{} ", logs.lines().len(), logs.capacity()),
                theme::key_hint(),
            ),
        ]))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let visible = usize::from(inner.height);
    let skip = logs.lines().len().saturating_sub(visible);
    let lines: Vec<Line> = logs.lines().iter().skip(skip).map(log_line).collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

/// One rendered log row: `HH:MM:SS [source] message`.
pub fn log_line(line: &LogLine) -> Line<'static> {
    let time = line.timestamp.with_timezone(&Local).format("%H:%M:%S");
    let stamp = Span::styled(format!("{time} "), theme::key_hint());

    match line.kind {
        LineKind::Output => {
            let color = theme::log_color(line.level, line.source);
            let mut spans = vec![stamp];
            if line.source != LineSource::Stdout {
                spans.push(Span::styled(
                    format!("[{}] ", line.source),
                    Style::default().fg(color).add_modifier(Modifier::DIM),
                ));
            }
            spans.push(Span::styled(line.message.clone(), Style::default().fg(color)));
            Line::from(spans)
        }
        LineKind::Connecting | LineKind::Notice => {
            let color = theme::log_color(line.level, LineSource::Stdout);
            Line::from(vec![
                stamp,
                Span::styled(
                    line.message.clone(),
                    Style::default().fg(color).add_modifier(Modifier::ITALIC),
                ),
            ])
        }
    }
}
