//! Application status indicator: ●/◐/○ with color mapping.

use ratatui::style::Style;
use ratatui::text::Span;

use tailon_core::StatusClass;

use crate::theme;

/// Returns a styled `Span` with the appropriate status dot and color.
pub fn status_span(status: StatusClass) -> Span<'static> {
    Span::styled(status_char(status), Style::default().fg(theme::status_color(status)))
}

/// Returns the status dot character without styling.
pub fn status_char(status: StatusClass) -> &'static str {
    match status {
        StatusClass::Running => "●",
        StatusClass::Stopping => "◐",
        StatusClass::Stopped => "○",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dots_follow_status() {
        assert_eq!(status_char(StatusClass::Running), "●");
        assert_eq!(status_char(StatusClass::Stopping), "◐");
        assert_eq!(status_char(StatusClass::Stopped), "○");
        assert_eq!(status_span(StatusClass::Running).content, "●");
    }
}
