// ── Log line domain types ──

use chrono::{DateTime, Utc};
use strum::{Display, EnumString};

/// Which stream of the process produced a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LineSource {
    #[default]
    Stdout,
    Stderr,
    /// Start/stop audit records written by the server itself.
    Audit,
}

impl LineSource {
    /// Parse a wire value; anything unrecognised is treated as stdout.
    pub fn from_wire(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    Debug,
    Info,
    #[strum(to_string = "warn", serialize = "warning")]
    Warn,
    Error,
}

/// Where a buffered line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Pushed by the server.
    Output,
    /// The "connecting" placeholder, dropped once the stream opens.
    Connecting,
    /// Any other client-generated status line.
    Notice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub level: Option<LogLevel>,
    pub source: LineSource,
    pub kind: LineKind,
}

impl LogLine {
    /// A client-generated status line stamped `at`.
    pub fn notice(message: impl Into<String>, level: Option<LogLevel>, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at,
            message: message.into(),
            level,
            source: LineSource::Stdout,
            kind: LineKind::Notice,
        }
    }

    /// Raw payload shown verbatim as stdout.
    pub fn plain(message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at,
            message: message.into(),
            level: None,
            source: LineSource::Stdout,
            kind: LineKind::Output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sources_fall_back_to_stdout() {
        assert_eq!(LineSource::from_wire(Some("stderr")), LineSource::Stderr);
        assert_eq!(LineSource::from_wire(Some("AUDIT")), LineSource::Audit);
        assert_eq!(LineSource::from_wire(Some("syslog")), LineSource::Stdout);
        assert_eq!(LineSource::from_wire(None), LineSource::Stdout);
    }

    #[test]
    fn level_accepts_warning_alias() {
        assert_eq!("warning".parse::<LogLevel>().ok(), Some(LogLevel::Warn));
        assert_eq!("ERROR".parse::<LogLevel>().ok(), Some(LogLevel::Error));
        assert!("trace".parse::<LogLevel>().is_err());
    }
}
