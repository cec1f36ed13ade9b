// ── Log stream controller ──
//
// Owns zero-or-one push connection for one application, a bounded FIFO
// of displayed lines, and the connection status. The connection itself
// runs on a tokio task inside `tailon-api`; this side only drains its
// channel on the host tick, so everything here is synchronous.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use tailon_api::{LogStreamHandle, StreamEvent};

use crate::convert;
use crate::error::CoreError;
use crate::model::{LineKind, LogLevel, LogLine};

const CONNECTING: &str = "Connecting to log stream...";
const CONNECTED: &str = "Connected to log stream.";
const RECONNECTING: &str = "Connection error - attempting to reconnect...";
const CONNECT_FAILED: &str = "Failed to connect to log stream.";
const CLEARED: &str = "Logs cleared.";

/// Opens push connections. Implemented by [`crate::Controller`]; tests
/// substitute channel-backed fakes.
pub trait StreamSource: Send + Sync {
    fn open(&self, app: &str) -> Result<LogStreamHandle, CoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum StreamStatus {
    Idle,
    Connecting,
    Connected,
    Reconnecting,
}

pub struct LogStream {
    app: String,
    source: Arc<dyn StreamSource>,
    handle: Option<LogStreamHandle>,
    lines: VecDeque<LogLine>,
    capacity: usize,
    status: StreamStatus,
}

impl std::fmt::Debug for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStream")
            .field("app", &self.app)
            .field("active", &self.handle.is_some())
            .field("lines", &self.lines.len())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl LogStream {
    pub fn new(app: impl Into<String>, source: Arc<dyn StreamSource>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            app: app.into(),
            source,
            handle: None,
            lines: VecDeque::with_capacity(capacity),
            capacity,
            status: StreamStatus::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    /// Buffered lines, oldest first.
    pub fn lines(&self) -> &VecDeque<LogLine> {
        &self.lines
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Open the connection unless one is already active.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.handle.is_some() {
            return;
        }

        self.push(LogLine {
            kind: LineKind::Connecting,
            ..LogLine::notice(CONNECTING, None, now)
        });

        match self.source.open(&self.app) {
            Ok(handle) => {
                debug!(app = %self.app, "log stream opening");
                self.handle = Some(handle);
                self.status = StreamStatus::Connecting;
            }
            Err(e) => {
                warn!(app = %self.app, error = %e, "failed to open log stream");
                self.drop_connecting_lines();
                self.push(LogLine::notice(CONNECT_FAILED, Some(LogLevel::Error), now));
                self.status = StreamStatus::Idle;
            }
        }
    }

    /// Close the connection; buffered lines stay.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(app = %self.app, "log stream closed");
            handle.close();
        }
        self.status = StreamStatus::Idle;
    }

    /// Drain every queued event from the connection. Returns how many were
    /// applied.
    pub fn pump(&mut self, now: DateTime<Utc>) -> usize {
        let mut applied = 0;
        while let Some(event) = self.handle.as_mut().and_then(LogStreamHandle::try_next) {
            self.apply(event, now);
            applied += 1;
        }
        applied
    }

    /// Apply one connection event.
    pub fn apply(&mut self, event: StreamEvent, now: DateTime<Utc>) {
        match event {
            StreamEvent::Open => {
                info!(app = %self.app, "log stream connected");
                self.drop_connecting_lines();
                self.push(LogLine::notice(CONNECTED, Some(LogLevel::Info), now));
                self.status = StreamStatus::Connected;
            }
            StreamEvent::Message(payload) => {
                let line = convert::log_line_or_plain(payload, now);
                self.push(line);
            }
            StreamEvent::Error(reason) => {
                debug!(app = %self.app, %reason, "log stream interrupted");
                self.push(LogLine::notice(RECONNECTING, Some(LogLevel::Error), now));
                self.status = StreamStatus::Reconnecting;
            }
        }
    }

    /// Empty the buffer, leaving a single notice.
    pub fn clear(&mut self, now: DateTime<Utc>) {
        self.lines.clear();
        self.push(LogLine::notice(CLEARED, Some(LogLevel::Info), now));
    }

    fn push(&mut self, line: LogLine) {
        self.lines.push_back(line);
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
    }

    fn drop_connecting_lines(&mut self) {
        self.lines.retain(|l| l.kind != LineKind::Connecting);
    }
}

impl Drop for LogStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use tokio::sync::mpsc::UnboundedSender;
    use tokio_util::sync::CancellationToken;

    use super::*;

    /// Channel-backed source recording every open.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        inner: Mutex<FakeInner>,
    }

    #[derive(Default)]
    struct FakeInner {
        opens: BTreeMap<String, usize>,
        senders: BTreeMap<String, (UnboundedSender<StreamEvent>, CancellationToken)>,
        fail: bool,
    }

    impl FakeSource {
        pub(crate) fn failing() -> Self {
            let source = Self::default();
            source.inner.lock().unwrap().fail = true;
            source
        }

        pub(crate) fn opens(&self, app: &str) -> usize {
            self.inner.lock().unwrap().opens.get(app).copied().unwrap_or(0)
        }

        pub(crate) fn total_opens(&self) -> usize {
            self.inner.lock().unwrap().opens.values().sum()
        }

        /// Whether the most recent connection for `app` is still live.
        pub(crate) fn is_live(&self, app: &str) -> bool {
            self.inner
                .lock()
                .unwrap()
                .senders
                .get(app)
                .is_some_and(|(_, token)| !token.is_cancelled())
        }

        pub(crate) fn send(&self, app: &str, event: StreamEvent) {
            let inner = self.inner.lock().unwrap();
            let (tx, _) = inner.senders.get(app).expect("stream was opened");
            let _ = tx.send(event);
        }
    }

    impl StreamSource for FakeSource {
        fn open(&self, app: &str) -> Result<LogStreamHandle, CoreError> {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail {
                return Err(CoreError::Stream {
                    message: "connection refused".into(),
                });
            }
            *inner.opens.entry(app.to_owned()).or_default() += 1;
            let token = CancellationToken::new();
            let (tx, handle) = LogStreamHandle::pair(token.clone());
            inner.senders.insert(app.to_owned(), (tx, token));
            Ok(handle)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeSource;
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap()
    }

    fn stream(source: &Arc<FakeSource>, capacity: usize) -> LogStream {
        let source: Arc<dyn StreamSource> = source.clone();
        LogStream::new("web", source, capacity)
    }

    fn messages(stream: &LogStream) -> Vec<&str> {
        stream.lines().iter().map(|l| l.message.as_str()).collect()
    }

    #[test]
    fn start_is_idempotent() {
        let source = Arc::new(FakeSource::default());
        let mut s = stream(&source, 500);

        s.start(now());
        s.start(now());

        assert_eq!(source.opens("web"), 1);
        assert_eq!(s.status(), StreamStatus::Connecting);
        assert_eq!(messages(&s), vec![CONNECTING]);
    }

    #[test]
    fn open_replaces_connecting_line() {
        let source = Arc::new(FakeSource::default());
        let mut s = stream(&source, 500);
        s.start(now());

        source.send("web", StreamEvent::Open);
        source.send("web", StreamEvent::Message("plain".into()));
        assert_eq!(s.pump(now()), 2);

        assert_eq!(s.status(), StreamStatus::Connected);
        assert_eq!(messages(&s), vec![CONNECTED, "plain"]);
        assert_eq!(s.lines()[0].level, Some(LogLevel::Info));
    }

    #[test]
    fn structured_and_plain_payloads_are_both_kept() {
        let source = Arc::new(FakeSource::default());
        let mut s = stream(&source, 500);
        s.start(now());

        s.apply(
            StreamEvent::Message(
                r#"{"timestamp":"2026-01-01T09:00:00Z","message":"hi","source":"stderr"}"#.into(),
            ),
            now(),
        );
        s.apply(StreamEvent::Message("{broken".into()), now());

        let last_two: Vec<_> = s.lines().iter().skip(1).collect();
        assert_eq!(last_two[0].message, "hi");
        assert_eq!(last_two[0].source, crate::model::LineSource::Stderr);
        assert_eq!(last_two[1].message, "{broken");
        assert_eq!(last_two[1].timestamp, now());
    }

    #[test]
    fn error_marks_reconnecting_and_keeps_connection() {
        let source = Arc::new(FakeSource::default());
        let mut s = stream(&source, 500);
        s.start(now());

        s.apply(StreamEvent::Error("reset".into()), now());

        assert_eq!(s.status(), StreamStatus::Reconnecting);
        assert!(s.is_active());
        assert!(source.is_live("web"));
        let last = s.lines().back().unwrap();
        assert_eq!(last.message, RECONNECTING);
        assert_eq!(last.level, Some(LogLevel::Error));
    }

    #[test]
    fn buffer_is_strict_fifo() {
        let source = Arc::new(FakeSource::default());
        let mut s = stream(&source, 500);

        for i in 1..=501 {
            s.apply(StreamEvent::Message(format!("line {i}")), now());
        }

        assert_eq!(s.lines().len(), 500);
        assert_eq!(s.lines().front().unwrap().message, "line 2");
        assert!(s.lines().iter().any(|l| l.message == "line 500"));
        assert_eq!(s.lines().back().unwrap().message, "line 501");
    }

    #[test]
    fn stop_closes_connection_but_keeps_lines() {
        let source = Arc::new(FakeSource::default());
        let mut s = stream(&source, 500);
        s.start(now());
        s.apply(StreamEvent::Message("kept".into()), now());

        s.stop();

        assert!(!s.is_active());
        assert!(!source.is_live("web"));
        assert_eq!(s.status(), StreamStatus::Idle);
        assert!(messages(&s).contains(&"kept"));
    }

    #[test]
    fn clear_leaves_notice() {
        let source = Arc::new(FakeSource::default());
        let mut s = stream(&source, 500);
        s.apply(StreamEvent::Message("a".into()), now());

        s.clear(now());

        assert_eq!(messages(&s), vec![CLEARED]);
    }

    #[test]
    fn failed_open_reports_and_stays_idle() {
        let source = Arc::new(FakeSource::failing());
        let mut s = stream(&source, 500);

        s.start(now());

        assert!(!s.is_active());
        assert_eq!(messages(&s), vec![CONNECT_FAILED]);
    }

    #[test]
    fn dropping_the_stream_closes_the_connection() {
        let source = Arc::new(FakeSource::default());
        let mut s = stream(&source, 500);
        s.start(now());
        drop(s);
        assert!(!source.is_live("web"));
    }
}
