//! Server-sent log stream with auto-reconnect.
//!
//! Opens `GET /apps/{name}/logs?stream=true`, decodes the `text/event-stream`
//! framing, and forwards lifecycle transitions and raw `data:` payloads as
//! [`StreamEvent`]s over an unbounded channel. Reconnection follows the
//! EventSource model: the server's `retry:` hint (or an exponential backoff
//! with jitter) between attempts, `Last-Event-ID` on resume, and an
//! [`StreamEvent::Error`] for every broken or ended connection.
//!
//! # Example
//!
//! ```rust,ignore
//! use tailon_api::{ApiClient, ReconnectConfig, StreamEvent, TransportConfig};
//!
//! let client = ApiClient::new("http://localhost:8080", &TransportConfig::default())?;
//! let mut handle = client.open_log_stream("web", ReconnectConfig::default())?;
//!
//! while let Some(event) = handle.next().await {
//!     if let StreamEvent::Message(data) = event {
//!         println!("{data}");
//!     }
//! }
//! ```

use std::time::Duration;

use async_stream::try_stream;
use bytes::Bytes;
use futures_util::{Stream, StreamExt, pin_mut};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── StreamEvent ──────────────────────────────────────────────────────

/// Lifecycle transitions and payloads of one log-stream connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The server accepted the request; events will follow.
    Open,
    /// Raw `data:` payload of one event (multi-line data joined with `\n`).
    Message(String),
    /// The connection failed or ended; a reconnect is scheduled.
    Error(String),
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Backoff configuration for stream reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 3s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── LogStreamHandle ──────────────────────────────────────────────────

/// Owning handle to a running log stream.
///
/// Closing or dropping the handle cancels the background reader, so a
/// stream never outlives its owner.
#[derive(Debug)]
pub struct LogStreamHandle {
    events: mpsc::UnboundedReceiver<StreamEvent>,
    cancel: CancellationToken,
}

impl LogStreamHandle {
    /// Spawn the reconnecting reader for `url` and return its handle.
    pub fn connect(
        http: reqwest::Client,
        url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, handle) = Self::pair(cancel);
        let task_cancel = handle.cancel.clone();
        tokio::spawn(async move {
            sse_loop(http, url, tx, reconnect, task_cancel).await;
        });
        handle
    }

    /// A handle fed by the returned sender instead of a network task.
    ///
    /// Useful for alternative transports and for driving consumers in tests.
    pub fn pair(cancel: CancellationToken) -> (mpsc::UnboundedSender<StreamEvent>, Self) {
        let (tx, events) = mpsc::unbounded_channel();
        (tx, Self { events, cancel })
    }

    /// Next event without waiting, if one is queued.
    pub fn try_next(&mut self) -> Option<StreamEvent> {
        self.events.try_recv().ok()
    }

    /// Wait for the next event. `None` once the reader has stopped.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Signal the background reader to stop.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Whether [`close`](Self::close) was called (or the handle cancelled).
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A clone of the cancellation token, for observing shutdown.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for LogStreamHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Resume state carried across reconnects.
#[derive(Debug, Default)]
struct ResumeState {
    last_event_id: Option<String>,
    retry: Option<Duration>,
}

/// Main loop: connect → read → on end or error, wait → reconnect.
async fn sse_loop(
    http: reqwest::Client,
    url: Url,
    tx: mpsc::UnboundedSender<StreamEvent>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;
    let mut resume = ResumeState::default();

    loop {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&http, &url, &tx, &cancel, &mut resume) => result,
        };

        if cancel.is_cancelled() {
            break;
        }

        let reason = match outcome {
            Ok(()) => {
                tracing::info!(url = %url, "log stream ended, reconnecting");
                attempt = 0;
                "stream ended".to_owned()
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, attempt, "log stream error");
                e.to_string()
            }
        };

        if tx.send(StreamEvent::Error(reason)).is_err() {
            break;
        }

        if let Some(max) = reconnect.max_retries {
            if attempt >= max {
                tracing::error!(
                    max_retries = max,
                    "log stream reconnection limit reached, giving up"
                );
                break;
            }
        }

        let delay = resume
            .retry
            .unwrap_or_else(|| calculate_backoff(attempt, &reconnect));
        tracing::debug!(delay_ms = delay.as_millis(), attempt, "waiting before reconnect");

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        attempt = attempt.saturating_add(1);
    }

    tracing::debug!(url = %url, "log stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Open one streaming request and forward frames until it drops.
async fn connect_and_read(
    http: &reqwest::Client,
    url: &Url,
    tx: &mpsc::UnboundedSender<StreamEvent>,
    cancel: &CancellationToken,
    resume: &mut ResumeState,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to log stream");

    let mut request = http
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .header(reqwest::header::CACHE_CONTROL, "no-cache");
    if let Some(ref id) = resume.last_event_id {
        request = request.header("Last-Event-ID", id.as_str());
    }

    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Status {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("stream rejected").to_owned(),
        });
    }

    if tx.send(StreamEvent::Open).is_err() {
        return Ok(());
    }

    let frames = frames(resp.bytes_stream());
    pin_mut!(frames);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = frames.next() => match frame {
                Some(Ok(frame)) => {
                    if let Some(id) = frame.id.clone() {
                        resume.last_event_id = Some(id);
                    }
                    if let Some(retry) = frame.retry {
                        resume.retry = Some(retry);
                    }
                    if let Some(event) = frame.into_event() {
                        if tx.send(event).is_err() {
                            return Ok(());
                        }
                    }
                }
                Some(Err(e)) => return Err(e),
                None => return Ok(()),
            },
        }
    }
}

/// Adapt a body byte stream into decoded SSE frames.
fn frames<S>(body: S) -> impl Stream<Item = Result<SseFrame, Error>>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>>,
{
    try_stream! {
        let mut decoder = SseDecoder::default();
        pin_mut!(body);
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| Error::Stream(e.to_string()))?;
            for frame in decoder.feed(&chunk) {
                yield frame;
            }
        }
    }
}

// ── Event-stream framing ─────────────────────────────────────────────

/// One dispatched event (or a bare `id:`/`retry:` update).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: Option<String>,
    pub id: Option<String>,
    pub retry: Option<Duration>,
}

impl SseFrame {
    /// Map the frame to what a consumer sees. Unnamed and `message` events
    /// carry data; a named `error` event reports a failure; other named
    /// events have no consumer.
    fn into_event(self) -> Option<StreamEvent> {
        let data = self.data?;
        match self.event.as_deref() {
            None | Some("message") => Some(StreamEvent::Message(data)),
            Some("error") => Some(StreamEvent::Error(data)),
            Some(_) => None,
        }
    }
}

/// Incremental `text/event-stream` decoder.
///
/// Bytes may split anywhere, including inside a UTF-8 sequence, so
/// undecoded bytes are kept until a full line is available.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    current: SseFrame,
}

impl SseDecoder {
    /// Feed a chunk and return every frame it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.pending.extend_from_slice(chunk);
        let mut out = Vec::new();

        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches('\n').trim_end_matches('\r');
            if let Some(frame) = self.process_line(line) {
                out.push(frame);
            }
        }

        out
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            let frame = std::mem::take(&mut self.current);
            let is_empty = frame.data.is_none() && frame.id.is_none() && frame.retry.is_none();
            return (!is_empty).then_some(frame);
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => match self.current.data {
                Some(ref mut data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.current.data = Some(value.to_owned()),
            },
            "event" => self.current.event = Some(value.to_owned()),
            "id" if !value.contains('\0') => self.current.id = Some(value.to_owned()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.current.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
        None
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 ± 0.25)`
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(16)).unwrap_or(16);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

// ── Tests ────────────────────────────────────────────────────────────
