// ── Core error types ──
//
// User-facing errors from tailon-core. Consumers never see raw HTTP or
// JSON failures directly; the `From<tailon_api::Error>` impl folds
// transport-layer errors into the fetch/stream/config buckets, and the
// controller wraps action failures with the action and application name.

use thiserror::Error;

use crate::action::AppAction;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Remote reads ─────────────────────────────────────────────────
    /// Snapshot or identity fetch failed (network or non-2xx).
    #[error("Failed to fetch from server: {message}")]
    Fetch {
        message: String,
        /// HTTP status code, when the server answered.
        status: Option<u16>,
    },

    // ── Log streaming ────────────────────────────────────────────────
    #[error("Log stream error: {message}")]
    Stream { message: String },

    /// A pushed payload was not a structured log entry.
    #[error("Malformed log payload: {message}")]
    Decode { message: String },

    // ── Mutations ────────────────────────────────────────────────────
    #[error("Failed to {action} {app}: {message}")]
    Action {
        action: AppAction,
        app: String,
        message: String,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Wrap a transport failure of `action` on `app`.
    pub fn action(action: AppAction, app: &str, err: &tailon_api::Error) -> Self {
        Self::Action {
            action,
            app: app.to_owned(),
            message: describe(err),
        }
    }
}

/// Short human description of an API failure, without the variant prefix
/// for server-reported errors.
fn describe(err: &tailon_api::Error) -> String {
    match err {
        tailon_api::Error::Status { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tailon_api::Error> for CoreError {
    fn from(err: tailon_api::Error) -> Self {
        match err {
            tailon_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            tailon_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS setup failed: {msg}"),
            },
            tailon_api::Error::Stream(message) => CoreError::Stream { message },
            tailon_api::Error::Status { status, message } => CoreError::Fetch {
                message: format!("HTTP {status}: {message}"),
                status: Some(status),
            },
            ref e @ (tailon_api::Error::Transport(_)
            | tailon_api::Error::Deserialization { .. }) => CoreError::Fetch {
                message: e.to_string(),
                status: e.status(),
            },
        }
    }
}
