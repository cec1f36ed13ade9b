//! View/state synchronization core between `tailon-api` and the TUI.
//!
//! Everything here is synchronous and deterministic. The host owns a
//! [`Dashboard`], feeds it fetched snapshots, key-driven intents and a
//! periodic tick, and renders whatever state it exposes:
//!
//! - **[`Dashboard`]**: owns one [`ApplicationCard`] per application and
//!   reconciles fresh snapshots against them: a changed name set rebuilds,
//!   an unchanged one updates cards in place so transient state survives.
//!
//! - **[`ApplicationCard`]**: expand/collapse with a settle delay before
//!   streaming, the per-action [`Confirmations`] guard, busy tracking, and
//!   the one-second runtime display.
//!
//! - **[`LogStream`]**: one push connection per expanded card, a bounded
//!   FIFO of [`LogLine`]s and the connection status shown above them.
//!
//! - **[`Controller`]**: async facade over [`tailon_api::ApiClient`] that
//!   the host calls from its own tasks; also the production
//!   [`StreamSource`].
//!
//! Timers are plain [`std::time::Instant`] deadlines stored on their owner
//! and fired by [`Dashboard::tick`].

pub mod action;
pub mod card;
pub mod config;
pub mod confirm;
pub mod controller;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod log_stream;
pub mod model;
pub mod time;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::AppAction;
pub use card::{ApplicationCard, DetailsPanel};
pub use config::{DashboardSettings, RemoteConfig, TlsVerification};
pub use confirm::{Confirmations, TriggerOutcome};
pub use controller::Controller;
pub use dashboard::{Dashboard, DashboardTick, DashboardView, Notice, NoticeKind, Reconciliation};
pub use error::CoreError;
pub use log_stream::{LogStream, StreamSource, StreamStatus};
pub use tailon_api::{LogStreamHandle, StreamEvent};
pub use time::Moment;
pub use view::{CardView, StatusClass, format_duration};

pub use model::{
    Actor, ApplicationState, LaunchConfig, Lifecycle, LineKind, LineSource, LogLevel, LogLine,
    Snapshot, StateChange,
};
