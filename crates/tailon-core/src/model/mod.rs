// ── Domain model ──
//
// Canonical client-side representation of what the server reports.
// Wire payloads from `tailon_api::models` are converted into these types
// in `crate::convert`; nothing downstream sees the wire shapes.

pub mod application;
pub mod log;

pub use application::{Actor, ApplicationState, LaunchConfig, Lifecycle, Snapshot, StateChange};
pub use log::{LineKind, LineSource, LogLevel, LogLine};
