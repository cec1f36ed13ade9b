// tailon-api: Async Rust client for the tailon process manager API (REST + SSE log streams)

pub mod client;
pub mod error;
pub mod models;
pub mod stream;
pub mod transport;

pub use client::ApiClient;
pub use error::Error;
pub use models::{ActionResponse, AppConfig, ApplicationResponse, LifecycleState, LogEntry, User};
pub use stream::{LogStreamHandle, ReconnectConfig, StreamEvent};
pub use transport::{TlsMode, TransportConfig};
