//! Reusable rendering helpers shared by screens.

pub mod log_panel;
pub mod status_indicator;
