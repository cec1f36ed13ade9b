//! Screen implementations. Each screen is a top-level Component.

pub mod dashboard;
pub mod docs;

use std::sync::Arc;

use tailon_core::{DashboardSettings, StreamSource};

use crate::component::Component;
use crate::screen::ScreenId;

/// Create screen components for the tab bar.
pub fn create_screens(
    source: Arc<dyn StreamSource>,
    settings: DashboardSettings,
    server: &str,
) -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (
            ScreenId::Dashboard,
            Box::new(dashboard::DashboardScreen::new(source, settings)),
        ),
        (ScreenId::Docs, Box::new(docs::DocsScreen::new(server))),
    ]
}
