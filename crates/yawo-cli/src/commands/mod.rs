//! CLI command implementations.

pub mod icon;
pub mod once;
pub mod watch;

use std::path::Path;
use std::time::Duration;

use tracing::info;
use yawo_core::{OverlayConfig, SettingsLoader};

/// Settings folder plus command line overrides.
pub fn load_config(
    settings: &Path,
    status: Option<String>,
    interval_ms: Option<u64>,
) -> OverlayConfig {
    let mut config = SettingsLoader::new(settings).load();
    info!("Loaded settings from {}", settings.display());

    if let Some(status) = status {
        config.status_path = status;
    }
    if let Some(ms) = interval_ms {
        config.poll_interval = Duration::from_millis(ms.max(1));
    }
    config
}
