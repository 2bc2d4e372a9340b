//! Main watch mode command.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use yawo_core::{
    DisplaySettings, Fetcher, OverlayConfig, Scheduler, SongStateDetector, SourceCatalog,
    StreamOutput,
};

/// Poll the status file until Ctrl+C, writing every update to `output_dir`.
pub fn run(config: &OverlayConfig, output_dir: &Path) -> Result<()> {
    let scheduler = Scheduler::new(config.poll_interval);

    // Setup graceful shutdown handler
    let stop = scheduler.stop_handle();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        stop.stop();
    })?;

    info!("yawo {}", env!("CARGO_PKG_VERSION"));

    let fetcher = Fetcher::new();
    let catalog = Arc::new(SourceCatalog::new());
    // Loaders are detached; icons show up once both indexes settle
    let _loaders = catalog.spawn_load(Arc::new(fetcher.clone()));

    if config.selected_instruments.is_empty() {
        warn!("No instruments selected, difficulty display is disabled");
    }

    let detector = Arc::new(SongStateDetector::from_config(config, fetcher, catalog));

    let output = StreamOutput::new(output_dir, DisplaySettings::from(config));
    info!("Writing stream output to {}", output.base_dir().display());
    detector.subscribe(move |update| Ok(output.write_update(update)?));

    let polling = Arc::clone(&detector);
    scheduler.add(move || {
        polling.poll();
        Ok(())
    });

    println!(
        "Watching {} every {:?} (Ctrl+C to quit)",
        detector.status_path(),
        scheduler.period()
    );
    let ticks = scheduler.run();

    info!("Stopped after {} polls", ticks);
    Ok(())
}
