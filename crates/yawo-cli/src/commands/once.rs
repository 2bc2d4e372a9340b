//! Single poll, printed to stdout.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use tracing::warn;
use yawo_core::{
    EnrichedSongRecord, Fetcher, OverlayConfig, PollOutcome, SongStateDetector, SongUpdate,
    SourceCatalog,
};

const CATALOG_TIMEOUT: Duration = Duration::from_secs(10);

pub fn run(config: &OverlayConfig, json: bool) -> Result<()> {
    let fetcher = Fetcher::new();
    let catalog = Arc::new(SourceCatalog::new());
    catalog.spawn_load(Arc::new(fetcher.clone()));
    if !catalog.wait_loaded(CATALOG_TIMEOUT) {
        warn!("Source catalogs not loaded, icon will be missing");
    }

    let detector = SongStateDetector::from_config(config, fetcher, catalog);
    let received: Arc<Mutex<Option<SongUpdate>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&received);
    detector.subscribe(move |update| {
        *sink.lock().unwrap_or_else(|e| e.into_inner()) = Some(update.clone());
        Ok(())
    });

    if detector.poll() == PollOutcome::ReadFailed {
        bail!("Could not read status file {}", detector.status_path());
    }

    let update = received
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .take()
        .unwrap_or(SongUpdate::Empty);

    match (update.song(), json) {
        (Some(song), true) => println!("{}", serde_json::to_string_pretty(song)?),
        (None, true) => println!("null"),
        (Some(song), false) if song.is_playing() => print_summary(song),
        _ => println!("{}", "Not playing".dimmed()),
    }
    Ok(())
}

fn print_summary(song: &EnrichedSongRecord) {
    let record = &song.record;
    println!("{}", record.name.bold());
    println!("  {} {}", "Artist:".dimmed(), record.artist);
    if !record.album.is_empty() {
        println!("  {} {}", "Album: ".dimmed(), record.album);
    }
    if !record.charter.is_empty() {
        println!("  {} {}", "Charter:".dimmed(), record.charter);
    }

    for entry in &song.selected_instruments {
        let line = format!("{} {}", entry.instrument, entry.difficulty);
        if entry.active {
            println!("  {} {}", "*".green(), line.green());
        } else {
            println!("    {}", line);
        }
    }

    match &song.album_art {
        Some(art) if art.is_embedded() => println!("  {} embedded", "Art:".dimmed()),
        Some(art) => println!("  {} {}", "Art:".dimmed(), art.as_src().cyan()),
        None => println!("  {} {}", "Art:".dimmed(), "none".yellow()),
    }
    if let Some(icon) = &song.source_icon {
        println!("  {} {}", "Icon:".dimmed(), icon.as_src().cyan());
    }
}
