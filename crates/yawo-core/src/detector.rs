//! Song state detection: poll the status file, enrich, fan out.
//!
//! Every poll runs `Reading → change check → parse → enrich → notify`.
//! The baseline content is swapped under a lock at change-check time, before
//! any slow enrichment work starts, so overlapping polls of the same content
//! notify once. No failure leaves the detector unable to poll again.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, info, warn};

use crate::attempt::{Race, first_success};
use crate::catalog::SourceCatalog;
use crate::config::OverlayConfig;
use crate::error::{Error, Result};
use crate::fetch::{Fetch, Fetcher, data_url, is_remote};
use crate::lastfm::{ArtResolver, LastFmArtResolver};
use crate::song::{
    EnrichedSongRecord, ImageRef, Instrument, InstrumentSelection, SongRecord, SongUpdate,
    select_instruments,
};
use crate::subscribers::{Subscribers, SubscriptionId};

/// Album art file names looked up in the chart folder, with their MIME type.
pub const ALBUM_ART_FILES: &[(&str, &str)] = &[
    ("album.png", "image/png"),
    ("album.jpg", "image/jpeg"),
    ("album.jpeg", "image/jpeg"),
];

/// What a single poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    ReadFailed,
    Unchanged,
    /// Content changed but did not parse; subscribers got [`SongUpdate::Empty`]
    NotifiedEmpty,
    NotifiedSong,
}

pub struct SongStateDetector {
    status_path: String,
    selected_instruments: Vec<Instrument>,
    fetcher: Arc<dyn Fetch>,
    catalog: Arc<SourceCatalog>,
    art_resolver: Option<Arc<dyn ArtResolver>>,
    /// Last content seen in the status file, empty before the first read
    last_content: Mutex<String>,
    subscribers: Subscribers,
}

impl SongStateDetector {
    pub fn new(
        status_path: impl Into<String>,
        fetcher: Arc<dyn Fetch>,
        catalog: Arc<SourceCatalog>,
    ) -> Self {
        Self {
            status_path: status_path.into(),
            selected_instruments: Vec::new(),
            fetcher,
            catalog,
            art_resolver: None,
            last_content: Mutex::new(String::new()),
            subscribers: Subscribers::new(),
        }
    }

    /// Detector wired the way the overlay runs: Last.fm fallback when a key
    /// is configured.
    pub fn from_config(
        config: &OverlayConfig,
        fetcher: Fetcher,
        catalog: Arc<SourceCatalog>,
    ) -> Self {
        let resolver = LastFmArtResolver::new(config.lastfm_api_key.clone(), fetcher.clone());
        let detector = Self::new(config.status_path.clone(), Arc::new(fetcher), catalog)
            .with_selected_instruments(config.selected_instruments.clone());

        if resolver.is_configured() {
            detector.with_art_resolver(Arc::new(resolver))
        } else {
            debug!("No Last.fm API key, album art fallback disabled");
            detector
        }
    }

    pub fn with_selected_instruments(mut self, instruments: Vec<Instrument>) -> Self {
        self.selected_instruments = instruments;
        self
    }

    pub fn with_art_resolver(mut self, resolver: Arc<dyn ArtResolver>) -> Self {
        self.art_resolver = Some(resolver);
        self
    }

    pub fn status_path(&self) -> &str {
        &self.status_path
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&SongUpdate) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribers.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// One poll cycle. Never fails; see [`PollOutcome`].
    pub fn poll(&self) -> PollOutcome {
        let content = match self.fetcher.fetch_text(&self.status_path) {
            Ok(content) => content,
            Err(e) => {
                if e.is_not_found() {
                    debug!("Status file {} not found", self.status_path);
                } else {
                    warn!("Failed to read status file {}: {}", self.status_path, e);
                }
                return PollOutcome::ReadFailed;
            }
        };

        if !self.check_changed(&content) {
            return PollOutcome::Unchanged;
        }

        match self.normalize_and_parse(&content) {
            Ok(record) => {
                info!("Song changed: {} - {}", record.artist, record.name);
                let enriched = self.enrich(record);
                self.notify(&SongUpdate::Song(Arc::new(enriched)));
                PollOutcome::NotifiedSong
            }
            Err(e) => {
                warn!("Failed to parse status file {}: {}", self.status_path, e);
                self.notify(&SongUpdate::Empty);
                PollOutcome::NotifiedEmpty
            }
        }
    }

    /// Compare with the stored content and store `new_content` if different.
    pub fn check_changed(&self, new_content: &str) -> bool {
        let mut last = self.last_content.lock().unwrap_or_else(|e| e.into_inner());
        if *last == new_content {
            return false;
        }
        *last = new_content.to_string();
        true
    }

    pub fn normalize_and_parse(&self, content: &str) -> Result<SongRecord> {
        SongRecord::parse(content)
    }

    /// Derive display fields. Art and icon are resolved on separate threads
    /// and the record is only built once both have settled.
    pub fn enrich(&self, record: SongRecord) -> EnrichedSongRecord {
        let (album_art, source_icon, selected_instruments) = thread::scope(|scope| {
            let art = scope.spawn(|| self.resolve_album_art(&record));
            let icon = scope.spawn(|| self.resolve_source_icon(&record.source));
            let instruments = self.select_instruments(&record);

            let album_art = art.join().unwrap_or_else(|_| {
                warn!("Album art resolution panicked");
                None
            });
            let source_icon = icon.join().unwrap_or_else(|_| {
                warn!("Source icon resolution panicked");
                None
            });
            (album_art, source_icon, instruments)
        });

        EnrichedSongRecord {
            record,
            album_art,
            source_icon,
            selected_instruments,
        }
    }

    pub fn select_instruments(&self, record: &SongRecord) -> Vec<InstrumentSelection> {
        select_instruments(&self.selected_instruments, &record.part_difficulties)
    }

    /// Local chart art first, then the remote fallback.
    pub fn resolve_album_art(&self, record: &SongRecord) -> Option<ImageRef> {
        match self.local_album_art(&record.location) {
            Race::Won(image) => return Some(image),
            Race::AllFailed(errors) => {
                let unexpected: Vec<&Error> = errors.iter().filter(|e| !e.is_not_found()).collect();
                if unexpected.is_empty() {
                    debug!("No album art in {:?}", record.location);
                } else {
                    for e in unexpected {
                        debug!("Album art read failed in {:?}: {}", record.location, e);
                    }
                }
            }
        }

        let resolver = self.art_resolver.as_ref()?;
        if record.artist.is_empty() && record.album.is_empty() {
            return None;
        }
        resolver
            .resolve_image(&record.artist, &record.album)
            .map(ImageRef::Url)
    }

    /// Read every conventional art file concurrently; first hit wins.
    pub fn local_album_art(&self, location: &str) -> Race<ImageRef> {
        if location.trim().is_empty() {
            return Race::AllFailed(vec![Error::InvalidLocation(
                "chart location is empty".to_string(),
            )]);
        }

        let fetcher = self.fetcher.as_ref();
        let attempts = ALBUM_ART_FILES
            .iter()
            .map(|(file_name, mime)| {
                let path = join_location(location, file_name);
                move || -> Result<ImageRef> {
                    let bytes = fetcher.fetch_bytes(&path)?;
                    debug!("Album art found: {}", path);
                    Ok(ImageRef::Data(data_url(mime, &bytes)))
                }
            })
            .collect();

        first_success(attempts)
    }

    /// `None` while the catalog is still loading.
    pub fn resolve_source_icon(&self, source_id: &str) -> Option<ImageRef> {
        match self.catalog.resolve(source_id) {
            Ok(url) => Some(ImageRef::Url(url)),
            Err(e) => {
                debug!("Source icon for {:?} unresolved: {}", source_id, e);
                None
            }
        }
    }

    pub fn notify(&self, update: &SongUpdate) {
        let failed = self.subscribers.notify(update);
        if failed > 0 {
            debug!("{} subscriber(s) failed on this update", failed);
        }
    }
}

/// Join a file name onto a chart location, which may be a URL.
fn join_location(location: &str, file_name: &str) -> String {
    if is_remote(location) {
        format!("{}/{}", location.trim_end_matches('/'), file_name)
    } else {
        Path::new(location)
            .join(file_name)
            .to_string_lossy()
            .into_owned()
    }
}
