//! # yawo-core
//!
//! Core library for the YARG "now playing" overlay.
//!
//! This crate provides:
//! - Status file normalization and parsing (`SongRecord`)
//! - Change detection and enrichment (`SongStateDetector`)
//! - Album art from the chart folder with a Last.fm fallback
//! - Source icon lookup against the YARG source catalogs
//! - A fixed-period `Scheduler` and file-based `StreamOutput` for OBS

pub mod attempt;
pub mod catalog;
pub mod config;
pub mod detector;
pub mod error;
pub mod fetch;
pub mod lastfm;
pub mod normalize;
pub mod prelude;
pub mod scheduler;
pub mod song;
pub mod stream;
pub mod subscribers;

pub use attempt::{Race, first_success};
pub use catalog::{CatalogState, IndexKind, SourceCatalog, SourceEntry, SourceIndex};
pub use config::{OverlayConfig, OverlayConfigBuilder, SettingsLoader, TextAlignment};
pub use detector::{PollOutcome, SongStateDetector};
pub use error::{Error, Result};
pub use fetch::{Fetch, Fetcher};
pub use lastfm::{ArtResolver, LastFmArtResolver};
pub use normalize::{is_vendor_format, normalize};
pub use scheduler::{Scheduler, StopHandle};
pub use song::{
    EnrichedSongRecord, ImageRef, Instrument, InstrumentSelection, PartDifficulties, SongRecord,
    SongUpdate, select_instruments,
};
pub use stream::{DisplaySettings, StreamOutput};
pub use subscribers::{Subscribers, SubscriptionId};
