//! Prelude module for convenient imports
//!
//! ```ignore
//! use yawo_core::prelude::*;
//! ```

// Pipeline
pub use crate::detector::{PollOutcome, SongStateDetector};
pub use crate::scheduler::{Scheduler, StopHandle};

// Configuration
pub use crate::config::{OverlayConfig, SettingsLoader};

// Song data
pub use crate::song::{EnrichedSongRecord, ImageRef, Instrument, SongRecord, SongUpdate};

// Remote sources
pub use crate::catalog::SourceCatalog;
pub use crate::fetch::{Fetch, Fetcher};
pub use crate::lastfm::{ArtResolver, LastFmArtResolver};

// Error handling
pub use crate::error::{Error, Result};
