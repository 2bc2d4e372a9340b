//! Stream output for OBS integration.
//!
//! Writes the current song to a directory that browser sources and text
//! sources can read:
//!
//! - `nowplaying.json` with the enriched record and display settings
//! - One text file per displayed field (title, artist, album, instrument)
//! - Play state (`play` / `off`) and the scene to switch to

mod output;

pub use output::*;
