use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::{OverlayConfig, TextAlignment};
use crate::error::Result;
use crate::song::{EnrichedSongRecord, SongUpdate};

pub const NOW_PLAYING_FILE: &str = "nowplaying.json";

const TEXT_FILES: [&str; 4] = ["title.txt", "artist.txt", "album.txt", "instrument.txt"];

/// Display settings forwarded to the browser source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    pub display_small_icon: bool,
    pub text_alignment: TextAlignment,
    #[serde(skip)]
    pub playing_scene: Option<String>,
    #[serde(skip)]
    pub not_playing_scene: Option<String>,
}

impl From<&OverlayConfig> for DisplaySettings {
    fn from(config: &OverlayConfig) -> Self {
        Self {
            display_small_icon: config.display_small_icon,
            text_alignment: config.text_alignment,
            playing_scene: config.playing_scene.clone(),
            not_playing_scene: config.not_playing_scene.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NowPlaying<'a> {
    playing: bool,
    updated_at: DateTime<Utc>,
    #[serde(flatten)]
    display: &'a DisplaySettings,
    song: Option<&'a EnrichedSongRecord>,
}

pub struct StreamOutput {
    base_dir: PathBuf,
    display: DisplaySettings,
}

impl StreamOutput {
    pub fn new<P: AsRef<Path>>(base_dir: P, display: DisplaySettings) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            display,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Write every output file for `update`.
    pub fn write_update(&self, update: &SongUpdate) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;

        let song = update.song().filter(|song| song.is_playing());
        match song {
            Some(song) => self.write_full_song_info(song)?,
            None => self.clear_full_song_info()?,
        }
        self.write_play_state(song.is_some())?;
        self.write_scene(song.is_some())?;
        self.write_now_playing(update.song(), song.is_some())?;

        debug!(
            "Stream output updated in {} (playing: {})",
            self.base_dir.display(),
            song.is_some()
        );
        Ok(())
    }

    fn write_now_playing(&self, song: Option<&EnrichedSongRecord>, playing: bool) -> Result<()> {
        let now_playing = NowPlaying {
            playing,
            updated_at: Utc::now(),
            display: &self.display,
            song,
        };
        let json = serde_json::to_string_pretty(&now_playing)?;
        self.write_file(NOW_PLAYING_FILE, &json)
    }

    fn write_play_state(&self, playing: bool) -> Result<()> {
        self.write_file("playstate.txt", if playing { "play" } else { "off" })
    }

    fn write_scene(&self, playing: bool) -> Result<()> {
        let scene = if playing {
            self.display.playing_scene.as_deref()
        } else {
            self.display.not_playing_scene.as_deref()
        };
        self.write_file("scene.txt", scene.unwrap_or_default())
    }

    /// Write per-field text files for OBS text sources
    pub fn write_full_song_info(&self, song: &EnrichedSongRecord) -> Result<()> {
        self.write_file("title.txt", &song.record.name)?;
        self.write_file("artist.txt", &song.record.artist)?;
        self.write_file("album.txt", &song.record.album)?;

        let instrument = song
            .selected_instrument()
            .map(|entry| format!("{} {}", entry.instrument, entry.difficulty))
            .unwrap_or_default();
        self.write_file("instrument.txt", &instrument)?;

        Ok(())
    }

    pub fn clear_full_song_info(&self) -> Result<()> {
        for name in TEXT_FILES {
            self.write_file(name, "")?;
        }
        Ok(())
    }

    fn write_file(&self, filename: &str, content: &str) -> Result<()> {
        fs::write(self.base_dir.join(filename), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::{Instrument, InstrumentSelection, SongRecord};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn read(dir: &TempDir, name: &str) -> String {
        fs::read_to_string(dir.path().join(name)).unwrap()
    }

    fn display() -> DisplaySettings {
        DisplaySettings {
            display_small_icon: true,
            text_alignment: TextAlignment::Center,
            playing_scene: Some("Gameplay".to_string()),
            not_playing_scene: Some("Menu".to_string()),
        }
    }

    fn song(name: &str) -> SongUpdate {
        SongUpdate::Song(Arc::new(EnrichedSongRecord {
            record: SongRecord {
                name: name.to_string(),
                artist: "Band".to_string(),
                album: "Record".to_string(),
                ..Default::default()
            },
            album_art: None,
            source_icon: None,
            selected_instruments: vec![InstrumentSelection {
                active: true,
                instrument: Instrument::Drums,
                difficulty: 4,
            }],
        }))
    }

    #[test]
    fn test_write_playing_song() {
        let dir = TempDir::new().unwrap();
        let output = StreamOutput::new(dir.path(), display());

        output.write_update(&song("Song")).unwrap();

        assert_eq!(read(&dir, "title.txt"), "Song");
        assert_eq!(read(&dir, "artist.txt"), "Band");
        assert_eq!(read(&dir, "album.txt"), "Record");
        assert_eq!(read(&dir, "instrument.txt"), "DRUMS 4");
        assert_eq!(read(&dir, "playstate.txt"), "play");
        assert_eq!(read(&dir, "scene.txt"), "Gameplay");

        let json: serde_json::Value = serde_json::from_str(&read(&dir, NOW_PLAYING_FILE)).unwrap();
        assert_eq!(json["playing"], true);
        assert_eq!(json["displaySmallIcon"], true);
        assert_eq!(json["textAlignment"], "center");
        assert_eq!(json["song"]["Name"], "Song");
        assert!(json["updatedAt"].is_string());
    }

    #[test]
    fn test_empty_clears_text_files() {
        let dir = TempDir::new().unwrap();
        let output = StreamOutput::new(dir.path(), display());

        output.write_update(&song("Song")).unwrap();
        output.write_update(&SongUpdate::Empty).unwrap();

        for name in TEXT_FILES {
            assert_eq!(read(&dir, name), "", "{name}");
        }
        assert_eq!(read(&dir, "playstate.txt"), "off");
        assert_eq!(read(&dir, "scene.txt"), "Menu");

        let json: serde_json::Value = serde_json::from_str(&read(&dir, NOW_PLAYING_FILE)).unwrap();
        assert_eq!(json["playing"], false);
        assert!(json["song"].is_null());
    }

    #[test]
    fn test_idle_song_is_off() {
        let dir = TempDir::new().unwrap();
        let output = StreamOutput::new(dir.path(), display());

        output.write_update(&song("")).unwrap();

        assert_eq!(read(&dir, "playstate.txt"), "off");
        assert_eq!(read(&dir, "title.txt"), "");
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("overlay").join("out");
        let output = StreamOutput::new(&nested, DisplaySettings::from(&OverlayConfig::default()));

        output.write_update(&SongUpdate::Empty).unwrap();

        assert!(nested.join(NOW_PLAYING_FILE).exists());
        assert_eq!(fs::read_to_string(nested.join("scene.txt")).unwrap(), "");
    }
}
