//! Overlay configuration.
//!
//! [`OverlayConfig`] holds typed settings with defaults. [`SettingsLoader`]
//! fills it from a settings folder of one-value text files, which is how
//! streamers configure the overlay without editing JSON.
//!
//! ```ignore
//! let config = OverlayConfig::builder()
//!     .status_path("C:/YARG/currentSong.json")
//!     .selected_instruments(vec![Instrument::Drums, Instrument::Guitar])
//!     .build();
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoEnumIterator};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::song::Instrument;

pub const DEFAULT_STATUS_PATH: &str = "currentSong.json";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Settings consumed by the detector and the stream output.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    /// Status file written by the game
    pub status_path: String,
    /// Instruments in priority order for the difficulty display
    pub selected_instruments: Vec<Instrument>,
    /// Enables the Last.fm album art fallback
    pub lastfm_api_key: Option<String>,
    pub poll_interval: Duration,
    pub display_small_icon: bool,
    pub text_alignment: TextAlignment,
    /// Scene names written for the streaming software to switch to
    pub playing_scene: Option<String>,
    pub not_playing_scene: Option<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            status_path: DEFAULT_STATUS_PATH.to_string(),
            selected_instruments: Vec::new(),
            lastfm_api_key: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            display_small_icon: false,
            text_alignment: TextAlignment::default(),
            playing_scene: None,
            not_playing_scene: None,
        }
    }
}

impl OverlayConfig {
    pub fn builder() -> OverlayConfigBuilder {
        OverlayConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverlayConfigBuilder {
    status_path: Option<String>,
    selected_instruments: Option<Vec<Instrument>>,
    lastfm_api_key: Option<String>,
    poll_interval: Option<Duration>,
    display_small_icon: Option<bool>,
    text_alignment: Option<TextAlignment>,
    playing_scene: Option<String>,
    not_playing_scene: Option<String>,
}

impl OverlayConfigBuilder {
    pub fn status_path(mut self, path: impl Into<String>) -> Self {
        self.status_path = Some(path.into());
        self
    }

    pub fn selected_instruments(mut self, instruments: Vec<Instrument>) -> Self {
        self.selected_instruments = Some(instruments);
        self
    }

    pub fn lastfm_api_key(mut self, key: impl Into<String>) -> Self {
        self.lastfm_api_key = Some(key.into());
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn display_small_icon(mut self, enabled: bool) -> Self {
        self.display_small_icon = Some(enabled);
        self
    }

    pub fn text_alignment(mut self, alignment: TextAlignment) -> Self {
        self.text_alignment = Some(alignment);
        self
    }

    pub fn playing_scene(mut self, scene: impl Into<String>) -> Self {
        self.playing_scene = Some(scene.into());
        self
    }

    pub fn not_playing_scene(mut self, scene: impl Into<String>) -> Self {
        self.not_playing_scene = Some(scene.into());
        self
    }

    pub fn build(self) -> OverlayConfig {
        let default = OverlayConfig::default();
        OverlayConfig {
            status_path: self.status_path.unwrap_or(default.status_path),
            selected_instruments: self
                .selected_instruments
                .unwrap_or(default.selected_instruments),
            lastfm_api_key: self.lastfm_api_key.or(default.lastfm_api_key),
            poll_interval: self.poll_interval.unwrap_or(default.poll_interval),
            display_small_icon: self
                .display_small_icon
                .unwrap_or(default.display_small_icon),
            text_alignment: self.text_alignment.unwrap_or(default.text_alignment),
            playing_scene: self.playing_scene.or(default.playing_scene),
            not_playing_scene: self.not_playing_scene.or(default.not_playing_scene),
        }
    }
}

/// Settings file names inside the settings folder
pub mod files {
    pub const STATUS_PATH: &str = "CurrentSongFilePath.txt";
    pub const INSTRUMENTS: &str = "Instrument.txt";
    pub const LASTFM_API_KEY: &str = "LastFmAPIKey.txt";
    pub const DISPLAY_SMALL_ICON: &str = "DisplaySmallIcon.txt";
    pub const TEXT_ALIGNMENT: &str = "TextAlignment.txt";
    pub const PLAYING_SCENE: &str = "PlayingOBSSceneName.txt";
    pub const NOT_PLAYING_SCENE: &str = "NotPlayingOBSSceneName.txt";
}

/// Reads the settings folder into an [`OverlayConfig`].
///
/// Missing or empty files keep the default. A file that exists but cannot
/// be read or parsed is logged and skipped, so one bad setting never keeps
/// the overlay from starting.
pub struct SettingsLoader {
    root: PathBuf,
}

impl SettingsLoader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load(&self) -> OverlayConfig {
        let mut builder = OverlayConfig::builder();

        if let Some(path) = self.read_value(files::STATUS_PATH) {
            builder = builder.status_path(path);
        }
        if let Some(raw) = self.read_value(files::INSTRUMENTS) {
            builder = builder.selected_instruments(parse_instrument_list(&raw));
        }
        if let Some(key) = self.read_value(files::LASTFM_API_KEY) {
            builder = builder.lastfm_api_key(key);
        }
        if let Some(raw) = self.read_value(files::DISPLAY_SMALL_ICON) {
            match parse_bool(files::DISPLAY_SMALL_ICON, &raw) {
                Ok(enabled) => builder = builder.display_small_icon(enabled),
                Err(e) => warn!("{}", e),
            }
        }
        if let Some(raw) = self.read_value(files::TEXT_ALIGNMENT) {
            match TextAlignment::from_str(&raw) {
                Ok(alignment) => builder = builder.text_alignment(alignment),
                Err(_) => warn!(
                    "{}",
                    Error::InvalidSetting {
                        key: files::TEXT_ALIGNMENT.to_string(),
                        message: format!("unknown alignment {:?}", raw),
                    }
                ),
            }
        }
        if let Some(scene) = self.read_value(files::PLAYING_SCENE) {
            builder = builder.playing_scene(scene);
        }
        if let Some(scene) = self.read_value(files::NOT_PLAYING_SCENE) {
            builder = builder.not_playing_scene(scene);
        }

        builder.build()
    }

    /// Trimmed content of a settings file, `None` if missing or blank.
    fn read_value(&self, file_name: &str) -> Option<String> {
        let path = self.root.join(file_name);
        match fs::read_to_string(&path) {
            Ok(raw) => {
                let value = raw.trim();
                if value.is_empty() {
                    debug!("{} is empty, using default", path.display());
                    None
                } else {
                    Some(value.to_string())
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} not found, using default", path.display());
                None
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Parse a comma separated instrument list; unknown names are skipped.
pub fn parse_instrument_list(raw: &str) -> Vec<Instrument> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter_map(|name| match Instrument::from_str(name) {
            Ok(instrument) => Some(instrument),
            Err(_) => {
                let known: Vec<&'static str> = Instrument::iter().map(|i| i.key()).collect();
                warn!(
                    "Unknown instrument {:?} in {}, expected one of {}",
                    name,
                    files::INSTRUMENTS,
                    known.join(", ")
                );
                None
            }
        })
        .collect()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(Error::InvalidSetting {
            key: key.to_string(),
            message: format!("expected true or false, got {:?}", raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_builder_defaults() {
        let config = OverlayConfig::builder().build();
        assert_eq!(config, OverlayConfig::default());
        assert_eq!(config.status_path, "currentSong.json");
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert!(config.selected_instruments.is_empty());
        assert!(config.lastfm_api_key.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = OverlayConfig::builder()
            .status_path("/tmp/song.json")
            .poll_interval(Duration::from_millis(250))
            .text_alignment(TextAlignment::Right)
            .build();
        assert_eq!(config.status_path, "/tmp/song.json");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.text_alignment, TextAlignment::Right);
    }

    #[test]
    fn test_load_missing_folder_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let loader = SettingsLoader::new(dir.path().join("nope"));
        assert_eq!(loader.load(), OverlayConfig::default());
    }

    #[test]
    fn test_load_settings_folder() {
        let dir = TempDir::new().unwrap();
        write(&dir, files::STATUS_PATH, "  C:/YARG/currentSong.json\r\n");
        write(&dir, files::INSTRUMENTS, "DRUMS, guitar ,KAZOO,,VOCALS");
        write(&dir, files::LASTFM_API_KEY, "secret\n");
        write(&dir, files::DISPLAY_SMALL_ICON, "TRUE");
        write(&dir, files::TEXT_ALIGNMENT, "Center");
        write(&dir, files::PLAYING_SCENE, "Playing");
        write(&dir, files::NOT_PLAYING_SCENE, "   ");

        let config = SettingsLoader::new(dir.path()).load();
        assert_eq!(config.status_path, "C:/YARG/currentSong.json");
        assert_eq!(
            config.selected_instruments,
            vec![Instrument::Drums, Instrument::Guitar, Instrument::Vocals]
        );
        assert_eq!(config.lastfm_api_key.as_deref(), Some("secret"));
        assert!(config.display_small_icon);
        assert_eq!(config.text_alignment, TextAlignment::Center);
        assert_eq!(config.playing_scene.as_deref(), Some("Playing"));
        assert_eq!(config.not_playing_scene, None);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let dir = TempDir::new().unwrap();
        write(&dir, files::DISPLAY_SMALL_ICON, "sometimes");
        write(&dir, files::TEXT_ALIGNMENT, "diagonal");

        let config = SettingsLoader::new(dir.path()).load();
        assert!(!config.display_small_icon);
        assert_eq!(config.text_alignment, TextAlignment::Left);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("k", "yes").unwrap());
        assert!(!parse_bool("k", "Off").unwrap());
        assert!(matches!(
            parse_bool("k", "maybe"),
            Err(Error::InvalidSetting { .. })
        ));
    }
}
