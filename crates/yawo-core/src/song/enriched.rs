use std::sync::Arc;

use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::song::{InstrumentSelection, SongRecord};

/// Something an `<img src>` can display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    /// Embedded `data:` URL
    Data(String),
    Url(String),
}

impl ImageRef {
    pub fn as_src(&self) -> &str {
        match self {
            Self::Data(src) | Self::Url(src) => src,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Data(_))
    }
}

/// Keys the overlay adds next to the record's own fields.
const DERIVED_KEYS: [&str; 3] = ["AlbumArt", "SourceIcon", "SelectedInstruments"];

/// Song record plus the display fields derived from it.
///
/// Serializes as one flat object: the record's fields, then the derived
/// ones. A status file carrying a derived key of its own is overridden.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSongRecord {
    pub record: SongRecord,
    pub album_art: Option<ImageRef>,
    pub source_icon: Option<ImageRef>,
    pub selected_instruments: Vec<InstrumentSelection>,
}

impl EnrichedSongRecord {
    /// The active entry of the instrument selection.
    pub fn selected_instrument(&self) -> Option<&InstrumentSelection> {
        self.selected_instruments.iter().find(|entry| entry.active)
    }

    pub fn is_playing(&self) -> bool {
        self.record.is_playing()
    }
}

impl Serialize for EnrichedSongRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut fields = match serde_json::to_value(&self.record).map_err(S::Error::custom)? {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        for key in DERIVED_KEYS {
            fields.remove(key);
        }

        let mut map = serializer.serialize_map(Some(fields.len() + DERIVED_KEYS.len()))?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(DERIVED_KEYS[0], &self.album_art)?;
        map.serialize_entry(DERIVED_KEYS[1], &self.source_icon)?;
        map.serialize_entry(DERIVED_KEYS[2], &self.selected_instruments)?;
        map.end()
    }
}

/// Payload delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum SongUpdate {
    Song(Arc<EnrichedSongRecord>),
    /// The status file could not be parsed; the current song is unknown.
    Empty,
}

impl SongUpdate {
    pub fn song(&self) -> Option<&EnrichedSongRecord> {
        match self {
            Self::Song(song) => Some(song),
            Self::Empty => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.song().is_some_and(EnrichedSongRecord::is_playing)
    }
}
