use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Difficulty value YARG writes for a part that has no chart.
pub const NOT_CHARTED: i32 = -1;

/// Instrument part keys used in `PartDifficulties`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Instrument {
    #[serde(rename = "GUITAR")]
    #[strum(serialize = "GUITAR")]
    Guitar,
    #[serde(rename = "GUITAR_COOP")]
    #[strum(serialize = "GUITAR_COOP")]
    GuitarCoop,
    #[serde(rename = "REAL_GUITAR")]
    #[strum(serialize = "REAL_GUITAR")]
    RealGuitar,
    #[serde(rename = "RHYTHM")]
    #[strum(serialize = "RHYTHM")]
    Rhythm,
    #[serde(rename = "BASS")]
    #[strum(serialize = "BASS")]
    Bass,
    #[serde(rename = "REAL_BASS")]
    #[strum(serialize = "REAL_BASS")]
    RealBass,
    #[serde(rename = "DRUMS")]
    #[strum(serialize = "DRUMS")]
    Drums,
    #[serde(rename = "GH_DRUMS")]
    #[strum(serialize = "GH_DRUMS")]
    GhDrums,
    #[serde(rename = "REALDRUMS")]
    #[strum(serialize = "REALDRUMS")]
    RealDrums,
    #[serde(rename = "KEYS")]
    #[strum(serialize = "KEYS")]
    Keys,
    #[serde(rename = "REAL_KEYS")]
    #[strum(serialize = "REAL_KEYS")]
    RealKeys,
    #[serde(rename = "VOCALS")]
    #[strum(serialize = "VOCALS")]
    Vocals,
    #[serde(rename = "HARMONY")]
    #[strum(serialize = "HARMONY")]
    Harmony,
}

impl Instrument {
    /// Key used for this part in the status file.
    pub fn key(&self) -> &'static str {
        self.into()
    }
}

/// Per-part difficulty map as written by the game.
///
/// Kept keyed by string so parts added by newer game versions survive a
/// round trip to the overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartDifficulties(BTreeMap<String, i32>);

impl PartDifficulties {
    pub fn get(&self, instrument: Instrument) -> Option<i32> {
        self.0.get(instrument.key()).copied()
    }

    /// Charted difficulty of a part, `None` if missing or [`NOT_CHARTED`].
    pub fn charted(&self, instrument: Instrument) -> Option<i32> {
        self.get(instrument).filter(|difficulty| *difficulty > NOT_CHARTED)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Instrument, i32)> for PartDifficulties {
    fn from_iter<I: IntoIterator<Item = (Instrument, i32)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(instrument, difficulty)| (instrument.key().to_string(), difficulty))
                .collect(),
        )
    }
}

/// One entry of the instrument selection shown by the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSelection {
    /// Only the first charted instrument in priority order is active.
    pub active: bool,
    pub instrument: Instrument,
    pub difficulty: i32,
}

/// Scan `priority` in order against `parts`.
///
/// Every charted instrument from the list is returned in priority order,
/// the first one marked active. Empty when nothing in the list is charted.
pub fn select_instruments(
    priority: &[Instrument],
    parts: &PartDifficulties,
) -> Vec<InstrumentSelection> {
    priority
        .iter()
        .filter_map(|instrument| {
            parts
                .charted(*instrument)
                .map(|difficulty| (*instrument, difficulty))
        })
        .enumerate()
        .map(|(index, (instrument, difficulty))| InstrumentSelection {
            active: index == 0,
            instrument,
            difficulty,
        })
        .collect()
}
