use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::normalize::normalize;
use crate::song::PartDifficulties;

/// Song as written by the game to the status file.
///
/// Every field is defaulted so that partial documents still parse, and
/// scalar fields accept whatever JSON type the game happened to write.
/// Fields the overlay does not use are kept in `extra` and passed through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SongRecord {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name_no_parenthesis: String,
    #[serde(deserialize_with = "lenient::string")]
    pub artist: String,
    #[serde(deserialize_with = "lenient::string")]
    pub album: String,
    #[serde(deserialize_with = "lenient::string")]
    pub charter: String,
    #[serde(deserialize_with = "lenient::string")]
    pub genre: String,
    #[serde(deserialize_with = "lenient::string")]
    pub year: String,
    #[serde(deserialize_with = "lenient::string")]
    pub playlist: String,
    #[serde(deserialize_with = "lenient::string")]
    pub sub_playlist: String,
    /// Chart source id, resolved to an icon through the source catalog
    #[serde(deserialize_with = "lenient::string")]
    pub source: String,
    #[serde(deserialize_with = "lenient::string")]
    pub checksum: String,
    /// Absolute folder of the chart
    #[serde(deserialize_with = "lenient::string")]
    pub location: String,
    /// Length in milliseconds
    #[serde(deserialize_with = "lenient::number")]
    pub song_length: u64,
    pub part_difficulties: PartDifficulties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SongRecord {
    /// Normalize vendor quirks then parse.
    pub fn parse(content: &str) -> Result<Self> {
        let normalized = normalize(content);
        Ok(serde_json::from_str(&normalized)?)
    }

    /// The game writes an empty name while no song is loaded.
    pub fn is_playing(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Scalar readers that accept any JSON scalar; `null` reads as the default.
mod lenient {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Numbers and booleans become their JSON text.
    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(String::new()),
            Value::String(text) => Ok(text),
            scalar @ (Value::Number(_) | Value::Bool(_)) => Ok(scalar.to_string()),
            other => Err(D::Error::custom(format!("expected a scalar, got {}", other))),
        }
    }

    /// Fractions are truncated, negatives and unparsable text read as 0.
    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(0),
            Value::Number(number) => Ok(number
                .as_u64()
                .or_else(|| number.as_f64().map(truncate))
                .unwrap_or_default()),
            Value::String(text) => {
                let text = text.trim();
                Ok(text
                    .parse::<u64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().map(truncate))
                    .unwrap_or_default())
            }
            other => Err(D::Error::custom(format!("expected a number, got {}", other))),
        }
    }

    fn truncate(value: f64) -> u64 {
        if value.is_finite() && value > 0.0 {
            value as u64
        } else {
            0
        }
    }
}
