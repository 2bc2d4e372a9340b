//! Album art fallback through the Last.fm `album.getinfo` API.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::fetch::Fetcher;

pub const LASTFM_ENDPOINT: &str = "https://ws.audioscrobbler.com/2.0/";

/// Best-effort remote lookup of an album image URL.
pub trait ArtResolver: Send + Sync {
    /// `None` when nothing was found or the lookup failed.
    fn resolve_image(&self, artist: &str, album: &str) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct AlbumInfoResponse {
    album: Option<AlbumInfo>,
    error: Option<u32>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlbumInfo {
    #[serde(default)]
    image: Vec<AlbumImage>,
}

#[derive(Debug, Deserialize)]
struct AlbumImage {
    #[serde(rename = "#text", default)]
    text: String,
}

/// Largest image URL from an `album.getinfo` response body.
///
/// Last.fm lists images from small to mega, so the last entry wins. An
/// empty URL means Last.fm has no art for the album.
pub fn image_from_response(body: &str) -> Result<Option<String>> {
    let response: AlbumInfoResponse = serde_json::from_str(body)?;

    if let Some(code) = response.error {
        debug!(
            "Last.fm error {}: {}",
            code,
            response.message.as_deref().unwrap_or("no message")
        );
    }

    Ok(response
        .album
        .and_then(|album| album.image.into_iter().next_back())
        .map(|image| image.text)
        .filter(|url| !url.is_empty()))
}

pub struct LastFmArtResolver {
    api_key: Option<String>,
    endpoint: String,
    fetcher: Fetcher,
}

impl LastFmArtResolver {
    /// Without a key every lookup returns `None` without touching the network.
    pub fn new(api_key: Option<String>, fetcher: Fetcher) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            endpoint: LASTFM_ENDPOINT.to_string(),
            fetcher,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn request(&self, api_key: &str, artist: &str, album: &str) -> Result<Option<String>> {
        let body = self
            .fetcher
            .agent()
            .get(&self.endpoint)
            .header("User-Agent", self.fetcher.user_agent())
            .query("method", "album.getinfo")
            .query("artist", artist)
            .query("album", album)
            .query("format", "json")
            .query("api_key", api_key)
            .call()?
            .body_mut()
            .read_to_string()?;

        image_from_response(&body)
    }
}

impl ArtResolver for LastFmArtResolver {
    fn resolve_image(&self, artist: &str, album: &str) -> Option<String> {
        let api_key = self.api_key.as_deref()?;

        match self.request(api_key, artist, album) {
            Ok(Some(url)) => {
                debug!("Last.fm art for {} - {}: {}", artist, album, url);
                Some(url)
            }
            Ok(None) => {
                debug!("Last.fm has no art for {} - {}", artist, album);
                None
            }
            Err(e) => {
                warn!("Last.fm lookup failed for {} - {}: {}", artist, album, e);
                None
            }
        }
    }
}
