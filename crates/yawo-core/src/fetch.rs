//! Resource fetching for local files and remote URLs.
//!
//! Everything the pipeline reads (the status file, chart album art, catalog
//! indexes, Last.fm responses) goes through the [`Fetch`] trait so the
//! detector can be driven by a fake in tests.

use std::fs;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::error::{Error, Result};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Read raw content from a location (local path or `http(s)://` URL).
pub trait Fetch: Send + Sync {
    fn fetch_bytes(&self, location: &str) -> Result<Vec<u8>>;

    /// Fetch and decode as text, honouring a leading byte order mark.
    fn fetch_text(&self, location: &str) -> Result<String> {
        let bytes = self.fetch_bytes(location)?;
        Ok(decode_text(&bytes, location))
    }

    /// Fetch and encode the content as standard base64.
    fn fetch_base64(&self, location: &str) -> Result<String> {
        let bytes = self.fetch_bytes(location)?;
        Ok(STANDARD.encode(bytes))
    }
}

/// Default fetcher: filesystem for paths, `ureq` for URLs.
#[derive(Clone)]
pub struct Fetcher {
    agent: ureq::Agent,
    user_agent: String,
}

impl Fetcher {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(HTTP_TIMEOUT))
            .build();
        let user_agent = format!(
            "yawo/{} ({})",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS
        );

        Self {
            agent: config.into(),
            user_agent,
        }
    }

    /// Shared HTTP agent, reused by the remote lookups.
    pub fn agent(&self) -> &ureq::Agent {
        &self.agent
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetch for Fetcher {
    fn fetch_bytes(&self, location: &str) -> Result<Vec<u8>> {
        if location.trim().is_empty() {
            return Err(Error::InvalidLocation("empty location".to_string()));
        }

        if is_remote(location) {
            let mut response = self
                .agent
                .get(location)
                .header("User-Agent", &self.user_agent)
                .call()?;
            Ok(response.body_mut().read_to_vec()?)
        } else {
            Ok(fs::read(location)?)
        }
    }
}

/// Whether a location should be fetched over HTTP.
pub fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Decode bytes as UTF-8 unless a UTF-16 byte order mark says otherwise.
///
/// A UTF-8 BOM is stripped. Invalid sequences become U+FFFD.
pub fn decode_text(bytes: &[u8], location: &str) -> String {
    let (text, encoding, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if had_errors {
        debug!(
            "Invalid {} sequences in {}, replaced",
            encoding.name(),
            location
        );
    }
    text.into_owned()
}

/// Build a `data:` URL from raw bytes.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/index.json"));
        assert!(is_remote("HTTP://example.com"));
        assert!(!is_remote("C:\\Songs\\chart"));
        assert!(!is_remote("/home/user/currentSong.json"));
    }

    #[test]
    fn test_fetch_local_text_strips_bom() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\xEF\xBB\xBF{\"Name\":\"Song\"}").unwrap();

        let fetcher = Fetcher::new();
        let text = fetcher
            .fetch_text(file.path().to_str().unwrap())
            .unwrap();
        assert_eq!(text, "{\"Name\":\"Song\"}");
    }

    #[test]
    fn test_fetch_local_base64() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();

        let fetcher = Fetcher::new();
        let encoded = fetcher
            .fetch_base64(file.path().to_str().unwrap())
            .unwrap();
        assert_eq!(encoded, "YWJj");
    }

    #[test]
    fn test_fetch_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");

        let err = Fetcher::new()
            .fetch_bytes(missing.to_str().unwrap())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_fetch_empty_location() {
        let err = Fetcher::new().fetch_bytes("  ").unwrap_err();
        assert!(matches!(err, Error::InvalidLocation(_)));
    }

    #[test]
    fn test_data_url() {
        assert_eq!(data_url("image/png", b"abc"), "data:image/png;base64,YWJj");
    }
}
