use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Error),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("All {attempts} attempts failed")]
    AllAttemptsFailed { attempts: usize },

    #[error("Source catalog not loaded yet")]
    CatalogNotLoaded,

    #[error("Invalid setting {key}: {message}")]
    InvalidSetting { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
