//! Error type shared by every stage of a pull.
//!
//! Workspace API and filesystem failures abort the run and surface through this
//! type. Image failures use it as well, but the walker downgrades them to a log
//! line and a placeholder reference.

use thiserror::Error;

/// Result alias for notion-mirror-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The workspace API answered with a non-success status.
    #[error("workspace API returned {status} for {url}: {body}")]
    Api {
        status: u16,
        url: String,
        body: String,
    },

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("front matter error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Downloaded bytes did not look like any known image format.
    #[error("could not recognise the image type of {url}")]
    UnrecognizedImage { url: String },

    #[error("configuration error: {0}")]
    Config(String),
}
