use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, UpdaterError>;

#[derive(Debug, Error)]
pub enum UpdaterError {
    #[error("unable to initialise the HTTP client ({0}); check that the system TLS roots are installed and run this program again")]
    ClientUnavailable(String),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("'{url}' is not a usable API address: {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("{url} answered with unexpected status {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("{url} did not send a usable {header} header")]
    MissingHeader { url: String, header: &'static str },

    #[error("'{0}' does not look like a server build filename")]
    UnrecognizedArtifact(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("configuration file {} is malformed: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl UpdaterError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
