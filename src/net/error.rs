//! Transport failure taxonomy.

use std::path::PathBuf;
use std::time::Duration;

/// Boxed error returned by decoded response bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Broad class of a transport failure, which decides the client status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The backend could not be reached or did not answer in time.
    Timeout,
    /// Any other failure to obtain an HTTP response.
    Other,
}

/// A failure to obtain an HTTP response from a backend socket.
///
/// Backend responses with error status codes are not transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Timeout while connecting to {} after {:?}", .socket.display(), .after)]
    ConnectTimeout { socket: PathBuf, after: Duration },

    #[error("Request to {} timed out after {:?}", .socket.display(), .after)]
    RequestTimeout { socket: PathBuf, after: Duration },

    #[error("Connection to {} failed: {source}", .socket.display())]
    Connect {
        socket: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid backend URI `{uri}`: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },

    #[error("Failed to build backend request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("Backend protocol error: {0}")]
    Protocol(#[from] hyper::Error),

    #[error("Failed to read backend response body: {0}")]
    Body(#[source] BoxError),

    #[error("Invalid redirect location `{0}`")]
    InvalidRedirect(String),

    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(u32),
}

impl TransportError {
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            TransportError::ConnectTimeout { .. } | TransportError::RequestTimeout { .. } => {
                TransportErrorKind::Timeout
            }
            _ => TransportErrorKind::Other,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == TransportErrorKind::Timeout
    }
}
