//! Error types for dataset sessions.

use ncstream_core::SectionError;
use ncstream_wire::DecodeError;

/// Failure reported by a [`Transport`](crate::Transport).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a status other than success or not-found.
    #[error("server error: {detail}")]
    Status { detail: String },

    /// The transport could not be configured.
    #[error("invalid transport configuration: {detail}")]
    Config { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "http")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors produced by [`RemoteDataset`](crate::RemoteDataset) and
/// [`LocalDataset`](crate::LocalDataset).
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The server reported the resource as absent.
    #[error("not found: {url} ({detail})")]
    NotFound { url: String, detail: String },

    /// Any other non-success status or connectivity failure.
    #[error("transport failure for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The response does not begin with the start magic.
    #[error("bad start magic in response to {url}: found {found:02x?}")]
    BadMagic { url: String, found: Vec<u8> },

    /// The metadata frame could not be read or decoded.
    #[error("malformed schema from {url}: {source}")]
    MalformedSchema {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A data response is structurally invalid.
    #[error("malformed data for variable '{variable}': {source}")]
    MalformedRecord {
        variable: String,
        #[source]
        source: DecodeError,
    },

    /// Declared length disagrees with the length implied by type and section.
    #[error("variable '{variable}': declared {declared} bytes, expected {expected}")]
    SizeMismatch {
        variable: String,
        declared: u64,
        expected: u64,
    },

    /// The transport gave no declared length and the session requires one.
    #[error("variable '{variable}': response has no declared length")]
    MissingDeclaredLength { variable: String },

    /// The variable is not in the schema. No request was issued.
    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },

    /// The section does not fit the variable. No request was issued.
    #[error("section out of range for variable '{variable}': {detail}")]
    SectionOutOfRange { variable: String, detail: String },

    /// The dataset has been closed.
    #[error("dataset is closed")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The operation is not available in this configuration.
    #[error("unsupported: {detail}")]
    Unsupported { detail: String },
}

impl DatasetError {
    pub(crate) fn section(variable: &str, error: SectionError) -> Self {
        Self::SectionOutOfRange {
            variable: variable.to_string(),
            detail: error.to_string(),
        }
    }
}

/// A request string that [`Request::parse`](crate::Request::parse) does not
/// understand.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("unrecognized request '{0}'")]
    Unrecognized(String),

    #[error(transparent)]
    Section(#[from] SectionError),
}
