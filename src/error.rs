//! Error types for metadata service operations.

use std::num::ParseIntError;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Errors that can occur when querying the metadata service.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The request could not be completed (DNS, connection refused, timeout).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with something other than `200 OK`.
    #[error("unexpected response from metadata API, status {status}: {context}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Start of the response body, or the status line if the body was empty.
        context: String,
    },

    /// A successful response could not be interpreted.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The configured base URL is unusable.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

impl MetadataError {
    /// HTTP status code carried by [`MetadataError::UnexpectedStatus`].
    pub fn status(&self) -> Option<u16> {
        match self {
            MetadataError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request never produced a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, MetadataError::Transport(_))
    }

    /// Whether a `200 OK` body failed to decode.
    pub fn is_decode(&self) -> bool {
        matches!(self, MetadataError::Decode(_))
    }
}

/// Reasons a successful response body could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The instance id was not a base-10 integer.
    #[error("instance id: {0}")]
    InstanceId(#[from] ParseIntError),

    /// The metadata document was not valid YAML for the data model.
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A text body was not valid UTF-8.
    #[error("invalid utf-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// Reading the response body failed after the status was accepted.
    #[error("reading body: {0}")]
    Body(#[source] reqwest::Error),
}
