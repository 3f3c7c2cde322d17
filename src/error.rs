//! Errors surfaced by every call against the Toxiproxy server.

use http::StatusCode;
use std::fmt;
use thiserror::Error;

const PROXY_NOT_FOUND: &str = "proxy not found";

pub type Result<T> = std::result::Result<T, Error>;

/// What a conflict or a failed lookup was about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Proxy,
    Toxic { proxy: String },
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Proxy => write!(f, "proxy"),
            Resource::Toxic { proxy } => write!(f, "toxic on proxy `{}`", proxy),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A proxy or toxic with this name already exists in its scope.
    #[error("{resource} `{name}` already exists")]
    Conflict { resource: Resource, name: String },

    /// No proxy or toxic with this name exists.
    #[error("{resource} `{name}` not found")]
    NotFound { resource: Resource, name: String },

    /// The `type` discriminator of a toxic matched none of the known kinds.
    #[error("unrecognized toxic type `{0}`")]
    UnrecognizedToxicType(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failures of the round trip itself, not classified as a resource error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("json (de)serialization failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid server address: {0}")]
    Address(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Transport(TransportError::Decode(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::Request(err))
    }
}

impl Error {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Maps a non-success reply onto the taxonomy. 409 and 404 name the
    /// resource, everything else stays a transport failure. The server
    /// answers 404 for a missing proxy under a toxic path too; its
    /// `proxy not found` body moves the blame onto the proxy.
    pub(crate) fn from_status(
        status: StatusCode,
        body: String,
        resource: Resource,
        name: &str,
    ) -> Self {
        match status {
            StatusCode::CONFLICT => Error::Conflict {
                resource,
                name: name.to_owned(),
            },
            StatusCode::NOT_FOUND => match resource {
                Resource::Toxic { proxy } if body.contains(PROXY_NOT_FOUND) => Error::NotFound {
                    resource: Resource::Proxy,
                    name: proxy,
                },
                resource => Error::NotFound {
                    resource,
                    name: name.to_owned(),
                },
            },
            _ => Error::Transport(TransportError::Status { status, body }),
        }
    }
}
