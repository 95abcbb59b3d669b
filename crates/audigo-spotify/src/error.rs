// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpotifyError>;

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("expected status code {expected} but got {actual}")]
    UnexpectedStatus { expected: u16, actual: u16 },

    #[error("expected content type application/json but got {0:?}")]
    UnexpectedContentType(String),

    #[error("authentication failed: {message}")]
    Authentication {
        message: String,
        #[source]
        source: Option<Box<SpotifyError>>,
    },

    /// A resource call was made before a successful `authenticate`.
    #[error("client is not authenticated")]
    NotAuthenticated,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("too many ids: {count} given, at most {max} allowed per call")]
    TooManyIds { count: usize, max: usize },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SpotifyError {
    pub(crate) fn authentication(message: impl Into<String>) -> Self {
        SpotifyError::Authentication {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn authentication_caused_by(message: impl Into<String>, source: SpotifyError) -> Self {
        SpotifyError::Authentication {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
