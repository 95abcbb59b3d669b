// SPDX-License-Identifier: GPL-3.0-or-later

//! Client-credentials grant and the session it produces.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

/// Application id and secret issued by the Spotify developer dashboard.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// `Authorization` header value for the token endpoint.
    pub(crate) fn basic_authorization(&self) -> String {
        let pair = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(pair))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Authentication state of a client.
///
/// There is no way back to `Unauthenticated` and no expiry: a token stays
/// in use until the next successful `authenticate` replaces it.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Unauthenticated,
    Authenticated {
        /// Full header value, `"Bearer " + access_token`.
        bearer: String,
    },
}

impl Session {
    pub(crate) fn from_access_token(access_token: &str) -> Self {
        Session::Authenticated {
            bearer: format!("Bearer {access_token}"),
        }
    }

    pub fn bearer(&self) -> Option<&str> {
        match self {
            Session::Unauthenticated => None,
            Session::Authenticated { bearer } => Some(bearer),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::Unauthenticated => f.write_str("Unauthenticated"),
            Session::Authenticated { .. } => f
                .debug_struct("Authenticated")
                .field("bearer", &"<redacted>")
                .finish(),
        }
    }
}

/// Body of a token endpoint response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_authorization_encoding() {
        let credentials = Credentials::new("id", "secret");
        // base64("id:secret")
        assert_eq!(credentials.basic_authorization(), "Basic aWQ6c2VjcmV0");
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let credentials = Credentials::new("my-id", "my-secret");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("my-id"));
        assert!(!rendered.contains("my-secret"));
    }

    #[test]
    fn test_session_bearer() {
        assert_eq!(Session::default().bearer(), None);
        assert!(!Session::default().is_authenticated());

        let session = Session::from_access_token("XYZ");
        assert_eq!(session.bearer(), Some("Bearer XYZ"));
        assert!(session.is_authenticated());
        assert!(!format!("{session:?}").contains("XYZ"));
    }

    #[test]
    fn test_token_response_tolerates_missing_fields() {
        let token: TokenResponse = serde_json::from_str(r#"{"token_type":"bearer"}"#).unwrap();
        assert_eq!(token.access_token, None);
        assert_eq!(token.token_type.as_deref(), Some("bearer"));
        assert_eq!(token.expires_in, None);
    }
}
