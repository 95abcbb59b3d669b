// SPDX-License-Identifier: GPL-3.0-or-later

//! Single-shot HTTP exchange with the Spotify services.
//!
//! A [`Transport`] only moves bytes. Status and media type checks live in
//! [`request`] so that every implementation is held to the same rules.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, trace};

use crate::error::{Result, SpotifyError};

/// Status code every Spotify endpoint used here answers with on success.
pub const EXPECTED_STATUS: u16 = 200;

const JSON_MEDIA_TYPE: &str = "application/json";
const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";
const USER_AGENT: &str = concat!("audigo-spotify/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }

    fn permits_body(self) -> bool {
        matches!(self, Method::Post)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound request handed to a [`Transport`].
#[derive(Clone, Copy)]
pub struct Request<'a> {
    pub url: &'a str,
    pub method: Method,
    /// Form-encoded body. Always `None` for methods that carry no body.
    pub body: Option<&'a [u8]>,
    /// Sent verbatim as the `Authorization` header.
    pub authorization: &'a str,
}

impl fmt::Debug for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("body_len", &self.body.map(<[u8]>::len))
            .field("authorization", &"<redacted>")
            .finish()
    }
}

/// Response as it came off the wire, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Validated response: success status and a JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request<'_>) -> Result<RawResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: Request<'_>) -> Result<RawResponse> {
        (**self).send(request).await
    }
}

/// Perform one request and normalize the outcome.
///
/// `body` is dropped for methods that do not permit one. A non-JSON
/// `Content-Type` is reported before the status code is looked at.
pub async fn request<T>(
    transport: &T,
    url: &str,
    method: Method,
    body: &[u8],
    authorization: &str,
) -> Result<ApiResponse>
where
    T: Transport + ?Sized,
{
    let request = Request {
        url,
        method,
        body: method.permits_body().then_some(body),
        authorization,
    };

    trace!(target: "spotify::transport", "{} {}", method, url);
    let raw = transport.send(request).await?;
    debug!(target: "spotify::transport", status = raw.status, "response received");

    validate(raw)
}

fn validate(raw: RawResponse) -> Result<ApiResponse> {
    match raw.content_type.as_deref() {
        Some(content_type) if !is_json(content_type) => {
            return Err(SpotifyError::UnexpectedContentType(content_type.to_string()));
        }
        _ => {}
    }

    if raw.status != EXPECTED_STATUS {
        return Err(SpotifyError::UnexpectedStatus {
            expected: EXPECTED_STATUS,
            actual: raw.status,
        });
    }

    if raw.content_type.is_none() {
        return Err(SpotifyError::UnexpectedContentType(String::new()));
    }

    trace!(target: "spotify::transport", body_len = raw.body.len(), "response accepted");

    Ok(ApiResponse {
        status: raw.status,
        body: raw.body,
    })
}

fn is_json(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|essence| essence.eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request<'_>) -> Result<RawResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(request.url),
            Method::Post => self.client.post(request.url),
        };

        builder = builder.header(AUTHORIZATION, request.authorization);

        if let Some(body) = request.body {
            builder = builder
                .header(CONTENT_TYPE, FORM_MEDIA_TYPE)
                .body(body.to_vec());
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{Method, RawResponse, Request, Transport};
    use crate::error::Result;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct RecordedRequest {
        pub url: String,
        pub method: Method,
        pub body: Option<Vec<u8>>,
        pub authorization: String,
    }

    /// Replays queued responses and remembers every request it was given.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingTransport {
        responses: Mutex<VecDeque<RawResponse>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl RecordingTransport {
        pub fn with_responses(responses: impl IntoIterator<Item = RawResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    pub(crate) fn json_response(status: u16, body: serde_json::Value) -> RawResponse {
        RawResponse {
            status,
            content_type: Some("application/json; charset=utf-8".to_string()),
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: Request<'_>) -> Result<RawResponse> {
            self.requests.lock().unwrap().push(RecordedRequest {
                url: request.url.to_string(),
                method: request.method,
                body: request.body.map(<[u8]>::to_vec),
                authorization: request.authorization.to_string(),
            });

            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no response queued for request"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{json_response, RecordingTransport};
    use super::*;

    fn raw(status: u16, content_type: Option<&str>, body: &str) -> RawResponse {
        RawResponse {
            status,
            content_type: content_type.map(str::to_string),
            body: body.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn test_body_only_attached_to_post() {
        let transport = RecordingTransport::with_responses([
            json_response(200, serde_json::json!({})),
            json_response(200, serde_json::json!({})),
        ]);

        request(&transport, "http://localhost/a", Method::Get, b"ignored", "Bearer t")
            .await
            .unwrap();
        request(&transport, "http://localhost/b", Method::Post, b"x=1", "Basic c")
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].body, None);
        assert_eq!(requests[1].method, Method::Post);
        assert_eq!(requests[1].body.as_deref(), Some(&b"x=1"[..]));
    }

    #[tokio::test]
    async fn test_authorization_sent_verbatim() {
        let transport =
            RecordingTransport::with_responses([json_response(200, serde_json::json!({}))]);

        request(&transport, "http://localhost/", Method::Get, b"", "Bearer abc def")
            .await
            .unwrap();

        assert_eq!(transport.requests()[0].authorization, "Bearer abc def");
    }

    #[test]
    fn test_success_returns_exact_body() {
        let response = validate(raw(200, Some("application/json"), "{\"a\":1}")).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"{\"a\":1}");
    }

    #[test]
    fn test_json_with_parameters_accepted() {
        assert!(validate(raw(200, Some("application/json; charset=utf-8"), "{}")).is_ok());
        assert!(validate(raw(200, Some("Application/JSON"), "{}")).is_ok());
    }

    #[test]
    fn test_unexpected_status() {
        let err = validate(raw(404, Some("application/json"), "{}")).unwrap_err();
        assert!(matches!(
            err,
            SpotifyError::UnexpectedStatus {
                expected: 200,
                actual: 404
            }
        ));
    }

    #[test]
    fn test_html_rejected_regardless_of_status() {
        for status in [200, 404, 500] {
            let err = validate(raw(status, Some("text/html"), "<html></html>")).unwrap_err();
            match err {
                SpotifyError::UnexpectedContentType(actual) => assert_eq!(actual, "text/html"),
                other => panic!("unexpected error for status {status}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_missing_content_type_on_success_rejected() {
        let err = validate(raw(200, None, "{}")).unwrap_err();
        assert!(matches!(err, SpotifyError::UnexpectedContentType(ref v) if v.is_empty()));
    }

    #[test]
    fn test_missing_content_type_on_error_reports_status() {
        let err = validate(raw(401, None, "")).unwrap_err();
        assert!(matches!(
            err,
            SpotifyError::UnexpectedStatus { actual: 401, .. }
        ));
    }

    #[test]
    fn test_request_debug_redacts_authorization() {
        let request = Request {
            url: "http://localhost/",
            method: Method::Get,
            body: None,
            authorization: "Bearer secret-token",
        };
        let rendered = format!("{request:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }
}
