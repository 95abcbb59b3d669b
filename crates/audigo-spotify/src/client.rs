// SPDX-License-Identifier: GPL-3.0-or-later

use crate::auth::{Credentials, Session, TokenResponse};
use crate::error::{Result, SpotifyError};
use crate::models::{Album, Albums, Page, SearchResults, SearchType, SimplifiedAlbum, SimplifiedTrack};
use crate::transport::{self, HttpTransport, Method, Transport};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, trace};
use url::form_urlencoded;

const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
const SPOTIFY_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

/// Upper bound the multi-album endpoint accepts per call.
pub const MAX_ALBUM_IDS: usize = 20;

/// Spotify Web API client using the client-credentials grant.
///
/// Every resource call needs a prior successful [`authenticate`](Self::authenticate);
/// without one it fails with [`SpotifyError::NotAuthenticated`] and sends nothing.
///
/// Clones share the session, so re-authenticating through one clone is seen
/// by all of them. Use a separate client per logical session to keep tokens apart.
pub struct SpotifyClient<T = HttpTransport> {
    transport: Arc<T>,
    credentials: Credentials,
    api_base_url: String,
    accounts_base_url: String,
    session: Arc<Mutex<Session>>,
}

impl SpotifyClient<HttpTransport> {
    /// Create a client against the public Spotify endpoints.
    pub fn new(credentials: Credentials) -> Result<Self> {
        SpotifyClientBuilder::new(credentials).build()
    }

    /// Create a client builder for custom configuration.
    pub fn builder(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> SpotifyClientBuilder {
        SpotifyClientBuilder::new(Credentials::new(client_id, client_secret))
    }
}

impl<T: Transport> SpotifyClient<T> {
    /// Exchange the client credentials for an access token and store it.
    ///
    /// Calling this again fetches a fresh token and replaces the stored one.
    /// On failure the session is left as it was.
    pub async fn authenticate(&self) -> Result<()> {
        let url = format!("{}/api/token", self.accounts_base_url);
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .finish();

        debug!(target: "spotify", client_id = %self.credentials.client_id(), "requesting access token");

        let response = transport::request(
            self.transport.as_ref(),
            &url,
            Method::Post,
            body.as_bytes(),
            &self.credentials.basic_authorization(),
        )
        .await
        .map_err(|e| SpotifyError::authentication_caused_by("token request failed", e))?;

        let token: TokenResponse = serde_json::from_slice(&response.body).map_err(|e| {
            SpotifyError::authentication_caused_by("token response is not valid JSON", e.into())
        })?;

        debug!(
            target: "spotify",
            token_type = ?token.token_type,
            expires_in = ?token.expires_in,
            "token issued"
        );

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SpotifyError::authentication("token response has no access_token"))?;

        *self.session.lock().await = Session::from_access_token(&access_token);
        info!(target: "spotify", "authenticated with client credentials");

        Ok(())
    }

    /// Current session state.
    pub async fn session(&self) -> Session {
        self.session.lock().await.clone()
    }

    /// Stored `Authorization` value, `"Bearer <token>"`, if authenticated.
    pub async fn bearer_token(&self) -> Option<String> {
        self.session.lock().await.bearer().map(str::to_owned)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.lock().await.is_authenticated()
    }

    /// Fetch a single album.
    ///
    /// # Example
    /// ```no_run
    /// # use audigo_spotify::SpotifyClient;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = SpotifyClient::builder("client-id", "client-secret").build()?;
    /// client.authenticate().await?;
    /// let album = client.get_album("4aawyAB9vmqN3uQ7FjRGTy").await?;
    /// println!("{}", album.name);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_album(&self, id: &str) -> Result<Album> {
        require_id(id, "album")?;
        debug!(target: "spotify", %id, "get album");

        let url = format!("{}/albums/{}", self.api_base_url, urlencoding::encode(id));
        self.get(&url).await
    }

    /// Fetch a page of an album's tracks.
    ///
    /// `options` are appended as query parameters in the order given, e.g.
    /// `[("limit", "10"), ("offset", "5")]` or
    /// [`PageOptions::to_query_pairs`](crate::PageOptions::to_query_pairs).
    pub async fn get_album_tracks<I, K, V>(&self, id: &str, options: I) -> Result<Page<SimplifiedTrack>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        require_id(id, "album")?;
        debug!(target: "spotify", %id, "get album tracks");

        let mut url = format!(
            "{}/albums/{}/tracks",
            self.api_base_url,
            urlencoding::encode(id)
        );

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in options {
            serializer.append_pair(key.as_ref(), value.as_ref());
        }
        let query = serializer.finish();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        self.get(&url).await
    }

    /// Fetch up to [`MAX_ALBUM_IDS`] albums in one call.
    ///
    /// The result has one entry per requested id, in order; ids unknown to
    /// Spotify yield `None`. More than [`MAX_ALBUM_IDS`] ids fail with
    /// [`SpotifyError::TooManyIds`] before anything is sent.
    pub async fn get_albums<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Option<Album>>> {
        if ids.is_empty() {
            return Err(SpotifyError::InvalidArgument(
                "at least one album id is required".to_string(),
            ));
        }
        if ids.len() > MAX_ALBUM_IDS {
            return Err(SpotifyError::TooManyIds {
                count: ids.len(),
                max: MAX_ALBUM_IDS,
            });
        }
        for id in ids {
            require_id(id.as_ref(), "album")?;
        }
        debug!(target: "spotify", count = ids.len(), "get albums");

        let joined = ids
            .iter()
            .map(|id| urlencoding::encode(id.as_ref()).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/albums?ids={}", self.api_base_url, joined);

        let response: Albums = self.get(&url).await?;
        Ok(response.albums)
    }

    /// Fetch the first page of an artist's albums.
    pub async fn get_artist_albums(&self, id: &str) -> Result<Page<SimplifiedAlbum>> {
        require_id(id, "artist")?;
        debug!(target: "spotify", %id, "get artist albums");

        let url = format!(
            "{}/artists/{}/albums",
            self.api_base_url,
            urlencoding::encode(id)
        );
        self.get(&url).await
    }

    /// Search the catalog.
    ///
    /// The returned [`SearchResults`] holds one listing per requested type.
    ///
    /// # Example
    /// ```no_run
    /// # use audigo_spotify::{SearchType, SpotifyClient};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = SpotifyClient::builder("client-id", "client-secret").build()?;
    /// client.authenticate().await?;
    /// let results = client.search("daft punk", &[SearchType::Artist]).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search(&self, query: &str, types: &[SearchType]) -> Result<SearchResults> {
        if query.trim().is_empty() {
            return Err(SpotifyError::InvalidArgument(
                "search query must not be empty".to_string(),
            ));
        }
        if types.is_empty() {
            return Err(SpotifyError::InvalidArgument(
                "at least one search type is required".to_string(),
            ));
        }

        let types = types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(",");
        debug!(target: "spotify", %query, %types, "search");

        let url = format!(
            "{}/search?q={}&type={}",
            self.api_base_url,
            urlencoding::encode(query),
            types
        );
        self.get(&url).await
    }

    /// Authenticated GET decoded into `R`.
    async fn get<R: DeserializeOwned>(&self, url: &str) -> Result<R> {
        let bearer = self
            .bearer_token()
            .await
            .ok_or(SpotifyError::NotAuthenticated)?;

        let response =
            transport::request(self.transport.as_ref(), url, Method::Get, &[], &bearer).await?;
        trace!(
            target: "spotify",
            "response body: {}",
            String::from_utf8_lossy(&response.body)
        );

        Ok(serde_json::from_slice(&response.body)?)
    }
}

fn require_id(id: &str, kind: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(SpotifyError::InvalidArgument(format!(
            "{kind} id must not be empty"
        )));
    }
    Ok(())
}

impl<T> Clone for SpotifyClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            credentials: self.credentials.clone(),
            api_base_url: self.api_base_url.clone(),
            accounts_base_url: self.accounts_base_url.clone(),
            session: Arc::clone(&self.session),
        }
    }
}

impl<T> fmt::Debug for SpotifyClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("credentials", &self.credentials)
            .field("api_base_url", &self.api_base_url)
            .field("accounts_base_url", &self.accounts_base_url)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring a Spotify client.
#[derive(Debug)]
pub struct SpotifyClientBuilder {
    credentials: Credentials,
    api_base_url: String,
    accounts_base_url: String,
    timeout: Duration,
}

impl SpotifyClientBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            api_base_url: SPOTIFY_API_BASE.to_string(),
            accounts_base_url: SPOTIFY_ACCOUNTS_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set a custom Web API base URL (useful for testing with mock servers).
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = trim_base(url.into());
        self
    }

    /// Set a custom accounts service base URL, the host of `/api/token`.
    pub fn accounts_base_url(mut self, url: impl Into<String>) -> Self {
        self.accounts_base_url = trim_base(url.into());
        self
    }

    /// Set request timeout duration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client on top of `reqwest`.
    pub fn build(self) -> Result<SpotifyClient<HttpTransport>> {
        let transport = HttpTransport::new(self.timeout)?;
        Ok(self.build_with_transport(transport))
    }

    /// Build the client on top of any [`Transport`]. The timeout setting is
    /// left to the transport.
    pub fn build_with_transport<T: Transport>(self, transport: T) -> SpotifyClient<T> {
        SpotifyClient {
            transport: Arc::new(transport),
            credentials: self.credentials,
            api_base_url: self.api_base_url,
            accounts_base_url: self.accounts_base_url,
            session: Arc::new(Mutex::new(Session::Unauthenticated)),
        }
    }
}

fn trim_base(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
