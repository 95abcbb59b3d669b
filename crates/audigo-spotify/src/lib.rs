// SPDX-License-Identifier: GPL-3.0-or-later

//! Spotify Web API client for catalog lookups.
//!
//! This crate authenticates with the client-credentials grant and exposes
//! album, album track, artist album and search lookups, each decoded into
//! typed models that mirror the API's JSON.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::{Credentials, Session};
pub use client::{SpotifyClient, SpotifyClientBuilder, MAX_ALBUM_IDS};
pub use error::{Result, SpotifyError};
pub use models::{
    Album, Albums, Artist, Copyright, ExternalIds, ExternalUrls, Followers, Image, LinkedTrack,
    Page, PageOptions, Restrictions, SearchResults, SearchType, SimplifiedAlbum, SimplifiedArtist,
    SimplifiedTrack, Track,
};
pub use transport::{ApiResponse, HttpTransport, Method, RawResponse, Request, Transport};
