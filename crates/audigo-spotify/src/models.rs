// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt;

use serde::{Deserialize, Serialize};

/// Links to the object on open.spotify.com.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ExternalUrls {
    pub spotify: String,
}

/// Industry identifiers. Only the ones present in the payload are kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ExternalIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isrc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ean: Option<String>,
}

/// Cover art or artist picture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Image {
    pub url: String,
    /// Pixel height, null when unknown.
    pub height: Option<u32>,
    /// Pixel width, null when unknown.
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Copyright {
    pub text: String,
    /// `C` for copyright, `P` for sound recording (performance) copyright.
    #[serde(rename = "type")]
    pub copyright_type: String,
}

/// Why content is unavailable, e.g. `market`, `product` or `explicit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Restrictions {
    pub reason: String,
}

/// Original track a relinked track stands in for. Present when a market
/// was requested and the track was relinked for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkedTrack {
    pub external_urls: ExternalUrls,
    pub href: String,
    pub id: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Followers {
    pub href: Option<String>,
    pub total: u64,
}

/// Artist as embedded in albums and tracks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimplifiedArtist {
    pub external_urls: ExternalUrls,
    pub href: String,
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub uri: String,
}

/// Full artist object, as returned by artist search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artist {
    pub external_urls: ExternalUrls,
    pub followers: Followers,
    #[serde(default)]
    pub genres: Vec<String>,
    pub href: String,
    pub id: String,
    #[serde(default)]
    pub images: Vec<Image>,
    pub name: String,
    pub popularity: u32,
    #[serde(rename = "type")]
    pub object_type: String,
    pub uri: String,
}

/// Track as listed inside an album.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimplifiedTrack {
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub available_markets: Vec<String>,
    pub disc_number: u32,
    pub duration_ms: u64,
    pub explicit: bool,
    pub external_urls: ExternalUrls,
    pub href: String,
    pub id: String,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_playable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_from: Option<LinkedTrack>,
    pub name: String,
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Restrictions>,
    pub track_number: u32,
    #[serde(rename = "type")]
    pub object_type: String,
    pub uri: String,
}

/// Full track object, as returned by track search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub album: SimplifiedAlbum,
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub available_markets: Vec<String>,
    pub disc_number: u32,
    pub duration_ms: u64,
    pub explicit: bool,
    #[serde(default)]
    pub external_ids: ExternalIds,
    pub external_urls: ExternalUrls,
    pub href: String,
    pub id: String,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_playable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_from: Option<LinkedTrack>,
    pub name: String,
    pub popularity: u32,
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Restrictions>,
    pub track_number: u32,
    #[serde(rename = "type")]
    pub object_type: String,
    pub uri: String,
}

/// Album as listed by artist albums and album search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimplifiedAlbum {
    /// Relation to the artist being listed. Only set on artist album listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_group: Option<String>,
    pub album_type: String,
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub available_markets: Vec<String>,
    pub external_urls: ExternalUrls,
    pub href: String,
    pub id: String,
    #[serde(default)]
    pub images: Vec<Image>,
    pub name: String,
    pub release_date: String,
    /// `year`, `month` or `day`.
    pub release_date_precision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Restrictions>,
    pub total_tracks: u32,
    #[serde(rename = "type")]
    pub object_type: String,
    pub uri: String,
}

/// Full album object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Album {
    pub album_type: String,
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub available_markets: Vec<String>,
    #[serde(default)]
    pub copyrights: Vec<Copyright>,
    #[serde(default)]
    pub external_ids: ExternalIds,
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub genres: Vec<String>,
    pub href: String,
    pub id: String,
    #[serde(default)]
    pub images: Vec<Image>,
    pub label: String,
    pub name: String,
    pub popularity: u32,
    pub release_date: String,
    pub release_date_precision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Restrictions>,
    pub total_tracks: u32,
    /// First page of the album's tracks.
    pub tracks: Page<SimplifiedTrack>,
    #[serde(rename = "type")]
    pub object_type: String,
    pub uri: String,
}

/// Offset-paged listing. `next` and `previous` are opaque URLs passed
/// through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    pub href: String,
    pub items: Vec<T>,
    pub limit: u32,
    pub next: Option<String>,
    pub offset: u32,
    pub previous: Option<String>,
    pub total: u32,
}

/// Response of the multi-album endpoint. Ids the API does not know come
/// back as `null`, so positions line up with the requested ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Albums {
    pub albums: Vec<Option<Album>>,
}

/// Search response. Only the categories that were asked for are present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SearchResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub albums: Option<Page<SimplifiedAlbum>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artists: Option<Page<Artist>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Page<Track>>,
}

/// Object types accepted by the search endpoint's `type` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    Album,
    Artist,
    Track,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Album => "album",
            SearchType::Artist => "artist",
            SearchType::Track => "track",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paging parameters for listing endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOptions {
    /// Maximum number of items (Spotify allows 1-50).
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// ISO 3166-1 alpha-2 country code.
    pub market: Option<String>,
}

impl PageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    /// Query parameters in a stable order: limit, offset, market.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(market) = &self.market {
            pairs.push(("market", market.clone()));
        }
        pairs
    }
}
