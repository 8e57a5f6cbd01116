//! MusicBrainz artist search response types.
//!
//! Only the fields the resolver reads. Convert to [`ArtistCandidate`] before
//! leaving the resolver module.
//!
//! API Reference: https://musicbrainz.org/doc/MusicBrainz_API/Search
//!
//! [`ArtistCandidate`]: super::ArtistCandidate

use serde::Deserialize;

/// `/artist?query=...` response
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistSearchResponse {
    #[serde(default)]
    pub artists: Vec<Artist>,
}

/// One search hit
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Artist {
    pub id: String,
    pub name: String,
    /// Search relevance, 0-100
    #[serde(default)]
    pub score: u32,
    pub sort_name: Option<String>,
    pub disambiguation: Option<String>,
}

/// Error body returned with non-success statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: String,
}
