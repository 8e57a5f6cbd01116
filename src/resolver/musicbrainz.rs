//! MusicBrainz HTTP client
//!
//! Handles the artist search endpoint of the MusicBrainz web service.
//! See: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! IMPORTANT: MusicBrainz requires a User-Agent header and rate limits to 1 req/sec.
//! Spacing is the caller's job, see [`RateGate`](super::RateGate).

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::{ArtistCandidate, ArtistSearchApi, ResolverError, dto};

/// Candidates requested per search
const SEARCH_LIMIT: usize = 5;

/// User agent string - MusicBrainz requires this
const USER_AGENT: &str = concat!(
    "music-ingest/",
    env!("CARGO_PKG_VERSION"),
    " (https://musicbrainz.org/doc/MusicBrainz_API)"
);

/// MusicBrainz API client
pub struct MusicBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl MusicBrainzClient {
    /// Create a client against the public service
    pub fn new() -> Result<Self, ResolverError> {
        Self::with_base_url("https://musicbrainz.org/ws/2")
    }

    /// Create a client against another service root, such as a mirror
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ResolverError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ResolverError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Search URL for an artist name
    fn search_url(&self, name: &str) -> String {
        let query = format!("artist:\"{}\"", escape_query(name));
        format!(
            "{}/artist?query={}&fmt=json&limit={SEARCH_LIMIT}",
            self.base_url,
            urlencoding::encode(&query)
        )
    }

    /// Send the HTTP request and parse the response
    async fn send_search_request(
        &self,
        name: &str,
    ) -> Result<dto::ArtistSearchResponse, ResolverError> {
        let url = self.search_url(name);
        debug!(url = %url, "MusicBrainz artist search");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ResolverError::Network(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(dto::ArtistSearchResponse {
                artists: Vec::new(),
            });
        }

        if let Some(err) = status_error(status) {
            return Err(err);
        }

        if !status.is_success() {
            // Try to parse error response
            if let Ok(error) = response.json::<dto::ApiError>().await {
                return Err(ResolverError::Api(error.error));
            }
            return Err(ResolverError::Api(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<dto::ArtistSearchResponse>()
            .await
            .map_err(|e| ResolverError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ArtistSearchApi for MusicBrainzClient {
    async fn search_artists(&self, name: &str) -> Result<Vec<ArtistCandidate>, ResolverError> {
        let response = self.send_search_request(name).await?;
        Ok(response
            .artists
            .into_iter()
            .map(|a| ArtistCandidate {
                id: a.id,
                name: a.name,
                score: a.score,
            })
            .collect())
    }
}

/// Statuses with a dedicated error, before the generic non-success case
fn status_error(status: StatusCode) -> Option<ResolverError> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Some(ResolverError::Unauthorized(status.as_u16()))
        }
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
            Some(ResolverError::RateLimited)
        }
        s if s.is_server_error() => Some(ResolverError::Server(s.as_u16())),
        _ => None,
    }
}

/// Backslash-escape Lucene query syntax characters
fn escape_query(term: &str) -> String {
    const SPECIAL: &[char] = &[
        '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':',
        '\\', '/',
    ];
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
