//! Artist identity lookup against MusicBrainz.
//!
//! Three concerns, kept separate:
//!
//! - **Spacing**: every request from every caller passes one [`RateGate`]
//! - **Retries**: transient failures are retried through the gate again,
//!   with a linearly growing pause
//! - **Authorization**: a 401/403 disables the resolver for the rest of the
//!   session; later lookups return `None` without touching the network
//!
//! Only candidates scoring above the configured threshold are accepted.

mod dto;
mod gate;
mod musicbrainz;

pub use gate::RateGate;
pub use musicbrainz::MusicBrainzClient;

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ResolverConfig;

/// Errors from the external artist service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolverError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not authorized (HTTP {0})")]
    Unauthorized(u16),

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("Server error (HTTP {0})")]
    Server(u16),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("Lookup cancelled")]
    Cancelled,
}

impl ResolverError {
    /// Worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited | Self::Server(_))
    }
}

/// One artist returned by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistCandidate {
    /// MusicBrainz artist ID
    pub id: String,
    pub name: String,
    /// Match confidence, 0-100
    pub score: u32,
}

/// Artist search capability.
///
/// Implement this trait to create mock implementations for testing.
#[async_trait]
pub trait ArtistSearchApi: Send + Sync {
    async fn search_artists(&self, name: &str) -> Result<Vec<ArtistCandidate>, ResolverError>;
}

/// Rate-limited, retrying artist lookup.
pub struct ArtistResolver<A> {
    api: A,
    gate: RateGate,
    disabled: AtomicBool,
    max_attempts: u32,
    retry_backoff: Duration,
    min_score: u32,
}

impl<A: ArtistSearchApi> ArtistResolver<A> {
    pub fn new(api: A, config: &ResolverConfig) -> Self {
        Self {
            api,
            gate: RateGate::new(config.min_interval()),
            disabled: AtomicBool::new(!config.enabled),
            max_attempts: config.max_attempts.max(1),
            retry_backoff: config.retry_backoff(),
            min_score: config.min_score,
        }
    }

    /// Whether lookups have been switched off for this session.
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    /// Best accepted match for `name`, or `None` when nothing scores high
    /// enough or the resolver is disabled.
    pub async fn resolve(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ArtistCandidate>, ResolverError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let mut attempt = 1;
        loop {
            if self.is_disabled() {
                return Ok(None);
            }

            let result = self
                .gate
                .run(cancel, || async {
                    // Another caller may have hit a 401 while we were queued
                    if self.is_disabled() {
                        return Ok(None);
                    }
                    self.api.search_artists(name).await.map(Some)
                })
                .await;

            match result {
                Ok(Some(candidates)) => return Ok(self.best_match(name, candidates)),
                Ok(None) => return Ok(None),
                Err(ResolverError::Unauthorized(status)) => {
                    warn!(status, "Artist lookups not authorized, disabling for this session");
                    self.disabled.store(true, Ordering::SeqCst);
                    return Ok(None);
                }
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let pause = self.retry_backoff * attempt;
                    warn!(artist = name, attempt, error = %e, ?pause, "Artist lookup failed, retrying");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(ResolverError::Cancelled),
                        _ = tokio::time::sleep(pause) => {}
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Highest-scoring candidate strictly above the threshold; the first one
    /// wins a tie.
    fn best_match(&self, name: &str, candidates: Vec<ArtistCandidate>) -> Option<ArtistCandidate> {
        let best = candidates
            .into_iter()
            .filter(|c| c.score > self.min_score)
            .fold(None::<ArtistCandidate>, |best, c| match best {
                Some(b) if b.score >= c.score => Some(b),
                _ => Some(c),
            });
        match &best {
            Some(c) => debug!(artist = name, id = %c.id, score = c.score, "Artist matched"),
            None => debug!(artist = name, "No artist match above threshold"),
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::Instant;

    /// Scripted search API recording when each call happened.
    #[derive(Default)]
    struct MockSearch {
        responses: Mutex<VecDeque<Result<Vec<ArtistCandidate>, ResolverError>>>,
        calls: Mutex<Vec<Instant>>,
        count: AtomicUsize,
    }

    impl MockSearch {
        fn with(responses: Vec<Result<Vec<ArtistCandidate>, ResolverError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        fn call_count(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ArtistSearchApi for Arc<MockSearch> {
        async fn search_artists(
            &self,
            _name: &str,
        ) -> Result<Vec<ArtistCandidate>, ResolverError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().push(Instant::now());
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![candidate("default", 100)]))
        }
    }

    fn candidate(id: &str, score: u32) -> ArtistCandidate {
        ArtistCandidate {
            id: id.to_string(),
            name: format!("Artist {id}"),
            score,
        }
    }

    fn resolver(mock: &Arc<MockSearch>) -> ArtistResolver<Arc<MockSearch>> {
        ArtistResolver::new(Arc::clone(mock), &ResolverConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_lookups_are_spaced_by_interval() {
        let mock = Arc::new(MockSearch::default());
        let resolver = resolver(&mock);
        let cancel = CancellationToken::new();

        let lookups = (0..5).map(|i| {
            let name = format!("artist {i}");
            let resolver = &resolver;
            let cancel = &cancel;
            async move { resolver.resolve(&name, cancel).await }
        });
        let results = futures::future::join_all(lookups).await;

        assert!(results.iter().all(|r| matches!(r, Ok(Some(_)))));
        let mut calls = mock.calls.lock().clone();
        assert_eq!(calls.len(), 5);
        calls.sort();
        for pair in calls.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_disables_resolver() {
        let mock = Arc::new(MockSearch::with(vec![Err(ResolverError::Unauthorized(401))]));
        let resolver = resolver(&mock);
        let cancel = CancellationToken::new();

        assert_eq!(resolver.resolve("Nirvana", &cancel).await, Ok(None));
        assert!(resolver.is_disabled());

        assert_eq!(resolver.resolve("Blur", &cancel).await, Ok(None));
        assert_eq!(resolver.resolve("Oasis", &cancel).await, Ok(None));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_callers_short_circuit_after_unauthorized() {
        let mock = Arc::new(MockSearch::with(vec![Err(ResolverError::Unauthorized(403))]));
        let resolver = resolver(&mock);
        let cancel = CancellationToken::new();

        let results = futures::future::join_all(
            ["a", "b", "c"].map(|name| resolver.resolve(name, &cancel)),
        )
        .await;

        assert!(results.iter().all(|r| *r == Ok(None)));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_score_threshold_is_exclusive() {
        let mock = Arc::new(MockSearch::with(vec![
            Ok(vec![candidate("eighty", 80)]),
            Ok(vec![candidate("eighty", 80), candidate("eighty-one", 81)]),
        ]));
        let resolver = resolver(&mock);
        let cancel = CancellationToken::new();

        assert_eq!(resolver.resolve("x", &cancel).await, Ok(None));
        let matched = resolver.resolve("x", &cancel).await.unwrap().unwrap();
        assert_eq!(matched.id, "eighty-one");
    }

    #[tokio::test(start_paused = true)]
    async fn test_best_candidate_wins_and_ties_keep_first() {
        let mock = Arc::new(MockSearch::with(vec![Ok(vec![
            candidate("low", 85),
            candidate("first-top", 99),
            candidate("second-top", 99),
        ])]));
        let resolver = resolver(&mock);

        let matched = resolver
            .resolve("x", &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(matched.id, "first-top");
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let mock = Arc::new(MockSearch::with(vec![
            Err(ResolverError::Network("reset".into())),
            Err(ResolverError::RateLimited),
            Ok(vec![candidate("ok", 95)]),
        ]));
        let resolver = resolver(&mock);

        let matched = resolver
            .resolve("x", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(matched.map(|c| c.id), Some("ok".to_string()));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_are_bounded() {
        let mock = Arc::new(MockSearch::with(vec![
            Err(ResolverError::Server(503)),
            Err(ResolverError::Server(503)),
            Err(ResolverError::Server(503)),
            Ok(vec![candidate("too-late", 100)]),
        ]));
        let resolver = resolver(&mock);

        let result = resolver.resolve("x", &CancellationToken::new()).await;
        assert_eq!(result, Err(ResolverError::Server(503)));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_errors_are_not_retried() {
        let mock = Arc::new(MockSearch::with(vec![Err(ResolverError::Parse(
            "bad json".into(),
        ))]));
        let resolver = resolver(&mock);

        let result = resolver.resolve("x", &CancellationToken::new()).await;
        assert!(matches!(result, Err(ResolverError::Parse(_))));
        assert_eq!(mock.call_count(), 1);
        assert!(!resolver.is_disabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_lookup_releases_gate() {
        let mock = Arc::new(MockSearch::default());
        let resolver = resolver(&mock);

        // Occupy the interval so the next caller has to wait
        resolver.resolve("first", &CancellationToken::new()).await.unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(
            resolver.resolve("second", &cancel).await,
            Err(ResolverError::Cancelled)
        );

        let third = resolver.resolve("third", &CancellationToken::new()).await;
        assert!(matches!(third, Ok(Some(_))));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_by_config() {
        let mock = Arc::new(MockSearch::default());
        let config = ResolverConfig {
            enabled: false,
            ..ResolverConfig::default()
        };
        let resolver = ArtistResolver::new(Arc::clone(&mock), &config);

        assert_eq!(resolver.resolve("x", &CancellationToken::new()).await, Ok(None));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_name_is_no_match() {
        let mock = Arc::new(MockSearch::default());
        let resolver = resolver(&mock);

        assert_eq!(resolver.resolve("   ", &CancellationToken::new()).await, Ok(None));
        assert_eq!(mock.call_count(), 0);
    }
}
