//! Search engine - main search orchestration logic
//!
//! This module contains the loop that drives one search:
//! - Validating the request and resolving the effective pattern list
//! - Building the target list through the frontier
//! - Fetching each page and scanning it with every pattern
//! - Streaming matches and per-URL failures to the result channel
//! - Honouring cooperative cancellation between units of work

use crate::config::Config;
use crate::crawler::fetcher::{FetchError, HttpFetcher, PageFetcher};
use crate::crawler::frontier::{build_frontier, Frontier};
use crate::crawler::request::CrawlRequest;
use crate::patterns::{compile_user_pattern, Pattern, PatternRegistry};
use crate::results::{InvalidRequest, ResultSender, SearchEvent};
use crate::state::SearchState;
use futures::FutureExt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Counters for one finished search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOutcome {
    /// Terminal state of the search
    pub state: SearchState,

    /// Pages fetched and scanned successfully
    pub pages_searched: usize,

    /// Pages that produced a fetch error
    pub pages_failed: usize,

    /// Match records pushed to the channel
    pub matches: usize,
}

/// Runs searches against a fetcher and a shared pattern registry
///
/// The engine holds no per-search state; every call to [`SearchEngine::run`]
/// builds its own frontier.
#[derive(Clone)]
pub struct SearchEngine {
    fetcher: Arc<dyn PageFetcher>,
    registry: Arc<PatternRegistry>,
}

impl SearchEngine {
    pub fn new(fetcher: Arc<dyn PageFetcher>, registry: Arc<PatternRegistry>) -> Self {
        Self { fetcher, registry }
    }

    /// Builds an engine with an HTTP fetcher and a registry holding the
    /// built-ins plus the configured extra patterns
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let registry = PatternRegistry::with_extra(&config.patterns)?;
        let fetcher = HttpFetcher::new(&config.fetch)?;
        Ok(Self::new(Arc::new(fetcher), Arc::new(registry)))
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Resolves the patterns a request asks for
    ///
    /// The explicit pattern (if any) comes first, followed by the selected
    /// built-ins in registration order.
    pub fn effective_patterns(&self, request: &CrawlRequest) -> Result<Vec<Pattern>, InvalidRequest> {
        let mut patterns = Vec::new();

        if let Some(explicit) = compile_user_pattern(request.explicit_pattern())? {
            patterns.push(explicit);
        }

        patterns.extend(self.registry.resolve_all(&request.built_in_patterns)?);

        if patterns.is_empty() {
            return Err(InvalidRequest::NoPattern);
        }

        Ok(patterns)
    }

    /// Runs one search to completion or cancellation
    ///
    /// # Flow
    ///
    /// 1. If the token is already set, stop without pushing anything
    /// 2. Validate patterns and base URL; on failure push one `InvalidRequest`
    /// 3. Build the target list (one discovery fetch in recursive mode)
    /// 4. For each target: check the token, fetch, then push a `Match` per
    ///    hit (checking the token before each one)
    ///
    /// Fetch failures, and panics raised while fetching or scanning a page,
    /// are pushed as `FetchFailed` and the loop moves on to the next URL.
    /// Only cancellation ends the loop early.
    pub async fn run(
        &self,
        request: &CrawlRequest,
        token: &CancellationToken,
        results: &ResultSender,
    ) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();

        if token.is_cancelled() {
            tracing::info!("Search cancelled before it started");
            outcome.state = transition(outcome.state, SearchState::Cancelled);
            return outcome;
        }

        outcome.state = transition(outcome.state, SearchState::Running);

        let validated = self
            .effective_patterns(request)
            .and_then(|patterns| validate_base_url(&request.base_url).map(|base| (patterns, base)));
        let (patterns, base_url) = match validated {
            Ok(validated) => validated,
            Err(e) => {
                tracing::warn!("Rejected search request: {}", e);
                results.push(SearchEvent::InvalidRequest(e));
                outcome.state = transition(outcome.state, SearchState::Completed);
                return outcome;
            }
        };

        let request = CrawlRequest {
            base_url,
            ..request.clone()
        };
        tracing::info!("Starting search of {}", request.base_url);

        let frontier = build_frontier(&request, self.fetcher.as_ref()).await;

        if token.is_cancelled() {
            return self.cancelled(outcome);
        }

        let mut frontier = match frontier {
            Ok(frontier) => frontier,
            Err(e) => {
                tracing::warn!("Link discovery failed: {}", e);
                outcome.pages_failed += 1;
                results.push(SearchEvent::FetchFailed(e));
                Frontier::new()
            }
        };

        tracing::debug!("Searching {} pages with {} patterns", frontier.len(), patterns.len());

        while let Some(url) = frontier.next_url() {
            if token.is_cancelled() {
                return self.cancelled(outcome);
            }

            tracing::debug!("Fetching {}", url);
            let fetched = AssertUnwindSafe(self.fetcher.fetch(&url))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(FetchError::from_panic(url.as_str(), &*panic)));

            if token.is_cancelled() {
                return self.cancelled(outcome);
            }

            let body = match fetched {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("{}", e);
                    outcome.pages_failed += 1;
                    results.push(SearchEvent::FetchFailed(e));
                    continue;
                }
            };

            let scanned = catch_unwind(AssertUnwindSafe(|| {
                scan_page(&url, &body, &patterns, token, results)
            }));

            match scanned {
                Ok(Some(found)) => {
                    outcome.pages_searched += 1;
                    outcome.matches += found;
                }
                Ok(None) => return self.cancelled(outcome),
                Err(panic) => {
                    let e = FetchError::from_panic(url.as_str(), &*panic);
                    tracing::error!("Scanning {} panicked: {}", url, e.kind);
                    outcome.pages_failed += 1;
                    results.push(SearchEvent::FetchFailed(e));
                }
            }
        }

        outcome.state = transition(outcome.state, SearchState::Completed);
        tracing::info!(
            "Search completed: {} pages searched, {} failed, {} matches",
            outcome.pages_searched,
            outcome.pages_failed,
            outcome.matches
        );
        outcome
    }

    fn cancelled(&self, mut outcome: SearchOutcome) -> SearchOutcome {
        outcome.state = transition(outcome.state, SearchState::Cancelled);
        tracing::info!(
            "Search cancelled after {} pages ({} matches)",
            outcome.pages_searched,
            outcome.matches
        );
        outcome
    }
}

/// Applies every pattern to `body` in order, pushing one record per match
///
/// Returns the number of matches pushed, or `None` if the token was set
/// before a match could be pushed.
fn scan_page(
    url: &str,
    body: &str,
    patterns: &[Pattern],
    token: &CancellationToken,
    results: &ResultSender,
) -> Option<usize> {
    let mut found = 0;

    for pattern in patterns {
        for matched in pattern.find_all(body) {
            if token.is_cancelled() {
                return None;
            }
            results.push_match(url, pattern.source(), matched);
            found += 1;
        }
    }

    tracing::debug!("{} matches on {}", found, url);
    Some(found)
}

/// Checks that the base URL is present and carries an HTTP(S) scheme
///
/// Returns the trimmed base URL that the rest of the search works from.
fn validate_base_url(base_url: &str) -> Result<String, InvalidRequest> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(InvalidRequest::MissingUrl);
    }

    match Url::parse(trimmed) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(trimmed.to_string()),
        Ok(url) => Err(InvalidRequest::MalformedUrl {
            url: base_url.to_string(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(url::ParseError::RelativeUrlWithoutBase) => Err(InvalidRequest::MissingScheme {
            url: trimmed.to_string(),
        }),
        Err(e) => Err(InvalidRequest::MalformedUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Moves to `next`, logging transitions the lifecycle does not allow
fn transition(current: SearchState, next: SearchState) -> SearchState {
    if !current.can_transition_to(next) {
        tracing::error!("Invalid search state transition: {} -> {}", current, next);
    } else {
        tracing::trace!("Search state {} -> {}", current, next);
    }
    next
}
