//! Crawl frontier
//!
//! Tracks which URLs are still to be fetched and which have already been
//! scheduled, so that no URL is fetched twice within one search.

use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::parser::extract_links;
use crate::crawler::request::CrawlRequest;
use futures::FutureExt;
use std::collections::{HashSet, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// URL queue with set-backed deduplication
///
/// Each search owns its own frontier; it is never shared between searches.
#[derive(Debug, Default)]
pub struct Frontier {
    /// URLs already scheduled or processed
    visited: HashSet<String>,

    /// URLs waiting to be fetched, in insertion order
    to_visit: VecDeque<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `url` unless it was queued before; returns whether it was added
    pub fn push(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.visited.contains(&url) {
            return false;
        }
        self.visited.insert(url.clone());
        self.to_visit.push_back(url);
        true
    }

    /// Queues every URL from `urls`, returning how many were new
    pub fn extend<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .map(|u| self.push(u))
            .filter(|added| *added)
            .count()
    }

    /// Takes the next URL to fetch
    pub fn next_url(&mut self) -> Option<String> {
        self.to_visit.pop_front()
    }

    /// Number of URLs still waiting
    pub fn len(&self) -> usize {
        self.to_visit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_visit.is_empty()
    }

    /// Consumes the frontier, returning the pending URLs in order
    pub fn into_targets(self) -> Vec<String> {
        self.to_visit.into_iter().collect()
    }
}

/// Builds the frontier of pages to search
///
/// Non-recursive requests search only the base URL. Recursive requests fetch
/// the base page once and queue every in-scope link found on it, in
/// lexicographic order; links on those pages are not followed.
///
/// A panic while fetching or parsing the base page is reported as an
/// `Unknown` fetch error for the base URL.
///
/// # Returns
///
/// * `Ok(Frontier)` - Target URLs, each queued once
/// * `Err(FetchError)` - The base page could not be fetched (recursive mode only)
pub async fn build_frontier(
    request: &CrawlRequest,
    fetcher: &dyn PageFetcher,
) -> Result<Frontier, FetchError> {
    let mut frontier = Frontier::new();

    if !request.recursive {
        frontier.push(request.base_url.clone());
        return Ok(frontier);
    }

    tracing::debug!("Discovering links from {}", request.base_url);
    let body = AssertUnwindSafe(fetcher.fetch(&request.base_url))
        .catch_unwind()
        .await
        .map_err(|panic| FetchError::from_panic(request.base_url.as_str(), &*panic))??;
    let links = catch_unwind(AssertUnwindSafe(|| extract_links(&body, &request.base_url)))
        .map_err(|panic| FetchError::from_panic(request.base_url.as_str(), &*panic))?;
    let added = frontier.extend(links);

    tracing::info!("Discovered {} pages under {}", added, request.base_url);
    Ok(frontier)
}

/// Builds the ordered list of pages to search
///
/// Same as [`build_frontier`], flattened into a `Vec`.
pub async fn build_target_list(
    request: &CrawlRequest,
    fetcher: &dyn PageFetcher,
) -> Result<Vec<String>, FetchError> {
    build_frontier(request, fetcher).await.map(Frontier::into_targets)
}
