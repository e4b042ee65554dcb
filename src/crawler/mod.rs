//! Crawler module for page fetching and pattern search
//!
//! This module contains the core search logic, including:
//! - HTTP fetching with timeout and error classification
//! - HTML parsing and same-origin link extraction
//! - Target list construction with deduplication
//! - The search loop that streams matches to the result channel

mod engine;
mod fetcher;
mod frontier;
mod parser;
mod request;

pub use engine::{SearchEngine, SearchOutcome};
pub use fetcher::{build_http_client, fetch_url, FetchError, FetchErrorKind, HttpFetcher, PageFetcher};
pub use frontier::{build_frontier, build_target_list, Frontier};
pub use parser::extract_links;
pub use request::CrawlRequest;
