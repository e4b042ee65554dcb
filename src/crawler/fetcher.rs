//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests to fetch page content
//! - Error classification into [`FetchErrorKind`]

use crate::config::FetchConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::any::Any;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The URL has no scheme (e.g. `example.com/page`)
    MissingScheme,

    /// The server answered with a non-success status
    HttpStatus(u16),

    /// DNS failure, refused or reset connection
    ConnectionFailed,

    /// The request did not complete within the timeout
    Timeout,

    /// Anything else
    Unknown(String),
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingScheme => write!(f, "Missing URL scheme"),
            Self::HttpStatus(code) => write!(f, "HTTP error {}", code),
            Self::ConnectionFailed => write!(f, "Error connecting"),
            Self::Timeout => write!(f, "Request timeout"),
            Self::Unknown(message) => write!(f, "Unexpected error: {}", message),
        }
    }
}

/// A failed fetch, always tied to the URL that failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} for {url}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(url: impl Into<String>, kind: FetchErrorKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    /// Turns a panic caught while processing `url` into an `Unknown` error
    pub fn from_panic(url: impl Into<String>, payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::new(url, FetchErrorKind::Unknown(message))
    }
}

/// Capability: retrieve the body of one page
///
/// Implementations apply their own timeout to every call and never write
/// to the result channel; the engine turns the returned value into events.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageFetcher`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            timeout: config.timeout(),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        fetch_url(&self.client, url, self.timeout).await
    }
}

/// Fetches a URL and returns its body as text
///
/// # Error Classification
///
/// | Condition | Kind |
/// |-----------|------|
/// | URL without scheme | MissingScheme |
/// | Non-2xx status | HttpStatus(code) |
/// | DNS failure, refused, reset | ConnectionFailed |
/// | Exceeded `timeout` | Timeout |
/// | Anything else | Unknown |
pub async fn fetch_url(client: &Client, url: &str, timeout: Duration) -> Result<String, FetchError> {
    let parsed = check_url(url)?;

    let response = client
        .get(parsed)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_error(url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::new(url, FetchErrorKind::HttpStatus(status.as_u16())));
    }

    response.text().await.map_err(|e| classify_error(url, &e))
}

/// Parses `url`, rejecting scheme-less and non-HTTP URLs
fn check_url(url: &str) -> Result<Url, FetchError> {
    match Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(parsed),
        Ok(parsed) => Err(FetchError::new(
            url,
            FetchErrorKind::Unknown(format!("unsupported scheme '{}'", parsed.scheme())),
        )),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Err(FetchError::new(url, FetchErrorKind::MissingScheme))
        }
        Err(e) => Err(FetchError::new(url, FetchErrorKind::Unknown(e.to_string()))),
    }
}

/// Maps a reqwest error onto a [`FetchErrorKind`]
fn classify_error(url: &str, e: &reqwest::Error) -> FetchError {
    let kind = if e.is_timeout() {
        FetchErrorKind::Timeout
    } else if e.is_connect() {
        FetchErrorKind::ConnectionFailed
    } else if let Some(status) = e.status() {
        FetchErrorKind::HttpStatus(status.as_u16())
    } else {
        FetchErrorKind::Unknown(e.to_string())
    };

    FetchError::new(url, kind)
}
