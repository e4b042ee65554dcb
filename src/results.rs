//! Result channel between the search worker and its consumer
//!
//! The worker pushes [`SearchEvent`]s into an unbounded FIFO; the consumer
//! drains it without blocking. End of stream is not signalled in-band: the
//! consumer watches the worker's liveness instead.

use crate::crawler::FetchError;
use crate::PatternError;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// One pattern match on one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// URL of the page the match was found on
    pub source_url: String,

    /// Pattern text as supplied by the user or registry
    pub pattern: String,

    /// The matched substring
    pub matched_text: String,
}

/// A request the engine refused to run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRequest {
    #[error("No URL supplied")]
    MissingUrl,

    #[error("URL '{url}' has no scheme; did you mean 'https://{url}'?")]
    MissingScheme { url: String },

    #[error("URL '{url}' is not valid: {message}")]
    MalformedUrl { url: String, message: String },

    #[error("No pattern supplied: enter a regex or select a built-in pattern")]
    NoPattern,

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Unknown built-in pattern '{0}'")]
    UnknownPattern(String),
}

impl From<PatternError> for InvalidRequest {
    fn from(err: PatternError) -> Self {
        match err {
            PatternError::NotFound(name) => Self::UnknownPattern(name),
            PatternError::Invalid { pattern, message } => Self::InvalidPattern { pattern, message },
            PatternError::Duplicate(name) => Self::InvalidPattern {
                pattern: name,
                message: "name is already registered".to_string(),
            },
        }
    }
}

/// An entry in the result stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// A pattern matched on a fetched page
    Match(MatchRecord),

    /// A page could not be fetched; the search continues with the next URL
    FetchFailed(FetchError),

    /// The request was rejected before any page was fetched
    InvalidRequest(InvalidRequest),
}

impl SearchEvent {
    pub fn as_match(&self) -> Option<&MatchRecord> {
        match self {
            Self::Match(record) => Some(record),
            _ => None,
        }
    }

    /// Human-readable error text, `None` for matches
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Match(_) => None,
            Self::FetchFailed(err) => Some(err.to_string()),
            Self::InvalidRequest(err) => Some(err.to_string()),
        }
    }
}

/// Creates a connected producer/consumer pair
pub fn result_channel() -> (ResultSender, ResultReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ResultSender { tx }, ResultReceiver { rx })
}

/// Producer half, owned by the search worker
#[derive(Debug, Clone)]
pub struct ResultSender {
    tx: UnboundedSender<SearchEvent>,
}

impl ResultSender {
    /// Appends an event; never blocks
    ///
    /// A dropped receiver means nobody is listening any more, so the event is
    /// discarded.
    pub fn push(&self, event: SearchEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Result receiver dropped, discarding event");
        }
    }

    pub fn push_match(&self, source_url: &str, pattern: &str, matched_text: &str) {
        self.push(SearchEvent::Match(MatchRecord {
            source_url: source_url.to_string(),
            pattern: pattern.to_string(),
            matched_text: matched_text.to_string(),
        }));
    }
}

/// Consumer half
#[derive(Debug)]
pub struct ResultReceiver {
    rx: UnboundedReceiver<SearchEvent>,
}

impl ResultReceiver {
    /// Takes the oldest event, or `None` if nothing is queued right now
    pub fn try_pop(&mut self) -> Option<SearchEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Takes every event currently queued
    pub fn drain(&mut self) -> Vec<SearchEvent> {
        std::iter::from_fn(|| self.try_pop()).collect()
    }
}
