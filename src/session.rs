//! Search worker management
//!
//! A [`SearchHandle`] owns one background search: its cancellation token,
//! its task, and the consumer half of its result channel. [`Searcher`] keeps
//! at most one handle alive and guarantees a previous worker has fully
//! stopped before a new one starts writing results.

use crate::crawler::{CrawlRequest, SearchEngine, SearchOutcome};
use crate::results::{result_channel, ResultReceiver, SearchEvent};
use crate::state::SearchState;
use crate::CrawlerError;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

/// One running (or finished) search
#[derive(Debug)]
pub struct SearchHandle {
    token: CancellationToken,
    task: Option<JoinHandle<SearchOutcome>>,
    /// Set once the task has been joined; `Err` holds the join failure
    finished: Option<Result<SearchOutcome, String>>,
    /// Lifecycle state published by the worker
    state: watch::Receiver<SearchState>,
    results: ResultReceiver,
}

impl SearchHandle {
    /// Spawns `request` on a background task with a fresh token and channel
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(engine: SearchEngine, request: CrawlRequest) -> Self {
        Self::spawn_with_token(engine, request, CancellationToken::new())
    }

    /// Like [`SearchHandle::spawn`], but observes a caller-supplied token
    pub fn spawn_with_token(
        engine: SearchEngine,
        request: CrawlRequest,
        token: CancellationToken,
    ) -> Self {
        let (sender, results) = result_channel();
        let (state_tx, state) = watch::channel(SearchState::Idle);
        let worker_token = token.clone();

        let task = tokio::spawn(async move {
            if !worker_token.is_cancelled() {
                state_tx.send_replace(SearchState::Running);
            }
            let outcome = engine.run(&request, &worker_token, &sender).await;
            state_tx.send_replace(outcome.state);
            outcome
        });

        Self {
            token,
            task: Some(task),
            finished: None,
            state,
            results,
        }
    }

    /// Requests cooperative cancellation; the worker stops at its next checkpoint
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the worker is still producing results
    ///
    /// Once this returns false, whatever is left in the channel is the tail of
    /// the stream.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Takes the next queued event without waiting
    pub fn try_pop(&mut self) -> Option<SearchEvent> {
        self.results.try_pop()
    }

    /// Takes every event currently queued
    pub fn drain(&mut self) -> Vec<SearchEvent> {
        self.results.drain()
    }

    /// Waits for the worker to stop and returns its outcome
    ///
    /// A worker that ended without an outcome (it panicked outside the
    /// per-URL boundary or was aborted) yields [`CrawlerError::Worker`].
    /// Queued events stay available through [`SearchHandle::try_pop`].
    pub async fn join(&mut self) -> Result<SearchOutcome, CrawlerError> {
        if let Some(task) = self.task.take() {
            self.finished = Some(worker_result(task.await));
        }

        match &self.finished {
            Some(Ok(outcome)) => Ok(*outcome),
            Some(Err(message)) => Err(CrawlerError::Worker(message.clone())),
            None => Err(CrawlerError::Worker("search was never spawned".to_string())),
        }
    }

    /// Current lifecycle state as seen from the consumer
    ///
    /// `Idle` until the worker picks the search up, then whatever the worker
    /// last reported. A task that finished without reporting a terminal state
    /// is `Failed`.
    pub fn state(&self) -> SearchState {
        if let Some(finished) = &self.finished {
            return match finished {
                Ok(outcome) => outcome.state,
                Err(_) => SearchState::Failed,
            };
        }

        let reported = *self.state.borrow();
        if !reported.is_terminal() && !self.is_active() {
            SearchState::Failed
        } else {
            reported
        }
    }
}

fn worker_result(joined: Result<SearchOutcome, JoinError>) -> Result<SearchOutcome, String> {
    joined.map_err(|e| {
        tracing::error!("Search worker stopped abnormally: {}", e);
        e.to_string()
    })
}

/// Controller that runs one search at a time
pub struct Searcher {
    engine: SearchEngine,
    active: Option<SearchHandle>,
}

impl Searcher {
    pub fn new(engine: SearchEngine) -> Self {
        Self {
            engine,
            active: None,
        }
    }

    /// Starts a new search, first cancelling and joining any previous one
    ///
    /// Events the previous search left unread are discarded with its channel.
    pub async fn start(&mut self, request: CrawlRequest) {
        match self.stop_and_wait().await {
            Some(Ok(outcome)) => tracing::debug!("Previous search ended as {}", outcome.state),
            Some(Err(e)) => tracing::warn!("Previous search failed: {}", e),
            None => {}
        }

        tracing::debug!("Spawning search worker for {}", request.base_url);
        self.active = Some(SearchHandle::spawn(self.engine.clone(), request));
    }

    /// Requests cancellation of the active search, if any
    pub fn stop(&self) {
        if let Some(handle) = &self.active {
            handle.cancel();
        }
    }

    /// Cancels the active search and waits for its worker to exit
    ///
    /// Returns `None` when no search was running.
    pub async fn stop_and_wait(&mut self) -> Option<Result<SearchOutcome, CrawlerError>> {
        let mut handle = self.active.take()?;
        handle.cancel();
        Some(handle.join().await)
    }

    /// Waits for the active search to finish on its own
    pub async fn wait(&mut self) -> Option<Result<SearchOutcome, CrawlerError>> {
        match self.active.as_mut() {
            Some(handle) => Some(handle.join().await),
            None => None,
        }
    }

    /// Whether a worker is currently running
    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(SearchHandle::is_active)
    }

    /// Lifecycle state of the active search, `Idle` when there is none
    pub fn state(&self) -> SearchState {
        self.active
            .as_ref()
            .map(SearchHandle::state)
            .unwrap_or_default()
    }

    /// Takes the next event of the active search without waiting
    pub fn try_pop(&mut self) -> Option<SearchEvent> {
        self.active.as_mut().and_then(SearchHandle::try_pop)
    }

    /// Takes every event currently queued for the active search
    pub fn drain(&mut self) -> Vec<SearchEvent> {
        self.active
            .as_mut()
            .map(SearchHandle::drain)
            .unwrap_or_default()
    }
}
