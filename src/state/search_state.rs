/// Search lifecycle states
///
/// A search starts `Idle`, becomes `Running` once the worker picks it up, and
/// ends in exactly one of the terminal states.
use std::fmt;

/// Represents the lifecycle state of a single search invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchState {
    /// Search has been created but the worker has not started it yet
    #[default]
    Idle,

    /// Worker is fetching pages and applying patterns
    Running,

    // ===== Terminal States =====
    /// Target list was exhausted (or the request was rejected) without cancellation
    Completed,

    /// Cancellation was observed at a checkpoint and the worker stopped
    Cancelled,

    /// The worker task ended abnormally without reporting an outcome
    Failed,
}

impl SearchState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// `Idle` may also go straight to `Cancelled` when the token was set
    /// before the worker started.
    pub fn can_transition_to(&self, next: SearchState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Cancelled)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Cancelled)
                | (Self::Idle, Self::Failed)
                | (Self::Running, Self::Failed)
        )
    }

    /// Short lowercase label used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
