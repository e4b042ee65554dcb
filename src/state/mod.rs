//! State module for tracking search progress
//!
//! # Components
//!
//! - `SearchState`: lifecycle of one search invocation (idle, running, completed, cancelled)

mod search_state;

pub use search_state::SearchState;
