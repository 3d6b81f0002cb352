//! Session observation hooks.
//!
//! A UI layer registers one [`EventHandler`] on the session and receives a
//! notification after every transcript append and on every round-state
//! transition. Both methods default to no-ops, so implementors override
//! only what they render.
//!
//! Handlers are awaited by the scheduler between turns, outside any
//! internal lock. A handler may therefore call the session's snapshot
//! accessors, but a slow handler slows the session down; keep the work
//! light and hand off heavy rendering to another task.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use brainstorm::{EventHandler, RoundState, TranscriptEntry};
//!
//! struct ConsoleRenderer;
//!
//! #[async_trait]
//! impl EventHandler for ConsoleRenderer {
//!     async fn on_transcript_appended(&self, entry: &TranscriptEntry) {
//!         println!("[{}]: {}", entry.sender, entry.content);
//!     }
//!
//!     async fn on_round_state_changed(&self, state: &RoundState) {
//!         println!("-- round {} is now {} --", state.round(), state.status());
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::brainstorm::round::RoundState;
use crate::brainstorm::transcript::TranscriptEntry;

/// Observer for session activity. All methods have default empty
/// implementations.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Called after an entry has been appended to the transcript.
    async fn on_transcript_appended(&self, _entry: &TranscriptEntry) {}

    /// Called after the round state machine actually changed state
    /// (forgiven no-op transitions do not notify).
    async fn on_round_state_changed(&self, _state: &RoundState) {}
}
