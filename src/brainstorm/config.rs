//! Session tuning knobs.
//!
//! [`SessionConfig`] is deliberately small and constructed in code; there
//! is no config-file parsing. The defaults suit interactive sessions; tests
//! typically shrink the limits.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use brainstorm::SessionConfig;
//!
//! let config = SessionConfig::default()
//!     .with_failure_budget(1)
//!     .with_invocation_timeout(Duration::from_secs(30));
//!
//! assert_eq!(config.recursion_limit, 50);
//! assert_eq!(config.failure_budget, 1);
//! ```

use std::time::Duration;

/// Default cap on organizer self-invocations per round.
pub const DEFAULT_RECURSION_LIMIT: u32 = 50;

/// Default number of failed model turns tolerated per round.
pub const DEFAULT_FAILURE_BUDGET: u32 = 3;

/// Tuning knobs for a brainstorming session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Self-invocations the organizer may accumulate in one round before
    /// the round is aborted with a recursion error. Counted at dispatch
    /// time; reset on round boundaries.
    pub recursion_limit: u32,
    /// Failed model turns tolerated per round. Each failure appends a
    /// marker entry; exceeding the budget aborts the round.
    pub failure_budget: u32,
    /// Optional wall-clock bound per model call. Expiry counts as a failed
    /// turn. `None` trusts the collaborator to return.
    pub invocation_timeout: Option<Duration>,
}

impl SessionConfig {
    /// Replace the self-invocation cap, consuming and returning `self`.
    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Replace the failure budget, consuming and returning `self`.
    pub fn with_failure_budget(mut self, budget: u32) -> Self {
        self.failure_budget = budget;
        self
    }

    /// Set a per-invocation timeout, consuming and returning `self`.
    pub fn with_invocation_timeout(mut self, timeout: Duration) -> Self {
        self.invocation_timeout = Some(timeout);
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            failure_budget: DEFAULT_FAILURE_BUDGET,
            invocation_timeout: None,
        }
    }
}
