//! Round lifecycle state machine.
//!
//! One [`RoundState`] lives per session and gates everything the scheduler
//! does: draining requires an active status, pausing flips `DISCUSSING` to
//! `PAUSED` without touching the queue, and `FINISHED` is terminal.
//!
//! Transitions are deliberately forgiving: an invalid transition (say,
//! resuming a session that is not paused) is a no-op rather than an error,
//! so duplicate UI events cannot wedge the machine. Each mutator returns
//! whether the state actually changed; callers emit change notifications
//! only on `true`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    /// Session constructed, no round started yet.
    Setup,
    /// A round is live; the scheduler may drain.
    Discussing,
    /// Draining is suspended; the queue is retained for resume.
    Paused,
    /// A closing summary turn is in progress; the scheduler may drain.
    Summarizing,
    /// Terminal. No further draining ever happens.
    Finished,
}

impl RoundStatus {
    /// Whether the scheduler is allowed to drain in this status.
    pub fn is_active(self) -> bool {
        matches!(self, RoundStatus::Discussing | RoundStatus::Summarizing)
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundStatus::Setup => "SETUP",
            RoundStatus::Discussing => "DISCUSSING",
            RoundStatus::Paused => "PAUSED",
            RoundStatus::Summarizing => "SUMMARIZING",
            RoundStatus::Finished => "FINISHED",
        };
        f.write_str(name)
    }
}

/// Round number, topic, and lifecycle status of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    round: u32,
    topic: String,
    status: RoundStatus,
}

impl RoundState {
    /// A fresh state: round 0, empty topic, `SETUP`.
    pub fn new() -> Self {
        RoundState {
            round: 0,
            topic: String::new(),
            status: RoundStatus::Setup,
        }
    }

    /// Current round number; 0 until the first round starts.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Topic of the current round.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Current lifecycle status.
    pub fn status(&self) -> RoundStatus {
        self.status
    }

    /// Start the first round of a session (or restart after `FINISHED`).
    /// No-op while a round is live.
    pub(crate) fn begin(&mut self, topic: impl Into<String>) -> bool {
        match self.status {
            RoundStatus::Setup | RoundStatus::Finished => {
                self.round = 1;
                self.topic = topic.into();
                self.status = RoundStatus::Discussing;
                true
            }
            _ => false,
        }
    }

    /// `DISCUSSING -> PAUSED`. No-op from any other status.
    pub(crate) fn pause(&mut self) -> bool {
        if self.status == RoundStatus::Discussing {
            self.status = RoundStatus::Paused;
            true
        } else {
            false
        }
    }

    /// `PAUSED -> DISCUSSING`. No-op from any other status.
    pub(crate) fn resume(&mut self) -> bool {
        if self.status == RoundStatus::Paused {
            self.status = RoundStatus::Discussing;
            true
        } else {
            false
        }
    }

    /// Move to the next round: increments the round number, stays
    /// `DISCUSSING`. No-op unless currently `DISCUSSING`.
    pub(crate) fn advance(&mut self) -> bool {
        if self.status == RoundStatus::Discussing {
            self.round += 1;
            true
        } else {
            false
        }
    }

    /// `DISCUSSING -> SUMMARIZING`. No-op from any other status.
    pub(crate) fn begin_summary(&mut self) -> bool {
        if self.status == RoundStatus::Discussing {
            self.status = RoundStatus::Summarizing;
            true
        } else {
            false
        }
    }

    /// Enter the terminal `FINISHED` status from anywhere. No-op when
    /// already finished.
    pub(crate) fn finish(&mut self) -> bool {
        if self.status != RoundStatus::Finished {
            self.status = RoundStatus::Finished;
            true
        } else {
            false
        }
    }
}

impl Default for RoundState {
    fn default() -> Self {
        RoundState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_setup() {
        let state = RoundState::new();
        assert_eq!(state.round(), 0);
        assert_eq!(state.status(), RoundStatus::Setup);
        assert!(!state.status().is_active());
    }

    #[test]
    fn begin_starts_round_one() {
        let mut state = RoundState::new();
        assert!(state.begin("How do we reduce churn?"));
        assert_eq!(state.round(), 1);
        assert_eq!(state.topic(), "How do we reduce churn?");
        assert_eq!(state.status(), RoundStatus::Discussing);
    }

    #[test]
    fn begin_is_noop_while_live() {
        let mut state = RoundState::new();
        state.begin("topic");
        assert!(!state.begin("other topic"));
        assert_eq!(state.topic(), "topic");

        state.pause();
        assert!(!state.begin("third topic"));
        assert_eq!(state.status(), RoundStatus::Paused);
    }

    #[test]
    fn begin_after_finished_restarts() {
        let mut state = RoundState::new();
        state.begin("one");
        state.finish();
        assert!(state.begin("two"));
        assert_eq!(state.round(), 1);
        assert_eq!(state.topic(), "two");
    }

    #[test]
    fn pause_resume_round_trip() {
        let mut state = RoundState::new();
        state.begin("topic");
        assert!(state.pause());
        assert_eq!(state.status(), RoundStatus::Paused);
        assert!(state.resume());
        assert_eq!(state.status(), RoundStatus::Discussing);
    }

    #[test]
    fn invalid_transitions_are_noops() {
        let mut state = RoundState::new();
        assert!(!state.pause());
        assert!(!state.resume());
        assert!(!state.advance());
        assert!(!state.begin_summary());
        assert_eq!(state.status(), RoundStatus::Setup);

        state.begin("topic");
        assert!(!state.resume());
        state.pause();
        assert!(!state.pause());
        assert!(!state.begin_summary());
    }

    #[test]
    fn advance_increments_round() {
        let mut state = RoundState::new();
        state.begin("topic");
        assert!(state.advance());
        assert!(state.advance());
        assert_eq!(state.round(), 3);
        assert_eq!(state.status(), RoundStatus::Discussing);
    }

    #[test]
    fn summary_then_finish() {
        let mut state = RoundState::new();
        state.begin("topic");
        assert!(state.begin_summary());
        assert_eq!(state.status(), RoundStatus::Summarizing);
        assert!(state.status().is_active());
        assert!(state.finish());
        assert!(!state.finish());
        assert_eq!(state.status(), RoundStatus::Finished);
    }

    #[test]
    fn status_display_matches_wire_names() {
        assert_eq!(RoundStatus::Setup.to_string(), "SETUP");
        assert_eq!(RoundStatus::Discussing.to_string(), "DISCUSSING");
        assert_eq!(RoundStatus::Paused.to_string(), "PAUSED");
        assert_eq!(RoundStatus::Summarizing.to_string(), "SUMMARIZING");
        assert_eq!(RoundStatus::Finished.to_string(), "FINISHED");
    }
}
