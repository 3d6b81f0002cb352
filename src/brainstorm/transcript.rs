//! Append-only transcript of a brainstorming session.
//!
//! The ordered sequence of [`TranscriptEntry`] values is the sole shared
//! memory of the system: every model invocation receives it as
//! conversational context, and UI layers observe it through
//! [`EventHandler::on_transcript_appended`](crate::EventHandler::on_transcript_appended)
//! or snapshot accessors. Entries are immutable once appended and only the
//! scheduler appends, so ordering always matches invocation order.
//!
//! The log tracks a per-round window: [`TranscriptLog::round_entries`]
//! exposes the entries of the current round while the full session history
//! persists across round boundaries.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Distinguishes real contributions from synthetic failure markers, so a
/// human operator can see where automation broke down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A participant's (or the human's) actual contribution.
    Message,
    /// A synthetic marker recorded when a model call failed or timed out.
    Failure,
}

/// One turn in the conversation. Immutable once appended.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    /// When the entry was appended.
    pub timestamp: DateTime<Utc>,
    /// Human-readable sender name: `"Organizer"`, an expert's role, or
    /// `"User"`.
    pub sender: String,
    /// The contribution text. `Arc<str>` keeps history snapshots cheap.
    pub content: Arc<str>,
    /// Whether this entry is a real message or a failure marker.
    pub kind: EntryKind,
}

impl TranscriptEntry {
    /// Create a regular message entry stamped with the current time.
    pub fn new(sender: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        TranscriptEntry {
            timestamp: Utc::now(),
            sender: sender.into(),
            content: content.into(),
            kind: EntryKind::Message,
        }
    }

    /// Create a failure marker entry stamped with the current time.
    pub fn failure(sender: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        TranscriptEntry {
            timestamp: Utc::now(),
            sender: sender.into(),
            content: content.into(),
            kind: EntryKind::Failure,
        }
    }

    /// Whether this entry marks a failed turn.
    pub fn is_failure(&self) -> bool {
        self.kind == EntryKind::Failure
    }
}

/// Append-only ordered record of turns with a current-round window.
#[derive(Debug, Clone, Default)]
pub struct TranscriptLog {
    entries: Vec<TranscriptEntry>,
    round_start: usize,
}

impl TranscriptLog {
    /// Create an empty log.
    pub fn new() -> Self {
        TranscriptLog::default()
    }

    /// Append an entry. Restricted to the crate: the transcript is owned by
    /// the scheduler and collaborators never mutate it directly.
    pub(crate) fn append(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// Mark the start of a new round. The full history persists; only the
    /// round window moves.
    pub(crate) fn begin_round(&mut self) {
        self.round_start = self.entries.len();
    }

    /// The full session history, oldest first.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// The entries appended since the current round began.
    pub fn round_entries(&self) -> &[TranscriptEntry] {
        &self.entries[self.round_start..]
    }

    /// Total number of entries across all rounds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the session has produced no entries yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
