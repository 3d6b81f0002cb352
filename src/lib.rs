//! # Brainstorm
//!
//! Brainstorm is a turn-orchestration engine for multi-round, multi-participant
//! brainstorming sessions in which a privileged *organizer* participant steers
//! the conversation by emitting textual commands.
//!
//! The crate provides carefully layered abstractions for:
//!
//! * **Sessions**: [`BrainstormSession`] drives rounds end to end (start,
//!   pause, resume, advance, summarize) and is cheap to clone into UI tasks
//! * **Dynamic rosters**: a [`ParticipantRegistry`] the organizer populates at
//!   runtime through `assign(...)` commands, field-by-field and in insertion
//!   order
//! * **Command extraction**: a tolerant [`CommandParser`] that finds
//!   `assign`/`invoke` calls inside free-form model prose and falls back to
//!   plain-language cues when no structured command is present
//! * **Fair scheduling**: a FIFO invocation queue drained strictly one turn at
//!   a time, so no participant ever speaks over another and a `pause()` never
//!   loses work
//! * **Pluggable collaborators**: [`ModelInvoker`], [`HumanInputSource`] and
//!   [`PromptTemplateProvider`] traits keep providers, terminals, and prompt
//!   engineering out of the engine
//! * **Shared memory**: an append-only [`TranscriptLog`] that is the sole
//!   conversational context handed to every model call
//!
//! The crate aims to provide documentation-quality examples for every public
//! API. These examples are kept up to date and are written to compile under
//! `cargo test --doc`.
//!
//! ## Core Concepts
//!
//! ### The Organizer and Its Commands
//!
//! Exactly one participant, `"organizer"`, is scanned for commands; expert and
//! human turns are never interpreted. The grammar the organizer emits inline
//! in its replies:
//!
//! ```text
//! assign(id='<id>', role='<role>', focus='<focus>', systemPrompt='<prompt>')
//! invoke(id='<id>')        # id='user' waits for the human, id='self' re-schedules the organizer
//! ```
//!
//! [`CommandParser`] extracts every well-formed occurrence in textual order
//! and ignores everything else, so models can wrap commands in as much prose
//! as they like:
//!
//! ```rust
//! use brainstorm::{Command, CommandParser};
//!
//! let parser = CommandParser::new("organizer");
//! let commands = parser.parse(
//!     "Let's begin. assign(id='ux', role='UX Expert', focus='Onboarding', \
//!      systemPrompt='You are the UX expert.') Now invoke(id='ux')",
//! );
//! assert_eq!(commands.len(), 2);
//! assert!(matches!(&commands[1], Command::Invoke { id } if id == "ux"));
//! ```
//!
//! ### Collaborators
//!
//! The engine never talks to a model, a terminal, or a network itself. It
//! calls three traits you provide as `Arc<dyn …>`:
//!
//! * [`ModelInvoker`]: produce a participant's next contribution from the
//!   transcript so far; the only async, network-facing seam
//! * [`HumanInputSource`]: suspend until the human types something (the
//!   stock [`ChannelInputSource`] is fed by
//!   [`BrainstormSession::submit_human_input`])
//! * [`PromptTemplateProvider`]: organizer, expert, and summary prompt text
//!   (the stock [`DefaultPromptLibrary`] covers all three)
//!
//! ### Driving a Session
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use brainstorm::{
//!     BrainstormSession, ModelError, ModelInvoker, Participant, SessionConfig, TranscriptEntry,
//! };
//!
//! struct MyProviderClient;
//!
//! #[async_trait]
//! impl ModelInvoker for MyProviderClient {
//!     async fn invoke(
//!         &self,
//!         participant: &Participant,
//!         history: &[TranscriptEntry],
//!         prompt_override: Option<&str>,
//!     ) -> Result<String, ModelError> {
//!         // Build a provider request from participant.system_prompt (or the
//!         // override) plus the history, await the reply, return its text.
//!         # let _ = (participant, history, prompt_override);
//!         todo!("call your provider here")
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     brainstorm::init_logger();
//!
//!     let session = BrainstormSession::new(Arc::new(MyProviderClient))
//!         .with_config(SessionConfig::default().with_failure_budget(2));
//!
//!     // Buffered: fulfils the organizer's first invoke(id='user') turn.
//!     session.submit_human_input("Topic: reducing churn in the first week.");
//!
//!     session.start_round("How do we reduce churn?").await?;
//!
//!     for entry in session.transcript().await {
//!         println!("[{}] {}", entry.sender, entry.content);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Scheduling Semantics
//!
//! Turns live in a FIFO queue of invocation requests. The scheduler drains it
//! single-flight: each model call is awaited to completion before the next
//! dequeue, and a reentrancy gate makes concurrent drain attempts no-ops.
//! `pause()` stops draining at the next turn boundary and leaves the queue
//! intact; `resume()` picks up exactly where the round left off. Failed model
//! calls become visible failure-marker entries until the configured budget
//! runs out, and a per-round cap on organizer self-invocations breaks
//! self-amplifying loops. See [`SessionConfig`] for the knobs.
//!
//! Continue exploring the modules re-exported from the crate root for
//! progressively richer interaction patterns.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// The helper is intentionally lightweight so that applications embedding
/// Brainstorm can opt-in to simple `RUST_LOG` driven diagnostics without
/// having to choose a specific logging backend upfront.
///
/// ```rust
/// brainstorm::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `brainstorm` module.
pub mod brainstorm;

// Re-exporting key items for easier external access.
pub use brainstorm::collaborators;
pub use brainstorm::collaborators::{
    ChannelInputSource, HumanInput, HumanInputSource, ModelError, ModelInvoker,
    PromptTemplateProvider,
};
pub use brainstorm::command;
pub use brainstorm::command::{Command, CommandParser};
pub use brainstorm::config::{SessionConfig, DEFAULT_FAILURE_BUDGET, DEFAULT_RECURSION_LIMIT};
pub use brainstorm::dispatch::{CommandDispatcher, DispatchOutcome};
pub use brainstorm::event::EventHandler;
pub use brainstorm::participant::{
    Participant, ParticipantRegistry, PerformanceRecord, ORGANIZER_ID, USER_ID,
};
pub use brainstorm::prompts::DefaultPromptLibrary;
pub use brainstorm::round::{RoundState, RoundStatus};
pub use brainstorm::scheduler::InvocationRequest;
pub use brainstorm::session::{BrainstormSession, RoundEvaluation, SessionError};
pub use brainstorm::transcript::{EntryKind, TranscriptEntry, TranscriptLog};
