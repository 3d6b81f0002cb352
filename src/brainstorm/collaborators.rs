//! Collaborator contracts consumed by the orchestration core.
//!
//! The engine deliberately knows nothing about HTTP, providers, terminals,
//! or prompt engineering. Everything that touches the outside world is one
//! of three pluggable traits, held as `Arc<dyn …>`:
//!
//! * [`ModelInvoker`]: turns a participant plus conversation history into
//!   the participant's next contribution. The single network-facing seam.
//! * [`HumanInputSource`]: suspends until the human contributes or ends
//!   the session.
//! * [`PromptTemplateProvider`]: supplies prompt text for the organizer,
//!   for experts assigned without an explicit prompt, and for round
//!   summaries.
//!
//! Implementations must be `Send + Sync`; the core awaits them without
//! holding any internal lock, so a slow model call never blocks a
//! concurrent `pause()`.

use std::error::Error;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::Mutex;

use crate::brainstorm::participant::Participant;
use crate::brainstorm::transcript::TranscriptEntry;

/// Boxed error crossing the model-call boundary. Any `Err` is treated by
/// the core as a failed turn ("model unavailable"), whatever the cause.
pub type ModelError = Box<dyn Error + Send + Sync>;

/// The single call the core makes per queued invocation.
///
/// # Example
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use brainstorm::{ModelError, ModelInvoker, Participant, TranscriptEntry};
///
/// struct EchoInvoker;
///
/// #[async_trait]
/// impl ModelInvoker for EchoInvoker {
///     async fn invoke(
///         &self,
///         participant: &Participant,
///         history: &[TranscriptEntry],
///         prompt_override: Option<&str>,
///     ) -> Result<String, ModelError> {
///         let _ = (history, prompt_override);
///         Ok(format!("{} has nothing to add.", participant.role))
///     }
/// }
/// ```
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Produce `participant`'s next contribution given the conversation so
    /// far.
    ///
    /// `history` is the full session transcript in append order. When
    /// `prompt_override` is `Some`, it replaces the participant's
    /// configured system prompt for this one call (used for summary
    /// turns). The core calls this at most once per queued request and
    /// never concurrently with itself.
    async fn invoke(
        &self,
        participant: &Participant,
        history: &[TranscriptEntry],
        prompt_override: Option<&str>,
    ) -> Result<String, ModelError>;
}

/// What a pending human-input read produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HumanInput {
    /// The human contributed text.
    Text(String),
    /// The human ended the session; the round transitions to `FINISHED`.
    EndOfSession,
}

/// Suspending source of human contributions, consulted whenever the
/// `"user"` participant is invoked.
#[async_trait]
pub trait HumanInputSource: Send + Sync {
    /// Suspend until the human produces input or ends the session.
    async fn read(&self) -> HumanInput;
}

/// Supplies prompt text the core cannot construct itself.
///
/// Kept synchronous: implementations do string work, not I/O. The crate
/// ships [`DefaultPromptLibrary`](crate::DefaultPromptLibrary); swap in
/// your own provider to change tone or language.
pub trait PromptTemplateProvider: Send + Sync {
    /// System prompt for the organizer participant, installed at bootstrap.
    fn organizer_prompt(&self) -> String;

    /// System prompt for an expert assigned without an explicit prompt.
    fn expert_prompt(&self, role: &str, focus: &str, topic: &str) -> String;

    /// Prompt override for the closing summary turn of a round.
    fn round_summary_prompt(&self, topic: &str, round: u32) -> String;
}

/// Built-in [`HumanInputSource`] backed by an unbounded channel.
///
/// [`BrainstormSession::submit_human_input`](crate::BrainstormSession::submit_human_input)
/// feeds the sending half, so a UI thread can fulfil a pending read at any
/// time. Two things map to [`HumanInput::EndOfSession`]: the literal
/// `"exit"` (case-insensitive, surrounding whitespace ignored) and a closed
/// channel.
pub struct ChannelInputSource {
    receiver: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl ChannelInputSource {
    /// Create the source together with the sender that fulfils its reads.
    pub fn new() -> (Self, mpsc::UnboundedSender<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            ChannelInputSource {
                receiver: Mutex::new(receiver),
            },
            sender,
        )
    }
}

#[async_trait]
impl HumanInputSource for ChannelInputSource {
    async fn read(&self) -> HumanInput {
        let mut receiver = self.receiver.lock().await;
        match receiver.recv().await {
            Some(text) if text.trim().eq_ignore_ascii_case("exit") => HumanInput::EndOfSession,
            Some(text) => HumanInput::Text(text),
            None => HumanInput::EndOfSession,
        }
    }
}
