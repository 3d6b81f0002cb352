//! The session facade: lifecycle commands, human input, and snapshots.
//!
//! [`BrainstormSession`] owns the scheduler and is the only type most
//! applications touch. Construct it with a [`ModelInvoker`], optionally
//! swap in your own collaborators with the `with_*` builders, then drive it
//! with the command methods: [`start_round`](BrainstormSession::start_round),
//! [`pause`](BrainstormSession::pause), [`resume`](BrainstormSession::resume),
//! [`finish_round`](BrainstormSession::finish_round),
//! [`summarize_round`](BrainstormSession::summarize_round),
//! [`submit_human_input`](BrainstormSession::submit_human_input) and
//! [`end_session`](BrainstormSession::end_session).
//!
//! The session is cheap to clone; clones share all state, so one clone can
//! sit in a UI task calling `pause()` while another drives the round.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use brainstorm::{BrainstormSession, ModelError, ModelInvoker, Participant, TranscriptEntry};
//!
//! struct ScriptedOrganizer;
//!
//! #[async_trait]
//! impl ModelInvoker for ScriptedOrganizer {
//!     async fn invoke(
//!         &self,
//!         participant: &Participant,
//!         _history: &[TranscriptEntry],
//!         _prompt_override: Option<&str>,
//!     ) -> Result<String, ModelError> {
//!         Ok(match participant.id.as_str() {
//!             "organizer" => "assign(id='tech', role='Tech Expert', focus='Feasibility', \
//!                             systemPrompt='You are the tech expert.') invoke(id='tech')"
//!                 .to_string(),
//!             _ => format!("{} weighs in.", participant.role),
//!         })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     brainstorm::init_logger();
//!
//!     let session = BrainstormSession::new(Arc::new(ScriptedOrganizer));
//!     session.start_round("How should we cache model replies?").await?;
//!
//!     for entry in session.transcript().await {
//!         println!("[{}] {}", entry.sender, entry.content);
//!     }
//!     Ok(())
//! }
//! ```

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::brainstorm::collaborators::{
    ChannelInputSource, HumanInputSource, ModelInvoker, PromptTemplateProvider,
};
use crate::brainstorm::config::SessionConfig;
use crate::brainstorm::event::EventHandler;
use crate::brainstorm::participant::{Participant, PerformanceRecord, ORGANIZER_ID, USER_ID};
use crate::brainstorm::prompts::DefaultPromptLibrary;
use crate::brainstorm::round::{RoundState, RoundStatus};
use crate::brainstorm::scheduler::{InvocationRequest, SchedulerCore, TurnScheduler};
use crate::brainstorm::transcript::TranscriptEntry;

/// System prompt for participants assigned without one, outside the
/// template synthesis path.
const DEFAULT_PARTICIPANT_PROMPT: &str = "You are a helpful participant in a brainstorming session.";

const ORGANIZER_ROLE: &str = "Discussion Organizer";
const ORGANIZER_FOCUS: &str = "Facilitate and guide the brainstorming session";

/// Errors surfaced by session commands. Everything else the engine absorbs:
/// malformed commands parse to nothing, unknown invoke targets are dropped
/// with a diagnostic, and failed model turns become transcript markers until
/// the budget runs out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// `start_round` was called with an empty or whitespace-only topic.
    EmptyTopic,
    /// The organizer exceeded the per-round self-invocation cap; the round
    /// was aborted to break the loop.
    RecursionLimitExceeded { limit: u32 },
    /// More failed model turns than the budget allows; the round was
    /// aborted.
    FailureBudgetExhausted { budget: u32 },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyTopic => write!(f, "a round needs a non-empty topic"),
            SessionError::RecursionLimitExceeded { limit } => write!(
                f,
                "organizer exceeded {} self-invocations in one round",
                limit
            ),
            SessionError::FailureBudgetExhausted { budget } => {
                write!(f, "more than {} failed model turns in one round", budget)
            }
        }
    }
}

impl Error for SessionError {}

/// One expert's evaluation for the current round, as returned by
/// [`BrainstormSession::evaluate_round`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundEvaluation {
    /// The evaluated expert.
    pub participant_id: String,
    /// The record appended to the expert's performance history.
    pub record: PerformanceRecord,
}

/// A multi-round, multi-participant brainstorming session.
#[derive(Clone)]
pub struct BrainstormSession {
    id: String,
    core: Arc<RwLock<SchedulerCore>>,
    invoker: Arc<dyn ModelInvoker>,
    input: Arc<dyn HumanInputSource>,
    templates: Arc<dyn PromptTemplateProvider>,
    events: Option<Arc<dyn EventHandler>>,
    config: SessionConfig,
    scheduler: TurnScheduler,
    input_sender: Option<mpsc::UnboundedSender<String>>,
}

impl BrainstormSession {
    /// Create a session around `invoker` with stock collaborators: the
    /// built-in prompt library and a channel-backed human input source fed
    /// by [`submit_human_input`](Self::submit_human_input).
    pub fn new(invoker: Arc<dyn ModelInvoker>) -> Self {
        let templates: Arc<dyn PromptTemplateProvider> = Arc::new(DefaultPromptLibrary::new());
        let (input_source, input_sender) = ChannelInputSource::new();
        let input: Arc<dyn HumanInputSource> = Arc::new(input_source);
        let core = Arc::new(RwLock::new(SchedulerCore::new(DEFAULT_PARTICIPANT_PROMPT)));
        let config = SessionConfig::default();
        let id = format!("session-{}", Uuid::new_v4());
        let scheduler = TurnScheduler::new(
            id.clone(),
            Arc::clone(&core),
            Arc::clone(&invoker),
            Arc::clone(&input),
            Arc::clone(&templates),
            None,
            config.clone(),
        );
        BrainstormSession {
            id,
            core,
            invoker,
            input,
            templates,
            events: None,
            config,
            scheduler,
            input_sender: Some(input_sender),
        }
    }

    /// Replace the session id, consuming and returning `self`.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self.rebuild_scheduler();
        self
    }

    /// Replace the tuning knobs, consuming and returning `self`.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self.rebuild_scheduler();
        self
    }

    /// Replace the prompt templates, consuming and returning `self`.
    pub fn with_prompt_templates(mut self, templates: Arc<dyn PromptTemplateProvider>) -> Self {
        self.templates = templates;
        self.rebuild_scheduler();
        self
    }

    /// Replace the human input source, consuming and returning `self`.
    ///
    /// [`submit_human_input`](Self::submit_human_input) only feeds the stock
    /// channel source; with a custom source it becomes a warning no-op.
    pub fn with_input_source(mut self, input: Arc<dyn HumanInputSource>) -> Self {
        self.input = input;
        self.input_sender = None;
        self.rebuild_scheduler();
        self
    }

    /// Install an event handler, consuming and returning `self`.
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.events = Some(handler);
        self.rebuild_scheduler();
        self
    }

    // The scheduler bakes in its collaborators, so the builders above
    // reconstruct it. Only legal before the session runs, which is the only
    // time the builders can be called: they take `self` by value.
    fn rebuild_scheduler(&mut self) {
        self.scheduler = TurnScheduler::new(
            self.id.clone(),
            Arc::clone(&self.core),
            Arc::clone(&self.invoker),
            Arc::clone(&self.input),
            Arc::clone(&self.templates),
            self.events.clone(),
            self.config.clone(),
        );
    }

    /// This session's identifier, `session-<uuid>` unless overridden.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Start the first round on `topic` and drive it until the queue goes
    /// idle or the round stops.
    ///
    /// Bootstraps the organizer and the `"user"` participant, queues the
    /// organizer's opening turn, and drains. A whitespace-only topic is
    /// rejected; calling while a round is live is a warning no-op. After
    /// `FINISHED` the session may be started again.
    pub async fn start_round(&self, topic: impl Into<String>) -> Result<(), SessionError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(SessionError::EmptyTopic);
        }

        let state = {
            let mut core = self.core.write().await;
            if !core.round.begin(topic) {
                warn!(
                    "[{}] start_round ignored: round already live ({})",
                    self.id,
                    core.round.status()
                );
                return Ok(());
            }
            // Anything left from a previous life of this session is stale.
            core.queue.clear();
            core.transcript.begin_round();
            core.reset_round_counters();

            core.registry.assign(
                ORGANIZER_ID,
                ORGANIZER_ROLE,
                ORGANIZER_FOCUS,
                Some(self.templates.organizer_prompt()),
                None,
            );
            core.registry
                .assign(USER_ID, "User", "Human participant", None, None);

            core.queue.push_back(InvocationRequest::new(ORGANIZER_ID));
            core.round.clone()
        };

        info!("[{}] round 1 started: {}", self.id, state.topic());
        self.scheduler.emit_state(&state).await;
        self.scheduler.drain().await
    }

    /// Suspend draining. The pending queue is left intact; an in-flight
    /// model call finishes and its result is still recorded. No-op unless
    /// the round is `DISCUSSING`.
    pub async fn pause(&self) {
        let state = {
            let mut core = self.core.write().await;
            if core.round.pause() {
                Some(core.round.clone())
            } else {
                None
            }
        };
        match state {
            Some(state) => {
                info!("[{}] paused", self.id);
                self.scheduler.emit_state(&state).await;
            }
            None => debug!("[{}] pause ignored", self.id),
        }
    }

    /// Resume a paused round and drain whatever queued up while paused.
    /// No-op unless the round is `PAUSED`.
    pub async fn resume(&self) -> Result<(), SessionError> {
        let state = {
            let mut core = self.core.write().await;
            if core.round.resume() {
                Some(core.round.clone())
            } else {
                None
            }
        };
        match state {
            Some(state) => {
                info!("[{}] resumed", self.id);
                self.scheduler.emit_state(&state).await;
                self.scheduler.drain().await
            }
            None => {
                debug!("[{}] resume ignored", self.id);
                Ok(())
            }
        }
    }

    /// Close the current round and open the next one: the round number
    /// advances, the round window and counters reset, and the organizer
    /// gets the opening turn. No-op unless the round is `DISCUSSING` with
    /// an idle queue.
    pub async fn finish_round(&self) -> Result<(), SessionError> {
        let state = {
            let mut core = self.core.write().await;
            if core.round.status() != RoundStatus::Discussing || !core.queue.is_empty() {
                debug!("[{}] finish_round ignored", self.id);
                return Ok(());
            }
            core.round.advance();
            core.transcript.begin_round();
            core.reset_round_counters();
            core.queue.push_back(InvocationRequest::new(ORGANIZER_ID));
            core.round.clone()
        };

        info!("[{}] advanced to round {}", self.id, state.round());
        self.scheduler.emit_state(&state).await;
        self.scheduler.drain().await
    }

    /// Wind the session down with a closing summary: the round moves to
    /// `SUMMARIZING`, the organizer takes one turn with the summary prompt
    /// override, and the session finishes when the queue runs dry. No-op
    /// unless the round is `DISCUSSING` with an idle queue.
    pub async fn summarize_round(&self) -> Result<(), SessionError> {
        let state = {
            let mut core = self.core.write().await;
            if core.round.status() != RoundStatus::Discussing || !core.queue.is_empty() {
                debug!("[{}] summarize_round ignored", self.id);
                return Ok(());
            }
            core.round.begin_summary();
            let prompt = self
                .templates
                .round_summary_prompt(core.round.topic(), core.round.round());
            core.queue
                .push_back(InvocationRequest::with_prompt_override(ORGANIZER_ID, prompt));
            core.round.clone()
        };

        info!("[{}] summarizing round {}", self.id, state.round());
        self.scheduler.emit_state(&state).await;
        self.scheduler.drain().await
    }

    /// Move the session to `FINISHED` immediately. Queued requests are
    /// abandoned. No-op when already finished.
    pub async fn end_session(&self) {
        let state = {
            let mut core = self.core.write().await;
            if core.round.finish() {
                Some(core.round.clone())
            } else {
                None
            }
        };
        if let Some(state) = state {
            info!("[{}] session ended", self.id);
            self.scheduler.emit_state(&state).await;
        }
    }

    /// Queue a turn for `participant_id` and drain if idle. Lets an
    /// operator hand the floor to a specific expert without waiting for the
    /// organizer to invoke them.
    pub async fn request_turn(&self, participant_id: impl Into<String>) -> Result<(), SessionError> {
        self.scheduler
            .request(InvocationRequest::new(participant_id))
            .await
    }

    /// Fulfil a pending (or future) `"user"` turn with `text`. The literal
    /// `"exit"` ends the session instead.
    ///
    /// Feeds the stock channel input source; when a custom source was
    /// installed via [`with_input_source`](Self::with_input_source) this is
    /// a warning no-op.
    pub fn submit_human_input(&self, text: impl Into<String>) {
        match &self.input_sender {
            Some(sender) => {
                if sender.send(text.into()).is_err() {
                    warn!("[{}] human input dropped: reader side gone", self.id);
                }
            }
            None => warn!(
                "[{}] human input ignored: a custom input source is installed",
                self.id
            ),
        }
    }

    /// Score every expert's engagement in the current round and append the
    /// records to their performance histories.
    ///
    /// The score is twice the expert's message count in the round window,
    /// clamped to `1..=10`; the organizer and the human are not scored.
    pub async fn evaluate_round(&self) -> Vec<RoundEvaluation> {
        let mut core = self.core.write().await;
        let round = core.round.round();

        let experts: Vec<(String, String)> = core
            .registry
            .all()
            .iter()
            .filter(|p| !p.is_organizer() && !p.is_user())
            .map(|p| (p.id.clone(), p.role.clone()))
            .collect();

        let mut evaluations = Vec::with_capacity(experts.len());
        for (id, role) in experts {
            let messages = core
                .transcript
                .round_entries()
                .iter()
                .filter(|e| e.sender == role && !e.is_failure())
                .count() as u32;
            let score = (messages * 2).clamp(1, 10) as u8;
            let feedback = if score >= 8 {
                "excellent contributions this round"
            } else if score >= 5 {
                "solid contributions this round"
            } else {
                "could engage more deeply next round"
            };
            let record = PerformanceRecord {
                round,
                score,
                feedback: feedback.to_string(),
            };
            core.registry.record_performance(&id, record.clone());
            evaluations.push(RoundEvaluation {
                participant_id: id,
                record,
            });
        }
        evaluations
    }

    /// Snapshot of the full session transcript.
    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.core.read().await.transcript.entries().to_vec()
    }

    /// Snapshot of the current round's transcript window.
    pub async fn round_transcript(&self) -> Vec<TranscriptEntry> {
        self.core.read().await.transcript.round_entries().to_vec()
    }

    /// Snapshot of the roster in insertion order.
    pub async fn participants(&self) -> Vec<Participant> {
        self.core
            .read()
            .await
            .registry
            .all()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Snapshot of the round state.
    pub async fn round_state(&self) -> RoundState {
        self.core.read().await.round.clone()
    }

    /// Ids currently waiting in the queue, front first.
    pub async fn queued_ids(&self) -> Vec<String> {
        self.core
            .read()
            .await
            .queue
            .iter()
            .map(|r| r.participant_id.clone())
            .collect()
    }
}
