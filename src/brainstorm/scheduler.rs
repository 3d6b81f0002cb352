//! The turn scheduler: pending-invocation queue, single-flight drain loop,
//! and the invocation primitive.
//!
//! All mutable session state (registry, queue, transcript, round state,
//! per-round counters) lives in one [`SchedulerCore`] behind an async
//! `RwLock`. The drain loop takes the lock only for state handoffs: it pops
//! a request and snapshots what the model call needs, releases, awaits the
//! collaborator, then relocks to append the result and dispatch any
//! commands. A `pause()` arriving while a call is in flight therefore takes
//! effect exactly at the next loop iteration, after the in-flight result
//! has been appended, and never discards it.
//!
//! Single-flight comes from two things: each collaborator call is awaited
//! to completion before the next dequeue, and a reentrancy gate ensures at
//! most one drain loop runs at a time. The gate is a `try_lock`: a second
//! caller finding a drain in progress simply returns, because whatever it
//! enqueued will be picked up by the running loop. That is also how the
//! session makes forward progress when the organizer re-enqueues itself
//! mid-drain.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{Mutex, RwLock};

use crate::brainstorm::collaborators::{
    HumanInput, HumanInputSource, ModelError, ModelInvoker, PromptTemplateProvider,
};
use crate::brainstorm::command::CommandParser;
use crate::brainstorm::config::SessionConfig;
use crate::brainstorm::dispatch::CommandDispatcher;
use crate::brainstorm::event::EventHandler;
use crate::brainstorm::participant::{Participant, ParticipantRegistry, ORGANIZER_ID, USER_ID};
use crate::brainstorm::round::{RoundState, RoundStatus};
use crate::brainstorm::session::SessionError;
use crate::brainstorm::transcript::{TranscriptEntry, TranscriptLog};

/// One queued turn. Ephemeral; exists only while waiting in the queue.
/// Duplicates are legal and processed independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    /// Who takes the turn.
    pub participant_id: String,
    /// Optional replacement for the participant's system prompt, used for
    /// summary turns.
    pub prompt_override: Option<String>,
}

impl InvocationRequest {
    /// Request a plain turn for `participant_id`.
    pub fn new(participant_id: impl Into<String>) -> Self {
        InvocationRequest {
            participant_id: participant_id.into(),
            prompt_override: None,
        }
    }

    /// Request a turn with a one-off system prompt.
    pub fn with_prompt_override(
        participant_id: impl Into<String>,
        prompt_override: impl Into<String>,
    ) -> Self {
        InvocationRequest {
            participant_id: participant_id.into(),
            prompt_override: Some(prompt_override.into()),
        }
    }
}

/// All mutable session state, owned by the scheduler. Collaborators never
/// see this type; reads go out as snapshots.
pub(crate) struct SchedulerCore {
    pub(crate) registry: ParticipantRegistry,
    pub(crate) queue: VecDeque<InvocationRequest>,
    pub(crate) transcript: TranscriptLog,
    pub(crate) round: RoundState,
    /// Organizer self-invocations dispatched this round.
    pub(crate) self_invocations: u32,
    /// Failed model turns this round.
    pub(crate) failed_turns: u32,
}

impl SchedulerCore {
    pub(crate) fn new(default_system_prompt: impl Into<String>) -> Self {
        SchedulerCore {
            registry: ParticipantRegistry::new(default_system_prompt),
            queue: VecDeque::new(),
            transcript: TranscriptLog::new(),
            round: RoundState::new(),
            self_invocations: 0,
            failed_turns: 0,
        }
    }

    pub(crate) fn reset_round_counters(&mut self) {
        self.self_invocations = 0;
        self.failed_turns = 0;
    }
}

/// Drives turns out of the queue one at a time.
#[derive(Clone)]
pub(crate) struct TurnScheduler {
    session_id: String,
    core: Arc<RwLock<SchedulerCore>>,
    gate: Arc<Mutex<()>>,
    invoker: Arc<dyn ModelInvoker>,
    input: Arc<dyn HumanInputSource>,
    parser: CommandParser,
    dispatcher: CommandDispatcher,
    events: Option<Arc<dyn EventHandler>>,
    config: SessionConfig,
}

impl TurnScheduler {
    pub(crate) fn new(
        session_id: String,
        core: Arc<RwLock<SchedulerCore>>,
        invoker: Arc<dyn ModelInvoker>,
        input: Arc<dyn HumanInputSource>,
        templates: Arc<dyn PromptTemplateProvider>,
        events: Option<Arc<dyn EventHandler>>,
        config: SessionConfig,
    ) -> Self {
        TurnScheduler {
            session_id,
            core,
            gate: Arc::new(Mutex::new(())),
            invoker,
            input,
            parser: CommandParser::new(ORGANIZER_ID),
            dispatcher: CommandDispatcher::new(ORGANIZER_ID, templates),
            events,
            config,
        }
    }

    /// Append a request and drain if no drain is running.
    pub(crate) async fn request(&self, request: InvocationRequest) -> Result<(), SessionError> {
        {
            let mut core = self.core.write().await;
            core.queue.push_back(request);
        }
        self.drain().await
    }

    /// Process queued requests one at a time until the queue is empty or
    /// the round stops being active.
    ///
    /// Reentrant calls are no-ops: the running loop re-checks emptiness
    /// after every turn, so anything enqueued meanwhile is picked up.
    pub(crate) async fn drain(&self) -> Result<(), SessionError> {
        let _gate = match self.gate.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("[{}] drain already in progress", self.session_id);
                return Ok(());
            }
        };

        loop {
            let next = {
                let mut core = self.core.write().await;
                if !core.round.status().is_active() {
                    debug!(
                        "[{}] drain stopped: round is {}",
                        self.session_id,
                        core.round.status()
                    );
                    return Ok(());
                }
                match core.queue.pop_front() {
                    Some(request) => request,
                    None => {
                        // A summary turn ends the session once the queue
                        // runs dry; a plain discussion just goes idle.
                        if core.round.status() == RoundStatus::Summarizing && core.round.finish() {
                            let state = core.round.clone();
                            drop(core);
                            info!("[{}] summary complete, session finished", self.session_id);
                            self.emit_state(&state).await;
                        }
                        return Ok(());
                    }
                }
            };
            self.take_turn(next).await?;
        }
    }

    /// The invocation primitive: one dequeued request becomes at most one
    /// transcript entry.
    async fn take_turn(&self, request: InvocationRequest) -> Result<(), SessionError> {
        info!("[{}] turn: {}", self.session_id, request.participant_id);

        if request.participant_id == USER_ID {
            return self.human_turn().await;
        }

        // Snapshot the participant and history so no lock is held across
        // the model call.
        let (participant, history) = {
            let core = self.core.read().await;
            match core.registry.get(&request.participant_id) {
                Some(participant) => (participant.clone(), core.transcript.entries().to_vec()),
                None => {
                    warn!(
                        "[{}] skipped missing participant: {}",
                        self.session_id, request.participant_id
                    );
                    return Ok(());
                }
            }
        };

        let sender = if participant.id == ORGANIZER_ID {
            "Organizer".to_string()
        } else {
            participant.role.clone()
        };

        match self
            .call_model(&participant, &history, request.prompt_override.as_deref())
            .await
        {
            Ok(content) => self.record_turn(&participant, sender, content).await,
            Err(err) => self.record_failed_turn(sender, &participant.id, err).await,
        }
    }

    /// Wrap the collaborator call in the configured timeout, if any.
    async fn call_model(
        &self,
        participant: &Participant,
        history: &[TranscriptEntry],
        prompt_override: Option<&str>,
    ) -> Result<String, ModelError> {
        let call = self.invoker.invoke(participant, history, prompt_override);
        match self.config.invocation_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(format!("no response within {:?}", limit).into()),
            },
            None => call.await,
        }
    }

    /// Append a successful turn and, for the organizer, run the
    /// parser/dispatcher over the new content.
    async fn record_turn(
        &self,
        participant: &Participant,
        sender: String,
        content: String,
    ) -> Result<(), SessionError> {
        let content: Arc<str> = content.into();
        let entry = TranscriptEntry::new(sender, Arc::clone(&content));

        let mut state_change: Option<RoundState> = None;
        let mut fatal: Option<SessionError> = None;
        {
            let mut core = self.core.write().await;
            let core = &mut *core;
            core.transcript.append(entry.clone());

            if participant.id == ORGANIZER_ID {
                let commands = self.parser.parse(&content);
                if !commands.is_empty() {
                    let topic = core.round.topic().to_string();
                    let outcome = self.dispatcher.dispatch(
                        &commands,
                        &mut core.registry,
                        &mut core.queue,
                        &topic,
                    );
                    debug!(
                        "[{}] organizer dispatched {} command(s): {} assigned, {} enqueued",
                        self.session_id,
                        commands.len(),
                        outcome.assigned,
                        outcome.enqueued
                    );
                    core.self_invocations += outcome.self_invocations;
                    if core.self_invocations > self.config.recursion_limit {
                        core.round.finish();
                        state_change = Some(core.round.clone());
                        fatal = Some(SessionError::RecursionLimitExceeded {
                            limit: self.config.recursion_limit,
                        });
                    }
                }
            }
        }

        self.emit_appended(&entry).await;
        if let Some(state) = state_change {
            warn!(
                "[{}] recursion limit hit, round aborted",
                self.session_id
            );
            self.emit_state(&state).await;
        }
        match fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Record a failed model turn as a visible marker entry and charge it
    /// against the failure budget.
    async fn record_failed_turn(
        &self,
        sender: String,
        participant_id: &str,
        err: ModelError,
    ) -> Result<(), SessionError> {
        warn!(
            "[{}] model call failed for {}: {}",
            self.session_id, participant_id, err
        );
        let entry = TranscriptEntry::failure(sender, format!("turn failed: {}", err));

        let mut state_change: Option<RoundState> = None;
        let mut fatal: Option<SessionError> = None;
        {
            let mut core = self.core.write().await;
            core.transcript.append(entry.clone());
            core.failed_turns += 1;
            if core.failed_turns > self.config.failure_budget {
                core.round.finish();
                state_change = Some(core.round.clone());
                fatal = Some(SessionError::FailureBudgetExhausted {
                    budget: self.config.failure_budget,
                });
            }
        }

        self.emit_appended(&entry).await;
        if let Some(state) = state_change {
            warn!(
                "[{}] failure budget exhausted, round aborted",
                self.session_id
            );
            self.emit_state(&state).await;
        }
        match fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// A `"user"` turn: suspend on the human-input collaborator instead of
    /// calling the model.
    async fn human_turn(&self) -> Result<(), SessionError> {
        info!("[{}] awaiting human input", self.session_id);
        match self.input.read().await {
            HumanInput::Text(text) => {
                let entry = TranscriptEntry::new("User", text);
                {
                    let mut core = self.core.write().await;
                    core.transcript.append(entry.clone());
                    // The organizer responds to the human next.
                    core.queue.push_back(InvocationRequest::new(ORGANIZER_ID));
                }
                self.emit_appended(&entry).await;
                Ok(())
            }
            HumanInput::EndOfSession => {
                info!("[{}] human ended the session", self.session_id);
                let state = {
                    let mut core = self.core.write().await;
                    if core.round.finish() {
                        Some(core.round.clone())
                    } else {
                        None
                    }
                };
                if let Some(state) = state {
                    self.emit_state(&state).await;
                }
                Ok(())
            }
        }
    }

    pub(crate) async fn emit_appended(&self, entry: &TranscriptEntry) {
        if let Some(handler) = &self.events {
            handler.on_transcript_appended(entry).await;
        }
    }

    pub(crate) async fn emit_state(&self, state: &RoundState) {
        if let Some(handler) = &self.events {
            handler.on_round_state_changed(state).await;
        }
    }
}
