// Integration tests for the session lifecycle: rounds, summaries, events,
// evaluation, and collaborator swapping.
use std::sync::Arc;

use async_trait::async_trait;
use brainstorm::{
    BrainstormSession, EventHandler, HumanInput, HumanInputSource, ModelError, ModelInvoker,
    Participant, PromptTemplateProvider, RoundState, RoundStatus, TranscriptEntry, ORGANIZER_ID,
};
use tokio::sync::Mutex;

// Organizer replies come from a script; experts improvise a one-liner.
struct OrganizerScript {
    replies: Mutex<Vec<String>>,
}

impl OrganizerScript {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(OrganizerScript {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
        })
    }
}

#[async_trait]
impl ModelInvoker for OrganizerScript {
    async fn invoke(
        &self,
        participant: &Participant,
        _history: &[TranscriptEntry],
        _prompt_override: Option<&str>,
    ) -> Result<String, ModelError> {
        if participant.id == ORGANIZER_ID {
            let mut replies = self.replies.lock().await;
            if replies.is_empty() {
                Ok("Nothing further from me.".to_string())
            } else {
                Ok(replies.remove(0))
            }
        } else {
            Ok(format!("{} contributes an idea.", participant.role))
        }
    }
}

#[derive(Default)]
struct RecordingHandler {
    appended: Mutex<Vec<String>>,
    states: Mutex<Vec<RoundStatus>>,
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn on_transcript_appended(&self, entry: &TranscriptEntry) {
        self.appended.lock().await.push(entry.sender.clone());
    }

    async fn on_round_state_changed(&self, state: &RoundState) {
        self.states.lock().await.push(state.status());
    }
}

#[tokio::test]
async fn test_session_id_defaults_to_uuid_form() {
    let session = BrainstormSession::new(OrganizerScript::new(&[]));
    assert!(session.id().starts_with("session-"));
    assert!(session.id().len() > "session-".len());

    let named = BrainstormSession::new(OrganizerScript::new(&[])).with_id("my-session");
    assert_eq!(named.id(), "my-session");
}

#[tokio::test]
async fn test_events_fire_on_appends_and_real_transitions_only() {
    let handler = Arc::new(RecordingHandler::default());
    let session = BrainstormSession::new(OrganizerScript::new(&["Hello everyone."]))
        .with_event_handler(Arc::clone(&handler) as Arc<dyn EventHandler>);

    session.start_round("events").await.unwrap();
    session.pause().await;
    session.resume().await.unwrap();
    session.end_session().await;
    // Already finished: an invalid transition must not notify.
    session.pause().await;
    session.end_session().await;

    assert_eq!(*handler.appended.lock().await, vec!["Organizer".to_string()]);
    assert_eq!(
        *handler.states.lock().await,
        vec![
            RoundStatus::Discussing,
            RoundStatus::Paused,
            RoundStatus::Discussing,
            RoundStatus::Finished,
        ]
    );
}

#[tokio::test]
async fn test_finish_round_advances_and_reopens_with_organizer() {
    let session = BrainstormSession::new(OrganizerScript::new(&[
        "Round one opening.",
        "Round two opening.",
    ]));

    session.start_round("multi round").await.unwrap();
    assert_eq!(session.round_state().await.round(), 1);
    assert_eq!(session.transcript().await.len(), 1);

    session.finish_round().await.unwrap();

    let state = session.round_state().await;
    assert_eq!(state.round(), 2);
    assert_eq!(state.status(), RoundStatus::Discussing);
    // Full history keeps both rounds; the round window holds only the new
    // opening turn.
    assert_eq!(session.transcript().await.len(), 2);
    let window = session.round_transcript().await;
    assert_eq!(window.len(), 1);
    assert_eq!(&*window[0].content, "Round two opening.");
}

#[tokio::test]
async fn test_summarize_round_takes_override_and_finishes() {
    struct CapturingClient {
        replies: Mutex<Vec<String>>,
        last_override: Mutex<Option<String>>,
    }

    #[async_trait]
    impl ModelInvoker for CapturingClient {
        async fn invoke(
            &self,
            _participant: &Participant,
            _history: &[TranscriptEntry],
            prompt_override: Option<&str>,
        ) -> Result<String, ModelError> {
            if let Some(prompt) = prompt_override {
                *self.last_override.lock().await = Some(prompt.to_string());
            }
            let mut replies = self.replies.lock().await;
            Ok(if replies.is_empty() {
                "Nothing further.".to_string()
            } else {
                replies.remove(0)
            })
        }
    }

    let client = Arc::new(CapturingClient {
        replies: Mutex::new(vec![
            "Opening remarks.".to_string(),
            "SUMMARY: build the cache first.".to_string(),
        ]),
        last_override: Mutex::new(None),
    });
    let handler = Arc::new(RecordingHandler::default());
    let session = BrainstormSession::new(Arc::clone(&client) as Arc<dyn ModelInvoker>)
        .with_event_handler(Arc::clone(&handler) as Arc<dyn EventHandler>);

    session.start_round("edge caching").await.unwrap();
    session.summarize_round().await.unwrap();

    let transcript = session.transcript().await;
    assert_eq!(transcript.len(), 2);
    assert!(transcript[1].content.contains("SUMMARY"));
    assert_eq!(session.round_state().await.status(), RoundStatus::Finished);

    let captured = client.last_override.lock().await.clone().unwrap();
    assert!(captured.contains("Round 1"));
    assert!(captured.contains("edge caching"));

    assert_eq!(
        *handler.states.lock().await,
        vec![
            RoundStatus::Discussing,
            RoundStatus::Summarizing,
            RoundStatus::Finished,
        ]
    );
}

#[tokio::test]
async fn test_summarize_round_requires_a_live_discussion() {
    let session = BrainstormSession::new(OrganizerScript::new(&["Opening."]));

    // Before any round: nothing to summarize.
    session.summarize_round().await.unwrap();
    assert_eq!(session.round_state().await.status(), RoundStatus::Setup);

    session.start_round("topic").await.unwrap();
    session.end_session().await;
    session.summarize_round().await.unwrap();
    assert_eq!(session.round_state().await.status(), RoundStatus::Finished);
    assert_eq!(session.transcript().await.len(), 1);
}

#[tokio::test]
async fn test_evaluate_round_scores_experts_by_engagement() {
    let session = BrainstormSession::new(OrganizerScript::new(&[
        "assign(id='alpha', role='Alpha Expert', focus='f', systemPrompt='p') \
         assign(id='beta', role='Beta Expert', focus='f', systemPrompt='p') \
         assign(id='gamma', role='Gamma Expert', focus='f', systemPrompt='p') \
         invoke(id='alpha') invoke(id='alpha') invoke(id='alpha') invoke(id='beta')",
    ]));

    session.start_round("scoring").await.unwrap();
    let evaluations = session.evaluate_round().await;

    // Experts only, in roster order; the organizer and the human are never
    // scored.
    assert_eq!(evaluations.len(), 3);
    assert_eq!(evaluations[0].participant_id, "alpha");
    assert_eq!(evaluations[0].record.score, 6);
    assert!(evaluations[0].record.feedback.contains("solid"));
    assert_eq!(evaluations[1].participant_id, "beta");
    assert_eq!(evaluations[1].record.score, 2);
    assert_eq!(evaluations[2].participant_id, "gamma");
    // Zero contributions still floor at one.
    assert_eq!(evaluations[2].record.score, 1);

    let participants = session.participants().await;
    let alpha = participants.iter().find(|p| p.id == "alpha").unwrap();
    assert_eq!(alpha.performance.len(), 1);
    assert_eq!(alpha.performance[0].round, 1);
    assert_eq!(alpha.performance[0].score, 6);
}

#[tokio::test]
async fn test_session_restarts_after_finish() {
    let session = BrainstormSession::new(OrganizerScript::new(&["First life.", "Second life."]));

    session.start_round("one").await.unwrap();
    session.end_session().await;
    assert_eq!(session.round_state().await.status(), RoundStatus::Finished);

    session.start_round("two").await.unwrap();

    let state = session.round_state().await;
    assert_eq!(state.status(), RoundStatus::Discussing);
    assert_eq!(state.round(), 1);
    assert_eq!(state.topic(), "two");
    // History spans both lives; the window covers only the second.
    assert_eq!(session.transcript().await.len(), 2);
    assert_eq!(session.round_transcript().await.len(), 1);
}

#[tokio::test]
async fn test_custom_input_source_replaces_the_channel() {
    struct AlwaysExit;

    #[async_trait]
    impl HumanInputSource for AlwaysExit {
        async fn read(&self) -> HumanInput {
            HumanInput::EndOfSession
        }
    }

    let session = BrainstormSession::new(OrganizerScript::new(&["invoke(id='user')"]))
        .with_input_source(Arc::new(AlwaysExit));

    // With a custom source installed this is a warning no-op.
    session.submit_human_input("goes nowhere");

    session.start_round("topic").await.unwrap();
    assert_eq!(session.round_state().await.status(), RoundStatus::Finished);
    assert_eq!(session.transcript().await.len(), 1);
}

#[tokio::test]
async fn test_custom_templates_drive_prompt_synthesis() {
    struct FixedTemplates;

    impl PromptTemplateProvider for FixedTemplates {
        fn organizer_prompt(&self) -> String {
            "ORG PROMPT".to_string()
        }

        fn expert_prompt(&self, role: &str, focus: &str, topic: &str) -> String {
            format!("CUSTOM {} {} {}", role, focus, topic)
        }

        fn round_summary_prompt(&self, topic: &str, round: u32) -> String {
            format!("CUSTOM SUMMARY {} {}", topic, round)
        }
    }

    // Whitespace-only systemPrompt counts as omitted and is synthesized
    // from the installed provider.
    let session = BrainstormSession::new(OrganizerScript::new(&[
        "assign(id='alpha', role='Alpha Expert', focus='Ideation', systemPrompt=' ')",
    ]))
    .with_prompt_templates(Arc::new(FixedTemplates));

    session.start_round("caching").await.unwrap();

    let participants = session.participants().await;
    assert_eq!(participants[0].system_prompt, "ORG PROMPT");
    let alpha = participants.iter().find(|p| p.id == "alpha").unwrap();
    assert_eq!(alpha.system_prompt, "CUSTOM Alpha Expert Ideation caching");
}
