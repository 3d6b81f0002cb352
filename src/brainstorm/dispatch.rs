//! Applies parsed commands to the live session state.
//!
//! The scheduler runs the dispatcher over the organizer's output only;
//! expert and human turns are never scanned for commands. Commands are
//! applied strictly in the order the parser returned them, so a block that
//! assigns an expert and then invokes it works in one turn, and enqueue
//! order always matches textual order.
//!
//! Unresolvable invokes are dropped with a diagnostic rather than failing
//! the turn; the organizer finds out from the missing contribution, and the
//! operator from the log.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{info, warn};

use crate::brainstorm::collaborators::PromptTemplateProvider;
use crate::brainstorm::command::Command;
use crate::brainstorm::participant::ParticipantRegistry;
use crate::brainstorm::scheduler::InvocationRequest;

/// What one dispatch pass did, for logging and loop accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Participants created or updated.
    pub assigned: usize,
    /// Requests appended to the queue.
    pub enqueued: usize,
    /// How many of the enqueued requests target the organizer itself.
    /// The scheduler adds these to its per-round recursion counter.
    pub self_invocations: u32,
    /// Invoke targets dropped because they resolve to nothing.
    pub skipped: Vec<String>,
}

/// Interprets [`Command`]s against the registry and the pending queue.
#[derive(Clone)]
pub struct CommandDispatcher {
    organizer_id: String,
    templates: Arc<dyn PromptTemplateProvider>,
}

impl CommandDispatcher {
    /// Create a dispatcher. `invoke(id='self')` resolves to `organizer_id`;
    /// `templates` fills in system prompts the model omitted.
    pub fn new(
        organizer_id: impl Into<String>,
        templates: Arc<dyn PromptTemplateProvider>,
    ) -> Self {
        CommandDispatcher {
            organizer_id: organizer_id.into(),
            templates,
        }
    }

    /// Apply `commands` in order. Enqueues always append to the back of the
    /// queue, preserving command order within the turn and FIFO fairness
    /// across turns.
    ///
    /// A whitespace-only `systemPrompt` on an assign counts as omitted and
    /// is replaced with the expert template for the current topic.
    pub fn dispatch(
        &self,
        commands: &[Command],
        registry: &mut ParticipantRegistry,
        queue: &mut VecDeque<InvocationRequest>,
        topic: &str,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        for command in commands {
            match command {
                Command::Assign {
                    id,
                    role,
                    focus,
                    system_prompt,
                } => {
                    let prompt = if system_prompt.trim().is_empty() {
                        self.templates.expert_prompt(role, focus, topic)
                    } else {
                        system_prompt.clone()
                    };
                    registry.assign(id.clone(), role.clone(), focus.clone(), Some(prompt), None);
                    outcome.assigned += 1;
                    info!("participant assigned: {} as {} (focus: {})", id, role, focus);
                }
                Command::Invoke { id } => {
                    let target = if id == "self" {
                        self.organizer_id.as_str()
                    } else {
                        id.as_str()
                    };
                    if target == self.organizer_id {
                        // Self-invocations bypass the resolution check and
                        // feed the recursion counter, however they were
                        // spelled.
                        queue.push_back(InvocationRequest::new(target));
                        outcome.enqueued += 1;
                        outcome.self_invocations += 1;
                    } else if registry.contains(target) {
                        queue.push_back(InvocationRequest::new(target));
                        outcome.enqueued += 1;
                    } else {
                        warn!("dropping invoke of unknown participant: {}", target);
                        outcome.skipped.push(target.to_string());
                    }
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brainstorm::command::CommandParser;
    use crate::brainstorm::participant::ORGANIZER_ID;

    struct StubTemplates;

    impl PromptTemplateProvider for StubTemplates {
        fn organizer_prompt(&self) -> String {
            "organizer prompt".to_string()
        }

        fn expert_prompt(&self, role: &str, focus: &str, topic: &str) -> String {
            format!("expert:{}:{}:{}", role, focus, topic)
        }

        fn round_summary_prompt(&self, topic: &str, round: u32) -> String {
            format!("summary:{}:{}", topic, round)
        }
    }

    fn dispatcher() -> CommandDispatcher {
        CommandDispatcher::new(ORGANIZER_ID, Arc::new(StubTemplates))
    }

    fn registry() -> ParticipantRegistry {
        ParticipantRegistry::new("default prompt")
    }

    #[test]
    fn assign_then_invoke_in_one_block() {
        let mut registry = registry();
        let mut queue = VecDeque::new();
        queue.push_back(InvocationRequest::new("earlier"));

        let commands = CommandParser::new(ORGANIZER_ID).parse(
            "assign(id='tech', role='Tech', focus='Feasibility', systemPrompt='You are Tech') \
             invoke(id='tech')",
        );
        let outcome = dispatcher().dispatch(&commands, &mut registry, &mut queue, "topic");

        assert!(registry.contains("tech"));
        assert_eq!(outcome.assigned, 1);
        assert_eq!(outcome.enqueued, 1);
        // The new request lands after the pre-existing one.
        let ids: Vec<&str> = queue.iter().map(|r| r.participant_id.as_str()).collect();
        assert_eq!(ids, vec!["earlier", "tech"]);
    }

    #[test]
    fn enqueue_order_matches_command_order() {
        let mut registry = registry();
        registry.assign("a", "A", "a", None, None);
        registry.assign("b", "B", "b", None, None);
        let mut queue = VecDeque::new();

        let commands = vec![
            Command::Invoke { id: "b".into() },
            Command::Invoke { id: "self".into() },
            Command::Invoke { id: "a".into() },
        ];
        dispatcher().dispatch(&commands, &mut registry, &mut queue, "topic");

        let ids: Vec<&str> = queue.iter().map(|r| r.participant_id.as_str()).collect();
        assert_eq!(ids, vec!["b", ORGANIZER_ID, "a"]);
    }

    #[test]
    fn blank_system_prompt_is_synthesized_from_template() {
        let mut registry = registry();
        let mut queue = VecDeque::new();

        let commands = vec![Command::Assign {
            id: "ux".into(),
            role: "UX".into(),
            focus: "Onboarding".into(),
            system_prompt: "   ".into(),
        }];
        dispatcher().dispatch(&commands, &mut registry, &mut queue, "retention");

        assert_eq!(
            registry.get("ux").unwrap().system_prompt,
            "expert:UX:Onboarding:retention"
        );
    }

    #[test]
    fn supplied_system_prompt_is_kept_verbatim() {
        let mut registry = registry();
        let mut queue = VecDeque::new();

        let commands = vec![Command::Assign {
            id: "ux".into(),
            role: "UX".into(),
            focus: "Onboarding".into(),
            system_prompt: " You are UX ".into(),
        }];
        dispatcher().dispatch(&commands, &mut registry, &mut queue, "retention");

        assert_eq!(registry.get("ux").unwrap().system_prompt, " You are UX ");
    }

    #[test]
    fn self_and_explicit_organizer_both_count_as_self_invocations() {
        let mut registry = registry();
        let mut queue = VecDeque::new();

        let commands = vec![
            Command::Invoke { id: "self".into() },
            Command::Invoke {
                id: ORGANIZER_ID.into(),
            },
        ];
        let outcome = dispatcher().dispatch(&commands, &mut registry, &mut queue, "topic");

        assert_eq!(outcome.self_invocations, 2);
        assert_eq!(queue.len(), 2);
        assert!(queue.iter().all(|r| r.participant_id == ORGANIZER_ID));
    }

    #[test]
    fn unknown_invoke_is_dropped_with_diagnostic() {
        let mut registry = registry();
        let mut queue = VecDeque::new();

        let commands = vec![Command::Invoke { id: "ghost".into() }];
        let outcome = dispatcher().dispatch(&commands, &mut registry, &mut queue, "topic");

        assert!(queue.is_empty());
        assert_eq!(outcome.enqueued, 0);
        assert_eq!(outcome.skipped, vec!["ghost".to_string()]);
    }

    #[test]
    fn reassign_updates_in_place() {
        let mut registry = registry();
        let mut queue = VecDeque::new();

        let first = vec![Command::Assign {
            id: "tech".into(),
            role: "Tech".into(),
            focus: "Feasibility".into(),
            system_prompt: "You are Tech".into(),
        }];
        let second = vec![Command::Assign {
            id: "tech".into(),
            role: "Tech Lead".into(),
            focus: "Delivery".into(),
            system_prompt: "".into(),
        }];
        let d = dispatcher();
        d.dispatch(&first, &mut registry, &mut queue, "topic");
        d.dispatch(&second, &mut registry, &mut queue, "topic");

        let tech = registry.get("tech").unwrap();
        assert_eq!(tech.role, "Tech Lead");
        // Blank prompt on the update is synthesized, not inherited.
        assert_eq!(tech.system_prompt, "expert:Tech Lead:Delivery:topic");
        assert_eq!(registry.len(), 1);
    }
}
