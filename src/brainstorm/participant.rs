//! Participant roster for a brainstorming session.
//!
//! A [`Participant`] is anything capable of taking a turn: the organizer,
//! a dynamically assigned expert, or the human behind [`USER_ID`]. The
//! [`ParticipantRegistry`] keys participants by stable id and updates them
//! field-by-field, so a repeated `assign` with the same id refines the
//! participant without erasing the fields it did not mention.
//!
//! Participants are never removed while a round is running; the registry
//! only grows or updates in place.
//!
//! # Example
//!
//! ```rust
//! use brainstorm::ParticipantRegistry;
//!
//! let mut registry = ParticipantRegistry::new("You are a helpful expert.");
//!
//! registry.assign("tech", "Tech Expert", "Feasibility", None, None);
//! registry.assign("tech", "Tech Lead", "Architecture", None, None);
//!
//! let tech = registry.get("tech").unwrap();
//! assert_eq!(tech.role, "Tech Lead");
//! // The omitted system prompt fell back to the registry default and survived
//! // the second assign untouched.
//! assert_eq!(tech.system_prompt, "You are a helpful expert.");
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved id of the organizer participant. The organizer's output is the
/// only output scanned for commands, and `invoke(id='self')` resolves to
/// this id.
pub const ORGANIZER_ID: &str = "organizer";

/// Reserved id of the human participant. Invoking it suspends the drain
/// loop until human input arrives instead of calling the model.
pub const USER_ID: &str = "user";

/// Outcome of one round evaluation for a participant.
///
/// Appended by [`BrainstormSession::evaluate_round`](crate::BrainstormSession::evaluate_round)
/// and deliberately never touched by [`ParticipantRegistry::assign`], so the
/// history survives re-assignment of the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Round the evaluation belongs to.
    pub round: u32,
    /// Contribution score in `1..=10`.
    pub score: u8,
    /// Human-readable tier feedback.
    pub feedback: String,
}

/// One entity capable of producing a turn: organizer, expert, or human.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Unique, stable identifier.
    pub id: String,
    /// Display role, e.g. `"Tech Expert"`. Used as the transcript sender
    /// name for non-organizer participants.
    pub role: String,
    /// What this participant concentrates on within the topic.
    pub focus: String,
    /// System prompt handed to the model collaborator on each invocation.
    pub system_prompt: String,
    /// Opaque per-participant model settings (model name, temperature,
    /// token caps). Values are heterogeneous, hence `serde_json::Value`.
    pub model_config: Option<HashMap<String, Value>>,
    /// Accumulated round evaluations, oldest first.
    pub performance: Vec<PerformanceRecord>,
}

impl Participant {
    /// Create a participant with an empty system prompt and no model config.
    pub fn new(id: impl Into<String>, role: impl Into<String>, focus: impl Into<String>) -> Self {
        Participant {
            id: id.into(),
            role: role.into(),
            focus: focus.into(),
            system_prompt: String::new(),
            model_config: None,
            performance: Vec::new(),
        }
    }

    /// Set the system prompt, consuming and returning `self` for chaining.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Attach model settings, consuming and returning `self` for chaining.
    pub fn with_model_config(mut self, config: HashMap<String, Value>) -> Self {
        self.model_config = Some(config);
        self
    }

    /// Whether this participant is the organizer.
    pub fn is_organizer(&self) -> bool {
        self.id == ORGANIZER_ID
    }

    /// Whether this participant is the human.
    pub fn is_user(&self) -> bool {
        self.id == USER_ID
    }
}

/// Insertion-ordered roster of participants keyed by id.
///
/// The map provides lookups, the companion order vector preserves the
/// sequence participants first appeared in for [`all`](Self::all).
#[derive(Debug, Clone)]
pub struct ParticipantRegistry {
    participants: HashMap<String, Participant>,
    order: Vec<String>,
    default_system_prompt: String,
}

impl ParticipantRegistry {
    /// Create an empty registry. `default_system_prompt` is used when a new
    /// participant is assigned without an explicit prompt.
    pub fn new(default_system_prompt: impl Into<String>) -> Self {
        ParticipantRegistry {
            participants: HashMap::new(),
            order: Vec::new(),
            default_system_prompt: default_system_prompt.into(),
        }
    }

    /// Create or update a participant, field-by-field.
    ///
    /// Unknown id: a new [`Participant`] is created, with the registry
    /// default standing in for an omitted system prompt. Known id: `role`
    /// and `focus` are always replaced; `system_prompt` and `model_config`
    /// only when supplied; the performance history is carried over verbatim.
    ///
    /// Returns a copy of the stored entry. Idempotent for identical inputs.
    pub fn assign(
        &mut self,
        id: impl Into<String>,
        role: impl Into<String>,
        focus: impl Into<String>,
        system_prompt: Option<String>,
        model_config: Option<HashMap<String, Value>>,
    ) -> Participant {
        let id = id.into();
        let updated = match self.participants.get(&id) {
            Some(existing) => Participant {
                id: id.clone(),
                role: role.into(),
                focus: focus.into(),
                system_prompt: system_prompt.unwrap_or_else(|| existing.system_prompt.clone()),
                model_config: model_config.or_else(|| existing.model_config.clone()),
                performance: existing.performance.clone(),
            },
            None => {
                self.order.push(id.clone());
                Participant {
                    id: id.clone(),
                    role: role.into(),
                    focus: focus.into(),
                    system_prompt: system_prompt
                        .unwrap_or_else(|| self.default_system_prompt.clone()),
                    model_config,
                    performance: Vec::new(),
                }
            }
        };
        self.participants.insert(id, updated.clone());
        updated
    }

    /// Look up a participant by id. Absence is an expected, recoverable
    /// condition; callers decide how to proceed.
    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Whether `id` resolves to a registered participant.
    pub fn contains(&self, id: &str) -> bool {
        self.participants.contains_key(id)
    }

    /// All participants in insertion order. Intended for display and
    /// debugging; this is not the invocation order.
    pub fn all(&self) -> Vec<&Participant> {
        self.order
            .iter()
            .filter_map(|id| self.participants.get(id))
            .collect()
    }

    /// Number of registered participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Append a round evaluation to a participant's history. Returns `false`
    /// when the id is unknown.
    pub fn record_performance(&mut self, id: &str, record: PerformanceRecord) -> bool {
        match self.participants.get_mut(id) {
            Some(participant) => {
                participant.performance.push(record);
                true
            }
            None => false,
        }
    }
}
