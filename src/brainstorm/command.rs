//! Tolerant command extraction from free-form model output.
//!
//! The organizer steers the session by embedding two command shapes in its
//! ordinary prose:
//!
//! * `assign(id='…', role='…', focus='…', systemPrompt='…')`: create or
//!   update an expert participant. All four arguments are required; a
//!   partial call is simply ignored.
//! * `invoke(id='…')`: queue a participant for the next turn.
//!
//! The grammar is a pattern match, not a strict parser: commands may appear
//! anywhere in a block, surrounded by arbitrary text, repeated, and mixed.
//! Malformed near-matches are dropped without a diagnostic. That tolerance
//! is deliberate; models routinely garble one call while getting the next
//! one right, and a strict parser would reject the whole block.
//!
//! Matches from both shapes are merged into a single sequence ordered by
//! textual position, because command order determines enqueue order.
//!
//! When the primary grammar finds nothing, a secondary pass looks for prose
//! descriptions of the two most common intents: a case-insensitive
//! "invoke the user" becomes `invoke(id='user')` and "invoke self" becomes
//! an invocation of the organizer itself. At most one implicit command is
//! produced, with the user form taking precedence.
//!
//! # Example
//!
//! ```rust
//! use brainstorm::{Command, CommandParser};
//!
//! let parser = CommandParser::new("organizer");
//! let commands = parser.parse(
//!     "Let me bring in an expert. \
//!      assign(id='tech', role='Tech Expert', focus='Feasibility', systemPrompt='You are the tech expert.') \
//!      Now invoke(id='tech') to hear their take.",
//! );
//!
//! assert_eq!(commands.len(), 2);
//! assert!(matches!(&commands[1], Command::Invoke { id } if id == "tech"));
//! ```

use lazy_static::lazy_static;
use regex::Regex;

use crate::brainstorm::participant::USER_ID;

lazy_static! {
    static ref ASSIGN_RE: Regex = Regex::new(
        r"assign\s*\(\s*id\s*=\s*'([^']+)'\s*,\s*role\s*=\s*'([^']+)'\s*,\s*focus\s*=\s*'([^']+)'\s*,\s*systemPrompt\s*=\s*'([^']+)'\s*\)",
    )
    .expect("assign pattern compiles");
    static ref INVOKE_RE: Regex =
        Regex::new(r"invoke\s*\(\s*id\s*=\s*'([^']+)'\s*\)").expect("invoke pattern compiles");
}

/// A structured directive extracted from a participant's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create or update a participant.
    Assign {
        id: String,
        role: String,
        focus: String,
        /// Verbatim prompt text, whitespace preserved. A whitespace-only
        /// value counts as omitted downstream and is replaced by a
        /// synthesized expert prompt.
        system_prompt: String,
    },
    /// Queue a participant for a turn. `"self"` resolves to the organizer
    /// at dispatch time.
    Invoke { id: String },
}

/// Extracts [`Command`] sequences from free text.
#[derive(Debug, Clone)]
pub struct CommandParser {
    organizer_id: String,
}

impl CommandParser {
    /// Create a parser whose implicit self-invocations resolve to
    /// `organizer_id`.
    pub fn new(organizer_id: impl Into<String>) -> Self {
        CommandParser {
            organizer_id: organizer_id.into(),
        }
    }

    /// Extract all well-formed commands in left-to-right textual order.
    ///
    /// Pure function of the input text: parsing the same block twice yields
    /// the same sequence. Falls back to the prose pass only when the
    /// primary grammar matches nothing.
    pub fn parse(&self, text: &str) -> Vec<Command> {
        let mut found: Vec<(usize, Command)> = Vec::new();

        for caps in ASSIGN_RE.captures_iter(text) {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
            found.push((
                start,
                Command::Assign {
                    id: caps[1].to_string(),
                    role: caps[2].to_string(),
                    focus: caps[3].to_string(),
                    system_prompt: caps[4].to_string(),
                },
            ));
        }
        for caps in INVOKE_RE.captures_iter(text) {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
            found.push((
                start,
                Command::Invoke {
                    id: caps[1].to_string(),
                },
            ));
        }

        if found.is_empty() {
            return self.prose_fallback(text);
        }

        found.sort_by_key(|(start, _)| *start);
        found.into_iter().map(|(_, command)| command).collect()
    }

    /// Secondary pass for models that describe an action in prose instead
    /// of emitting the grammar. Produces at most one implicit command.
    fn prose_fallback(&self, text: &str) -> Vec<Command> {
        let lowered = text.to_lowercase();
        if lowered.contains("invoke the user") {
            vec![Command::Invoke {
                id: USER_ID.to_string(),
            }]
        } else if lowered.contains("invoke self") {
            vec![Command::Invoke {
                id: self.organizer_id.clone(),
            }]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CommandParser {
        CommandParser::new("organizer")
    }

    #[test]
    fn parses_full_assign() {
        let commands = parser().parse(
            "assign(id='tech', role='Tech Expert', focus='Feasibility', systemPrompt='You are Tech')",
        );
        assert_eq!(
            commands,
            vec![Command::Assign {
                id: "tech".into(),
                role: "Tech Expert".into(),
                focus: "Feasibility".into(),
                system_prompt: "You are Tech".into(),
            }]
        );
    }

    #[test]
    fn parses_invoke() {
        let commands = parser().parse("Time to hear from them: invoke(id='tech').");
        assert_eq!(commands, vec![Command::Invoke { id: "tech".into() }]);
    }

    #[test]
    fn partial_assign_is_silently_ignored() {
        // Missing systemPrompt: not a command, not an error.
        let commands = parser().parse("assign(id='tech', role='Tech', focus='Feasibility')");
        assert!(commands.is_empty());
    }

    #[test]
    fn empty_argument_is_not_matched() {
        let commands =
            parser().parse("assign(id='', role='Tech', focus='F', systemPrompt='p')");
        assert!(commands.is_empty());
    }

    #[test]
    fn commands_need_not_be_on_their_own_line() {
        let commands = parser().parse(
            "I think we should invoke(id='ux') here, and later invoke(id='biz') as well.",
        );
        assert_eq!(
            commands,
            vec![
                Command::Invoke { id: "ux".into() },
                Command::Invoke { id: "biz".into() },
            ]
        );
    }

    #[test]
    fn mixed_commands_keep_textual_order() {
        let text = "invoke(id='first') then \
                    assign(id='mid', role='R', focus='F', systemPrompt='P') and finally \
                    invoke(id='last')";
        let commands = parser().parse(text);
        assert_eq!(commands.len(), 3);
        assert!(matches!(&commands[0], Command::Invoke { id } if id == "first"));
        assert!(matches!(&commands[1], Command::Assign { id, .. } if id == "mid"));
        assert!(matches!(&commands[2], Command::Invoke { id } if id == "last"));
    }

    #[test]
    fn repeated_ids_are_all_returned() {
        let commands = parser().parse("invoke(id='tech') invoke(id='tech')");
        assert_eq!(commands.len(), 2);
    }

    #[test]
    fn whitespace_inside_quotes_is_verbatim() {
        let commands = parser().parse(
            "assign(id='tech', role=' Tech Expert ', focus='Feasibility  review', systemPrompt=' You are Tech ')",
        );
        match &commands[0] {
            Command::Assign {
                role,
                focus,
                system_prompt,
                ..
            } => {
                assert_eq!(role, " Tech Expert ");
                assert_eq!(focus, "Feasibility  review");
                assert_eq!(system_prompt, " You are Tech ");
            }
            other => panic!("expected assign, got {:?}", other),
        }
    }

    #[test]
    fn whitespace_around_punctuation_is_tolerated() {
        let commands = parser().parse(
            "assign ( id = 'tech' , role = 'Tech' , focus = 'F' , systemPrompt = 'P' ) invoke ( id = 'tech' )",
        );
        assert_eq!(commands.len(), 2);
    }

    #[test]
    fn fallback_invokes_user_from_prose() {
        let commands = parser().parse("I'd like to Invoke The User for their opinion now.");
        assert_eq!(commands, vec![Command::Invoke { id: "user".into() }]);
    }

    #[test]
    fn fallback_invokes_organizer_from_prose() {
        let commands = parser().parse("Next I will invoke self to plan the following round.");
        assert_eq!(
            commands,
            vec![Command::Invoke {
                id: "organizer".into(),
            }]
        );
    }

    #[test]
    fn fallback_user_wins_when_both_mentioned() {
        let commands = parser().parse("I could invoke self, but better to invoke the user.");
        assert_eq!(commands, vec![Command::Invoke { id: "user".into() }]);
    }

    #[test]
    fn fallback_suppressed_by_any_structured_match() {
        let commands = parser().parse("Let me invoke the user later; first invoke(id='tech').");
        assert_eq!(commands, vec![Command::Invoke { id: "tech".into() }]);
    }

    #[test]
    fn no_commands_in_plain_prose() {
        assert!(parser().parse("Great ideas all around, let us continue.").is_empty());
        assert!(parser().parse("").is_empty());
    }

    #[test]
    fn parse_is_idempotent() {
        let text = "assign(id='a', role='R', focus='F', systemPrompt='P') invoke(id='a') \
                    invoke(id='b')";
        let p = parser();
        assert_eq!(p.parse(text), p.parse(text));
    }
}
