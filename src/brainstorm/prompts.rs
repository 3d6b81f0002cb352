//! Built-in prompt templates.
//!
//! [`DefaultPromptLibrary`] is the stock
//! [`PromptTemplateProvider`](crate::PromptTemplateProvider): a keyed map of
//! templates with `{role}`, `{focus}`, `{topic}` and `{round}` placeholders,
//! preloaded with an organizer prompt that documents the command grammar, a
//! generic expert template, three specialized expert templates picked by
//! role keyword, and a round-summary prompt. Individual templates can be
//! replaced with [`set_template`](DefaultPromptLibrary::set_template)
//! without reimplementing the trait.

use std::collections::HashMap;

use crate::brainstorm::collaborators::PromptTemplateProvider;

const ORGANIZER_KEY: &str = "organizer.system";
const EXPERT_KEY: &str = "expert.template";
const EXPERT_TECH_KEY: &str = "expert.tech";
const EXPERT_BUSINESS_KEY: &str = "expert.business";
const EXPERT_UX_KEY: &str = "expert.ux";
const SUMMARY_KEY: &str = "round.summary";

const ORGANIZER_TEMPLATE: &str = "\
You are the organizer of a brainstorming session with dynamically created expert participants.

Ground rules:
1. Steer the whole discussion and keep it focused and productive.
2. Create and call experts exclusively through the commands below.
3. Follow the execution flow step by step; do not skip ahead.
4. Stay neutral when summarizing or weighing contributions.

Commands (emit them inline in your reply, single quotes required):
- assign(id='<id>', role='<role>', focus='<focus>', systemPrompt='<prompt>'): create or update an expert participant.
- invoke(id='<id>'): give a participant the next turn. id='user' hands control to the human, id='self' schedules yourself again.

Execution flow:
1. Introduce yourself and the purpose of the session.
2. invoke(id='user') to collect the topic and requirements.
3. invoke(id='self') to give yourself a planning turn.
4. In the planning turn, assign three to five experts whose roles fit the topic, then invoke them in speaking order.
5. After the experts have spoken, invoke(id='self') to weigh the round.
6. Open the next round with a short guiding statement, then invoke(id='user') for feedback before planning again.

Keep the expert roster small and relevant; when you summarize, extract key points, innovation potential and feasibility.";

const EXPERT_TEMPLATE: &str = "\
You are a {role} concentrating on {focus}, taking part in an organizer-led brainstorming session on the topic \"{topic}\".
Contribute professional, specific viewpoints that move the discussion forward:
1. Analyze the problem from your own discipline.
2. Offer concrete, preferably novel proposals.
3. Build on, or respectfully challenge, what other participants said.
4. Name the risks and opportunities you can see.
Keep contributions concise, briefly explain any jargon, avoid repeating earlier points, and say so plainly when something falls outside your expertise.";

const EXPERT_TECH_TEMPLATE: &str = "\
You are a technology expert in a brainstorming session on \"{topic}\". You know the maturity, limits and typical pitfalls of current technology. Weigh in with feasibility analysis, implementation complexity, technical risks, and concrete technical alternatives.";

const EXPERT_BUSINESS_TEMPLATE: &str = "\
You are a business strategy expert in a brainstorming session on \"{topic}\". You turn raw ideas into viable business shapes. Weigh in with market potential, commercial risks, paths to revenue, and which ideas deserve investment first.";

const EXPERT_UX_TEMPLATE: &str = "\
You are a user experience expert in a brainstorming session on \"{topic}\". You judge ideas from the user's side. Weigh in with the user pain points each idea touches, likely adoption hurdles, and how the experience could be made simpler.";

const SUMMARY_TEMPLATE: &str = "\
Round {round} of the brainstorming session on \"{topic}\" is wrapping up. Write a closing summary: group the strongest ideas, note the feasibility concerns that were raised, and name the most promising directions to explore next. Do not emit any commands.";

/// Stock prompt templates with placeholder substitution.
///
/// # Example
///
/// ```rust
/// use brainstorm::{DefaultPromptLibrary, PromptTemplateProvider};
///
/// let library = DefaultPromptLibrary::new();
/// let prompt = library.expert_prompt("Economist", "pricing models", "a new SaaS product");
/// assert!(prompt.contains("Economist"));
/// assert!(prompt.contains("a new SaaS product"));
/// ```
#[derive(Debug, Clone)]
pub struct DefaultPromptLibrary {
    templates: HashMap<String, String>,
}

impl DefaultPromptLibrary {
    /// Create a library preloaded with the built-in templates.
    pub fn new() -> Self {
        let mut templates = HashMap::new();
        templates.insert(ORGANIZER_KEY.to_string(), ORGANIZER_TEMPLATE.to_string());
        templates.insert(EXPERT_KEY.to_string(), EXPERT_TEMPLATE.to_string());
        templates.insert(EXPERT_TECH_KEY.to_string(), EXPERT_TECH_TEMPLATE.to_string());
        templates.insert(
            EXPERT_BUSINESS_KEY.to_string(),
            EXPERT_BUSINESS_TEMPLATE.to_string(),
        );
        templates.insert(EXPERT_UX_KEY.to_string(), EXPERT_UX_TEMPLATE.to_string());
        templates.insert(SUMMARY_KEY.to_string(), SUMMARY_TEMPLATE.to_string());
        DefaultPromptLibrary { templates }
    }

    /// Look up a raw template by key.
    pub fn template(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    /// Replace or add a template. Placeholders of the replaced template
    /// apply unchanged.
    pub fn set_template(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(key.into(), template.into());
    }

    fn get(&self, key: &str, fallback: &str) -> String {
        self.templates
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Template key of the specialized expert prompt fitting `role` and
    /// `focus`, if any.
    fn specialized_key(role: &str, focus: &str) -> Option<&'static str> {
        let haystack = format!("{} {}", role, focus).to_lowercase();
        if haystack.contains("tech") || haystack.contains("engineer") {
            Some(EXPERT_TECH_KEY)
        } else if haystack.contains("business")
            || haystack.contains("market")
            || haystack.contains("strateg")
        {
            Some(EXPERT_BUSINESS_KEY)
        } else if haystack.contains("ux")
            || haystack.contains("user experience")
            || haystack.contains("design")
        {
            Some(EXPERT_UX_KEY)
        } else {
            None
        }
    }
}

impl Default for DefaultPromptLibrary {
    fn default() -> Self {
        DefaultPromptLibrary::new()
    }
}

impl PromptTemplateProvider for DefaultPromptLibrary {
    fn organizer_prompt(&self) -> String {
        self.get(ORGANIZER_KEY, ORGANIZER_TEMPLATE)
    }

    fn expert_prompt(&self, role: &str, focus: &str, topic: &str) -> String {
        match Self::specialized_key(role, focus) {
            Some(key) => self.get(key, EXPERT_TEMPLATE).replace("{topic}", topic),
            None => self
                .get(EXPERT_KEY, EXPERT_TEMPLATE)
                .replace("{role}", role)
                .replace("{focus}", focus)
                .replace("{topic}", topic),
        }
    }

    fn round_summary_prompt(&self, topic: &str, round: u32) -> String {
        self.get(SUMMARY_KEY, SUMMARY_TEMPLATE)
            .replace("{topic}", topic)
            .replace("{round}", &round.to_string())
    }
}
