//! Context assembly: stored interactions → ordered prompt messages.

use crate::emotion::FusionOutcome;
use crate::llm::message::Message;
use crate::store::Interaction;

/// Persona preamble of the system instruction. The tone directive is
/// appended as the final rule.
const PERSONA: &str = "You are a warm, emotionally intelligent assistant. \
Your personality is friendly, calm, and adaptive. \
Respond naturally like a trusted friend.";

const RULES: [&str; 3] = [
    "Be empathetic but not clinical",
    "Keep responses concise and human",
    "Never repeat the user's exact words",
];

/// Build the system instruction with `tone_directive` as the last rule.
pub fn build_system_instruction(tone_directive: &str) -> String {
    let mut out = String::from(PERSONA);
    out.push_str("\n\nRules:");
    for rule in RULES.iter().copied().chain(std::iter::once(tone_directive)) {
        out.push_str("\n- ");
        out.push_str(rule);
    }
    out
}

/// How much stored history is replayed into the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryWindow {
    /// Replay every stored interaction.
    #[default]
    Unbounded,
    /// Replay only the most recent `n` interactions.
    MostRecent(usize),
}

impl HistoryWindow {
    /// `0` means unbounded.
    pub fn from_max_interactions(max: usize) -> Self {
        if max == 0 {
            Self::Unbounded
        } else {
            Self::MostRecent(max)
        }
    }

    fn apply<'a>(&self, interactions: &'a [Interaction]) -> &'a [Interaction] {
        match *self {
            Self::Unbounded => interactions,
            Self::MostRecent(n) => &interactions[interactions.len().saturating_sub(n)..],
        }
    }
}

/// Per-turn prompt context. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptivePromptContext {
    /// Persona plus tone directive.
    pub system_instruction: String,
    /// Alternating user/assistant history, ending with the live user input.
    pub history: Vec<Message>,
    /// Sampling temperature from fusion.
    pub temperature: f64,
}

impl AdaptivePromptContext {
    /// The full ordered sequence: system instruction first, then `history`.
    pub fn messages(&self) -> Vec<Message> {
        let mut all = Vec::with_capacity(self.history.len() + 1);
        all.push(Message::system(self.system_instruction.clone()));
        all.extend(self.history.iter().cloned());
        all
    }
}

/// Turns stored interactions into an [`AdaptivePromptContext`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler {
    window: HistoryWindow,
}

impl ContextAssembler {
    /// Create an assembler with the given history window.
    pub fn new(window: HistoryWindow) -> Self {
        Self { window }
    }

    /// Assemble the prompt for one turn.
    ///
    /// `interactions` must be ascending by creation time. Every interaction
    /// yields a user message followed by an assistant message, even when
    /// either side is empty.
    pub fn assemble(
        &self,
        interactions: &[Interaction],
        user_input: &str,
        fusion: &FusionOutcome,
    ) -> AdaptivePromptContext {
        let replayed = self.window.apply(interactions);
        let mut history = Vec::with_capacity(replayed.len() * 2 + 1);
        for interaction in replayed {
            history.push(Message::user(interaction.user_input.clone()));
            history.push(Message::assistant(interaction.assistant_reply.clone()));
        }
        history.push(Message::user(user_input));

        AdaptivePromptContext {
            system_instruction: build_system_instruction(&fusion.tone_directive),
            history,
            temperature: fusion.temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::emotion::EmotionSignal;
    use crate::llm::message::Role;

    fn stored(user: &str, assistant: &str) -> Interaction {
        Interaction::new(user, assistant, EmotionSignal::neutral(), EmotionSignal::unknown())
    }

    fn fusion() -> FusionOutcome {
        FusionOutcome::from_signal(&EmotionSignal::new("joy", 0.8))
    }

    #[test]
    fn three_interactions_yield_eight_messages() {
        let past = [stored("a", "b"), stored("c", "d"), stored("e", "f")];
        let ctx = ContextAssembler::default().assemble(&past, "now", &fusion());
        let roles: Vec<Role> = ctx.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [
                Role::System,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User,
            ]
        );
        assert_eq!(ctx.history.last().unwrap().content, "now");
        assert_eq!(ctx.temperature, 0.9);
    }

    #[test]
    fn empty_fields_keep_alternation() {
        let past = [stored("", ""), stored("only user", "")];
        let ctx = ContextAssembler::default().assemble(&past, "hi", &fusion());
        assert_eq!(ctx.history.len(), 5);
        assert_eq!(ctx.history[1].role, Role::Assistant);
        assert_eq!(ctx.history[1].content, "");
    }

    #[test]
    fn legacy_record_with_missing_fields_is_tolerated() {
        let parsed: Interaction = serde_json::from_str(r#"{"input_text":"hey"}"#).unwrap();
        let ctx = ContextAssembler::default().assemble(&[parsed], "x", &fusion());
        assert_eq!(ctx.history[0].content, "hey");
        assert_eq!(ctx.history[1].content, "");
    }

    #[test]
    fn most_recent_window_keeps_tail() {
        let past = [stored("1", "a"), stored("2", "b"), stored("3", "c")];
        let ctx =
            ContextAssembler::new(HistoryWindow::MostRecent(2)).assemble(&past, "x", &fusion());
        assert_eq!(ctx.history.len(), 5);
        assert_eq!(ctx.history[0].content, "2");
    }

    #[test]
    fn window_larger_than_history_keeps_all() {
        let past = [stored("1", "a")];
        let ctx =
            ContextAssembler::new(HistoryWindow::MostRecent(10)).assemble(&past, "x", &fusion());
        assert_eq!(ctx.history.len(), 3);
    }

    #[test]
    fn window_from_config_value() {
        assert_eq!(HistoryWindow::from_max_interactions(0), HistoryWindow::Unbounded);
        assert_eq!(HistoryWindow::from_max_interactions(4), HistoryWindow::MostRecent(4));
    }

    #[test]
    fn system_instruction_ends_with_tone_rule() {
        let text = build_system_instruction("Current emotional tone: fear");
        assert!(text.starts_with("You are a warm, emotionally intelligent assistant."));
        assert!(text.contains("\n\nRules:\n- Be empathetic but not clinical\n"));
        assert!(text.ends_with("\n- Current emotional tone: fear"));
    }
}
