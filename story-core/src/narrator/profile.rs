//! Instruction profiles for the generation capability.
//!
//! A profile is the system-level instruction sent with every generation
//! call. It is always passed explicitly, so one generator can serve the
//! storyteller and the summarizer (and several sessions) at once.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phrase the storyteller ends the text with when the adventure is over.
pub const DEFAULT_ENDING_MARKER: &str = "THE END";

const STORYTELLER_BASE: &str = include_str!("prompts/storyteller.txt");
const SUMMARIZER_BASE: &str = include_str!("prompts/summarizer.txt");

const RECAP_FORBIDDEN: &str = "Do not summarize what happened in earlier chapters. The only past event you may tell is the player's latest decision and its consequence.";
const RECAP_ALLOWED: &str = "Before moving on, briefly recall what has happened so far in one or two sentences.";

/// Which profile is speaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    Storyteller,
    Summarizer,
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileKind::Storyteller => f.write_str("storyteller"),
            ProfileKind::Summarizer => f.write_str("summarizer"),
        }
    }
}

/// Whether the storyteller may recap earlier chapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecapPolicy {
    #[default]
    Forbid,
    Allow,
}

/// A system instruction tagged with the role it plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionProfile {
    kind: ProfileKind,
    instruction: String,
}

impl InstructionProfile {
    pub fn new(kind: ProfileKind, instruction: impl Into<String>) -> Self {
        Self {
            kind,
            instruction: instruction.into(),
        }
    }

    /// The narrator persona.
    pub fn storyteller(recap: RecapPolicy, ending_marker: &str) -> Self {
        let mut instruction = STORYTELLER_BASE
            .trim_end()
            .replace("{ending_marker}", ending_marker);

        instruction.push_str("\n\n## Recap\n");
        instruction.push_str(match recap {
            RecapPolicy::Forbid => RECAP_FORBIDDEN,
            RecapPolicy::Allow => RECAP_ALLOWED,
        });

        Self::new(ProfileKind::Storyteller, instruction)
    }

    /// The short-recap writer used to compress earlier chapters.
    pub fn summarizer() -> Self {
        Self::new(ProfileKind::Summarizer, SUMMARIZER_BASE.trim_end())
    }

    /// Append free-form instructions to the profile.
    pub fn with_extra_instruction(mut self, extra: &str) -> Self {
        if !extra.trim().is_empty() {
            self.instruction.push_str("\n\n## Additional Instructions\n");
            self.instruction.push_str(extra.trim());
        }
        self
    }

    pub fn kind(&self) -> ProfileKind {
        self.kind
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storyteller_uses_ending_marker() {
        let profile = InstructionProfile::storyteller(RecapPolicy::Forbid, "GAME OVER");
        assert_eq!(profile.kind(), ProfileKind::Storyteller);
        assert!(profile.instruction().contains("\"GAME OVER\""));
        assert!(!profile.instruction().contains("{ending_marker}"));
        assert!(profile.instruction().contains("A - [First option]"));
    }

    #[test]
    fn test_recap_policy_changes_instruction() {
        let forbid = InstructionProfile::storyteller(RecapPolicy::Forbid, DEFAULT_ENDING_MARKER);
        let allow = InstructionProfile::storyteller(RecapPolicy::Allow, DEFAULT_ENDING_MARKER);

        assert!(forbid.instruction().contains(RECAP_FORBIDDEN));
        assert!(!forbid.instruction().contains(RECAP_ALLOWED));
        assert!(allow.instruction().contains(RECAP_ALLOWED));
    }

    #[test]
    fn test_summarizer_profile() {
        let profile = InstructionProfile::summarizer();
        assert_eq!(profile.kind(), ProfileKind::Summarizer);
        assert!(profile.instruction().contains("two paragraphs"));
    }

    #[test]
    fn test_extra_instruction() {
        let profile = InstructionProfile::summarizer().with_extra_instruction("Use past tense.");
        assert!(profile.instruction().ends_with("Use past tense."));

        let unchanged = InstructionProfile::summarizer().with_extra_instruction("   ");
        assert_eq!(unchanged, InstructionProfile::summarizer());
    }

    #[test]
    fn test_recap_policy_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            recap: RecapPolicy,
        }
        let w: Wrapper = toml::from_str("recap = \"allow\"").unwrap();
        assert_eq!(w.recap, RecapPolicy::Allow);
    }
}
