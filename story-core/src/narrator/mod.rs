//! The narrator.
//!
//! Contains the narration controller, the generation seam, the instruction
//! profiles and the prompt builders.

mod agent;
pub mod generator;
pub mod profile;
pub mod prompt;
pub mod text;

pub use agent::{NarrationError, Narrator, NarratorConfig};
pub use generator::{ChatGenerator, GenerationError, Generator};
pub use profile::{InstructionProfile, ProfileKind, RecapPolicy, DEFAULT_ENDING_MARKER};
pub use text::{is_ending, parse_options, ChoiceOptions};
