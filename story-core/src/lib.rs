//! Interactive story engine with an LLM narrator.
//!
//! This crate provides:
//! - A story catalog loaded from CSV
//! - Explicit per-player session state
//! - A narrator that summarizes the previous chapter before continuing
//! - A game façade that front ends drive
//! - Session save/load
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use story_core::{Catalog, Choice, Narrator, StoryConfig, StoryGame, StoryId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoryConfig::load(None)?.with_model("llama3.1");
//!     config.validate()?;
//!
//!     let catalog = Arc::new(Catalog::load(&config.catalog.path)?);
//!     let narrator = Narrator::new(catalog, Arc::new(config.generator()?), config.narrator_config());
//!
//!     let mut game = StoryGame::new(narrator);
//!     game.select_story(StoryId(1))?;
//!     println!("{}", game.start().await?);
//!     println!("{}", game.choose(Choice::A).await?);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod game;
pub mod narrator;
pub mod persist;
pub mod session;
pub mod testing;

// Primary public API
pub use catalog::{Catalog, CatalogError, StoryId, StoryRecord, StorySummary};
pub use config::{ConfigError, StoryConfig};
pub use game::{GameError, StoryGame};
pub use narrator::{
    ChatGenerator, ChoiceOptions, GenerationError, Generator, InstructionProfile,
    NarrationError, Narrator, NarratorConfig, ProfileKind, RecapPolicy,
};
pub use persist::{PersistError, SavedSession};
pub use session::{Choice, SessionState};
pub use testing::{ScriptedGenerator, ScriptedReply, TestHarness};
