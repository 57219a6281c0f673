//! Per-player session state.
//!
//! A [`SessionState`] is an explicit value owned by whoever drives the game
//! (a TUI, a headless loop, a test). The narrator mutates it only after a
//! chapter has been generated successfully.

use crate::catalog::StoryId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The chapter every story starts at.
pub const FIRST_CHAPTER: u32 = 1;

/// One of the two options offered at the end of a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
}

impl Choice {
    /// The literal token used in prompts and shown on the buttons.
    pub fn token(self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{0}` is not a choice, expected A or B")]
pub struct ParseChoiceError(String);

impl FromStr for Choice {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "a" | "A" => Ok(Choice::A),
            "b" | "B" => Ok(Choice::B),
            other => Err(ParseChoiceError(other.to_string())),
        }
    }
}

/// Where a player is in a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// The story currently being played, if any.
    pub story: Option<StoryId>,
    /// The chapter the next narration will produce.
    pub chapter: u32,
    /// Text of the most recently narrated chapter.
    pub last_text: String,
    /// The option picked at the end of the previous chapter.
    pub last_choice: Option<Choice>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// A session with no story selected.
    pub fn new() -> Self {
        Self {
            story: None,
            chapter: FIRST_CHAPTER,
            last_text: String::new(),
            last_choice: None,
        }
    }

    /// A fresh session for `story`.
    pub fn for_story(story: StoryId) -> Self {
        Self {
            story: Some(story),
            ..Self::new()
        }
    }

    /// Make `story` the active story.
    ///
    /// Selecting the story that is already active keeps its progress;
    /// selecting any other story resets the session. Returns whether a reset
    /// happened.
    pub fn select_story(&mut self, story: StoryId) -> bool {
        if self.story == Some(story) {
            return false;
        }
        *self = Self::for_story(story);
        true
    }

    /// Start the active story over.
    pub fn restart(&mut self) {
        *self = Self {
            story: self.story,
            ..Self::new()
        };
    }

    /// Whether nothing has been narrated yet for the current selection.
    pub fn is_opening(&self) -> bool {
        self.chapter == FIRST_CHAPTER && self.last_text.is_empty() && self.last_choice.is_none()
    }

    /// Number of chapters narrated so far.
    pub fn chapters_narrated(&self) -> u32 {
        self.chapter.saturating_sub(FIRST_CHAPTER)
    }

    /// Record a narrated chapter and move on to the next one.
    pub(crate) fn record_chapter(&mut self, text: String, choice: Option<Choice>) {
        self.last_text = text;
        self.last_choice = choice;
        self.chapter += 1;
    }
}
