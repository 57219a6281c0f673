//! Story game façade.
//!
//! [`StoryGame`] bundles the narrator with one player's session, and is what
//! the front ends (TUI and headless) drive.

use crate::catalog::{Catalog, StoryId, StorySummary};
use crate::narrator::{self, ChoiceOptions, NarrationError, Narrator};
use crate::persist::{PersistError, SavedSession};
use crate::session::{Choice, SessionState, FIRST_CHAPTER};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors from the game façade.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Narration(#[from] NarrationError),

    #[error("no story selected")]
    NoStorySelected,

    #[error("the story has not started yet")]
    NotStarted,

    #[error("the story is over")]
    Finished,

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),
}

/// One player's game.
#[derive(Debug, Clone)]
pub struct StoryGame {
    narrator: Narrator,
    session: SessionState,
    ended: bool,
}

impl StoryGame {
    pub fn new(narrator: Narrator) -> Self {
        Self {
            narrator,
            session: SessionState::new(),
            ended: false,
        }
    }

    /// Resume from a saved session.
    ///
    /// The session must point at a story in the catalog and at a chapter
    /// between the first and one past the last.
    pub fn resume(&mut self, session: SessionState) -> Result<(), GameError> {
        if let Some(id) = session.story {
            let story = self
                .narrator
                .catalog()
                .lookup(id)
                .ok_or(NarrationError::StoryNotFound(id))?;
            let available = story.chapter_count();
            if session.chapter < FIRST_CHAPTER || session.chapter > available + 1 {
                return Err(NarrationError::ChapterOutOfRange {
                    story: id,
                    chapter: session.chapter,
                    available,
                }
                .into());
            }
        }

        self.ended = self.is_ending(&session.last_text);
        self.session = session;
        info!(story = ?self.session.story, chapter = self.session.chapter, "session resumed");
        Ok(())
    }

    /// Save the session to a JSON file.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), GameError> {
        let saved = SavedSession::new(
            self.session.clone(),
            self.story_title().map(str::to_string),
        );
        saved.save(path).await?;
        Ok(())
    }

    /// Load a session saved with [`StoryGame::save`].
    pub async fn load(&mut self, path: impl AsRef<Path>) -> Result<(), GameError> {
        let saved = SavedSession::load(path).await?;
        self.resume(saved.session)
    }

    /// Make `id` the active story. Returns whether the session was reset.
    pub fn select_story(&mut self, id: StoryId) -> Result<bool, GameError> {
        if self.narrator.catalog().lookup(id).is_none() {
            return Err(NarrationError::StoryNotFound(id).into());
        }

        let reset = self.session.select_story(id);
        if reset {
            self.ended = false;
            info!(story = %id, "story selected");
        }
        Ok(reset)
    }

    /// Narrate the opening of the selected story, restarting it if it was
    /// already in progress.
    pub async fn start(&mut self) -> Result<&str, GameError> {
        let story = self.session.story.ok_or(GameError::NoStorySelected)?;

        let mut session = self.session.clone();
        session.restart();
        let text = self.narrator.begin(&mut session, story).await?;

        self.ended = self.is_ending(&text);
        self.session = session;
        Ok(self.session.last_text.as_str())
    }

    /// Continue the story with the player's choice.
    pub async fn choose(&mut self, choice: Choice) -> Result<&str, GameError> {
        let story = self.session.story.ok_or(GameError::NoStorySelected)?;
        if self.session.is_opening() {
            return Err(GameError::NotStarted);
        }
        if self.is_finished() {
            return Err(GameError::Finished);
        }

        let text = self.narrator.advance(&mut self.session, story, choice).await?;
        self.ended = self.is_ending(&text);
        Ok(self.session.last_text.as_str())
    }

    /// Forget all progress in the selected story.
    pub fn restart(&mut self) {
        self.session.restart();
        self.ended = false;
    }

    /// The chapter the next narration will produce.
    pub fn chapter(&self) -> u32 {
        self.session.chapter
    }

    pub fn last_text(&self) -> &str {
        &self.session.last_text
    }

    /// The options offered by the last chapter, unless the story is over.
    pub fn options(&self) -> Option<ChoiceOptions> {
        if self.is_finished() || self.session.is_opening() {
            return None;
        }
        narrator::parse_options(&self.session.last_text)
    }

    /// Whether the narrator ended the adventure or the authored chapters ran
    /// out. Always false with no story selected.
    pub fn is_finished(&self) -> bool {
        self.session.story.is_some()
            && (self.ended || self.session.chapter > self.chapters_total())
    }

    /// Whether at least one chapter has been narrated.
    pub fn is_started(&self) -> bool {
        self.session.story.is_some() && !self.session.is_opening()
    }

    pub fn story_id(&self) -> Option<StoryId> {
        self.session.story
    }

    pub fn story_title(&self) -> Option<&str> {
        self.session
            .story
            .and_then(|id| self.narrator.catalog().lookup(id))
            .map(|story| story.title())
    }

    /// Number of authored chapters in the selected story, 0 with none
    /// selected.
    pub fn chapters_total(&self) -> u32 {
        self.session
            .story
            .and_then(|id| self.narrator.catalog().lookup(id))
            .map_or(0, |story| story.chapter_count())
    }

    pub fn stories(&self) -> Vec<StorySummary> {
        self.narrator.catalog().list_summaries()
    }

    pub fn catalog(&self) -> &Catalog {
        self.narrator.catalog()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    fn is_ending(&self, text: &str) -> bool {
        narrator::is_ending(text, &self.narrator.config().ending_marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    const CHAPTER_ONE: &str = "You wake in the tower.\nA - Climb down\nB - Climb up";

    #[tokio::test]
    async fn test_choose_before_select() {
        let mut harness = TestHarness::new();
        assert!(matches!(
            harness.game.choose(Choice::A).await,
            Err(GameError::NoStorySelected)
        ));
        assert!(matches!(harness.game.start().await, Err(GameError::NoStorySelected)));
    }

    #[tokio::test]
    async fn test_choose_before_start() {
        let mut harness = TestHarness::new();
        harness.game.select_story(StoryId(1)).unwrap();
        assert!(matches!(
            harness.game.choose(Choice::A).await,
            Err(GameError::NotStarted)
        ));
    }

    #[test]
    fn test_select_unknown_story() {
        let mut harness = TestHarness::new();
        let err = harness.game.select_story(StoryId(9)).unwrap_err();
        assert!(matches!(
            err,
            GameError::Narration(NarrationError::StoryNotFound(StoryId(9)))
        ));
    }

    #[tokio::test]
    async fn test_start_and_options() {
        let mut harness = TestHarness::new();
        harness.script([CHAPTER_ONE]);
        assert!(harness.game.select_story(StoryId(1)).unwrap());

        let text = harness.game.start().await.unwrap().to_string();
        assert_eq!(text, CHAPTER_ONE);
        assert_eq!(harness.game.chapter(), 2);
        assert_eq!(harness.game.story_title(), Some("The Sample Tale"));

        let options = harness.game.options().unwrap();
        assert_eq!(options.a, "Climb down");
        assert_eq!(options.b, "Climb up");
    }

    #[tokio::test]
    async fn test_finished_after_last_chapter() {
        let mut harness = TestHarness::new();
        harness.script([CHAPTER_ONE, "recap", "The tale closes."]);
        harness.game.select_story(StoryId(1)).unwrap();
        harness.game.start().await.unwrap();
        harness.game.choose(Choice::B).await.unwrap();

        assert!(harness.game.is_finished());
        assert!(harness.game.options().is_none());
        assert!(matches!(
            harness.game.choose(Choice::A).await,
            Err(GameError::Finished)
        ));
        assert_eq!(harness.generator.call_count(), 3);
    }

    #[tokio::test]
    async fn test_ending_marker_finishes_game() {
        let mut harness = TestHarness::new();
        harness.script(["The floor gives way. THE END."]);
        harness.game.select_story(StoryId(1)).unwrap();
        harness.game.start().await.unwrap();

        assert!(harness.game.is_finished());
        assert!(matches!(
            harness.game.choose(Choice::A).await,
            Err(GameError::Finished)
        ));
    }

    #[tokio::test]
    async fn test_prose_mentioning_the_end_keeps_playing() {
        let mut harness = TestHarness::new();
        harness.script([
            "At the end of the hall a door waits.\nA - Open\nB - Leave",
            "recap",
            "The door opens onto the end of the world.",
        ]);
        harness.game.select_story(StoryId(1)).unwrap();
        harness.game.start().await.unwrap();
        assert!(!harness.game.is_finished());

        let text = harness.game.choose(Choice::A).await.unwrap().to_string();
        assert_eq!(text, "The door opens onto the end of the world.");
    }

    #[test]
    fn test_not_finished_without_story() {
        let harness = TestHarness::new();
        assert!(!harness.game.is_finished());
        assert!(!harness.game.is_started());
        assert_eq!(harness.game.chapters_total(), 0);
    }

    #[tokio::test]
    async fn test_start_again_restarts() {
        let mut harness = TestHarness::new();
        harness.script([CHAPTER_ONE, "A fresh start.\nA - x\nB - y"]);
        harness.game.select_story(StoryId(1)).unwrap();
        harness.game.start().await.unwrap();
        harness.game.start().await.unwrap();

        assert_eq!(harness.game.chapter(), 2);
        assert_eq!(harness.game.last_text(), "A fresh start.\nA - x\nB - y");
        assert!(harness.generator.profiles().iter().all(|p| *p == narrator::ProfileKind::Storyteller));
    }

    #[tokio::test]
    async fn test_save_and_load_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");

        let mut harness = TestHarness::new();
        harness.script([CHAPTER_ONE]);
        harness.game.select_story(StoryId(1)).unwrap();
        harness.game.start().await.unwrap();
        harness.game.save(&path).await.unwrap();

        let mut other = TestHarness::new();
        other.game.load(&path).await.unwrap();
        assert_eq!(other.game.session(), harness.game.session());
        assert!(other.game.is_started());
        assert_eq!(other.game.options().unwrap().a, "Climb down");
    }

    #[test]
    fn test_resume_rejects_bad_chapter() {
        let mut harness = TestHarness::new();
        let mut session = SessionState::for_story(StoryId(1));
        session.chapter = 7;
        assert!(matches!(
            harness.game.resume(session),
            Err(GameError::Narration(NarrationError::ChapterOutOfRange { chapter: 7, .. }))
        ));

        let session = SessionState::for_story(StoryId(5));
        assert!(harness.game.resume(session).is_err());
    }

    #[tokio::test]
    async fn test_failed_start_keeps_session() {
        let mut harness = TestHarness::new();
        harness.game.select_story(StoryId(1)).unwrap();

        assert!(harness.game.start().await.is_err());
        assert!(!harness.game.is_started());
        assert_eq!(harness.game.chapter(), 1);
    }
}
