//! Main application state and logic

use story_core::{Choice, ChoiceOptions, GameError, StoryGame, StorySummary};

use crate::ui::theme::StoryTheme;
use crate::ui::widgets::narrative::{EntryKind, NarrativeItem};
use crate::ui::Overlay;

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Picking a story from the catalog (default)
    #[default]
    StoryList,
    /// Reading the selected story
    Reading,
}

/// Narration the main loop must run before handling more input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Start,
    Choose(Choice),
}

/// Main application state
pub struct App {
    pub game: StoryGame,
    stories: Vec<StorySummary>,

    // UI state
    pub theme: StoryTheme,
    pub screen: Screen,
    pub selected: usize,
    overlay: Option<Overlay>,

    // Narrative display
    pub narrative_history: Vec<NarrativeItem>,
    pub narrative_scroll: usize,
    pub scroll_locked_to_bottom: bool, // True = auto-scroll on new content

    // Status
    status_message: Option<String>,
    pub should_quit: bool,

    // Narration
    pub pending: Option<PendingAction>,
    pub narrating: bool,
}

impl App {
    pub fn new(game: StoryGame) -> Self {
        let stories = game.stories();
        let selected = game
            .story_id()
            .and_then(|id| stories.iter().position(|s| s.id == id))
            .unwrap_or(0);
        let screen = if game.story_id().is_some() {
            Screen::Reading
        } else {
            Screen::StoryList
        };

        let mut app = Self {
            game,
            stories,
            theme: StoryTheme::default(),
            screen,
            selected,
            overlay: None,
            narrative_history: Vec::new(),
            narrative_scroll: 0,
            scroll_locked_to_bottom: true,
            status_message: None,
            should_quit: false,
            pending: None,
            narrating: false,
        };

        if app.screen == Screen::Reading {
            app.pending = Some(PendingAction::Start);
        }
        app
    }

    pub fn stories(&self) -> &[StorySummary] {
        &self.stories
    }

    /// Move the story list cursor
    pub fn select_next(&mut self) {
        if !self.stories.is_empty() {
            self.selected = (self.selected + 1) % self.stories.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.stories.is_empty() {
            self.selected = (self.selected + self.stories.len() - 1) % self.stories.len();
        }
    }

    /// Open the story under the cursor.
    ///
    /// A different story starts over; the active one picks up where it was.
    pub fn open_selected(&mut self) {
        let Some(story) = self.stories.get(self.selected) else {
            return;
        };
        let id = story.id;

        match self.game.select_story(id) {
            Ok(reset) => {
                self.screen = Screen::Reading;
                if reset || !self.game.is_started() {
                    self.narrative_history.clear();
                    self.pending = Some(PendingAction::Start);
                }
                self.scroll_to_bottom();
            }
            Err(e) => self.set_status(format!("Error: {e}")),
        }
    }

    /// Back to the story list, keeping progress
    pub fn show_story_list(&mut self) {
        self.screen = Screen::StoryList;
    }

    /// Queue a choice if the current chapter offers one
    pub fn choose(&mut self, choice: Choice) {
        if self.narrating {
            return;
        }
        if self.game.is_finished() {
            self.set_status("The story is over. Press r to start again.");
            return;
        }
        if !self.game.is_started() {
            return;
        }
        self.pending = Some(PendingAction::Choose(choice));
    }

    /// Queue a restart of the selected story
    pub fn restart(&mut self) {
        if self.narrating || self.game.story_id().is_none() {
            return;
        }
        self.game.restart();
        self.narrative_history.clear();
        self.pending = Some(PendingAction::Start);
    }

    /// Record the outcome of a narration
    pub fn finish_narration(&mut self, action: PendingAction, result: Result<String, GameError>) {
        self.narrating = false;
        match result {
            Ok(text) => {
                if let PendingAction::Choose(choice) = action {
                    let label = self
                        .options()
                        .map(|o| format!("{choice} - {}", o.get(choice)))
                        .unwrap_or_else(|| choice.to_string());
                    self.add_narrative(label, EntryKind::Choice);
                }
                self.add_narrative(text, EntryKind::Narration);

                if self.game.is_finished() {
                    self.add_narrative("The story is over.".to_string(), EntryKind::System);
                    self.set_status("Press r to start again or s to pick another story");
                } else {
                    self.clear_status();
                }
            }
            Err(e) => {
                self.add_narrative(format!("The narrator failed: {e}"), EntryKind::System);
                self.set_status("Narration failed. Choose again or press r to restart.");
            }
        }
    }

    /// Options of the last chapter in the history
    pub fn options(&self) -> Option<ChoiceOptions> {
        self.narrative_history
            .iter()
            .rev()
            .find(|item| item.kind == EntryKind::Narration)
            .and_then(|item| story_core::narrator::parse_options(&item.content))
    }

    /// Add a narrative entry
    pub fn add_narrative(&mut self, content: String, kind: EntryKind) {
        self.narrative_history.push(NarrativeItem { content, kind });
        if self.scroll_locked_to_bottom {
            self.scroll_to_bottom();
        }
    }

    /// Scroll narrative to bottom and lock to bottom
    pub fn scroll_to_bottom(&mut self) {
        // Set to max value - the widget will cap it to actual max_scroll
        self.narrative_scroll = usize::MAX / 2;
        self.scroll_locked_to_bottom = true;
    }

    /// Estimate max scroll based on narrative content
    /// Uses conservative estimate assuming ~60 char effective width
    fn estimate_max_scroll(&self) -> usize {
        const ESTIMATED_WIDTH: usize = 60;
        const ESTIMATED_VISIBLE_HEIGHT: usize = 20;

        let estimated_lines: usize = self
            .narrative_history
            .iter()
            .map(|item| {
                item.content
                    .lines()
                    .map(|line| (line.chars().count() / ESTIMATED_WIDTH).max(1))
                    .sum::<usize>()
                    + 1 // blank line between entries
            })
            .sum();

        estimated_lines.saturating_sub(ESTIMATED_VISIBLE_HEIGHT)
    }

    /// Scroll narrative up (unlocks from bottom)
    pub fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.estimate_max_scroll();
        if self.narrative_scroll > max_scroll {
            self.narrative_scroll = max_scroll;
        }
        self.narrative_scroll = self.narrative_scroll.saturating_sub(lines);
        self.scroll_locked_to_bottom = false;
    }

    /// Scroll narrative down
    pub fn scroll_down(&mut self, lines: usize) {
        self.narrative_scroll = self.narrative_scroll.saturating_add(lines);
        let max_scroll = self.estimate_max_scroll();
        self.narrative_scroll = self.narrative_scroll.min(max_scroll + 100);
    }

    pub fn scroll_to_top(&mut self) {
        self.narrative_scroll = 0;
        self.scroll_locked_to_bottom = false;
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        if matches!(self.overlay, Some(Overlay::Help)) {
            self.overlay = None;
        } else {
            self.overlay = Some(Overlay::Help);
        }
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_core::testing::TestHarness;
    use story_core::StoryId;

    fn app() -> App {
        App::new(TestHarness::new().game)
    }

    #[test]
    fn test_new_app_starts_on_story_list() {
        let app = app();
        assert_eq!(app.screen, Screen::StoryList);
        assert_eq!(app.stories().len(), 1);
        assert!(app.pending.is_none());
    }

    #[test]
    fn test_open_selected_queues_start() {
        let mut app = app();
        app.open_selected();
        assert_eq!(app.screen, Screen::Reading);
        assert_eq!(app.pending, Some(PendingAction::Start));
        assert_eq!(app.game.story_id(), Some(StoryId(1)));
    }

    #[test]
    fn test_choose_requires_started_story() {
        let mut app = app();
        app.open_selected();
        app.pending = None;
        app.choose(Choice::A);
        assert!(app.pending.is_none());
    }

    #[test]
    fn test_finish_narration_records_choice_and_text() {
        let mut app = app();
        app.add_narrative("Dawn.\nA - Run\nB - Hide".into(), EntryKind::Narration);
        app.finish_narration(PendingAction::Choose(Choice::B), Ok("Night.".into()));

        let kinds: Vec<EntryKind> = app.narrative_history.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![EntryKind::Narration, EntryKind::Choice, EntryKind::Narration]);
        assert_eq!(app.narrative_history[1].content, "B - Hide");
    }

    #[test]
    fn test_failed_narration_sets_status() {
        let mut app = app();
        app.narrating = true;
        app.finish_narration(PendingAction::Start, Err(GameError::NotStarted));
        assert!(!app.narrating);
        assert!(app.status_message().is_some());
        assert_eq!(app.narrative_history.last().map(|i| i.kind), Some(EntryKind::System));
    }

    #[test]
    fn test_selection_wraps() {
        let mut app = app();
        app.select_prev();
        assert_eq!(app.selected, 0);
        app.select_next();
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_help_toggle() {
        let mut app = app();
        app.toggle_help();
        assert!(app.has_overlay());
        app.toggle_help();
        assert!(!app.has_overlay());
    }
}
