//! TUI widgets for the story reader

pub mod choice;
pub mod narrative;
pub mod story_list;

pub use choice::ChoiceBarWidget;
pub use narrative::NarrativeWidget;
pub use story_list::StoryListWidget;
