//! Color theme and styling for the story TUI

use ratatui::style::{Color, Modifier, Style};

/// Reader color theme
#[derive(Debug, Clone)]
pub struct StoryTheme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,
    pub title: Color,

    // Text colors
    pub narration_text: Color,
    pub choice_text: Color,
    pub system_text: Color,
    pub synopsis_text: Color,

    // Choice buttons
    pub option_key: Color,
    pub option_text: Color,
    pub ending: Color,
}

impl Default for StoryTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            title: Color::Yellow,

            narration_text: Color::White,
            choice_text: Color::Cyan,
            system_text: Color::DarkGray,
            synopsis_text: Color::Gray,

            option_key: Color::LightYellow,
            option_text: Color::White,
            ending: Color::LightRed,
        }
    }
}

impl StoryTheme {
    /// Get style for narration
    pub fn narration_style(&self) -> Style {
        Style::default().fg(self.narration_text)
    }

    /// Get style for the player's choices
    pub fn choice_style(&self) -> Style {
        Style::default()
            .fg(self.choice_text)
            .add_modifier(Modifier::ITALIC)
    }

    /// Get style for system messages
    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.system_text)
            .add_modifier(Modifier::DIM)
    }

    pub fn synopsis_style(&self) -> Style {
        Style::default().fg(self.synopsis_text)
    }

    pub fn title_style(&self) -> Style {
        Style::default().fg(self.title).add_modifier(Modifier::BOLD)
    }

    /// Get style for the selected row of a list
    pub fn highlight_style(&self) -> Style {
        Style::default()
            .fg(self.border_focused)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    }

    pub fn option_key_style(&self) -> Style {
        Style::default()
            .fg(self.option_key)
            .add_modifier(Modifier::BOLD)
    }

    pub fn option_text_style(&self, enabled: bool) -> Style {
        let style = Style::default().fg(self.option_text);
        if enabled {
            style
        } else {
            style.add_modifier(Modifier::DIM)
        }
    }

    pub fn ending_style(&self) -> Style {
        Style::default().fg(self.ending).add_modifier(Modifier::BOLD)
    }

    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }
}
