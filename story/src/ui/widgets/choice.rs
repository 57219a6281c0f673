//! The A/B decision bar

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use story_core::{Choice, ChoiceOptions};

use crate::ui::theme::StoryTheme;

/// Shows the two options, the end of the story, or nothing to choose yet
pub struct ChoiceBarWidget<'a> {
    options: Option<ChoiceOptions>,
    finished: bool,
    enabled: bool,
    theme: &'a StoryTheme,
}

impl<'a> ChoiceBarWidget<'a> {
    pub fn new(options: Option<ChoiceOptions>, theme: &'a StoryTheme) -> Self {
        Self {
            options,
            finished: false,
            enabled: true,
            theme,
        }
    }

    pub fn finished(mut self, finished: bool) -> Self {
        self.finished = finished;
        self
    }

    /// Dim the options while the narrator is busy
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn option_line(&self, choice: Choice, options: &ChoiceOptions) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!(" [{}] ", choice.token().to_lowercase()), self.theme.option_key_style()),
            Span::styled(options.get(choice).to_string(), self.theme.option_text_style(self.enabled)),
        ])
    }
}

impl Widget for ChoiceBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Your decision ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        let lines = if self.finished {
            vec![Line::from(Span::styled(
                " The story is over. [r] start again  [s] other stories",
                self.theme.ending_style(),
            ))]
        } else if let Some(options) = &self.options {
            vec![
                self.option_line(Choice::A, options),
                self.option_line(Choice::B, options),
            ]
        } else if self.enabled {
            vec![Line::from(Span::styled(
                " [a] first option  [b] second option",
                self.theme.system_style(),
            ))]
        } else {
            vec![Line::from(Span::styled(" ...", self.theme.system_style()))]
        };

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}
