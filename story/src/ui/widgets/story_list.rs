//! Story picker widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget, Widget},
};

use story_core::{StoryId, StorySummary};

use crate::ui::theme::StoryTheme;

/// Lists the catalog with the synopsis under each title
pub struct StoryListWidget<'a> {
    stories: &'a [StorySummary],
    selected: usize,
    active: Option<StoryId>,
    theme: &'a StoryTheme,
}

impl<'a> StoryListWidget<'a> {
    pub fn new(stories: &'a [StorySummary], theme: &'a StoryTheme) -> Self {
        Self {
            stories,
            selected: 0,
            active: None,
            theme,
        }
    }

    pub fn selected(mut self, selected: usize) -> Self {
        self.selected = selected;
        self
    }

    /// Mark the story currently in progress
    pub fn active(mut self, active: Option<StoryId>) -> Self {
        self.active = active;
        self
    }
}

impl Widget for StoryListWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Stories [j/k move, Enter read] ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(true));

        let items: Vec<ListItem> = self
            .stories
            .iter()
            .map(|story| {
                let marker = if Some(story.id) == self.active { " (in progress)" } else { "" };
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(format!("{}. {}", story.id, story.title), self.theme.title_style()),
                        Span::styled(marker, self.theme.system_style()),
                    ]),
                    Line::from(Span::styled(
                        format!("   {}", story.synopsis),
                        self.theme.synopsis_style(),
                    )),
                    Line::from(""),
                ])
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(self.theme.highlight_style())
            .highlight_symbol("» ");

        let mut state = ListState::default().with_selected(Some(self.selected));
        StatefulWidget::render(list, area, buf, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_titles() {
        let theme = StoryTheme::default();
        let stories = vec![
            StorySummary {
                id: StoryId(1),
                title: "The Glass Tower".into(),
                synopsis: "A thief climbs.".into(),
            },
            StorySummary {
                id: StoryId(2),
                title: "Salt Roads".into(),
                synopsis: "A caravan crosses.".into(),
            },
        ];
        let area = Rect::new(0, 0, 50, 10);
        let mut buf = Buffer::empty(area);
        StoryListWidget::new(&stories, &theme)
            .selected(1)
            .active(Some(StoryId(2)))
            .render(area, &mut buf);

        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("The Glass Tower"));
        assert!(text.contains("Salt Roads"));
        assert!(text.contains("(in progress)"));
    }
}
