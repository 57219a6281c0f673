//! Narrative display widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Widget, Wrap,
    },
};

use crate::ui::theme::StoryTheme;

/// What an entry in the narrative is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Chapter text from the narrator
    Narration,
    /// The option the player picked
    Choice,
    /// Messages from the reader itself
    System,
}

/// A single entry in the narrative display
#[derive(Debug, Clone)]
pub struct NarrativeItem {
    pub content: String,
    pub kind: EntryKind,
}

/// Widget for displaying narrative text
pub struct NarrativeWidget<'a> {
    items: &'a [NarrativeItem],
    title: &'a str,
    scroll: usize,
    theme: &'a StoryTheme,
    waiting: bool,
}

impl<'a> NarrativeWidget<'a> {
    pub fn new(items: &'a [NarrativeItem], theme: &'a StoryTheme) -> Self {
        Self {
            items,
            title: "",
            scroll: 0,
            theme,
            waiting: false,
        }
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Show that the narrator is writing
    pub fn waiting(mut self, waiting: bool) -> Self {
        self.waiting = waiting;
        self
    }

    fn style_for(&self, kind: EntryKind) -> Style {
        match kind {
            EntryKind::Narration => self.theme.narration_style(),
            EntryKind::Choice => self.theme.choice_style(),
            EntryKind::System => self.theme.system_style(),
        }
    }
}

impl Widget for NarrativeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = format!(" {} [j/k scroll] ", self.title);
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(true));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = Vec::new();

        for item in self.items {
            let style = self.style_for(item.kind);

            let (prefix, suffix) = match item.kind {
                EntryKind::Choice => ("> ", ""),
                EntryKind::System => ("[ ", " ]"),
                EntryKind::Narration => ("", ""),
            };

            let text = format!("{prefix}{}{suffix}", item.content);
            for line in text.lines() {
                lines.push(Line::from(Span::styled(line.to_string(), style)));
            }

            lines.push(Line::from(""));
        }

        if self.waiting {
            let style = self.theme.narration_style().add_modifier(Modifier::DIM);
            lines.push(Line::from(Span::styled("The narrator is writing... ▌", style)));
        }

        // Calculate scroll position
        let visible_height = inner.height as usize;
        let total_lines = lines.len();
        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll = self.scroll.min(max_scroll);

        let paragraph = Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .wrap(Wrap { trim: false });

        paragraph.render(inner, buf);

        // Render scrollbar if content exceeds visible area
        if total_lines > visible_height {
            let scrollbar_area = Rect {
                x: inner.x + inner.width.saturating_sub(1),
                y: inner.y,
                width: 1,
                height: inner.height,
            };

            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .thumb_style(Style::default().fg(Color::DarkGray))
                .track_style(Style::default().fg(Color::Black))
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            let mut scrollbar_state = ScrollbarState::new(max_scroll).position(scroll);

            scrollbar.render(scrollbar_area, buf, &mut scrollbar_state);

            // Hint at bottom if more content below
            if scroll < max_scroll {
                let hint = format!(" ↓{} more ", max_scroll - scroll);
                let hint_y = inner.y + inner.height.saturating_sub(1);
                let hint_style = Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::DIM);
                for (i, ch) in hint.chars().enumerate() {
                    let x = inner.x + (i as u16);
                    if x < inner.x + inner.width.saturating_sub(2) {
                        buf[(x, hint_y)].set_char(ch).set_style(hint_style);
                    }
                }
            }
        }
    }
}
