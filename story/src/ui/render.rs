//! Render orchestration for the story TUI

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Screen};
use crate::ui::widgets::{ChoiceBarWidget, NarrativeWidget, StoryListWidget};

/// Overlay types
#[derive(Debug, Clone)]
pub enum Overlay {
    Help,
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let [title_area, body_area, status_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .areas(area);

    render_title_bar(frame, app, title_area);

    match app.screen {
        Screen::StoryList => {
            let widget = StoryListWidget::new(app.stories(), &app.theme)
                .selected(app.selected)
                .active(app.game.story_id().filter(|_| app.game.is_started()));
            frame.render_widget(widget, body_area);
        }
        Screen::Reading => render_reading(frame, app, body_area),
    }

    render_status_bar(frame, app, status_area);

    if let Some(overlay) = app.overlay() {
        render_overlay(frame, app, overlay, area);
    }
}

/// Render the story being read: narrative above, decision bar below
fn render_reading(frame: &mut Frame, app: &App, area: Rect) {
    let [narrative_area, choice_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(4)])
        .areas(area);

    let title = app.game.story_title().unwrap_or("Story");
    let narrative = NarrativeWidget::new(&app.narrative_history, &app.theme)
        .title(title)
        .scroll(app.narrative_scroll)
        .waiting(app.narrating || app.pending.is_some());
    frame.render_widget(narrative, narrative_area);

    let busy = app.narrating || app.pending.is_some();
    let choices = ChoiceBarWidget::new(app.game.options(), &app.theme)
        .finished(app.game.is_finished() && app.game.is_started() && !busy)
        .enabled(!busy);
    frame.render_widget(choices, choice_area);
}

/// Render the title bar
fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = match (app.screen, app.game.story_title()) {
        (Screen::Reading, Some(story)) => {
            let chapter = app
                .game
                .session()
                .chapters_narrated()
                .min(app.game.chapters_total());
            format!(" {story} | chapter {chapter} of {} ", app.game.chapters_total())
        }
        _ => format!(" Story catalog | {} stories ", app.stories().len()),
    };

    let line = Line::from(Span::styled(title, app.theme.title_style()));
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let hint = match app.screen {
        Screen::StoryList => "j/k move  Enter read  ? help  q quit",
        Screen::Reading => "a/b decide  r restart  s stories  j/k scroll  ? help  q quit",
    };

    let line = match app.status_message() {
        Some(message) => Line::from(vec![
            Span::styled(format!(" {message} "), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("| {hint}"), app.theme.system_style()),
        ]),
        None => Line::from(Span::styled(format!(" {hint}"), app.theme.system_style())),
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Render overlay
fn render_overlay(frame: &mut Frame, app: &App, overlay: &Overlay, area: Rect) {
    match overlay {
        Overlay::Help => render_help_overlay(frame, app, area),
    }
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(50, 18, area);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let heading = Style::default().add_modifier(Modifier::UNDERLINED);
    let help_text = vec![
        Line::from(Span::styled(
            " Interactive Stories - Help ",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Story list:", heading)),
        Line::from("  j/k or ↑/↓     Move selection"),
        Line::from("  Enter          Read the selected story"),
        Line::from(""),
        Line::from(Span::styled("Reading:", heading)),
        Line::from("  a / b          Take option A or B"),
        Line::from("  r              Start the story again"),
        Line::from("  s or Esc       Back to the story list"),
        Line::from("  j/k, PgUp/PgDn Scroll"),
        Line::from("  g/G            Jump to top/bottom"),
        Line::from(""),
        Line::from("  q or Ctrl+c    Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or q to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}

/// A rectangle of fixed size centered in `area`, clamped to fit
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
