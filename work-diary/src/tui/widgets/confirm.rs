// Confirmation overlay widget.
//
// Renders a centered modal dialog with a yes/no prompt. Used for quitting
// and for sending a nudge; drawn on top of the main layout.

use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

const DIALOG_HEIGHT: u16 = 5;
/// Border plus padding around the prompt.
const DIALOG_PADDING: u16 = 6;
const MIN_DIALOG_WIDTH: u16 = 28;

/// Render a `prompt (y/n)` dialog titled `title`, centered in `area`.
pub fn render(frame: &mut Frame, area: Rect, title: &str, prompt: &str) {
    let dialog_area = centered_rect(dialog_width(prompt), DIALOG_HEIGHT, area);

    // Clear the area behind the dialog so it renders cleanly on top
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(Span::styled(
            title.to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));

    let text = vec![
        Line::default(),
        Line::from(vec![
            Span::raw(format!("  {prompt} (")),
            Span::styled("y", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw("/"),
            Span::styled("n", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(")"),
        ]),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().bg(Color::Black));

    frame.render_widget(paragraph, dialog_area);
}

/// Wide enough for `prompt (y/n)` plus the border.
fn dialog_width(prompt: &str) -> u16 {
    let text_width = u16::try_from(prompt.chars().count() + " (y/n)".len()).unwrap_or(u16::MAX);
    text_width
        .saturating_add(DIALOG_PADDING)
        .max(MIN_DIALOG_WIDTH)
}

/// Compute a centered rectangle of the given size within `area`.
///
/// If the area is too small, the dialog is clamped to the available space.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width);
    let clamped_height = height.min(area.height);

    let vertical = Layout::vertical([Constraint::Length(clamped_height)])
        .flex(Flex::Center)
        .split(area);

    let horizontal = Layout::horizontal([Constraint::Length(clamped_width)])
        .flex(Flex::Center)
        .split(vertical[0]);

    horizontal[0]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
