// AI analysis tab: the weekly coaching summary.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use super::{bullet_lines, clamped_scroll, heading, no_data_lines, wrapped_rows};
use crate::api::AiAnalysis;
use crate::dashboard::Panel;
use crate::protocol::TabId;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let border = match state.data.as_ref().map(|d| &d.ai_analysis) {
        Some(Panel::Failed(_)) => Style::default().fg(Color::Red),
        _ => Style::default(),
    };
    let lines = lines(state);
    let rows = wrapped_rows(&lines, area);
    let scroll = clamped_scroll(state, TabId::Analysis.scroll_key(), rows, area);

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("AI Analysis")
                .border_style(border),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

pub fn content_rows(state: &ViewState, area: Rect) -> usize {
    wrapped_rows(&lines(state), area)
}

fn lines(state: &ViewState) -> Vec<Line<'static>> {
    match state.data.as_ref().map(|d| &d.ai_analysis) {
        Some(Panel::Loaded(ai)) => build_lines(ai),
        Some(Panel::Failed(msg)) => vec![Line::from(Span::styled(
            format!(" Analysis unavailable: {msg}"),
            Style::default().fg(Color::Red),
        ))],
        Some(Panel::NotConnected) => vec![Line::from(Span::styled(
            " No analysis yet.",
            Style::default().fg(Color::DarkGray),
        ))],
        None => no_data_lines(state),
    }
}

fn build_lines(ai: &AiAnalysis) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if !ai.greeting.is_empty() {
        lines.push(Line::from(Span::styled(
            format!(" {}", ai.greeting),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::default());
    }

    lines.push(heading("Key patterns"));
    lines.extend(bullet_lines(&ai.key_patterns, Color::Cyan));
    lines.push(Line::default());

    lines.push(heading("Working well"));
    lines.extend(bullet_lines(&ai.working_well, Color::Green));
    lines.push(Line::default());

    lines.push(heading("Opportunities"));
    lines.extend(bullet_lines(&ai.opportunity_areas, Color::Yellow));
    lines.push(Line::default());

    lines.push(heading("This week's goal"));
    if !ai.weekly_goal.title.is_empty() {
        lines.push(Line::from(format!("   {}", ai.weekly_goal.title)));
    }
    for (i, step) in ai.weekly_goal.steps.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("   {}. ", i + 1), Style::default().fg(Color::Cyan)),
            Span::raw(step.clone()),
        ]));
    }

    if !ai.sign_off.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!(" {}", ai.sign_off),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}
