// Weekly goal sidebar: the coaching goal and its steps, always in view.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::api::WeeklyGoal;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let goal = state
        .data
        .as_ref()
        .and_then(|d| d.ai_analysis.loaded())
        .map(|ai| &ai.weekly_goal)
        .filter(|g| !g.title.is_empty() || !g.steps.is_empty());

    let lines = match goal {
        Some(goal) => build_lines(goal),
        None => vec![Line::from(Span::styled(
            " No goal this week.",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Weekly Goal"))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn build_lines(goal: &WeeklyGoal) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        format!(" {}", goal.title),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))];
    for step in &goal.steps {
        lines.push(Line::from(vec![
            Span::styled(" ☐ ", Style::default().fg(Color::Cyan)),
            Span::raw(step.clone()),
        ]));
    }
    lines
}
