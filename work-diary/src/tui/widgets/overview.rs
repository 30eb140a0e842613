// Overview tab: one section per source with its headline numbers.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use super::{
    clamped_scroll, heading, no_data_lines, panel_placeholder, stat_line, wrapped_rows,
};
use crate::api::Service;
use crate::dashboard::series::format_minutes;
use crate::dashboard::{DashboardData, Panel};
use crate::protocol::TabId;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = lines(state);
    let rows = wrapped_rows(&lines, area);
    let scroll = clamped_scroll(state, TabId::Overview.scroll_key(), rows, area);

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("This Week"))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

pub fn content_rows(state: &ViewState, area: Rect) -> usize {
    wrapped_rows(&lines(state), area)
}

fn lines(state: &ViewState) -> Vec<Line<'static>> {
    match &state.data {
        Some(data) => build_lines(data),
        None => no_data_lines(state),
    }
}

fn build_lines(data: &DashboardData) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let slack = &data.slack;
    lines.push(heading("Slack"));
    lines.push(stat_line("Messages", slack.message_count.to_string()));
    lines.push(stat_line(
        "After hours",
        format!("{} messages", slack.after_hours_messages),
    ));
    lines.push(stat_line(
        "In work hours",
        format!("{:.0}%", slack.time_analysis.work_hours_ratio * 100.0),
    ));
    lines.push(Line::default());

    lines.push(heading("Calendar"));
    match &data.calendar {
        Panel::Loaded(cal) => {
            lines.push(stat_line("Meetings", cal.total_meetings.to_string()));
            lines.push(stat_line(
                "Time in meetings",
                format_minutes(cal.total_duration_minutes),
            ));
            lines.push(stat_line(
                "Back-to-back",
                cal.back_to_back_meetings.to_string(),
            ));
        }
        other => lines.extend(panel_placeholder(other, Service::Google).unwrap_or_default()),
    }
    lines.push(Line::default());

    lines.push(heading("GitHub"));
    match &data.github {
        Panel::Loaded(gh) => {
            lines.push(stat_line("Commits", gh.commit_count.to_string()));
            lines.push(stat_line("Pull requests", gh.pr_count.to_string()));
            lines.push(stat_line("Reviews", gh.review_count.to_string()));
        }
        other => lines.extend(panel_placeholder(other, Service::Github).unwrap_or_default()),
    }
    lines.push(Line::default());

    lines.push(heading("AI Coach"));
    match &data.ai_analysis {
        Panel::Loaded(ai) if !ai.greeting.is_empty() => {
            lines.push(Line::from(format!(" {}", ai.greeting)));
            lines.push(Line::from(Span::styled(
                " Press 5 for the full analysis.",
                Style::default().fg(Color::DarkGray),
            )));
        }
        Panel::Failed(msg) => lines.push(Line::from(Span::styled(
            format!(" Analysis unavailable: {msg}"),
            Style::default().fg(Color::Red),
        ))),
        _ => lines.push(Line::from(Span::styled(
            " No analysis yet.",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    lines
}
