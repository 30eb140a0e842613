// Calendar tab: meeting load and how it spreads across the week.

use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::{bar_line, clamped_scroll, heading, no_data_lines, panel_placeholder, stat_line};
use crate::api::{CalendarActivity, Service};
use crate::dashboard::series::{self, format_minutes};
use crate::dashboard::Panel;
use crate::protocol::TabId;
use crate::tui::ViewState;

const BAR_WIDTH: usize = 30;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = lines(state);
    let scroll = clamped_scroll(state, TabId::Calendar.scroll_key(), lines.len(), area);

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Calendar"))
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

pub fn content_rows(state: &ViewState) -> usize {
    lines(state).len()
}

fn lines(state: &ViewState) -> Vec<Line<'static>> {
    match state.data.as_ref().map(|d| &d.calendar) {
        Some(Panel::Loaded(cal)) => build_lines(cal),
        Some(panel) => panel_placeholder(panel, Service::Google).unwrap_or_default(),
        None => no_data_lines(state),
    }
}

fn build_lines(cal: &CalendarActivity) -> Vec<Line<'static>> {
    let mut lines = vec![
        heading("Meetings"),
        stat_line("Total", cal.total_meetings.to_string()),
        stat_line("Time in meetings", format_minutes(cal.total_duration_minutes)),
        stat_line("Average length", format_minutes(average_minutes(cal))),
        stat_line("Longest", format_minutes(cal.longest_meeting_duration)),
        stat_line("Per day", format!("{:.1}", meetings_per_day(cal))),
        stat_line("Back-to-back", cal.back_to_back_meetings.to_string()),
        stat_line("Recurring", cal.recurring_meetings.to_string()),
        stat_line("Before 9am", cal.early_meetings.to_string()),
        stat_line("After hours", cal.meetings_after_hours.to_string()),
        Line::default(),
        heading("By weekday"),
    ];

    let week = series::weekly_pattern(&cal.weekly_patterns);
    let max = week.iter().map(|(_, n)| *n).max().unwrap_or(0);
    for (day, n) in &week {
        lines.push(bar_line(&day[..3], 3, *n, max, BAR_WIDTH, Color::Blue));
    }

    let daily = series::by_date(&cal.daily_meeting_counts);
    if !daily.is_empty() {
        lines.push(Line::default());
        lines.push(heading("By date"));
        let max = daily.iter().map(|(_, n)| *n).max().unwrap_or(0);
        for (date, n) in &daily {
            lines.push(bar_line(series::short_date(date), 5, *n, max, BAR_WIDTH, Color::Cyan));
        }
    }

    lines
}

/// Backend value when present, otherwise derived from the totals.
fn average_minutes(cal: &CalendarActivity) -> f64 {
    cal.average_meeting_duration.unwrap_or_else(|| {
        if cal.total_meetings == 0 {
            0.0
        } else {
            cal.total_duration_minutes / f64::from(cal.total_meetings)
        }
    })
}

fn meetings_per_day(cal: &CalendarActivity) -> f64 {
    cal.meetings_per_day.unwrap_or_else(|| {
        let days = cal.daily_meeting_counts.len();
        if days == 0 {
            0.0
        } else {
            f64::from(cal.total_meetings) / days as f64
        }
    })
}
