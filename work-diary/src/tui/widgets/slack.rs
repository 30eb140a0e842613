// Slack tab: message volume, timing, and thread activity.

use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::{bar_line, bullet_lines, clamped_scroll, heading, no_data_lines, stat_line};
use crate::api::SlackActivity;
use crate::dashboard::series;
use crate::protocol::TabId;
use crate::tui::ViewState;

const BAR_WIDTH: usize = 30;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = lines(state);
    let scroll = clamped_scroll(state, TabId::Slack.scroll_key(), lines.len(), area);

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Slack Activity"))
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Rows of content; this tab does not wrap.
pub fn content_rows(state: &ViewState) -> usize {
    lines(state).len()
}

fn lines(state: &ViewState) -> Vec<Line<'static>> {
    match &state.data {
        Some(data) => build_lines(&data.slack),
        None => no_data_lines(state),
    }
}

fn build_lines(slack: &SlackActivity) -> Vec<Line<'static>> {
    let mut lines = vec![
        heading("Messages"),
        stat_line("Total", slack.message_count.to_string()),
        stat_line("Direct messages", slack.dm_message_count.to_string()),
        stat_line("In channels", slack.channel_message_count.to_string()),
        stat_line("After hours", slack.after_hours_messages.to_string()),
        stat_line(
            "Avg response",
            format!("{:.1} min", slack.avg_response_time),
        ),
        stat_line(
            "In work hours",
            format!("{:.0}%", slack.time_analysis.work_hours_ratio * 100.0),
        ),
        Line::default(),
    ];

    let busiest = series::busiest_days(&slack.time_analysis, 3);
    if !busiest.is_empty() {
        let names: Vec<String> = busiest
            .iter()
            .map(|(day, n)| format!("{day} ({n})"))
            .collect();
        lines.push(stat_line("Busiest days", names.join(", ")));
    }
    let peaks = series::peak_hours(&slack.time_analysis, 3);
    if !peaks.is_empty() {
        let hours: Vec<String> = peaks.iter().map(|(h, _)| format!("{h:02}:00")).collect();
        lines.push(stat_line("Peak hours", hours.join(", ")));
    }
    lines.push(Line::default());

    lines.push(heading("By day"));
    let week = series::weekly_pattern(&slack.time_analysis.daily_breakdown);
    let max = week.iter().map(|(_, n)| *n).max().unwrap_or(0);
    for (day, n) in &week {
        lines.push(bar_line(&day[..3], 3, *n, max, BAR_WIDTH, Color::Magenta));
    }
    lines.push(Line::default());

    lines.push(heading("By hour"));
    let hours = series::hourly_heatmap(&slack.time_analysis);
    let max = hours.iter().copied().max().unwrap_or(0);
    for (h, n) in hours.iter().enumerate() {
        let color = if (9..17).contains(&h) {
            Color::Green
        } else {
            Color::Yellow
        };
        lines.push(bar_line(&format!("{h:02}"), 2, *n, max, BAR_WIDTH, color));
    }
    lines.push(Line::default());

    let threads = &slack.thread_analysis;
    lines.push(heading("Threads"));
    lines.push(stat_line("Threads", threads.total_threads.to_string()));
    lines.push(stat_line("Started by you", threads.threads_initiated.to_string()));
    lines.push(stat_line("Replies", threads.thread_replies.to_string()));
    lines.push(stat_line(
        "Avg length",
        format!("{:.1}", threads.avg_thread_length),
    ));
    if !threads.deep_discussions.is_empty() {
        lines.push(Line::default());
        lines.push(heading("Deep discussions"));
        let items: Vec<String> = threads
            .deep_discussions
            .iter()
            .map(|d| format!("#{} ({} messages): {}", d.channel, d.length, d.topic))
            .collect();
        lines.extend(bullet_lines(&items, Color::Magenta));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DeepDiscussion;
    use crate::tui::tests::{draw_to_string, sample_dashboard};

    #[test]
    fn renders_counts_and_busiest_day() {
        let mut state = ViewState::default();
        state.data = Some(sample_dashboard());
        let screen = draw_to_string(90, 20, |f| render(f, f.area(), &state));
        assert!(screen.contains("Slack Activity"));
        assert!(screen.contains("120"));
        assert!(screen.contains("Tuesday (40)"));
        assert!(screen.contains("10:00"));
    }

    #[test]
    fn hourly_section_has_every_hour() {
        let lines = build_lines(&sample_dashboard().slack);
        let text: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert!(text.iter().any(|l| l.starts_with(" 00 ")));
        assert!(text.iter().any(|l| l.starts_with(" 23 ")));
    }

    #[test]
    fn deep_discussions_listed_when_present() {
        let mut slack = sample_dashboard().slack;
        slack.thread_analysis.deep_discussions.push(DeepDiscussion {
            channel: "eng".into(),
            length: 14,
            user_participation: 5,
            topic: "release plan".into(),
        });
        let lines = build_lines(&slack);
        let last: String = lines
            .last()
            .unwrap()
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert!(last.contains("#eng (14 messages): release plan"));
    }

    #[test]
    fn scrolled_view_moves_past_header() {
        let mut state = ViewState::default();
        state.data = Some(sample_dashboard());
        state.scroll_offset.insert("slack".into(), 20);
        let screen = draw_to_string(90, 12, |f| render(f, f.area(), &state));
        assert!(!screen.contains("Direct messages"));
    }
}
