// Status bar widget: load indicator, signed-in user, tab indicator.

use chrono::{DateTime, Local, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::profile;
use crate::protocol::{LoadStatus, TabId};
use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [load indicator] [user] [freshness] [tab bar]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = Vec::new();

    let (dot, dot_color) = load_indicator(state.load_status);
    spans.push(Span::styled(format!(" {} ", dot), Style::default().fg(dot_color)));

    let user = state
        .data
        .as_ref()
        .map(|d| profile::display_name(&d.user))
        .unwrap_or_else(|| "Not signed in".to_string());
    spans.push(Span::styled(
        user,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ));

    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
    spans.push(Span::styled(
        freshness_text(state),
        Style::default().fg(Color::Gray),
    ));
    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));

    spans.extend(tab_spans(state.active_tab));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Return the load dot character and its color.
pub fn load_indicator(status: LoadStatus) -> (&'static str, Color) {
    match status {
        LoadStatus::Idle => ("●", Color::DarkGray),
        LoadStatus::Loading => ("●", Color::Yellow),
        LoadStatus::Loaded => ("●", Color::Green),
        LoadStatus::Failed => ("●", Color::Red),
    }
}

/// "refreshing...", "updated 09:41", "cached 09:41", "stale since 09:41",
/// or "offline". A failed refresh outranks the cache label.
pub fn freshness_text(state: &ViewState) -> String {
    if state.session_expired {
        return "session expired".to_string();
    }
    let stamp = state.data.as_ref().map(|d| clock(d.fetched_at));
    match (state.load_status, stamp) {
        (LoadStatus::Loading, _) => "refreshing...".to_string(),
        (LoadStatus::Failed, Some(at)) => format!("stale since {at}"),
        (_, Some(at)) if state.showing_cache => format!("cached {at}"),
        (LoadStatus::Failed, None) => "offline".to_string(),
        (_, Some(at)) => format!("updated {at}"),
        (_, None) => "no data".to_string(),
    }
}

fn clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

/// Build tab indicator spans with the active tab highlighted.
/// E.g. "[1:Overview] [2:Slack] [3:Calendar] [4:GitHub] [5:AI Analysis]"
pub fn tab_spans(active: TabId) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, tab_id) in TabId::ALL.iter().enumerate() {
        let style = if *tab_id == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("[{}:{}]", i + 1, tab_id.label()), style));
        spans.push(Span::raw(" "));
    }
    spans
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
