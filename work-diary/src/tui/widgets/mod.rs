// TUI widget modules for each dashboard panel, plus the line builders they
// share.

pub mod account;
pub mod ai_analysis;
pub mod calendar;
pub mod confirm;
pub mod github;
pub mod overview;
pub mod slack;
pub mod status_bar;
pub mod weekly_goal;

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::api::Service;
use crate::dashboard::Panel;
use crate::protocol::LoadStatus;
use crate::tui::ViewState;

/// Horizontal bar: `label  ████████      12`.
pub fn bar_line(
    label: &str,
    label_width: usize,
    value: u32,
    max: u32,
    bar_width: usize,
    color: Color,
) -> Line<'static> {
    let filled = if max == 0 {
        0
    } else {
        ((value as f64 / max as f64) * bar_width as f64).round() as usize
    };
    let filled = filled.min(bar_width);
    Line::from(vec![
        Span::styled(
            format!(" {:<width$} ", truncate(label, label_width), width = label_width),
            Style::default().fg(Color::Gray),
        ),
        Span::styled("█".repeat(filled), Style::default().fg(color)),
        Span::raw(" ".repeat(bar_width - filled)),
        Span::styled(format!(" {value}"), Style::default().fg(Color::White)),
    ])
}

/// `  Label:  value` with the value highlighted.
pub fn stat_line(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {label:<18}"), Style::default().fg(Color::Gray)),
        Span::styled(
            value.into(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
    ])
}

pub fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {text}"),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Bulleted list, or a dim "none" line when empty.
pub fn bullet_lines(items: &[String], color: Color) -> Vec<Line<'static>> {
    if items.is_empty() {
        return vec![Line::from(Span::styled(
            "   (none)",
            Style::default().fg(Color::DarkGray),
        ))];
    }
    items
        .iter()
        .map(|item| {
            Line::from(vec![
                Span::styled("   • ", Style::default().fg(color)),
                Span::raw(item.clone()),
            ])
        })
        .collect()
}

/// Lines shown in place of a panel that is not loaded.
pub fn panel_placeholder<T>(panel: &Panel<T>, service: Service) -> Option<Vec<Line<'static>>> {
    match panel {
        Panel::Loaded(_) => None,
        Panel::NotConnected => Some(vec![
            Line::from(Span::styled(
                format!(" {service} is not connected."),
                Style::default().fg(Color::Yellow),
            )),
            Line::from(Span::styled(
                format!(" Run `work-diary connect {}` to link it.", service.slug()),
                Style::default().fg(Color::DarkGray),
            )),
        ]),
        Panel::Failed(msg) => Some(vec![Line::from(Span::styled(
            format!(" Failed to load {service} data: {msg}"),
            Style::default().fg(Color::Red),
        ))]),
    }
}

/// Lines shown when there is no dashboard at all yet.
pub fn no_data_lines(state: &ViewState) -> Vec<Line<'static>> {
    let (text, color) = if state.session_expired {
        (
            "Session expired. Run `work-diary login` to sign in again.".to_string(),
            Color::Red,
        )
    } else {
        match state.load_status {
            LoadStatus::Failed => (
                state
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "Failed to load dashboard.".to_string()),
                Color::Red,
            ),
            _ => ("Loading your dashboard...".to_string(), Color::DarkGray),
        }
    };
    vec![Line::from(Span::styled(
        format!(" {text}"),
        Style::default().fg(color),
    ))]
}

/// Largest useful scroll offset for `total_rows` of content in a bordered
/// `area`.
pub fn max_scroll(total_rows: usize, area: Rect) -> usize {
    let visible_rows = (area.height as usize).saturating_sub(2);
    total_rows.saturating_sub(visible_rows)
}

/// Clamp the stored scroll offset for `key` so the last row stays on
/// screen.
pub fn clamped_scroll(state: &ViewState, key: &str, total_rows: usize, area: Rect) -> u16 {
    let offset = state.scroll_offset.get(key).copied().unwrap_or(0);
    offset
        .min(max_scroll(total_rows, area))
        .min(u16::MAX as usize) as u16
}

/// Screen rows `lines` take once wrapped inside a bordered `area`.
pub fn wrapped_rows(lines: &[Line], area: Rect) -> usize {
    let width = area.width.saturating_sub(2) as usize;
    lines.iter().map(|line| line_rows(line, width)).sum()
}

// Greedy word wrap, close to what `Paragraph` does with `Wrap`. Words
// wider than the row are split across rows.
fn line_rows(line: &Line, width: usize) -> usize {
    if width == 0 {
        return 1;
    }
    let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
    let mut rows = 1;
    let mut col = 0;
    let mut started = false;
    for word in text.split(' ') {
        let w = Span::raw(word).width();
        let needed = if started { col + 1 + w } else { w };
        started = true;
        if needed <= width {
            col = needed;
            continue;
        }
        if col > 0 {
            rows += 1;
        }
        rows += w.saturating_sub(1) / width;
        col = if w == 0 { 0 } else { (w - 1) % width + 1 };
    }
    rows
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max.saturating_sub(1)).chain(['…']).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
