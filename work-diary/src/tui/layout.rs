// Screen layout: panel arrangement and sizing.
//
// Divides the terminal area into fixed zones for the dashboard:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +-------------------------+------------------------+
// | Main Panel (68%)         | Sidebar (32%)          |
// |                          | +- Account (55%) -----+|
// |                          | +- Weekly Goal (45%) -+|
// +-------------------------+------------------------+
// | Notice Bar (1 row)                                |
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each dashboard zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: user, load status, tab bar.
    pub status_bar: Rect,
    /// Left side of the middle section: tab-switched content area.
    pub main_panel: Rect,
    /// Right sidebar top: profile and connected services.
    pub account: Rect,
    /// Right sidebar bottom: this week's AI goal.
    pub weekly_goal: Rect,
    /// Transient messages (nudge result, refresh errors).
    pub notice_bar: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the dashboard layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    // Vertical: status(1) | middle(fill) | notice(1) | help(1)
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(8),    // middle section (main + sidebar)
            Constraint::Length(1), // notice bar
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let status_bar = vertical[0];
    let middle = vertical[1];
    let notice_bar = vertical[2];
    let help_bar = vertical[3];

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(middle);

    let main_panel = horizontal[0];

    let sidebar_sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(horizontal[1]);

    AppLayout {
        status_bar,
        main_panel,
        account: sidebar_sections[0],
        weekly_goal: sidebar_sections[1],
        notice_bar,
        help_bar,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
