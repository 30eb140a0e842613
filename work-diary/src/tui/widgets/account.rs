// Account sidebar: who is signed in and which sources are linked.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::api::{Service, User};
use crate::profile::{display_name, initials};
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = match &state.data {
        Some(data) => build_lines(&data.user),
        None => vec![Line::from(Span::styled(
            " Not loaded",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Account"));
    frame.render_widget(paragraph, area);
}

fn build_lines(user: &User) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" [{}] ", initials(user)),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {}", display_name(user)),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            format!(" {}", user.email),
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
    ];

    for service in Service::ALL {
        lines.push(connection_line(user, service));
    }
    if let Some(login) = user.github_username.as_deref().filter(|s| !s.is_empty()) {
        lines.push(Line::from(Span::styled(
            format!("   github: @{login}"),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines
}

fn connection_line(user: &User, service: Service) -> Line<'static> {
    let (mark, color) = if user.is_connected(service) {
        ("✓", Color::Green)
    } else {
        ("✗", Color::Red)
    };
    Line::from(vec![
        Span::styled(format!(" {mark} "), Style::default().fg(color)),
        Span::raw(service.label()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::tests::{draw_to_string, sample_dashboard};

    #[test]
    fn shows_user_and_connections() {
        let mut state = ViewState::default();
        state.data = Some(sample_dashboard());
        let screen = draw_to_string(40, 12, |f| render(f, f.area(), &state));
        assert!(screen.contains("[RP]"));
        assert!(screen.contains("Robin Park"));
        assert!(screen.contains("robin@example.com"));
        assert!(screen.contains("✓ Slack"));
        assert!(screen.contains("✓ Google Calendar"));
        assert!(screen.contains("✓ GitHub"));
        assert!(screen.contains("@robinp"));
    }

    #[test]
    fn missing_connection_is_marked() {
        let mut data = sample_dashboard();
        data.user.google_calendar_connected = false;
        data.user.github_username = None;
        let lines = build_lines(&data.user);
        let text: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert!(text.contains(&" ✗ Google Calendar".to_string()));
        assert!(text.contains(&" ✗ GitHub".to_string()));
    }

    #[test]
    fn no_data_placeholder() {
        let state = ViewState::default();
        let screen = draw_to_string(30, 5, |f| render(f, f.area(), &state));
        assert!(screen.contains("Not loaded"));
    }
}
