// GitHub tab: contribution counts, daily activity, event mix, and the
// code-quality insights when available.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use super::{
    bar_line, bullet_lines, clamped_scroll, heading, no_data_lines, panel_placeholder, stat_line,
    wrapped_rows,
};
use crate::api::{CodeQuality, GithubActivity, QualityScore, Service};
use crate::dashboard::{series, Panel};
use crate::protocol::TabId;
use crate::tui::ViewState;

const BAR_WIDTH: usize = 30;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = lines(state);
    let rows = wrapped_rows(&lines, area);
    let scroll = clamped_scroll(state, TabId::Github.scroll_key(), rows, area);

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("GitHub"))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

pub fn content_rows(state: &ViewState, area: Rect) -> usize {
    wrapped_rows(&lines(state), area)
}

fn lines(state: &ViewState) -> Vec<Line<'static>> {
    match &state.data {
        Some(data) => match &data.github {
            Panel::Loaded(gh) => build_lines(gh, &data.code_quality),
            panel => panel_placeholder(panel, Service::Github).unwrap_or_default(),
        },
        None => no_data_lines(state),
    }
}

fn build_lines(gh: &GithubActivity, quality: &Panel<CodeQuality>) -> Vec<Line<'static>> {
    let mut lines = vec![
        heading("Contributions"),
        stat_line("Commits", gh.commit_count.to_string()),
        stat_line("Pull requests", gh.pr_count.to_string()),
        stat_line("Reviews", gh.review_count.to_string()),
        stat_line("Issues", gh.issue_count.to_string()),
        stat_line("Comments", gh.comment_count.to_string()),
        stat_line(
            "Active repos",
            if gh.active_repos.is_empty() {
                "none".to_string()
            } else {
                gh.active_repos.join(", ")
            },
        ),
    ];

    let daily = series::github_daily_totals(gh);
    if !daily.is_empty() {
        lines.push(Line::default());
        lines.push(heading("Events per day"));
        let max = daily.iter().map(|(_, n)| *n).max().unwrap_or(0);
        for (date, n) in &daily {
            lines.push(bar_line(series::short_date(date), 5, *n, max, BAR_WIDTH, Color::Green));
        }
    }

    let kinds = series::event_type_distribution(gh);
    if !kinds.is_empty() {
        lines.push(Line::default());
        lines.push(heading("Event types"));
        let max = kinds.first().map(|(_, n)| *n).unwrap_or(0);
        for (kind, n) in &kinds {
            lines.push(bar_line(kind, 14, *n, max, BAR_WIDTH, Color::LightGreen));
        }
    }

    lines.push(Line::default());
    lines.push(heading("Code quality"));
    match quality {
        Panel::Loaded(q) => lines.extend(quality_lines(q)),
        Panel::NotConnected => lines.push(Line::from(Span::styled(
            " Insights appear once you have commits in this window.",
            Style::default().fg(Color::DarkGray),
        ))),
        Panel::Failed(msg) => lines.push(Line::from(Span::styled(
            format!(" Insights unavailable: {msg}"),
            Style::default().fg(Color::Red),
        ))),
    }

    lines
}

fn quality_lines(q: &CodeQuality) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if !q.summary.is_empty() {
        lines.push(Line::from(format!(" {}", q.summary)));
    }
    lines.extend(score_lines("Commit quality", &q.commit_quality));
    lines.extend(score_lines("Code quality", &q.code_quality));
    lines.push(stat_line("Practices followed", ""));
    lines.extend(bullet_lines(&q.best_practices.followed, Color::Green));
    lines.push(stat_line("Worth adopting", ""));
    lines.extend(bullet_lines(&q.best_practices.suggested, Color::Yellow));
    lines
}

fn score_lines(label: &str, score: &QualityScore) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::styled(format!(" {label:<18}"), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{:.1}/10", score.score),
            Style::default().fg(score_color(score.score)),
        ),
    ])];
    lines.extend(bullet_lines(&score.strengths, Color::Green));
    if !score.improvements.is_empty() {
        lines.extend(bullet_lines(&score.improvements, Color::Yellow));
    }
    lines
}

pub fn score_color(score: f64) -> Color {
    if score >= 7.5 {
        Color::Green
    } else if score >= 5.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::tests::{draw_to_string, sample_dashboard};

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn score_colors() {
        assert_eq!(score_color(8.0), Color::Green);
        assert_eq!(score_color(6.0), Color::Yellow);
        assert_eq!(score_color(2.0), Color::Red);
    }

    #[test]
    fn quality_failure_is_shown_inline() {
        let data = sample_dashboard();
        let Panel::Loaded(gh) = &data.github else {
            panic!("sample github should be loaded");
        };
        let out = text(&build_lines(gh, &data.code_quality));
        assert!(out.contains("Commits"));
        assert!(out.contains("acme/api"));
        assert!(out.contains("Push"));
        assert!(out.contains("Insights unavailable: model overloaded"));
    }

    #[test]
    fn quality_scores_rendered() {
        let gh = GithubActivity {
            commit_count: 3,
            ..Default::default()
        };
        let quality = Panel::Loaded(CodeQuality {
            commit_quality: QualityScore {
                score: 8.5,
                strengths: vec!["Small commits".into()],
                improvements: vec![],
            },
            summary: "Solid week".into(),
            ..Default::default()
        });
        let out = text(&build_lines(&gh, &quality));
        assert!(out.contains("Solid week"));
        assert!(out.contains("8.5/10"));
        assert!(out.contains("Small commits"));
    }

    #[test]
    fn renders_not_connected_hint() {
        let mut data = sample_dashboard();
        data.github = Panel::NotConnected;
        let mut state = ViewState::default();
        state.data = Some(data);
        let screen = draw_to_string(80, 10, |f| render(f, f.area(), &state));
        assert!(screen.contains("GitHub is not connected."));
    }
}
