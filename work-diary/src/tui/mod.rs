// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors relevant parts of the application
// state. The app orchestrator pushes `UiUpdate` messages over an mpsc channel;
// the TUI applies them to `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::collections::HashMap;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;

use crate::dashboard::DashboardData;
use crate::protocol::{LoadStatus, TabId, UiUpdate, UserCommand};

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

/// One-line message shown above the help bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Notice {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Notice {
            text: text.into(),
            is_error: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the application state for rendering.
///
/// Updated incrementally via `UiUpdate` messages from the app orchestrator.
/// The `render_frame` function reads this struct to draw the dashboard.
pub struct ViewState {
    /// Latest dashboard, fresh or cached.
    pub data: Option<DashboardData>,
    /// True while `data` came from the local cache and no fresh fetch has
    /// landed yet.
    pub showing_cache: bool,
    pub load_status: LoadStatus,
    pub last_error: Option<String>,
    pub notice: Option<Notice>,
    pub session_expired: bool,
    pub nudge_sending: bool,
    /// Which tab is active in the main panel.
    pub active_tab: TabId,
    /// Per-widget scroll offsets (keyed by widget name).
    pub scroll_offset: HashMap<String, usize>,
    /// Whether the quit confirmation dialog is showing.
    pub confirm_quit: bool,
    /// Whether the send-nudge confirmation dialog is showing.
    pub confirm_nudge: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            data: None,
            showing_cache: false,
            load_status: LoadStatus::Idle,
            last_error: None,
            notice: None,
            session_expired: false,
            nudge_sending: false,
            active_tab: TabId::Overview,
            scroll_offset: HashMap::new(),
            confirm_quit: false,
            confirm_nudge: false,
        }
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Loading => {
            state.load_status = LoadStatus::Loading;
        }
        UiUpdate::DashboardLoaded { data, cached } => {
            state.data = Some(*data);
            state.showing_cache = cached;
            if !cached {
                state.load_status = LoadStatus::Loaded;
                state.last_error = None;
            }
        }
        UiUpdate::LoadFailed(message) => {
            state.load_status = LoadStatus::Failed;
            state.notice = Some(Notice::error(format!("Refresh failed: {message}")));
            state.last_error = Some(message);
        }
        UiUpdate::NudgeSending => {
            state.nudge_sending = true;
            state.notice = Some(Notice::info("Sending nudge..."));
        }
        UiUpdate::NudgeSent(status) => {
            state.nudge_sending = false;
            state.notice = Some(Notice::info(status));
        }
        UiUpdate::NudgeFailed(message) => {
            state.nudge_sending = false;
            state.notice = Some(Notice::error(format!("Nudge failed: {message}")));
        }
        UiUpdate::SessionExpired => {
            state.session_expired = true;
            state.data = None;
            state.showing_cache = false;
            state.nudge_sending = false;
            state.load_status = LoadStatus::Failed;
            state.notice = Some(Notice::error(
                "Session expired. Run `work-diary login` to sign in again.",
            ));
        }
        UiUpdate::ActiveTab(tab) => {
            state.active_tab = tab;
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    render_main_panel(frame, &layout, state);
    widgets::account::render(frame, layout.account, state);
    widgets::weekly_goal::render(frame, layout.weekly_goal, state);
    render_notice_bar(frame, &layout, state);
    render_help_bar(frame, &layout);

    // Dialogs render last so they sit on top.
    if state.confirm_quit {
        widgets::confirm::render(frame, frame.area(), " Quit? ", "Really quit?");
    } else if state.confirm_nudge {
        widgets::confirm::render(
            frame,
            frame.area(),
            " Send Nudge ",
            "Send this week's nudge to Slack?",
        );
    }
}

/// Pull the active tab's stored scroll offset back within its content, so
/// scrolling up after overshooting the end takes effect at once.
fn clamp_scroll(state: &mut ViewState, main_panel: Rect) {
    let tab = state.active_tab;
    let rows = match tab {
        TabId::Overview => widgets::overview::content_rows(state, main_panel),
        TabId::Slack => widgets::slack::content_rows(state),
        TabId::Calendar => widgets::calendar::content_rows(state),
        TabId::Github => widgets::github::content_rows(state, main_panel),
        TabId::Analysis => widgets::ai_analysis::content_rows(state, main_panel),
    };
    let max = widgets::max_scroll(rows, main_panel);
    if let Some(offset) = state.scroll_offset.get_mut(tab.scroll_key()) {
        *offset = (*offset).min(max);
    }
}

fn render_main_panel(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let area = layout.main_panel;
    match state.active_tab {
        TabId::Overview => widgets::overview::render(frame, area, state),
        TabId::Slack => widgets::slack::render(frame, area, state),
        TabId::Calendar => widgets::calendar::render(frame, area, state),
        TabId::Github => widgets::github::render(frame, area, state),
        TabId::Analysis => widgets::ai_analysis::render(frame, area, state),
    }
}

fn render_notice_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let line = match &state.notice {
        Some(notice) => {
            let color = if notice.is_error { Color::Red } else { Color::Green };
            Line::from(Span::styled(
                format!(" {}", notice.text),
                Style::default().fg(color),
            ))
        }
        None => Line::default(),
    };
    frame.render_widget(Paragraph::new(line), layout.notice_bar);
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout) {
    let text = " q:Quit | 1-5:Tabs | j/k:Scroll | r:Refresh | n:Send nudge | Esc:Dismiss";
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// This is the main entry point for the terminal UI. It:
/// 1. Initializes the terminal (enters raw mode, enables alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            // UI updates from the app orchestrator
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    // Channel closed: app is shutting down
                    None => break Ok(()),
                }
            }

            // Keyboard input
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break Ok(());
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Err(anyhow::Error::from(e)),
                    None => break Ok(()),
                }
            }

            _ = render_tick.tick() => {
                let drawn = terminal.draw(|frame| {
                    clamp_scroll(&mut view_state, build_layout(frame.area()).main_panel);
                    render_frame(frame, &view_state);
                });
                if let Err(e) = drawn {
                    break Err(anyhow::Error::from(e));
                }
            }
        }
    };

    ratatui::restore();
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
