// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (scrolling, dialogs).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::ViewState;
use crate::protocol::{TabId, UserCommand};

/// Lines moved by PageUp/PageDown.
const PAGE_SIZE: usize = 20;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator (e.g. Refresh, Quit). Returns `None` when the key press
/// was handled locally by mutating `ViewState`.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // On Windows, crossterm emits both Press and Release events for each
    // physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode
    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }
    if view_state.confirm_nudge {
        return handle_confirm_nudge(key_event, view_state);
    }

    match key_event.code {
        KeyCode::Char(c @ '1'..='5') => {
            let tab = TabId::from_number(c.to_digit(10)?)?;
            switch_tab(view_state, tab)
        }
        KeyCode::Tab => switch_tab(view_state, next_tab(view_state.active_tab, 1)),
        KeyCode::BackTab => switch_tab(view_state, next_tab(view_state.active_tab, -1)),

        KeyCode::Up | KeyCode::Char('k') => {
            scroll(view_state, -1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            scroll(view_state, 1);
            None
        }
        KeyCode::PageUp => {
            scroll(view_state, -(PAGE_SIZE as isize));
            None
        }
        KeyCode::PageDown => {
            scroll(view_state, PAGE_SIZE as isize);
            None
        }

        KeyCode::Char('r') => Some(UserCommand::Refresh),

        // Nudges need a live session and go through a confirmation dialog.
        KeyCode::Char('n') => {
            if !view_state.session_expired && !view_state.nudge_sending {
                view_state.confirm_nudge = true;
            }
            None
        }

        KeyCode::Esc => {
            view_state.notice = None;
            None
        }

        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }

        _ => None,
    }
}

/// In quit confirmation mode `y`/`q` quit, `n`/Esc cancel, and everything
/// else is blocked.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

fn handle_confirm_nudge(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            view_state.confirm_nudge = false;
            Some(UserCommand::SendNudge)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_nudge = false;
            None
        }
        _ => None,
    }
}

fn switch_tab(view_state: &mut ViewState, tab: TabId) -> Option<UserCommand> {
    if view_state.active_tab == tab {
        return None;
    }
    view_state.active_tab = tab;
    Some(UserCommand::SwitchTab(tab))
}

fn next_tab(current: TabId, step: isize) -> TabId {
    let len = TabId::ALL.len() as isize;
    let idx = TabId::ALL.iter().position(|t| *t == current).unwrap_or(0) as isize;
    TabId::ALL[(idx + step).rem_euclid(len) as usize]
}

/// Move the active tab's scroll offset by `delta` lines, saturating at 0.
/// The render loop pulls it back within the content before each frame.
fn scroll(view_state: &mut ViewState, delta: isize) {
    let key = view_state.active_tab.scroll_key();
    let offset = view_state
        .scroll_offset
        .entry(key.to_string())
        .or_insert(0);
    *offset = offset.saturating_add_signed(delta);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl_key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    // -- Tabs --

    #[test]
    fn number_keys_switch_tabs() {
        let mut state = ViewState::default();
        let result = handle_key(key(KeyCode::Char('4')), &mut state);
        assert_eq!(result, Some(UserCommand::SwitchTab(TabId::Github)));
        assert_eq!(state.active_tab, TabId::Github);

        let result = handle_key(key(KeyCode::Char('5')), &mut state);
        assert_eq!(result, Some(UserCommand::SwitchTab(TabId::Analysis)));
    }

    #[test]
    fn same_tab_sends_nothing() {
        let mut state = ViewState::default();
        assert!(handle_key(key(KeyCode::Char('1')), &mut state).is_none());
        assert_eq!(state.active_tab, TabId::Overview);
    }

    #[test]
    fn tab_and_backtab_cycle() {
        let mut state = ViewState::default();
        handle_key(key(KeyCode::Tab), &mut state);
        assert_eq!(state.active_tab, TabId::Slack);
        handle_key(key(KeyCode::BackTab), &mut state);
        handle_key(key(KeyCode::BackTab), &mut state);
        assert_eq!(state.active_tab, TabId::Analysis);
    }

    // -- Scroll --

    #[test]
    fn j_and_k_scroll_active_tab() {
        let mut state = ViewState::default();
        state.active_tab = TabId::Slack;
        handle_key(key(KeyCode::Char('j')), &mut state);
        handle_key(key(KeyCode::Down), &mut state);
        assert_eq!(state.scroll_offset["slack"], 2);
        handle_key(key(KeyCode::Char('k')), &mut state);
        assert_eq!(state.scroll_offset["slack"], 1);
        assert!(state.scroll_offset.get("overview").is_none());
    }

    #[test]
    fn scroll_up_does_not_underflow() {
        let mut state = ViewState::default();
        handle_key(key(KeyCode::Up), &mut state);
        assert_eq!(state.scroll_offset["overview"], 0);
    }

    #[test]
    fn page_keys_scroll_by_page() {
        let mut state = ViewState::default();
        handle_key(key(KeyCode::PageDown), &mut state);
        assert_eq!(state.scroll_offset["overview"], 20);
        state.scroll_offset.insert("overview".into(), 25);
        handle_key(key(KeyCode::PageUp), &mut state);
        assert_eq!(state.scroll_offset["overview"], 5);
    }

    // -- Commands --

    #[test]
    fn r_requests_refresh() {
        let mut state = ViewState::default();
        assert_eq!(
            handle_key(key(KeyCode::Char('r')), &mut state),
            Some(UserCommand::Refresh)
        );
    }

    #[test]
    fn nudge_requires_confirmation() {
        let mut state = ViewState::default();
        assert!(handle_key(key(KeyCode::Char('n')), &mut state).is_none());
        assert!(state.confirm_nudge);

        // Other keys are blocked while the dialog is up.
        assert!(handle_key(key(KeyCode::Char('r')), &mut state).is_none());
        assert!(state.confirm_nudge);

        assert_eq!(
            handle_key(key(KeyCode::Char('y')), &mut state),
            Some(UserCommand::SendNudge)
        );
        assert!(!state.confirm_nudge);
    }

    #[test]
    fn nudge_can_be_cancelled() {
        let mut state = ViewState::default();
        handle_key(key(KeyCode::Char('n')), &mut state);
        assert!(handle_key(key(KeyCode::Esc), &mut state).is_none());
        assert!(!state.confirm_nudge);
    }

    #[test]
    fn nudge_blocked_after_session_expiry_or_while_sending() {
        let mut state = ViewState::default();
        state.session_expired = true;
        handle_key(key(KeyCode::Char('n')), &mut state);
        assert!(!state.confirm_nudge);

        let mut state = ViewState::default();
        state.nudge_sending = true;
        handle_key(key(KeyCode::Char('n')), &mut state);
        assert!(!state.confirm_nudge);
    }

    #[test]
    fn esc_dismisses_notice() {
        let mut state = ViewState::default();
        state.notice = Some(super::super::Notice {
            text: "hi".into(),
            is_error: false,
        });
        handle_key(key(KeyCode::Esc), &mut state);
        assert!(state.notice.is_none());
    }

    // -- Quit --

    #[test]
    fn q_enters_confirm_mode() {
        let mut state = ViewState::default();
        assert!(handle_key(key(KeyCode::Char('q')), &mut state).is_none());
        assert!(state.confirm_quit);
    }

    #[test]
    fn confirm_quit_y_quits() {
        let mut state = ViewState::default();
        state.confirm_quit = true;
        assert_eq!(
            handle_key(key(KeyCode::Char('y')), &mut state),
            Some(UserCommand::Quit)
        );
    }

    #[test]
    fn confirm_quit_n_cancels_and_blocks_others() {
        let mut state = ViewState::default();
        state.confirm_quit = true;
        assert!(handle_key(key(KeyCode::Char('2')), &mut state).is_none());
        assert_eq!(state.active_tab, TabId::Overview);
        assert!(handle_key(key(KeyCode::Char('n')), &mut state).is_none());
        assert!(!state.confirm_quit);
    }

    #[test]
    fn ctrl_c_quits_from_any_mode() {
        let mut state = ViewState::default();
        state.confirm_nudge = true;
        assert_eq!(
            handle_key(ctrl_key(KeyCode::Char('c')), &mut state),
            Some(UserCommand::Quit)
        );
    }

    #[test]
    fn release_events_are_ignored() {
        let mut state = ViewState::default();
        let mut event = key(KeyCode::Char('q'));
        event.kind = KeyEventKind::Release;
        assert!(handle_key(event, &mut state).is_none());
        assert!(!state.confirm_quit);
    }
}
