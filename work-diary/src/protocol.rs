// Message types passed between the app orchestrator and the TUI.

use serde::{Deserialize, Serialize};

use crate::dashboard::DashboardData;

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

/// Main-panel tabs, in the order of their number keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TabId {
    Overview,
    Slack,
    Calendar,
    Github,
    Analysis,
}

impl TabId {
    pub const ALL: [TabId; 5] = [
        TabId::Overview,
        TabId::Slack,
        TabId::Calendar,
        TabId::Github,
        TabId::Analysis,
    ];

    /// Tab for number key `n` (1-based).
    pub fn from_number(n: u32) -> Option<TabId> {
        let idx = usize::try_from(n.checked_sub(1)?).ok()?;
        Self::ALL.get(idx).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            TabId::Overview => "Overview",
            TabId::Slack => "Slack",
            TabId::Calendar => "Calendar",
            TabId::Github => "GitHub",
            TabId::Analysis => "AI Analysis",
        }
    }

    /// Key used for this tab's scroll offset.
    pub fn scroll_key(self) -> &'static str {
        match self {
            TabId::Overview => "overview",
            TabId::Slack => "slack",
            TabId::Calendar => "calendar",
            TabId::Github => "github",
            TabId::Analysis => "analysis",
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Dashboard fetch state shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    Failed,
}

// ---------------------------------------------------------------------------
// App -> TUI
// ---------------------------------------------------------------------------

/// Updates pushed from the app orchestrator to the TUI.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    /// A dashboard fetch started.
    Loading,
    /// Fresh or cached dashboard data. `cached` is true when the data came
    /// from the local snapshot rather than the backend.
    DashboardLoaded {
        data: Box<DashboardData>,
        cached: bool,
    },
    LoadFailed(String),
    NudgeSending,
    NudgeSent(String),
    NudgeFailed(String),
    /// The backend rejected the session; the token has been cleared.
    SessionExpired,
    /// Restore the tab that was active when the app last exited.
    ActiveTab(TabId),
}

// ---------------------------------------------------------------------------
// TUI -> App
// ---------------------------------------------------------------------------

/// Commands sent from the TUI to the app orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Refresh,
    SendNudge,
    SwitchTab(TabId),
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_number_keys() {
        assert_eq!(TabId::from_number(1), Some(TabId::Overview));
        assert_eq!(TabId::from_number(5), Some(TabId::Analysis));
        assert_eq!(TabId::from_number(0), None);
        assert_eq!(TabId::from_number(6), None);
    }

    #[test]
    fn scroll_keys_are_distinct() {
        let mut keys: Vec<&str> = TabId::ALL.iter().map(|t| t.scroll_key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), TabId::ALL.len());
    }
}
