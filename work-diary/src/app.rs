// Application state and orchestration logic.
//
// The central event loop that coordinates user commands from the TUI,
// periodic dashboard refreshes, and the background fetch tasks. Pushes UI
// updates to the TUI render loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::{ApiError, WorkDiaryApi};
use crate::config::DashboardConfig;
use crate::dashboard::{self, DashboardData, DashboardError, SNAPSHOT_KEY};
use crate::protocol::{TabId, UiUpdate, UserCommand};
use crate::session::SessionStore;

/// Snapshot-cache key for the last active tab.
pub const TAB_SNAPSHOT_KEY: &str = "ui.active_tab";

// ---------------------------------------------------------------------------
// Background task results
// ---------------------------------------------------------------------------

/// Result of a spawned fetch, delivered back to the event loop.
#[derive(Debug)]
pub enum TaskEvent {
    Dashboard(Result<DashboardData, DashboardError>),
    Nudge(Result<String, ApiError>),
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub api: Arc<dyn WorkDiaryApi>,
    pub store: Arc<SessionStore>,
    pub refresh_interval: Duration,
    pub window_days: u32,
    /// Last dashboard received from the backend (or the cache).
    pub data: Option<DashboardData>,
    pub active_tab: TabId,
    /// Set once the backend rejects the session. No further fetches are
    /// started after this.
    pub session_expired: bool,
    pub refresh_task: Option<JoinHandle<()>>,
    pub nudge_task: Option<JoinHandle<()>>,
    /// Sender cloned into spawned tasks.
    pub task_tx: mpsc::Sender<TaskEvent>,
}

impl AppState {
    pub fn new(
        api: Arc<dyn WorkDiaryApi>,
        store: Arc<SessionStore>,
        config: &DashboardConfig,
        task_tx: mpsc::Sender<TaskEvent>,
    ) -> Self {
        AppState {
            api,
            store,
            refresh_interval: Duration::from_secs(config.refresh_interval_secs),
            window_days: config.analysis_window_days,
            data: None,
            active_tab: TabId::Overview,
            session_expired: false,
            refresh_task: None,
            nudge_task: None,
            task_tx,
        }
    }

    fn is_running(task: &Option<JoinHandle<()>>) -> bool {
        task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start a dashboard fetch unless one is already running. Returns true
    /// if a fetch was started.
    pub fn trigger_refresh(&mut self) -> bool {
        if self.session_expired {
            debug!("session expired, not refreshing");
            return false;
        }
        if Self::is_running(&self.refresh_task) {
            debug!("refresh already in flight");
            return false;
        }

        let api = Arc::clone(&self.api);
        let tx = self.task_tx.clone();
        let days = self.window_days;
        self.refresh_task = Some(tokio::spawn(async move {
            let result = dashboard::load_dashboard(api.as_ref(), days).await;
            let _ = tx.send(TaskEvent::Dashboard(result)).await;
        }));
        true
    }

    /// Start sending a nudge unless one is already in flight.
    pub fn trigger_nudge(&mut self) -> bool {
        if self.session_expired || Self::is_running(&self.nudge_task) {
            return false;
        }
        let api = Arc::clone(&self.api);
        let tx = self.task_tx.clone();
        self.nudge_task = Some(tokio::spawn(async move {
            let result = dashboard::send_nudge(api.as_ref()).await;
            let _ = tx.send(TaskEvent::Nudge(result)).await;
        }));
        true
    }

    /// Read the cached dashboard and tab from the session store.
    pub fn load_cached(&mut self) -> Option<DashboardData> {
        if let Ok(Some(value)) = self.store.load_snapshot(TAB_SNAPSHOT_KEY) {
            if let Ok(tab) = serde_json::from_value::<TabId>(value) {
                self.active_tab = tab;
            }
        }

        let value = match self.store.load_snapshot(SNAPSHOT_KEY) {
            Ok(v) => v?,
            Err(e) => {
                warn!(error = %e, "failed to read dashboard cache");
                return None;
            }
        };
        match serde_json::from_value::<DashboardData>(value) {
            Ok(data) => {
                self.data = Some(data.clone());
                Some(data)
            }
            Err(e) => {
                // Stale format from an older build; the next fetch overwrites it.
                debug!(error = %e, "ignoring unreadable dashboard cache");
                None
            }
        }
    }

    fn save_cache(&self, data: &DashboardData) {
        let result = serde_json::to_value(data)
            .map_err(anyhow::Error::from)
            .and_then(|value| self.store.save_snapshot(SNAPSHOT_KEY, &value));
        if let Err(e) = result {
            warn!(error = %e, "failed to cache dashboard");
        }
    }

    fn save_tab(&self) {
        let result = serde_json::to_value(self.active_tab)
            .map_err(anyhow::Error::from)
            .and_then(|value| self.store.save_snapshot(TAB_SNAPSHOT_KEY, &value));
        if let Err(e) = result {
            warn!(error = %e, "failed to remember active tab");
        }
    }

    /// Drop the session locally after the backend rejected it.
    fn expire_session(&mut self) {
        self.session_expired = true;
        self.data = None;
        if let Err(e) = self.api.logout() {
            warn!(error = %e, "failed to clear session");
        }
    }

    pub fn cancel_tasks(&mut self) {
        for task in [self.refresh_task.take(), self.nudge_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Run the application event loop.
///
/// Shows the cached dashboard (if any), starts an initial fetch, then
/// listens on the command channel, the task channel, and the refresh
/// timer until the user quits or the TUI goes away.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut task_rx: mpsc::Receiver<TaskEvent>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    if let Some(cached) = state.load_cached() {
        info!(fetched_at = %cached.fetched_at, "showing cached dashboard");
        let _ = ui_tx
            .send(UiUpdate::DashboardLoaded {
                data: Box::new(cached),
                cached: true,
            })
            .await;
    }
    let _ = ui_tx.send(UiUpdate::ActiveTab(state.active_tab)).await;

    if state.trigger_refresh() {
        let _ = ui_tx.send(UiUpdate::Loading).await;
    }

    let period = state.refresh_interval;
    let mut refresh_timer = tokio::time::interval_at(Instant::now() + period, period);
    refresh_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Background task results ---
            Some(event) = task_rx.recv() => {
                handle_task_event(&mut state, event, &ui_tx).await;
            }

            // --- Periodic refresh ---
            _ = refresh_timer.tick() => {
                debug!("periodic refresh");
                if state.trigger_refresh() {
                    let _ = ui_tx.send(UiUpdate::Loading).await;
                }
            }
        }
    }

    state.save_tab();
    state.cancel_tasks();
    info!("Application event loop exiting");
    Ok(())
}

/// Handle a user command from the TUI.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::Refresh => {
            info!("Manual refresh");
            if state.trigger_refresh() {
                let _ = ui_tx.send(UiUpdate::Loading).await;
            }
        }
        UserCommand::SendNudge => {
            info!("Sending nudge");
            if state.trigger_nudge() {
                let _ = ui_tx.send(UiUpdate::NudgeSending).await;
            }
        }
        UserCommand::SwitchTab(tab) => {
            state.active_tab = tab;
            debug!("Switched to tab: {:?}", tab);
        }
        UserCommand::Quit => {}
    }
}

/// Apply the result of a background task.
async fn handle_task_event(
    state: &mut AppState,
    event: TaskEvent,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match event {
        TaskEvent::Dashboard(Ok(data)) => {
            info!("dashboard refreshed");
            state.save_cache(&data);
            state.data = Some(data.clone());
            let _ = ui_tx
                .send(UiUpdate::DashboardLoaded {
                    data: Box::new(data),
                    cached: false,
                })
                .await;
        }
        TaskEvent::Dashboard(Err(e)) if e.requires_login() => {
            warn!("session rejected during refresh");
            state.expire_session();
            let _ = ui_tx.send(UiUpdate::SessionExpired).await;
        }
        TaskEvent::Dashboard(Err(e)) => {
            warn!(error = %e, "dashboard refresh failed");
            let _ = ui_tx.send(UiUpdate::LoadFailed(e.to_string())).await;
        }
        TaskEvent::Nudge(Ok(status)) => {
            let _ = ui_tx.send(UiUpdate::NudgeSent(status)).await;
        }
        TaskEvent::Nudge(Err(e)) if e.requires_login() => {
            warn!("session rejected while sending nudge");
            state.expire_session();
            let _ = ui_tx.send(UiUpdate::SessionExpired).await;
        }
        TaskEvent::Nudge(Err(e)) => {
            warn!(error = %e, "nudge failed");
            let _ = ui_tx.send(UiUpdate::NudgeFailed(e.to_string())).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
