// Dashboard orchestration: landing route, the dependent analytics fetches,
// and nudges.
//
// Slack is the required source. Calendar, GitHub, code-quality insights and
// the AI summary are optional panels whose failures are recorded on the
// panel instead of aborting the load.

pub mod series;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{
    AiAnalysis, ApiError, CalendarActivity, CodeQuality, GithubActivity, Service, SlackActivity,
    User, WorkDiaryApi,
};

/// Snapshot-cache key for the last successful dashboard.
pub const SNAPSHOT_KEY: &str = "dashboard";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Slack is not connected; run `work-diary connect slack` first")]
    SlackNotConnected,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl DashboardError {
    pub fn requires_login(&self) -> bool {
        matches!(self, DashboardError::Api(e) if e.requires_login())
    }
}

/// Where a user should land after starting the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// No valid session: log in or sign up.
    Auth,
    /// Logged in, but Slack is not linked yet.
    ConnectSlack,
    Dashboard,
    /// A token is stored but the backend could not confirm it (unreachable
    /// or erroring). Only produced by `startup_route`.
    Offline,
}

/// State of one optional dashboard panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Panel<T> {
    Loaded(T),
    /// The backing service is not linked, or the panel does not apply.
    NotConnected,
    /// The fetch failed; the message is shown in place of the data.
    Failed(String),
}

impl<T> Panel<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Panel::Loaded(v) => Some(v),
            _ => None,
        }
    }
}

/// Everything the dashboard shows, as of `fetched_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub user: User,
    pub slack: SlackActivity,
    pub calendar: Panel<CalendarActivity>,
    pub github: Panel<GithubActivity>,
    /// Only fetched when GitHub loaded with at least one commit.
    pub code_quality: Panel<CodeQuality>,
    pub ai_analysis: Panel<AiAnalysis>,
    pub fetched_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Decide the landing route for the current session. Any failure to
/// fetch the user lands on `Auth`.
pub async fn landing_route(api: &dyn WorkDiaryApi) -> Route {
    match startup_route(api).await {
        Route::Offline => Route::Auth,
        route => route,
    }
}

/// Like `landing_route`, but keeps a session the backend never rejected:
/// only a missing or rejected token lands on `Auth`, other failures give
/// `Offline` so the cached dashboard can still be shown.
pub async fn startup_route(api: &dyn WorkDiaryApi) -> Route {
    if !api.has_session() {
        return Route::Auth;
    }
    match api.current_user().await {
        Ok(user) if user.slack_connected() => Route::Dashboard,
        Ok(_) => Route::ConnectSlack,
        Err(e) if e.requires_login() => {
            warn!(error = %e, "session rejected at startup");
            Route::Auth
        }
        Err(e) => {
            warn!(error = %e, "backend unavailable at startup");
            Route::Offline
        }
    }
}

/// Fetch the full dashboard.
///
/// The user fetch and the Slack fetch are fatal. Calendar, GitHub and the
/// AI summary are fetched concurrently once Slack succeeded; code quality
/// follows GitHub when it reports commits. Any 401 aborts the load since
/// the session is gone.
pub async fn load_dashboard(
    api: &dyn WorkDiaryApi,
    window_days: u32,
) -> Result<DashboardData, DashboardError> {
    let user = api.current_user().await?;
    if !user.slack_connected() {
        return Err(DashboardError::SlackNotConnected);
    }

    let slack = api.slack_activity().await?;
    info!(messages = slack.message_count, "slack activity loaded");

    let calendar = async {
        if user.is_connected(Service::Google) {
            panel("calendar", api.calendar_activity().await)
        } else {
            Ok(Panel::NotConnected)
        }
    };

    let github = async {
        if !user.is_connected(Service::Github) {
            return Ok((Panel::NotConnected, Panel::NotConnected));
        }
        let github = panel("github", api.github_activity(window_days).await)?;
        let has_commits = github.loaded().is_some_and(|g| g.commit_count > 0);
        let quality = if has_commits {
            panel("code quality", api.code_quality().await)?
        } else {
            Panel::NotConnected
        };
        Ok::<_, ApiError>((github, quality))
    };

    let ai = async { panel("ai analysis", api.ai_analysis().await) };

    let (calendar, github, ai_analysis) = tokio::join!(calendar, github, ai);
    let (github, code_quality) = github?;

    Ok(DashboardData {
        user,
        slack,
        calendar: calendar?,
        github,
        code_quality,
        ai_analysis: ai_analysis?,
        fetched_at: Utc::now(),
    })
}

/// Ask the backend to send the AI nudge to the user's Slack. Returns the
/// backend's status text.
pub async fn send_nudge(api: &dyn WorkDiaryApi) -> Result<String, ApiError> {
    let resp = api.send_nudge().await?;
    info!(status = %resp.status, "nudge sent");
    Ok(resp.status)
}

/// Turn an optional fetch into a panel. Session loss stays an error so the
/// caller can end the session.
fn panel<T>(name: &str, result: Result<T, ApiError>) -> Result<Panel<T>, ApiError> {
    match result {
        Ok(v) => Ok(Panel::Loaded(v)),
        Err(e) if e.requires_login() => Err(e),
        Err(e) => {
            warn!(panel = name, error = %e, "optional panel failed");
            Ok(Panel::Failed(e.to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
