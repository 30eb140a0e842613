// Backend protocol: request/response types, the API trait, and errors.
//
// The backend owns OAuth, aggregation, and AI generation. Everything here
// mirrors its JSON payloads; unknown fields are ignored and optional ones
// default so older or newer backends still decode.

pub mod client;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::BackendClient;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    /// No session token is stored; the user must log in first.
    #[error("not logged in")]
    NotLoggedIn,

    /// The backend rejected the token. The stored token has been removed.
    #[error("session expired, please log in again")]
    Unauthorized,

    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("network error: {0}")]
    Transport(String),

    #[error("failed to decode backend response: {0}")]
    Decode(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("session store error: {0}")]
    Session(String),
}

impl ApiError {
    /// True when the error means the session is gone and the user has to
    /// authenticate again.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::NotLoggedIn | ApiError::Unauthorized)
    }
}

// ---------------------------------------------------------------------------
// Account types
// ---------------------------------------------------------------------------

/// The authenticated user as returned by `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slack_user_id: Option<String>,
    #[serde(default)]
    pub slack_team_id: Option<String>,
    #[serde(default)]
    pub google_calendar_connected: bool,
    #[serde(default)]
    pub github_user_id: Option<String>,
    #[serde(default)]
    pub github_username: Option<String>,
}

impl User {
    pub fn slack_connected(&self) -> bool {
        self.slack_user_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    pub fn github_connected(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.github_username) || present(&self.github_user_id)
    }

    pub fn is_connected(&self, service: Service) -> bool {
        match service {
            Service::Slack => self.slack_connected(),
            Service::Google => self.google_calendar_connected,
            Service::Github => self.github_connected(),
        }
    }
}

/// The abbreviated user embedded in a login response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginUser {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slack_user_id: Option<String>,
    #[serde(default)]
    pub slack_team_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Generic `{status, message}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// An external account that can be linked through OAuth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Slack,
    Google,
    Github,
}

impl Service {
    pub const ALL: [Service; 3] = [Service::Slack, Service::Google, Service::Github];

    /// Path segment used by the backend (`/connect-{slug}`, `/disconnect-{slug}`).
    pub fn slug(self) -> &'static str {
        match self {
            Service::Slack => "slack",
            Service::Google => "google",
            Service::Github => "github",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Service::Slack => "Slack",
            Service::Google => "Google Calendar",
            Service::Github => "GitHub",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Service {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slack" => Ok(Service::Slack),
            "google" | "calendar" | "google-calendar" => Ok(Service::Google),
            "github" => Ok(Service::Github),
            other => Err(format!(
                "unknown service `{other}` (expected slack, google, or github)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Analytics payloads
// ---------------------------------------------------------------------------

/// Seven-day Slack communication analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackActivity {
    pub message_count: u32,
    pub dm_message_count: u32,
    pub channel_message_count: u32,
    pub after_hours_messages: u32,
    pub avg_response_time: f64,
    pub time_analysis: SlackTimeAnalysis,
    pub thread_analysis: SlackThreadAnalysis,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackTimeAnalysis {
    /// Message counts keyed by weekday name ("Monday", ...).
    pub daily_breakdown: BTreeMap<String, u32>,
    /// Message counts keyed by zero-padded hour ("00".."23").
    pub hourly_heatmap: BTreeMap<String, u32>,
    /// Top hours as `(hour, count)`, most active first.
    pub peak_hours: Vec<(String, u32)>,
    /// Weekdays as `(day, count)`, busiest first.
    pub busiest_days: Vec<(String, u32)>,
    /// Share of messages sent between 09:00 and 17:00, in `[0, 1]`.
    pub work_hours_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackThreadAnalysis {
    pub total_threads: u32,
    pub threads_initiated: u32,
    pub thread_replies: u32,
    pub avg_thread_length: f64,
    pub long_threads: u32,
    pub deep_discussions: Vec<DeepDiscussion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepDiscussion {
    pub channel: String,
    pub length: u32,
    pub user_participation: u32,
    pub topic: String,
}

/// Seven-day Google Calendar analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarActivity {
    pub total_meetings: u32,
    pub total_duration_minutes: f64,
    pub meetings_after_hours: u32,
    pub early_meetings: u32,
    pub back_to_back_meetings: u32,
    pub recurring_meetings: u32,
    pub longest_meeting_duration: f64,
    /// Meeting counts keyed by ISO date.
    pub daily_meeting_counts: BTreeMap<String, u32>,
    /// Meeting counts keyed by weekday name.
    pub weekly_patterns: BTreeMap<String, u32>,
    pub average_meeting_duration: Option<f64>,
    pub meetings_per_day: Option<f64>,
}

/// GitHub contribution analytics for the configured window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubActivity {
    pub commit_count: u32,
    pub pr_count: u32,
    pub review_count: u32,
    pub issue_count: u32,
    pub comment_count: u32,
    pub active_repos: Vec<String>,
    /// Event counts keyed by ISO date, then by GitHub event type.
    pub events_by_day: BTreeMap<String, BTreeMap<String, u32>>,
}

/// AI assessment of code and commit quality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeQuality {
    pub commit_quality: QualityScore,
    pub code_quality: QualityScore,
    pub best_practices: BestPractices,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityScore {
    /// Score in `[0, 10]`.
    pub score: f64,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BestPractices {
    pub followed: Vec<String>,
    pub suggested: Vec<String>,
}

/// Weekly AI coaching summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiAnalysis {
    pub greeting: String,
    pub key_patterns: Vec<String>,
    pub working_well: Vec<String>,
    pub opportunity_areas: Vec<String>,
    pub weekly_goal: WeeklyGoal,
    pub sign_off: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyGoal {
    pub title: String,
    pub steps: Vec<String>,
}

// ---------------------------------------------------------------------------
// API trait
// ---------------------------------------------------------------------------

/// Every backend operation the client performs.
///
/// `BackendClient` is the HTTP implementation; orchestration code takes
/// `&dyn WorkDiaryApi` so it can be driven by mocks in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkDiaryApi: Send + Sync {
    /// True when a session token is stored locally. Does not contact the
    /// backend.
    fn has_session(&self) -> bool;

    async fn signup(&self, request: &SignupRequest) -> Result<(), ApiError>;
    /// Exchange credentials for a token and store it.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;
    /// Forget the stored token and any cached data.
    fn logout(&self) -> Result<(), ApiError>;

    async fn current_user(&self) -> Result<User, ApiError>;
    async fn update_name(&self, name: &str) -> Result<(), ApiError>;
    async fn update_password(&self, password: &str) -> Result<(), ApiError>;
    async fn disconnect(&self, service: Service) -> Result<StatusResponse, ApiError>;

    async fn slack_activity(&self) -> Result<SlackActivity, ApiError>;
    async fn calendar_activity(&self) -> Result<CalendarActivity, ApiError>;
    async fn github_activity(&self, days: u32) -> Result<GithubActivity, ApiError>;
    async fn code_quality(&self) -> Result<CodeQuality, ApiError>;
    async fn ai_analysis(&self) -> Result<AiAnalysis, ApiError>;

    async fn send_nudge(&self) -> Result<StatusResponse, ApiError>;
}

// ---------------------------------------------------------------------------
// Session checks
// ---------------------------------------------------------------------------

/// Validate the stored session against the backend.
///
/// Returns the current user, or `None` after clearing the local session if
/// the token is missing, rejected, or the backend is unreachable.
pub async fn check_auth(api: &dyn WorkDiaryApi) -> Option<User> {
    match api.current_user().await {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::debug!(error = %e, "auth check failed, clearing session");
            if let Err(e) = api.logout() {
                tracing::warn!(error = %e, "failed to clear session");
            }
            None
        }
    }
}

/// True iff the current user has linked a Slack account. Any failure counts
/// as not connected.
pub async fn check_slack_connection(api: &dyn WorkDiaryApi) -> bool {
    match api.current_user().await {
        Ok(user) => user.slack_connected(),
        Err(e) => {
            tracing::debug!(error = %e, "slack connection check failed");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
