// HTTP implementation of `WorkDiaryApi` using reqwest.
//
// Every authenticated call goes through `send_authed`, which reads the token
// from the session store, attaches it as a bearer header, and drops the
// session when the backend answers 401.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{
    AiAnalysis, ApiError, CalendarActivity, CodeQuality, GithubActivity, LoginResponse, Service,
    SignupRequest, SlackActivity, StatusResponse, User, WorkDiaryApi,
};
use crate::config::BackendConfig;
use crate::session::SessionStore;

// ---------------------------------------------------------------------------
// BackendClient
// ---------------------------------------------------------------------------

/// Client for the Work Diary backend.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<SessionStore>,
}

impl BackendClient {
    /// Build a client from the `[backend]` config section.
    pub fn new(config: &BackendConfig, store: Arc<SessionStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Browser URL that starts the OAuth flow for `service`. GitHub needs
    /// the account email to associate the callback with the user.
    pub fn connect_url(&self, service: Service, user_email: Option<&str>) -> String {
        connect_url(&self.base_url, service, user_email)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn token(&self) -> Result<String, ApiError> {
        self.store
            .get_token()
            .map_err(|e| ApiError::Session(e.to_string()))?
            .ok_or(ApiError::NotLoggedIn)
    }

    /// Send `request` with the stored bearer token.
    ///
    /// Never touches the network without a token. A 401 removes the token
    /// before returning `Unauthorized`.
    async fn send_authed(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let token = self.token()?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("backend rejected session token, logging out");
            self.store
                .remove_token()
                .map_err(|e| ApiError::Session(e.to_string()))?;
            return Err(ApiError::Unauthorized);
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(path, "GET");
        let response = self.send_authed(self.http.get(self.url(path))).await?;
        read_json(response).await
    }

    async fn put_user(&self, body: Value) -> Result<(), ApiError> {
        let request = self.http.put(self.url("/users/me")).json(&body);
        let response = self.send_authed(request).await?;
        ensure_success(response).await
    }
}

#[async_trait]
impl WorkDiaryApi for BackendClient {
    fn has_session(&self) -> bool {
        matches!(self.store.get_token(), Ok(Some(_)))
    }

    async fn signup(&self, request: &SignupRequest) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("/signup"))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        ensure_success(response).await?;
        info!(email = %request.email, "account created");

        // The backend does not return a token from signup.
        self.login(&request.email, &request.password).await?;
        Ok(())
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .http
            .post(self.url("/login"))
            .form(&[("username", email), ("password", password)])
            .send()
            .await
            .map_err(transport_error)?;
        let login: LoginResponse = read_json(response).await?;

        self.store
            .set_token(&login.access_token)
            .map_err(|e| ApiError::Session(e.to_string()))?;
        info!(email = %login.user.email, "logged in");
        Ok(login)
    }

    fn logout(&self) -> Result<(), ApiError> {
        self.store
            .remove_token()
            .map_err(|e| ApiError::Session(e.to_string()))
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.get_json("/users/me").await
    }

    async fn update_name(&self, name: &str) -> Result<(), ApiError> {
        self.put_user(serde_json::json!({ "name": name })).await
    }

    async fn update_password(&self, password: &str) -> Result<(), ApiError> {
        self.put_user(serde_json::json!({ "password": password })).await
    }

    async fn disconnect(&self, service: Service) -> Result<StatusResponse, ApiError> {
        let path = format!("/disconnect-{}", service.slug());
        let response = self.send_authed(self.http.post(self.url(&path))).await?;
        read_json(response).await
    }

    async fn slack_activity(&self) -> Result<SlackActivity, ApiError> {
        self.get_json("/slack/activity").await
    }

    async fn calendar_activity(&self) -> Result<CalendarActivity, ApiError> {
        self.get_json("/calendar/activity").await
    }

    async fn github_activity(&self, days: u32) -> Result<GithubActivity, ApiError> {
        let request = self
            .http
            .get(self.url("/github/activity"))
            .query(&[("days", days)]);
        let response = self.send_authed(request).await?;
        read_json(response).await
    }

    async fn code_quality(&self) -> Result<CodeQuality, ApiError> {
        self.get_json("/github/code-quality").await
    }

    async fn ai_analysis(&self) -> Result<AiAnalysis, ApiError> {
        self.get_json("/ai/analysis").await
    }

    async fn send_nudge(&self) -> Result<StatusResponse, ApiError> {
        let response = self
            .send_authed(self.http.post(self.url("/slack/send-nudge")))
            .await?;
        read_json(response).await
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Build the OAuth start URL for `service` against `base_url`.
pub fn connect_url(base_url: &str, service: Service, user_email: Option<&str>) -> String {
    let base = format!("{}/connect-{}", base_url.trim_end_matches('/'), service.slug());
    match (service, user_email) {
        (Service::Github, Some(email)) => {
            match reqwest::Url::parse_with_params(&base, &[("user_email", email)]) {
                Ok(url) => url.to_string(),
                Err(_) => base,
            }
        }
        _ => base,
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Transport("request timed out".to_string())
    } else {
        ApiError::Transport(err.to_string())
    }
}

async fn read_body(response: Response) -> Result<(StatusCode, String), ApiError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;
    Ok((status, body))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let (status, body) = read_body(response).await?;
    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

async fn ensure_success(response: Response) -> Result<(), ApiError> {
    let (status, body) = read_body(response).await?;
    if status.is_success() {
        Ok(())
    } else {
        Err(status_error(status, &body))
    }
}

fn status_error(status: StatusCode, body: &str) -> ApiError {
    ApiError::Status {
        status: status.as_u16(),
        detail: error_detail(body),
    }
}

/// Pull a human-readable message out of an error body.
///
/// Handles `{"detail": "..."}` and the validation form
/// `{"detail": [{"msg": "..."}, ...]}`; anything else falls back to the raw
/// text.
pub(crate) fn error_detail(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| match v.get("detail")? {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg")?.as_str())
                    .collect();
                (!msgs.is_empty()).then(|| msgs.join("; "))
            }
            _ => None,
        });

    match from_json {
        Some(detail) => detail,
        None if body.trim().is_empty() => "no details".to_string(),
        None => body.trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
