// Profile editing and account display helpers.

use tracing::info;

use crate::api::{ApiError, Service, User, WorkDiaryApi};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Check a new password and its confirmation before sending it.
pub fn validate_password_change(password: &str, confirm: &str) -> Result<(), ApiError> {
    if password != confirm {
        return Err(ApiError::InvalidInput("Passwords do not match!".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long!"
        )));
    }
    Ok(())
}

pub async fn update_name(api: &dyn WorkDiaryApi, name: &str) -> Result<(), ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("Name cannot be empty".to_string()));
    }
    api.update_name(name).await?;
    info!("name updated");
    Ok(())
}

/// Validate, then change the password. Nothing is sent when validation
/// fails.
pub async fn update_password(
    api: &dyn WorkDiaryApi,
    password: &str,
    confirm: &str,
) -> Result<(), ApiError> {
    validate_password_change(password, confirm)?;
    api.update_password(password).await?;
    info!("password updated");
    Ok(())
}

/// Unlink `service`. Succeeds only when the backend reports `"success"`.
pub async fn disconnect(api: &dyn WorkDiaryApi, service: Service) -> Result<(), ApiError> {
    let resp = api.disconnect(service).await?;
    if resp.status == "success" {
        info!(%service, "service disconnected");
        Ok(())
    } else {
        Err(ApiError::Status {
            status: 200,
            detail: resp
                .message
                .unwrap_or_else(|| format!("Failed to disconnect {service}")),
        })
    }
}

/// The user's name, falling back to the local part of their email.
pub fn display_name(user: &User) -> String {
    match user.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => user
            .email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Avatar initials: first letter of each word of the name, else the first
/// letter of the email, else `U`.
pub fn initials(user: &User) -> String {
    if let Some(name) = user.name.as_deref() {
        let from_name: String = name
            .split_whitespace()
            .filter_map(|w| w.chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        if !from_name.is_empty() {
            return from_name;
        }
    }
    user.email
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "U".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockWorkDiaryApi, StatusResponse};

    fn user(name: Option<&str>, email: &str) -> User {
        User {
            id: 1,
            email: email.into(),
            name: name.map(Into::into),
            slack_user_id: None,
            slack_team_id: None,
            google_calendar_connected: false,
            github_user_id: None,
            github_username: None,
        }
    }

    #[test]
    fn password_mismatch_checked_first() {
        let err = validate_password_change("abc", "abd").unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match!");
    }

    #[test]
    fn password_too_short() {
        let err = validate_password_change("abc12", "abc12").unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters long!");
        assert!(validate_password_change("abc123", "abc123").is_ok());
    }

    #[tokio::test]
    async fn invalid_password_never_reaches_backend() {
        let mut api = MockWorkDiaryApi::new();
        api.expect_update_password().never();
        assert!(update_password(&api, "short", "short").await.is_err());
    }

    #[tokio::test]
    async fn valid_password_is_sent() {
        let mut api = MockWorkDiaryApi::new();
        api.expect_update_password()
            .withf(|p| p.to_string() == "hunter22")
            .times(1)
            .returning(|_| Ok(()));
        update_password(&api, "hunter22", "hunter22").await.unwrap();
    }

    #[tokio::test]
    async fn update_name_trims_and_rejects_empty() {
        let mut api = MockWorkDiaryApi::new();
        api.expect_update_name()
            .withf(|n| n.to_string() == "Ada")
            .times(1)
            .returning(|_| Ok(()));
        update_name(&api, "  Ada ").await.unwrap();
        assert!(matches!(
            update_name(&api, "   ").await,
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn disconnect_requires_success_status() {
        let mut api = MockWorkDiaryApi::new();
        api.expect_disconnect()
            .withf(|s| *s == Service::Slack)
            .returning(|_| {
                Ok(StatusResponse {
                    status: "success".into(),
                    message: None,
                })
            });
        api.expect_disconnect()
            .withf(|s| *s == Service::Github)
            .returning(|_| {
                Ok(StatusResponse {
                    status: "error".into(),
                    message: Some("not linked".into()),
                })
            });

        disconnect(&api, Service::Slack).await.unwrap();
        let err = disconnect(&api, Service::Github).await.unwrap_err();
        assert!(err.to_string().contains("not linked"));
    }

    #[test]
    fn display_name_fallbacks() {
        assert_eq!(display_name(&user(Some("Ada Lovelace"), "ada@x.io")), "Ada Lovelace");
        assert_eq!(display_name(&user(Some("  "), "ada@x.io")), "ada");
        assert_eq!(display_name(&user(None, "grace@x.io")), "grace");
    }

    #[test]
    fn initials_fallbacks() {
        assert_eq!(initials(&user(Some("ada king lovelace"), "a@x.io")), "AKL");
        assert_eq!(initials(&user(None, "grace@x.io")), "G");
        assert_eq!(initials(&user(Some(""), "")), "U");
    }
}
