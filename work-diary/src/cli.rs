// Command-line interface: argument parsing and the one-shot commands.
//
// Every command except `dashboard` runs to completion against the backend
// and prints a short plain-text result. `dashboard` (the default) is
// launched by the binary since it needs the terminal.

use std::fmt::Write as _;
use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::api::client::connect_url;
use crate::api::{self, Service, SignupRequest, WorkDiaryApi};
use crate::dashboard::series::{self, format_minutes};
use crate::dashboard::{self, DashboardData, Panel};
use crate::profile::{self, display_name};

#[derive(Parser, Debug)]
#[command(name = "work-diary", version, long_about = None)]
#[command(about = "Weekly work-life balance dashboard for Slack, Calendar and GitHub")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    #[command(about = "Create an account and sign in")]
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, help = "Prompted for when omitted")]
        password: Option<String>,
    },
    #[command(about = "Sign in and store the session token")]
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, help = "Prompted for when omitted")]
        password: Option<String>,
    },
    #[command(about = "Forget the stored session and cached data")]
    Logout,
    #[command(about = "Show the signed-in user and linked services")]
    Status,
    #[command(about = "Print the URL that links a service (slack, google, github)")]
    Connect { service: Service },
    #[command(about = "Unlink a service (slack, google, github)")]
    Disconnect { service: Service },
    #[command(about = "Change your display name")]
    SetName { name: String },
    #[command(about = "Change your password")]
    SetPassword {
        #[arg(long, help = "Prompted for when omitted")]
        password: Option<String>,
        #[arg(long, help = "Prompted for when omitted")]
        confirm: Option<String>,
    },
    #[command(about = "Send this week's AI nudge to your Slack")]
    Nudge,
    #[command(about = "Print this week's dashboard as plain text")]
    Summary,
    #[command(about = "Open the terminal dashboard (default)")]
    Dashboard,
}

/// What a one-shot command needs besides its arguments.
pub struct CliContext<'a> {
    pub api: &'a dyn WorkDiaryApi,
    pub base_url: &'a str,
    pub window_days: u32,
}

/// Run a one-shot command, reading prompts from `input` and writing
/// results to `out`.
pub async fn execute(
    command: Command,
    ctx: &CliContext<'_>,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<()> {
    let api = ctx.api;
    match command {
        Command::Signup {
            email,
            name,
            password,
        } => {
            let password = read_secret(password, "Password: ", input, out)?;
            let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
            api.signup(&SignupRequest {
                email: email.clone(),
                password,
                name,
            })
            .await?;
            writeln!(out, "Account created. Signed in as {email}.")?;
            writeln!(out, "Next: run `work-diary connect slack` to link Slack.")?;
        }
        Command::Login { email, password } => {
            let password = read_secret(password, "Password: ", input, out)?;
            let resp = api.login(&email, &password).await?;
            let who = resp
                .user
                .name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(&resp.user.email);
            writeln!(out, "Signed in as {who}.")?;
            if !resp
                .user
                .slack_user_id
                .as_deref()
                .is_some_and(|id| !id.is_empty())
            {
                writeln!(out, "Next: run `work-diary connect slack` to link Slack.")?;
            }
        }
        Command::Logout => {
            api.logout()?;
            writeln!(out, "Signed out.")?;
        }
        Command::Status => write_status(api, out).await?,
        Command::Connect { service } => {
            let email = if service == Service::Github && api.has_session() {
                api.current_user().await.ok().map(|u| u.email)
            } else {
                None
            };
            let url = connect_url(ctx.base_url, service, email.as_deref());
            writeln!(out, "Open this URL in your browser to connect {service}:")?;
            writeln!(out, "  {url}")?;
        }
        Command::Disconnect { service } => {
            require_session(api)?;
            profile::disconnect(api, service).await?;
            writeln!(out, "{service} disconnected.")?;
        }
        Command::SetName { name } => {
            require_session(api)?;
            profile::update_name(api, &name).await?;
            writeln!(out, "Name updated.")?;
        }
        Command::SetPassword { password, confirm } => {
            require_session(api)?;
            let password = read_secret(password, "New password: ", input, out)?;
            let confirm = read_secret(confirm, "Confirm password: ", input, out)?;
            profile::update_password(api, &password, &confirm).await?;
            writeln!(out, "Password updated.")?;
        }
        Command::Nudge => {
            require_session(api)?;
            if !api::check_slack_connection(api).await {
                bail!("Slack is not connected. Run `work-diary connect slack` first.");
            }
            let status = dashboard::send_nudge(api).await?;
            writeln!(out, "Nudge sent ({status}).")?;
        }
        Command::Summary => {
            require_session(api)?;
            let data = dashboard::load_dashboard(api, ctx.window_days).await?;
            write!(out, "{}", render_summary(&data))?;
        }
        Command::Dashboard => bail!("the dashboard needs an interactive terminal"),
    }
    Ok(())
}

fn require_session(api: &dyn WorkDiaryApi) -> Result<()> {
    if !api.has_session() {
        bail!("Not signed in. Run `work-diary login --email <email>` first.");
    }
    Ok(())
}

fn read_secret(
    value: Option<String>,
    prompt: &str,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn write_status(api: &dyn WorkDiaryApi, out: &mut dyn Write) -> Result<()> {
    if !api.has_session() {
        writeln!(out, "Not signed in. Run `work-diary login --email <email>`.")?;
        return Ok(());
    }
    let Some(user) = api::check_auth(api).await else {
        writeln!(
            out,
            "Session expired. Run `work-diary login --email <email>` to sign in again."
        )?;
        return Ok(());
    };

    writeln!(out, "Signed in as {} <{}>", display_name(&user), user.email)?;
    for service in Service::ALL {
        if user.is_connected(service) {
            writeln!(out, "  ✓ {service}")?;
        } else {
            writeln!(
                out,
                "  ✗ {service} (run `work-diary connect {}`)",
                service.slug()
            )?;
        }
    }
    if user.slack_connected() {
        writeln!(out, "Dashboard ready: run `work-diary` to open it.")?;
    } else {
        writeln!(out, "Connect Slack to unlock your dashboard.")?;
    }
    Ok(())
}

/// Plain-text rendering of a loaded dashboard.
pub fn render_summary(data: &DashboardData) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "Work Diary for {} <{}>", display_name(&data.user), data.user.email);
    let _ = writeln!(s, "Fetched {}", data.fetched_at.format("%Y-%m-%d %H:%M UTC"));

    let slack = &data.slack;
    let _ = writeln!(s, "\nSlack");
    let _ = writeln!(
        s,
        "  {} messages ({} direct, {} in channels), {} after hours",
        slack.message_count,
        slack.dm_message_count,
        slack.channel_message_count,
        slack.after_hours_messages
    );
    let _ = writeln!(
        s,
        "  {:.0}% in work hours, {:.1} min average response",
        slack.time_analysis.work_hours_ratio * 100.0,
        slack.avg_response_time
    );
    let busiest = series::busiest_days(&slack.time_analysis, 3);
    if !busiest.is_empty() {
        let days: Vec<String> = busiest.iter().map(|(d, n)| format!("{d} ({n})")).collect();
        let _ = writeln!(s, "  Busiest: {}", days.join(", "));
    }

    let _ = writeln!(s, "\nCalendar");
    match &data.calendar {
        Panel::Loaded(cal) => {
            let _ = writeln!(
                s,
                "  {} meetings, {} total, {} back-to-back, {} after hours",
                cal.total_meetings,
                format_minutes(cal.total_duration_minutes),
                cal.back_to_back_meetings,
                cal.meetings_after_hours
            );
        }
        other => write_panel_gap(&mut s, other, Service::Google),
    }

    let _ = writeln!(s, "\nGitHub");
    match &data.github {
        Panel::Loaded(gh) => {
            let _ = writeln!(
                s,
                "  {} commits, {} PRs, {} reviews, {} issues",
                gh.commit_count, gh.pr_count, gh.review_count, gh.issue_count
            );
            if !gh.active_repos.is_empty() {
                let _ = writeln!(s, "  Repos: {}", gh.active_repos.join(", "));
            }
            if let Panel::Loaded(q) = &data.code_quality {
                if !q.summary.is_empty() {
                    let _ = writeln!(s, "  {}", q.summary);
                }
            }
        }
        other => write_panel_gap(&mut s, other, Service::Github),
    }

    if let Panel::Loaded(ai) = &data.ai_analysis {
        let _ = writeln!(s, "\nAI Coach");
        if !ai.greeting.is_empty() {
            let _ = writeln!(s, "  {}", ai.greeting);
        }
        if !ai.weekly_goal.title.is_empty() {
            let _ = writeln!(s, "  Goal: {}", ai.weekly_goal.title);
        }
        for (i, step) in ai.weekly_goal.steps.iter().enumerate() {
            let _ = writeln!(s, "    {}. {step}", i + 1);
        }
    }
    s
}

fn write_panel_gap<T>(s: &mut String, panel: &Panel<T>, service: Service) {
    let _ = match panel {
        Panel::NotConnected => writeln!(s, "  not connected (run `work-diary connect {}`)", service.slug()),
        Panel::Failed(msg) => writeln!(s, "  unavailable: {msg}"),
        Panel::Loaded(_) => Ok(()),
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, LoginResponse, LoginUser, MockWorkDiaryApi, User};
    use crate::tui::tests::sample_dashboard;

    fn user(slack: bool) -> User {
        User {
            id: 7,
            email: "robin@example.com".into(),
            name: Some("Robin Park".into()),
            slack_user_id: slack.then(|| "U1".to_string()),
            slack_team_id: None,
            google_calendar_connected: false,
            github_user_id: None,
            github_username: None,
        }
    }

    async fn run(api: &MockWorkDiaryApi, command: Command, stdin: &str) -> (Result<()>, String) {
        let ctx = CliContext {
            api,
            base_url: "https://localhost:8000",
            window_days: 7,
        };
        let mut input = stdin.as_bytes();
        let mut out = Vec::new();
        let result = execute(command, &ctx, &mut input, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["work-diary"]).unwrap();
        assert_eq!(cli.command, None);

        let cli = Cli::try_parse_from(["work-diary", "connect", "calendar"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Connect {
                service: Service::Google
            })
        );

        let cli = Cli::try_parse_from(["work-diary", "set-name", "Robin"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::SetName {
                name: "Robin".into()
            })
        );

        assert!(Cli::try_parse_from(["work-diary", "connect", "teams"]).is_err());
    }

    #[tokio::test]
    async fn status_without_session() {
        let mut api = MockWorkDiaryApi::new();
        api.expect_has_session().return_const(false);
        let (result, out) = run(&api, Command::Status, "").await;
        assert!(result.is_ok());
        assert!(out.contains("Not signed in"));
    }

    #[tokio::test]
    async fn status_lists_connections() {
        let mut api = MockWorkDiaryApi::new();
        api.expect_has_session().return_const(true);
        api.expect_current_user().returning(|| Ok(user(false)));
        let (result, out) = run(&api, Command::Status, "").await;
        assert!(result.is_ok());
        assert!(out.contains("Signed in as Robin Park <robin@example.com>"));
        assert!(out.contains("✗ Slack (run `work-diary connect slack`)"));
        assert!(out.contains("Connect Slack to unlock"));
    }

    #[tokio::test]
    async fn status_with_rejected_session_clears_it() {
        let mut api = MockWorkDiaryApi::new();
        api.expect_has_session().return_const(true);
        api.expect_current_user()
            .returning(|| Err(ApiError::Unauthorized));
        api.expect_logout().times(1).returning(|| Ok(()));
        let (result, out) = run(&api, Command::Status, "").await;
        assert!(result.is_ok());
        assert!(out.contains("Session expired"));
    }

    #[tokio::test]
    async fn login_prompts_for_password() {
        let mut api = MockWorkDiaryApi::new();
        api.expect_login()
            .withf(|email, password| email.to_string() == "robin@example.com" && password.to_string() == "hunter22")
            .times(1)
            .returning(|_, _| {
                Ok(LoginResponse {
                    access_token: "tok".into(),
                    token_type: "bearer".into(),
                    user: LoginUser {
                        email: "robin@example.com".into(),
                        name: None,
                        slack_user_id: None,
                        slack_team_id: None,
                    },
                })
            });
        let (result, out) = run(
            &api,
            Command::Login {
                email: "robin@example.com".into(),
                password: None,
            },
            "hunter22\n",
        )
        .await;
        assert!(result.is_ok());
        assert!(out.starts_with("Password: "));
        assert!(out.contains("Signed in as robin@example.com."));
        assert!(out.contains("connect slack"));
    }

    #[tokio::test]
    async fn connect_github_carries_email() {
        let mut api = MockWorkDiaryApi::new();
        api.expect_has_session().return_const(true);
        api.expect_current_user().returning(|| Ok(user(true)));
        let (result, out) = run(
            &api,
            Command::Connect {
                service: Service::Github,
            },
            "",
        )
        .await;
        assert!(result.is_ok());
        assert!(out.contains("https://localhost:8000/connect-github?user_email=robin%40example.com"));
    }

    #[tokio::test]
    async fn connect_slack_needs_no_session() {
        let api = MockWorkDiaryApi::new();
        let (result, out) = run(
            &api,
            Command::Connect {
                service: Service::Slack,
            },
            "",
        )
        .await;
        assert!(result.is_ok());
        assert!(out.contains("https://localhost:8000/connect-slack"));
    }

    #[tokio::test]
    async fn set_password_mismatch_is_rejected_locally() {
        let mut api = MockWorkDiaryApi::new();
        api.expect_has_session().return_const(true);
        api.expect_update_password().times(0);
        let (result, _) = run(
            &api,
            Command::SetPassword {
                password: None,
                confirm: None,
            },
            "abcdef\nabcdeg\n",
        )
        .await;
        assert_eq!(result.unwrap_err().to_string(), "Passwords do not match!");
    }

    #[tokio::test]
    async fn nudge_requires_slack() {
        let mut api = MockWorkDiaryApi::new();
        api.expect_has_session().return_const(true);
        api.expect_current_user().returning(|| Ok(user(false)));
        api.expect_send_nudge().times(0);
        let (result, _) = run(&api, Command::Nudge, "").await;
        assert!(result.unwrap_err().to_string().contains("Slack is not connected"));
    }

    #[tokio::test]
    async fn commands_need_a_session() {
        let mut api = MockWorkDiaryApi::new();
        api.expect_has_session().return_const(false);
        let (result, _) = run(&api, Command::Summary, "").await;
        assert!(result.unwrap_err().to_string().contains("Not signed in"));
    }

    #[test]
    fn summary_covers_each_source() {
        let text = render_summary(&sample_dashboard());
        assert!(text.contains("Work Diary for Robin Park <robin@example.com>"));
        assert!(text.contains("120 messages"));
        assert!(text.contains("Busiest: Tuesday (40)"));
        assert!(text.contains("18 meetings, 14h 00m total"));
        assert!(text.contains("25 commits"));
        assert!(text.contains("Goal: Protect focus time"));
        assert!(text.contains("1. Block 2h each morning"));
    }

    #[test]
    fn summary_marks_missing_panels() {
        let mut data = sample_dashboard();
        data.calendar = Panel::NotConnected;
        data.github = Panel::Failed("rate limited".into());
        let text = render_summary(&data);
        assert!(text.contains("not connected (run `work-diary connect google`)"));
        assert!(text.contains("unavailable: rate limited"));
    }
}
