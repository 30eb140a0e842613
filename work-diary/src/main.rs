// Work Diary entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Load config
// 3. Initialize tracing (log to file, not terminal)
// 4. Open the session store, seeding it from credentials.toml if empty
// 5. Build the backend client
// 6. Run a one-shot command, or the dashboard (app task + TUI)

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};

use work_diary::api::{BackendClient, Service, WorkDiaryApi};
use work_diary::app;
use work_diary::cli::{self, Cli, CliContext, Command};
use work_diary::config::{self, Config};
use work_diary::dashboard::{self, Route};
use work_diary::session::SessionStore;
use work_diary::tui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse arguments
    let args = Cli::parse();

    // 2. Load config; logging needs its directory
    let config = config::load_config().context("failed to load configuration")?;

    // 3. Initialize tracing
    init_tracing(&config)?;
    info!(backend = %config.backend.base_url, "work-diary starting up");

    // 4. Open the session store
    let store = Arc::new(
        SessionStore::open(&config.session.db_path, config.session.token_max_age_days)
            .context("failed to open session store")?,
    );
    seed_token(&store, &config)?;

    // 5. Build the backend client
    let client = Arc::new(
        BackendClient::new(&config.backend, Arc::clone(&store))
            .context("failed to build backend client")?,
    );

    // 6. Dispatch
    match args.command.unwrap_or(Command::Dashboard) {
        Command::Dashboard => run_dashboard(client, store, &config).await,
        command => {
            let ctx = CliContext {
                api: client.as_ref(),
                base_url: client.base_url(),
                window_days: config.dashboard.analysis_window_days,
            };
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut out = std::io::stdout();
            let result = cli::execute(command, &ctx, &mut input, &mut out).await;
            out.flush()?;
            if let Err(e) = &result {
                error!("command failed: {e:#}");
            }
            result
        }
    }
}

/// Launch the full-screen dashboard, or explain what is missing first.
async fn run_dashboard(
    client: Arc<BackendClient>,
    store: Arc<SessionStore>,
    config: &Config,
) -> anyhow::Result<()> {
    match dashboard::startup_route(client.as_ref()).await {
        Route::Auth => {
            println!("Not signed in. Run `work-diary login --email <email>` first.");
            return Ok(());
        }
        Route::ConnectSlack => {
            println!("Connect Slack to unlock your dashboard:");
            println!("  {}", client.connect_url(Service::Slack, None));
            return Ok(());
        }
        Route::Offline => {
            // The app keeps retrying on its refresh timer.
            if store.load_snapshot(dashboard::SNAPSHOT_KEY)?.is_none() {
                println!(
                    "Backend unreachable at {} and nothing is cached yet. Try again later.",
                    client.base_url()
                );
                return Ok(());
            }
            info!("backend unreachable, opening cached dashboard");
        }
        Route::Dashboard => {}
    }

    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);
    let (task_tx, task_rx) = mpsc::channel(16);

    let api: Arc<dyn WorkDiaryApi> = client;
    let app_state = app::AppState::new(api, store, &config.dashboard, task_tx);

    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, task_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // Blocks until the user quits.
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("work-diary shut down cleanly");
    Ok(())
}

/// Store the token from credentials.toml when no session exists yet.
fn seed_token(store: &SessionStore, config: &Config) -> anyhow::Result<()> {
    let Some(token) = config
        .credentials
        .access_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        return Ok(());
    };
    if !store.is_authenticated()? {
        store.set_token(token)?;
        info!("session seeded from credentials.toml");
    }
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = config.logging.resolve_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("work-diary.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("work_diary=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
