// Configuration loading and parsing (work-diary.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that replaces `backend.base_url` when set.
pub const BACKEND_URL_ENV: &str = "WORK_DIARY_BACKEND_URL";

/// Name of the main config file inside `config/` and `defaults/`.
const CONFIG_FILE: &str = "work-diary.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub session: SessionConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
    pub credentials: CredentialsConfig,
}

// ---------------------------------------------------------------------------
// work-diary.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    backend: BackendConfig,
    session: SessionConfig,
    dashboard: DashboardConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub db_path: String,
    #[serde(default = "default_token_max_age_days")]
    pub token_max_age_days: u32,
}

fn default_token_max_age_days() -> u32 {
    7
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    pub refresh_interval_secs: u64,
    #[serde(default = "default_analysis_window_days")]
    pub analysis_window_days: u32,
}

fn default_analysis_window_days() -> u32 {
    7
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log directory. When absent, the platform's local data directory is used.
    pub dir: Option<String>,
}

impl LoggingConfig {
    /// Resolve the directory log files are written to.
    pub fn resolve_dir(&self) -> PathBuf {
        if let Some(dir) = &self.dir {
            return PathBuf::from(dir);
        }
        directories::ProjectDirs::from("", "", "work-diary")
            .map(|dirs| dirs.data_local_dir().join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"))
    }
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    /// Bearer token to seed the session store with when no session exists.
    pub access_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/work-diary.toml` and
/// (optionally) `config/credentials.toml`, relative to `base_dir`.
///
/// Does not copy defaults or read the environment; `load_config()` does both.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let config_path = config_dir.join(CONFIG_FILE);
    let config_text = read_file(&config_path)?;
    let file: ConfigFile = toml::from_str(&config_text).map_err(|e| ConfigError::ParseError {
        path: config_path.clone(),
        source: e,
    })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        backend: file.backend,
        session: file.session,
        dashboard: file.dashboard,
        logging: file.logging,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Replace config values with environment overrides, then re-validate.
///
/// `lookup` abstracts `std::env::var` so tests don't have to mutate the
/// process environment.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(BACKEND_URL_ENV).filter(|u| !u.trim().is_empty()) {
        config.backend.base_url = url.trim().to_string();
    }
    validate(config)
}

/// Copy every missing file from `defaults/` into `config/`, never touching
/// a file that already exists. `*.example` files are left for the user to
/// copy by hand. Returns the files that were written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(seed_error(format!(
            "neither defaults/ nor config/ directory found in {}; \
             run from the project root or ensure defaults/ is present",
            base_dir.display()
        )));
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| seed_error(format!("failed to create config directory: {e}")))?;
    let entries = std::fs::read_dir(&defaults_dir)
        .map_err(|e| seed_error(format!("failed to read defaults directory: {e}")))?;

    let mut seeded = Vec::new();
    for entry in entries {
        let source = entry
            .map_err(|e| seed_error(format!("failed to read defaults entry: {e}")))?
            .path();
        let Some(name) = source.file_name().filter(|_| source.is_file()) else {
            continue;
        };
        if name.to_string_lossy().ends_with(".example") {
            continue;
        }
        let target = config_dir.join(name);
        if seed_file(&source, &target)? {
            seeded.push(target);
        }
    }
    Ok(seeded)
}

/// Copy `source` to `target` unless `target` exists. The source is read in
/// full before the target is created, and a failed write removes the
/// partial target.
fn seed_file(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    if target.exists() {
        return Ok(false);
    }
    let content = std::fs::read(source)
        .map_err(|e| seed_error(format!("failed to read {}: {e}", source.display())))?;

    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => {
            return Err(seed_error(format!(
                "failed to create {}: {e}",
                target.display()
            )))
        }
    };
    if let Err(e) = std::io::Write::write_all(&mut dest, &content) {
        drop(dest);
        let _ = std::fs::remove_file(target);
        return Err(seed_error(format!(
            "failed to write {}: {e}",
            target.display()
        )));
    }
    Ok(true)
}

fn seed_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Load config relative to the current working directory, seeding missing
/// files from `defaults/` and applying environment overrides.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    let mut config = load_config_from(&cwd)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let url = config.backend.base_url.trim();
    if url.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "backend.base_url".into(),
            message: "must not be empty".into(),
        });
    }
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        Ok(parsed) => {
            return Err(ConfigError::ValidationError {
                field: "backend.base_url".into(),
                message: format!("unsupported scheme `{}`", parsed.scheme()),
            });
        }
        Err(e) => {
            return Err(ConfigError::ValidationError {
                field: "backend.base_url".into(),
                message: format!("invalid URL: {e}"),
            });
        }
    }

    let positive_fields: &[(&str, u64)] = &[
        (
            "backend.request_timeout_secs",
            config.backend.request_timeout_secs,
        ),
        (
            "dashboard.refresh_interval_secs",
            config.dashboard.refresh_interval_secs,
        ),
    ];
    for (name, val) in positive_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    let max_age = config.session.token_max_age_days;
    if !(1..=365).contains(&max_age) {
        return Err(ConfigError::ValidationError {
            field: "session.token_max_age_days".into(),
            message: format!("must be between 1 and 365 inclusive, got {max_age}"),
        });
    }

    let window = config.dashboard.analysis_window_days;
    if !(1..=31).contains(&window) {
        return Err(ConfigError::ValidationError {
            field: "dashboard.analysis_window_days".into(),
            message: format!("must be between 1 and 31 inclusive, got {window}"),
        });
    }

    if config.session.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "session.db_path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// Path to the work-diary package root (works from the crate root or the
    /// workspace root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("work-diary/defaults").exists() {
            cwd.join("work-diary")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Temp dir with `config/work-diary.toml` copied from defaults, with
    /// `edit` applied to its text.
    fn config_dir_with(edit: impl Fn(String) -> String) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let config_dir = tmp.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        let text = fs::read_to_string(project_root().join("defaults/work-diary.toml")).unwrap();
        fs::write(config_dir.join(CONFIG_FILE), edit(text)).unwrap();
        tmp
    }

    fn expect_validation_field(err: ConfigError, expected: &str) {
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_valid_config_from_defaults() {
        let tmp = config_dir_with(|t| t);
        let config = load_config_from(tmp.path()).expect("should load valid config");

        assert_eq!(config.backend.base_url, "https://localhost:8000");
        assert_eq!(config.backend.request_timeout_secs, 60);
        assert!(config.backend.accept_invalid_certs);
        assert_eq!(config.session.db_path, "work-diary.db");
        assert_eq!(config.session.token_max_age_days, 7);
        assert_eq!(config.dashboard.refresh_interval_secs, 300);
        assert_eq!(config.dashboard.analysis_window_days, 7);
        assert_eq!(config.logging.dir.as_deref(), Some("logs"));
        assert!(config.credentials.access_token.is_none());
    }

    #[test]
    fn credentials_toml_with_token() {
        let tmp = config_dir_with(|t| t);
        fs::write(
            tmp.path().join("config/credentials.toml"),
            "access_token = \"tok-123\"\n",
        )
        .unwrap();

        let config = load_config_from(tmp.path()).unwrap();
        assert_eq!(config.credentials.access_token.as_deref(), Some("tok-123"));
    }

    #[test]
    fn env_override_replaces_base_url() {
        let tmp = config_dir_with(|t| t);
        let mut config = load_config_from(tmp.path()).unwrap();
        apply_env_overrides(&mut config, |key| {
            (key == BACKEND_URL_ENV).then(|| "http://backend.internal:9000".to_string())
        })
        .unwrap();
        assert_eq!(config.backend.base_url, "http://backend.internal:9000");
    }

    #[test]
    fn blank_env_override_is_ignored() {
        let tmp = config_dir_with(|t| t);
        let mut config = load_config_from(tmp.path()).unwrap();
        apply_env_overrides(&mut config, |_| Some("   ".to_string())).unwrap();
        assert_eq!(config.backend.base_url, "https://localhost:8000");
    }

    #[test]
    fn invalid_env_override_fails_validation() {
        let tmp = config_dir_with(|t| t);
        let mut config = load_config_from(tmp.path()).unwrap();
        let err = apply_env_overrides(&mut config, |_| Some("ftp://nope".to_string()))
            .unwrap_err();
        expect_validation_field(err, "backend.base_url");
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let tmp = config_dir_with(|t| {
            t.replace(
                "base_url = \"https://localhost:8000\"",
                "base_url = \"not a url\"",
            )
        });
        expect_validation_field(load_config_from(tmp.path()).unwrap_err(), "backend.base_url");
    }

    #[test]
    fn rejects_zero_timeout() {
        let tmp = config_dir_with(|t| {
            t.replace("request_timeout_secs = 60", "request_timeout_secs = 0")
        });
        expect_validation_field(
            load_config_from(tmp.path()).unwrap_err(),
            "backend.request_timeout_secs",
        );
    }

    #[test]
    fn rejects_zero_token_age() {
        let tmp = config_dir_with(|t| t.replace("token_max_age_days = 7", "token_max_age_days = 0"));
        expect_validation_field(
            load_config_from(tmp.path()).unwrap_err(),
            "session.token_max_age_days",
        );
    }

    #[test]
    fn rejects_token_age_over_a_year() {
        let tmp = config_dir_with(|t| {
            t.replace("token_max_age_days = 7", "token_max_age_days = 4294967295")
        });
        let err = load_config_from(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("between 1 and 365"));
        expect_validation_field(err, "session.token_max_age_days");

        let tmp = config_dir_with(|t| t.replace("token_max_age_days = 7", "token_max_age_days = 365"));
        assert!(load_config_from(tmp.path()).is_ok());
    }

    #[test]
    fn unreadable_default_leaves_no_target() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("work-diary.toml");
        let err = seed_file(&tmp.path().join("missing.toml"), &target).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultsCopyError { .. }));
        assert!(!target.exists(), "no empty file should be left behind");
    }

    #[test]
    fn seed_file_keeps_existing_target() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("default.toml");
        let target = tmp.path().join("work-diary.toml");
        fs::write(&source, "a = 1").unwrap();

        assert!(seed_file(&source, &target).unwrap());
        assert_eq!(fs::read_to_string(&target).unwrap(), "a = 1");

        fs::write(&target, "a = 2").unwrap();
        assert!(!seed_file(&source, &target).unwrap());
        assert_eq!(fs::read_to_string(&target).unwrap(), "a = 2");
    }

    #[test]
    fn rejects_window_out_of_range() {
        let tmp = config_dir_with(|t| {
            t.replace("analysis_window_days = 7", "analysis_window_days = 90")
        });
        expect_validation_field(
            load_config_from(tmp.path()).unwrap_err(),
            "dashboard.analysis_window_days",
        );
    }

    #[test]
    fn missing_optional_sections_use_defaults() {
        let tmp = config_dir_with(|t| {
            t.replace("token_max_age_days = 7\n", "")
                .replace("analysis_window_days = 7\n", "")
                .replace("[logging]\ndir = \"logs\"\n", "")
        });
        let config = load_config_from(tmp.path()).unwrap();
        assert_eq!(config.session.token_max_age_days, 7);
        assert_eq!(config.dashboard.analysis_window_days, 7);
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        match load_config_from(tmp.path()).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected FileNotFound, got: {other}"),
        }
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = config_dir_with(|_| "this is not valid [[[ toml".to_string());
        match load_config_from(tmp.path()).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected ParseError, got: {other}"),
        }
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let defaults_dir = tmp.path().join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::copy(
            project_root().join("defaults/work-diary.toml"),
            defaults_dir.join(CONFIG_FILE),
        )
        .unwrap();
        fs::write(
            defaults_dir.join("credentials.toml.example"),
            "access_token = \"...\"\n",
        )
        .unwrap();

        let copied = ensure_config_files(tmp.path()).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(tmp.path().join("config").join(CONFIG_FILE).exists());
        assert!(!tmp.path().join("config/credentials.toml.example").exists());
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let defaults_dir = tmp.path().join("defaults");
        let config_dir = tmp.path().join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();
        fs::copy(
            project_root().join("defaults/work-diary.toml"),
            defaults_dir.join(CONFIG_FILE),
        )
        .unwrap();
        fs::write(config_dir.join(CONFIG_FILE), "# custom\n").unwrap();

        let copied = ensure_config_files(tmp.path()).unwrap();
        assert!(copied.is_empty());
        let content = fs::read_to_string(config_dir.join(CONFIG_FILE)).unwrap();
        assert_eq!(content, "# custom\n");
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = tempfile::tempdir().unwrap();
        match ensure_config_files(tmp.path()).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }
    }

    #[test]
    fn logging_dir_prefers_configured_value() {
        let logging = LoggingConfig {
            dir: Some("/var/log/work-diary".into()),
        };
        assert_eq!(logging.resolve_dir(), PathBuf::from("/var/log/work-diary"));
    }
}
