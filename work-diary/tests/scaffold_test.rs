// Integration tests for the shipped defaults and config seeding.

use std::path::Path;

use work_diary::config;

/// Verify that defaults/work-diary.toml is valid TOML with every section.
#[test]
fn default_config_has_all_sections() {
    let content = std::fs::read_to_string("defaults/work-diary.toml")
        .expect("defaults/work-diary.toml should exist");
    let parsed: toml::Value = toml::from_str(&content).unwrap();

    for section in ["backend", "session", "dashboard", "logging"] {
        assert!(parsed.get(section).is_some(), "missing [{section}] section");
    }
    let backend = parsed.get("backend").unwrap();
    assert!(backend.get("base_url").unwrap().as_str().unwrap().starts_with("http"));
    let session = parsed.get("session").unwrap();
    assert_eq!(session.get("token_max_age_days").unwrap().as_integer().unwrap(), 7);
}

/// Verify that defaults/credentials.toml.example is valid TOML.
#[test]
fn credentials_example_is_valid_toml() {
    let content = std::fs::read_to_string("defaults/credentials.toml.example")
        .expect("defaults/credentials.toml.example should exist");
    let parsed: Result<toml::Value, _> = toml::from_str(&content);
    assert!(
        parsed.is_ok(),
        "credentials.toml.example is not valid TOML: {:?}",
        parsed.err()
    );
}

/// Seeding copies the defaults into config/, skips examples, and never
/// overwrites an edited file.
#[test]
fn ensure_config_files_seeds_from_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let defaults = dir.path().join("defaults");
    std::fs::create_dir_all(&defaults).unwrap();
    std::fs::copy("defaults/work-diary.toml", defaults.join("work-diary.toml")).unwrap();
    std::fs::copy(
        "defaults/credentials.toml.example",
        defaults.join("credentials.toml.example"),
    )
    .unwrap();

    let copied = config::ensure_config_files(dir.path()).unwrap();
    assert_eq!(copied, vec![dir.path().join("config").join("work-diary.toml")]);
    assert!(!Path::new(&dir.path().join("config/credentials.toml.example")).exists());

    std::fs::write(dir.path().join("config/work-diary.toml"), "# edited").unwrap();
    let copied = config::ensure_config_files(dir.path()).unwrap();
    assert!(copied.is_empty());
    let kept = std::fs::read_to_string(dir.path().join("config/work-diary.toml")).unwrap();
    assert_eq!(kept, "# edited");
}

/// Without defaults/ or config/ there is nothing to start from.
#[test]
fn ensure_config_files_needs_a_source() {
    let dir = tempfile::tempdir().unwrap();
    let err = config::ensure_config_files(dir.path()).unwrap_err();
    assert!(err.to_string().contains("neither defaults/ nor config/"));
}
