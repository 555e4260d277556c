use testomat_reporter::config::{CONFIG_FILE_NAME, Config, RunScope};

#[test]
fn test_default_config_values() {
    let config = Config::default();

    assert_eq!(config.reporter.url, None);
    assert_eq!(config.reporter.title_prefix, "Rust Test Run");
    assert_eq!(config.reporter.timeout, 30);
    assert!(!config.reporter.strict);
    assert_eq!(config.reporter.scope, RunScope::Suite);
    assert_eq!(config.run.title, None);
    assert!(config.tests.is_empty());
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "[reporter]\nstrict = true\n").unwrap();

    let config = Config::load_from_file(&path).expect("config should load");

    assert!(config.reporter.strict);
    assert_eq!(config.reporter.timeout, 30);
    assert_eq!(config.reporter.title_prefix, "Rust Test Run");
}

#[test]
fn test_missing_or_invalid_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let invalid = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&invalid, "[reporter\n").unwrap();

    assert!(Config::load_from_file(&missing).is_none());
    assert!(Config::load_from_file(&invalid).is_none());
}

#[test]
fn test_written_default_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, Config::default().to_toml()).unwrap();

    let config = Config::load_from_file(&path).expect("config should load");

    assert_eq!(config.reporter.scope, RunScope::Suite);
    assert_eq!(config.reporter.timeout, 30);
}
