//! Tests for arena configuration loading.

use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use tilewar::ArenaConfig;

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_defaults() {
    let config = ArenaConfig::default();
    assert_eq!(*config.admission_cap(), 500);
    assert_eq!(config.poll_interval(), Duration::from_millis(100));
    assert_eq!(config.sweep_interval(), Duration::from_secs(10));
    assert_eq!(config.idle_timeout(), Duration::from_secs(300));
    assert_eq!(config.dead_round_window(), Duration::from_secs(30));
    assert_eq!(config.invitation_window(), Duration::from_secs(2));
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file = config_file("admission_cap = 3\npoll_interval_ms = 5\n");
    let config = ArenaConfig::from_file(file.path()).unwrap();
    assert_eq!(*config.admission_cap(), 3);
    assert_eq!(config.poll_interval(), Duration::from_millis(5));
    assert_eq!(*config.idle_timeout_secs(), 300);
}

#[test]
fn test_zero_intervals_are_rejected() {
    let file = config_file("poll_interval_ms = 0\n");
    let error = ArenaConfig::from_file(file.path()).unwrap_err();
    assert!(error.message.contains("poll_interval_ms"));

    let file = config_file("sweep_interval_secs = 0\n");
    assert!(ArenaConfig::from_file(file.path()).is_err());
}

#[test]
fn test_malformed_file_is_an_error() {
    let file = config_file("admission_cap = \"many\"\n");
    let error = ArenaConfig::from_file(file.path()).unwrap_err();
    assert!(error.message.starts_with("Failed to parse config"));
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ArenaConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, ArenaConfig::default());
    assert!(ArenaConfig::from_file(dir.path().join("absent.toml")).is_err());
}
