use barman_web::config::{self, AppConfig, ConfigError};
use std::collections::HashMap;
use std::env;
use std::io::Write;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_parse_prefix_command_splits_on_whitespace() {
    assert_eq!(
        config::parse_prefix_command("  sudo   -u barman "),
        vec!["sudo", "-u", "barman"]
    );
}

#[test]
fn test_parse_prefix_command_empty_string() {
    assert!(config::parse_prefix_command("").is_empty());
    assert!(config::parse_prefix_command("   ").is_empty());
}

#[test]
fn test_prefix_is_ignored_when_disabled() {
    let cfg = AppConfig::from_lookup(lookup(&[
        ("ADMIN_USERNAME", "admin"),
        ("ADMIN_PASSWORD", "pw"),
        ("USE_PREFIX_COMMAND", "false"),
        ("PREFIX_COMMAND", "sudo -u barman"),
    ]))
    .unwrap();
    assert_eq!(cfg.prefix_command, vec!["sudo", "-u", "barman"]);
    assert_eq!(cfg.active_prefix(), None);
}

#[test]
fn test_blank_admin_username_counts_as_missing() {
    let err = AppConfig::from_lookup(lookup(&[("ADMIN_USERNAME", "   "), ("ADMIN_PASSWORD", "pw")])).unwrap_err();
    assert_eq!(err, ConfigError::Missing("ADMIN_USERNAME"));
}

#[test]
fn test_password_whitespace_is_preserved() {
    let cfg = AppConfig::from_lookup(lookup(&[("ADMIN_USERNAME", "admin"), ("ADMIN_PASSWORD", " pw ")])).unwrap();
    assert_eq!(cfg.admin_password, " pw ");
}

#[test]
fn test_optional_settings_override_defaults() {
    let cfg = AppConfig::from_lookup(lookup(&[
        ("ADMIN_USERNAME", "admin"),
        ("ADMIN_PASSWORD", "pw"),
        ("BARMAN_BIN", "/usr/local/bin/barman"),
        ("MAX_CONCURRENT_COMMANDS", "2"),
        ("SESSION_TTL_HOURS", "1"),
        ("USERS_FILE", "/var/lib/barman-web/users.json"),
        ("APP_NAME", "Backups"),
    ]))
    .unwrap();
    assert_eq!(cfg.barman_bin, "/usr/local/bin/barman");
    assert_eq!(cfg.max_concurrent_commands, 2);
    assert_eq!(cfg.session_ttl_hours, 1);
    assert_eq!(cfg.users_file.to_str(), Some("/var/lib/barman-web/users.json"));
    assert_eq!(cfg.app_name, "Backups");
}

#[test]
fn test_invalid_session_ttl_is_rejected() {
    let err = AppConfig::from_lookup(lookup(&[
        ("ADMIN_USERNAME", "admin"),
        ("ADMIN_PASSWORD", "pw"),
        ("SESSION_TTL_HOURS", "-3"),
    ]))
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { name: "SESSION_TTL_HOURS", .. }));
    assert!(err.to_string().contains("-3"));
}

#[test]
fn test_load_env_file_reads_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "BARMAN_WEB_TEST_ONLY_KEY=from-file").unwrap();
    config::load_env_file(file.path().to_str());
    assert_eq!(env::var("BARMAN_WEB_TEST_ONLY_KEY").as_deref(), Ok("from-file"));
}

#[test]
fn test_load_env_file_missing_path_is_not_fatal() {
    config::load_env_file(Some("/nonexistent/barman-web.env"));
}
