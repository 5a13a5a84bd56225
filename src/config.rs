use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

// Default configuration constants
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5555;
pub const DEFAULT_BARMAN_BIN: &str = "barman";
pub const DEFAULT_USERS_FILE: &str = "users.json";
pub const DEFAULT_APP_NAME: &str = "Barman Web App";
pub const DEFAULT_MAX_CONCURRENT_COMMANDS: usize = 4;
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 12;
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// The single administrative role every barman route requires.
pub const SUPER_ADMIN_ROLE: &str = "SuperAdmin";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not configured")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("USE_PREFIX_COMMAND is enabled but PREFIX_COMMAND is empty")]
    EmptyPrefix,
}

/// Typed application configuration, validated once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub admin_username: String,
    pub admin_password: String,
    pub use_prefix_command: bool,
    pub prefix_command: Vec<String>,
    pub barman_bin: String,
    pub max_concurrent_commands: usize,
    pub users_file: PathBuf,
    pub session_ttl_hours: i64,
    pub app_name: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any key lookup, which keeps validation
    /// testable without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let admin_username = get("ADMIN_USERNAME").ok_or(ConfigError::Missing("ADMIN_USERNAME"))?;
        // Passwords are taken verbatim, surrounding spaces included.
        let admin_password = lookup("ADMIN_PASSWORD")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("ADMIN_PASSWORD"))?;

        let use_prefix_command = match get("USE_PREFIX_COMMAND") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                name: "USE_PREFIX_COMMAND",
                value: raw,
                reason: "expected true or false",
            })?,
            None => false,
        };
        let prefix_command = parse_prefix_command(&get("PREFIX_COMMAND").unwrap_or_default());
        if use_prefix_command && prefix_command.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }

        let max_concurrent_commands = match get("MAX_CONCURRENT_COMMANDS") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "MAX_CONCURRENT_COMMANDS",
                        value: raw,
                        reason: "expected a positive integer",
                    })
                }
            },
            None => DEFAULT_MAX_CONCURRENT_COMMANDS,
        };

        let session_ttl_hours = match get("SESSION_TTL_HOURS") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SESSION_TTL_HOURS",
                        value: raw,
                        reason: "expected a positive integer",
                    })
                }
            },
            None => DEFAULT_SESSION_TTL_HOURS,
        };

        Ok(AppConfig {
            admin_username,
            admin_password,
            use_prefix_command,
            prefix_command,
            barman_bin: get("BARMAN_BIN").unwrap_or_else(|| DEFAULT_BARMAN_BIN.to_string()),
            max_concurrent_commands,
            users_file: PathBuf::from(get("USERS_FILE").unwrap_or_else(|| DEFAULT_USERS_FILE.to_string())),
            session_ttl_hours,
            app_name: get("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
        })
    }

    /// The prefix actually prepended to tool invocations, if any.
    pub fn active_prefix(&self) -> Option<Vec<String>> {
        if self.use_prefix_command {
            Some(self.prefix_command.clone())
        } else {
            None
        }
    }
}

pub fn load_env_file(env_file: Option<&str>) {
    if let Some(path) = env_file {
        dotenvy::from_path(Path::new(path)).ok();
    } else {
        dotenvy::dotenv().ok();
    }
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Splits `sudo -u barman` into its words. Quoting is not interpreted.
pub fn parse_prefix_command(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "MyPassword"),
        ]))
        .unwrap();
        assert_eq!(cfg.barman_bin, "barman");
        assert!(!cfg.use_prefix_command);
        assert_eq!(cfg.active_prefix(), None);
        assert_eq!(cfg.max_concurrent_commands, DEFAULT_MAX_CONCURRENT_COMMANDS);
        assert_eq!(cfg.users_file, PathBuf::from("users.json"));
        assert_eq!(cfg.app_name, DEFAULT_APP_NAME);
    }

    #[test]
    fn missing_admin_fails_fast() {
        let err = AppConfig::from_lookup(lookup_from(&[("ADMIN_PASSWORD", "x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("ADMIN_USERNAME"));

        let err = AppConfig::from_lookup(lookup_from(&[("ADMIN_USERNAME", "admin")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("ADMIN_PASSWORD"));
    }

    #[test]
    fn prefix_is_split_into_words() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "pw"),
            ("USE_PREFIX_COMMAND", "True"),
            ("PREFIX_COMMAND", "sudo  -u barman"),
        ]))
        .unwrap();
        assert_eq!(
            cfg.active_prefix(),
            Some(vec!["sudo".to_string(), "-u".to_string(), "barman".to_string()])
        );
    }

    #[test]
    fn enabled_prefix_without_words_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "pw"),
            ("USE_PREFIX_COMMAND", "yes"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::EmptyPrefix);
    }

    #[test]
    fn invalid_numbers_and_bools_are_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "pw"),
            ("USE_PREFIX_COMMAND", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "USE_PREFIX_COMMAND", .. }));

        let err = AppConfig::from_lookup(lookup_from(&[
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "pw"),
            ("MAX_CONCURRENT_COMMANDS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MAX_CONCURRENT_COMMANDS", .. }));
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool(""), None);
    }
}
