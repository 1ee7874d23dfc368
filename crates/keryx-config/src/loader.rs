//! Configuration loading.
//!
//! Precedence, lowest to highest: built-in defaults, TOML file,
//! `KERYX_*` environment variables. A `.env` file is honored before the
//! environment is read.

use crate::error::ConfigError;
use crate::settings::{KeryxConfig, PipelineConfig};
use std::env;
use std::path::Path;

/// Loads configuration from an optional TOML file plus the environment.
///
/// A missing `path` (or `None`) starts from defaults; only an unreadable
/// or unparseable file is an error.
pub fn load(path: Option<&Path>) -> Result<KeryxConfig, ConfigError> {
    // Honor a local .env before reading the environment; a missing file is
    // not an error.
    dotenvy::dotenv().ok();

    let mut config = match path {
        Some(path) if path.exists() => {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?
        }
        Some(path) => {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            KeryxConfig::default()
        }
        None => KeryxConfig::default(),
    };

    apply_env(&mut config)?;
    Ok(config)
}

fn apply_env(config: &mut KeryxConfig) -> Result<(), ConfigError> {
    if let Ok(value) = env::var("KERYX_SERVICE_NAME") {
        config.service_name = value;
    }
    apply_side_env("KERYX_SERVER", &mut config.server)?;
    apply_side_env("KERYX_CLIENT", &mut config.client)?;
    Ok(())
}

fn apply_side_env(prefix: &str, config: &mut PipelineConfig) -> Result<(), ConfigError> {
    set_bool(&format!("{prefix}_DEBUG"), &mut config.debug)?;
    set_bool(&format!("{prefix}_METRICS"), &mut config.metrics)?;
    set_bool(&format!("{prefix}_TRACER"), &mut config.tracer)?;
    set_bool(&format!("{prefix}_VALIDATE"), &mut config.validate)?;
    set_bool(&format!("{prefix}_CHECK_SLOW"), &mut config.check_slow)?;
    set_u64(&format!("{prefix}_SLOW_TIME_MS"), &mut config.slow_time_ms)?;
    set_u64(&format!("{prefix}_TIMEOUT_MS"), &mut config.timeout_ms)?;
    set_u64(
        &format!("{prefix}_CONNECT_TIMEOUT_MS"),
        &mut config.connect_timeout_ms,
    )?;
    set_u64(
        &format!("{prefix}_KEEPALIVE_TIME_SECS"),
        &mut config.keepalive_time_secs,
    )?;
    set_u64(
        &format!("{prefix}_KEEPALIVE_TIMEOUT_SECS"),
        &mut config.keepalive_timeout_secs,
    )?;
    Ok(())
}

fn set_bool(key: &str, slot: &mut bool) -> Result<(), ConfigError> {
    match env::var(key) {
        Ok(value) => {
            *slot = parse_bool(&value).ok_or_else(|| ConfigError::InvalidEnvValue {
                key: key.to_string(),
                value,
            })?;
            Ok(())
        }
        Err(_) => Ok(()),
    }
}

fn set_u64(key: &str, slot: &mut u64) -> Result<(), ConfigError> {
    match env::var(key) {
        Ok(value) => {
            *slot = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnvValue {
                    key: key.to_string(),
                    value,
                })?;
            Ok(())
        }
        Err(_) => Ok(()),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = load(None).unwrap();
        assert_eq!(config.server.timeout().as_millis(), 1_000);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = load(Some(Path::new("/definitely/not/here.toml"))).unwrap();
        assert_eq!(config.client.timeout().as_millis(), 1_000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "service_name = 'gw'\n[server]\nvalidate = true\nslow_time_ms = 20\ncheck_slow = true"
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.service_name, "gw");
        assert!(config.server.validate);
        assert_eq!(
            config.server.slow_time(),
            Some(std::time::Duration::from_millis(20))
        );
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server = 'not-a-table'").unwrap();

        assert!(matches!(
            load(Some(file.path())),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_bool_forms() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool(" ON "), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
