//! Configuration error types.

use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// The path that failed.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// The path that failed.
        path: String,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// An environment override carries an unparseable value.
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnvValue {
        /// The environment variable name.
        key: String,
        /// The rejected value.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_env_value_display() {
        let err = ConfigError::InvalidEnvValue {
            key: "KERYX_SERVER_TIMEOUT_MS".to_string(),
            value: "soon".to_string(),
        };
        assert!(err.to_string().contains("KERYX_SERVER_TIMEOUT_MS"));
        assert!(err.to_string().contains("soon"));
    }
}
