//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::EntrypointConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for environment variable {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a configuration from TOML text without validating it.
pub fn parse_config(content: &str) -> Result<EntrypointConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load configuration from an optional TOML file, apply environment
/// overrides from the process environment, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<EntrypointConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<EntrypointConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            parse_config(&content)?
        }
        None => EntrypointConfig::default(),
    };

    apply_env_overrides(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `HOST`, `PORT`, `STATUS_ADDRESS` and `LOG_LEVEL` overrides.
pub fn apply_env_overrides<F>(config: &mut EntrypointConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = env("HOST") {
        config.server.host = host;
    }
    if let Some(port) = env("PORT") {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::Env { var: "PORT", value: port.clone() })?;
    }
    if let Some(addr) = env("STATUS_ADDRESS") {
        config.observability.status_address = addr;
    }
    if let Some(level) = env("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_no_file_gives_defaults() {
        let config = load_config_with(None, env_from(&[])).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_env_overrides_bind_parameters() {
        let config =
            load_config_with(None, env_from(&[("HOST", "127.0.0.1"), ("PORT", "9001")])).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9001);
        assert_eq!(
            config.server.rendered_args(),
            vec!["app.main:app", "--host", "127.0.0.1", "--port", "9001"]
        );
    }

    #[test]
    fn test_malformed_port_is_an_error() {
        let err = load_config_with(None, env_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "PORT", .. }));
    }

    #[test]
    fn test_reads_file_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 0").unwrap();

        let err = load_config_with(Some(file.path()), env_from(&[])).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::ZeroPort]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_env_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 7000").unwrap();

        let config = load_config_with(Some(file.path()), env_from(&[("PORT", "7001")])).unwrap();
        assert_eq!(config.server.port, 7001);
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let config = parse_config(include_str!("../../entrypoint.example.toml")).unwrap();
        let defaults = EntrypointConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.server.rendered_args(), defaults.server.rendered_args());
        assert_eq!(config.worker.env, defaults.worker.env);
        assert_eq!(config.worker.max_restarts, defaults.worker.max_restarts);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_config_with(Some(Path::new("/definitely/not/here.toml")), env_from(&[]))
            .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
