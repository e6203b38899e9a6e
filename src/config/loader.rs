//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: RelayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Replace the port of the configured bind address.
///
/// The listen port is environment-sourced in deployment (PORT), overriding
/// whatever the config file says while keeping the configured interface.
pub fn apply_port_override(config: &mut RelayConfig, port: u16) {
    let host = config
        .listener
        .bind_address
        .rsplit_once(':')
        .map(|(host, _)| host.to_string())
        .unwrap_or_else(|| "0.0.0.0".to_string());
    config.listener.bind_address = format!("{host}:{port}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_override_keeps_interface() {
        let mut config = RelayConfig::default();
        config.listener.bind_address = "127.0.0.1:8001".into();
        apply_port_override(&mut config, 9999);
        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
    }

    #[test]
    fn load_rejects_invalid_file() {
        let dir = std::env::temp_dir().join("mcp-relay-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "[upstream]\nurl = \"not a url\"\n").unwrap();
        match load_config(&path) {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.field == "upstream.url"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
