use crate::config::types::SignerConfig;
use crate::error::ConfigError;
use std::fs;
use tracing::{info, warn};

const MAX_CONFIG_SIZE: usize = 1024 * 1024;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate signer configuration from a TOML file
    pub fn from_file(path: &str) -> Result<SignerConfig, ConfigError> {
        Self::validate_config_path(path)?;

        let content = fs::read_to_string(path).map_err(|e| {
            warn!("Failed to read config file {}: {}", path, e);
            ConfigError::FileReadError(e)
        })?;

        Self::validate_config_content(&content)?;

        let config: SignerConfig = toml::from_str(&content).map_err(|e| {
            warn!("Failed to parse TOML in {}: {}", path, e);
            ConfigError::TomlParseError(e)
        })?;

        config.validate()?;

        info!("Configuration loaded successfully from {}", path);
        Ok(config)
    }

    /// Reject paths that cannot name a regular config file
    fn validate_config_path(path: &str) -> Result<(), ConfigError> {
        if path.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "configuration path cannot be empty".to_string(),
            });
        }

        if path.chars().any(|c| c.is_control()) {
            warn!("Configuration path contains invalid characters");
            return Err(ConfigError::ValidationError {
                message: "configuration path contains invalid characters".to_string(),
            });
        }

        if path.len() > 1024 {
            warn!("Configuration path too long: {} characters", path.len());
            return Err(ConfigError::ValidationError {
                message: format!("configuration path too long: {} characters", path.len()),
            });
        }

        for pattern in ["/proc/", "/sys/", "/dev/"] {
            if path.starts_with(pattern) {
                warn!("Configuration path points into {}", pattern);
                return Err(ConfigError::ValidationError {
                    message: format!("configuration path points into {}", pattern),
                });
            }
        }

        Ok(())
    }

    /// Validate configuration file content before parsing
    fn validate_config_content(content: &str) -> Result<(), ConfigError> {
        if content.len() > MAX_CONFIG_SIZE {
            warn!("Configuration file too large: {} bytes", content.len());
            return Err(ConfigError::ValidationError {
                message: format!("configuration file too large: {} bytes", content.len()),
            });
        }

        if content.contains('\0') {
            warn!("Configuration file contains binary data");
            return Err(ConfigError::ValidationError {
                message: "configuration file appears to contain binary data".to_string(),
            });
        }

        Ok(())
    }
}
