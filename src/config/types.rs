use crate::error::ConfigError;
use crate::security::InputValidator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default mount point of build secrets in a build pod
pub const DEFAULT_SECRETS_DIR: &str = "/var/build-secrets";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignerConfig {
    #[serde(default = "default_secrets_dir")]
    pub secrets_dir: PathBuf,
    /// Also export per-secret overrides as `COSIGN_*` process variables while signing
    #[serde(default)]
    pub export_environment: bool,
    #[serde(default)]
    pub cosign: CosignConfig,
    /// Annotations attached to every signature
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Destination repository override, keyed by secret name
    #[serde(default)]
    pub repositories: BTreeMap<String, String>,
    /// Docker media types override, keyed by secret name
    #[serde(default)]
    pub docker_media_types: BTreeMap<String, String>,
}

fn default_secrets_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SECRETS_DIR)
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            secrets_dir: default_secrets_dir(),
            export_environment: false,
            cosign: CosignConfig::default(),
            annotations: BTreeMap::new(),
            repositories: BTreeMap::new(),
            docker_media_types: BTreeMap::new(),
        }
    }
}

impl SignerConfig {
    /// Load configuration from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        crate::config::ConfigLoader::from_file(path)
    }

    /// Validate override keys and values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let validator = InputValidator::new();

        if self.secrets_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "secrets_dir cannot be empty".to_string(),
            });
        }

        if self.cosign.binary.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "cosign binary cannot be empty".to_string(),
            });
        }

        for key in self.annotations.keys() {
            if key.is_empty() {
                return Err(ConfigError::ValidationError {
                    message: "annotation keys cannot be empty".to_string(),
                });
            }
        }

        for (secret, repository) in &self.repositories {
            validator
                .validate_secret_name(secret)
                .and_then(|_| validator.validate_repository(repository))
                .map_err(|e| ConfigError::InvalidOverride {
                    secret: secret.clone(),
                    reason: e.to_string(),
                })?;
        }

        for (secret, media_types) in &self.docker_media_types {
            validator
                .validate_secret_name(secret)
                .and_then(|_| validator.validate_docker_media_types(media_types))
                .map_err(|e| ConfigError::InvalidOverride {
                    secret: secret.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(())
    }
}

/// Settings for the `cosign` command line delegate
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CosignConfig {
    #[serde(default = "default_cosign_binary")]
    pub binary: String,
}

fn default_cosign_binary() -> String {
    "cosign".to_string()
}

impl Default for CosignConfig {
    fn default() -> Self {
        Self {
            binary: default_cosign_binary(),
        }
    }
}
