use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by signing delegates
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("signing failed: {0}")]
    Sign(#[from] SignError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("report error: {0}")]
    Report(#[from] ReportError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while signing an image with the mounted cosign secrets
#[derive(Debug, Error)]
pub enum SignError {
    #[error("no keys found for cosign signing: {0}")]
    Enumerate(#[source] std::io::Error),

    #[error("no keys found for cosign signing")]
    NoKeys,

    #[error("no image found in report to sign")]
    NoImage,

    #[error("failed setting {var} env variable: {reason}")]
    Environment { var: String, reason: String },

    #[error("unable to sign image with {}: {source}", .key_path.display())]
    Delegate {
        key_path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl SignError {
    /// Key path of the secret whose delegated call failed, if any
    pub fn key_path(&self) -> Option<&std::path::Path> {
        match self {
            SignError::Delegate { key_path, .. } => Some(key_path),
            _ => None,
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("invalid toml format: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("invalid override for secret {secret}: {reason}")]
    InvalidOverride { secret: String, reason: String },
}

/// Export report loading errors
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read report {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid report {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors raised by the `cosign` command line delegate
#[derive(Debug, Error)]
pub enum CosignCliError {
    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cosign exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("signing cancelled")]
    Cancelled,

    #[error("passphrase is not valid UTF-8 on this platform")]
    InvalidPassphrase,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Security-specific errors
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("input validation failed: {message}")]
    InputValidationFailed { message: String },
}

/// Convenience type for Results
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegate_error_names_key_path() {
        let err = SignError::Delegate {
            key_path: PathBuf::from("/var/build-secrets/second/cosign.key"),
            source: "registry unavailable".into(),
        };

        assert_eq!(
            err.to_string(),
            "unable to sign image with /var/build-secrets/second/cosign.key: registry unavailable"
        );
        assert_eq!(
            err.key_path(),
            Some(std::path::Path::new("/var/build-secrets/second/cosign.key"))
        );
    }

    #[test]
    fn test_enumeration_error_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = SignError::Enumerate(io);
        assert_eq!(err.to_string(), "no keys found for cosign signing: missing");
        assert!(err.key_path().is_none());
    }

    #[test]
    fn test_app_error_wraps_sign_error() {
        let err: AppError = SignError::NoKeys.into();
        assert_eq!(
            err.to_string(),
            "signing failed: no keys found for cosign signing"
        );
    }
}
