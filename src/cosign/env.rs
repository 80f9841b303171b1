use crate::error::SignError;
use crate::security::InputValidator;
use std::env;
use std::ffi::OsString;
use tracing::debug;

/// Signature destination read by cosign
pub const COSIGN_REPOSITORY_ENV: &str = "COSIGN_REPOSITORY";
/// Switch read by cosign to push docker instead of OCI media types
pub const COSIGN_DOCKER_MEDIA_TYPES_ENV: &str = "COSIGN_DOCKER_MEDIA_TYPES";
/// Passphrase for the private key, read by the cosign binary
pub const COSIGN_PASSWORD_ENV: &str = "COSIGN_PASSWORD";

/// Process environment variable set for the lifetime of the guard.
///
/// The previous value, or its absence, is restored on drop. The process
/// environment is global: callers must not hold guards for the same variable
/// from concurrent tasks.
#[derive(Debug)]
pub struct ScopedEnv {
    key: String,
    previous: Option<OsString>,
}

impl ScopedEnv {
    pub fn set(key: &str, value: &str) -> Result<Self, SignError> {
        InputValidator::new()
            .validate_env(key, value)
            .map_err(|e| SignError::Environment {
                var: key.to_string(),
                reason: e.to_string(),
            })?;

        let previous = env::var_os(key);
        env::set_var(key, value);
        debug!("Exported {} for the current signing call", key);

        Ok(Self {
            key: key.to_string(),
            previous,
        })
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => env::set_var(&self.key, value),
            None => env::remove_var(&self.key),
        }
    }
}
