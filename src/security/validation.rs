use crate::error::SecurityError;
use regex::Regex;

/// Validator for values that flow from configuration into signing options
pub struct InputValidator {
    max_secret_name_length: usize,
    repository_pattern: Regex,
    env_key_pattern: Regex,
}

impl Default for InputValidator {
    fn default() -> Self {
        // [host[:port]/]path with lowercase path components, as accepted by OCI references
        let component = r"[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*";
        let repository_pattern = Regex::new(&format!(
            r"^(?:[a-zA-Z0-9.-]+(?::[0-9]+)?/)?{component}(?:/{component})*$"
        ))
        .unwrap();

        Self {
            max_secret_name_length: 253, // Kubernetes object name limit
            repository_pattern,
            env_key_pattern: Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap(),
        }
    }
}

impl InputValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a secret name used as an override key
    pub fn validate_secret_name(&self, name: &str) -> Result<(), SecurityError> {
        if name.is_empty() {
            return Err(SecurityError::InputValidationFailed {
                message: "secret name cannot be empty".to_string(),
            });
        }

        if name.len() > self.max_secret_name_length {
            return Err(SecurityError::InputValidationFailed {
                message: format!("secret name too long: {} characters", name.len()),
            });
        }

        if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
            return Err(SecurityError::InputValidationFailed {
                message: format!("secret name must be a single directory name: {name}"),
            });
        }

        if name.chars().any(|c| c.is_control()) {
            return Err(SecurityError::InputValidationFailed {
                message: "secret name contains control characters".to_string(),
            });
        }

        Ok(())
    }

    /// Validate a destination repository override
    pub fn validate_repository(&self, repository: &str) -> Result<(), SecurityError> {
        if repository.is_empty() {
            return Err(SecurityError::InputValidationFailed {
                message: "repository cannot be empty".to_string(),
            });
        }

        if !self.repository_pattern.is_match(repository) {
            return Err(SecurityError::InputValidationFailed {
                message: format!("invalid repository format: {repository}"),
            });
        }

        Ok(())
    }

    /// Validate a docker media types override. cosign reads it as a boolean.
    pub fn validate_docker_media_types(&self, value: &str) -> Result<(), SecurityError> {
        const ACCEPTED: [&str; 12] = [
            "1", "t", "T", "TRUE", "true", "True", "0", "f", "F", "FALSE", "false", "False",
        ];

        if !ACCEPTED.contains(&value) {
            return Err(SecurityError::InputValidationFailed {
                message: format!("docker media types must be a boolean, got: {value}"),
            });
        }

        Ok(())
    }

    /// Validate an environment variable name and value before it is exported
    pub fn validate_env(&self, key: &str, value: &str) -> Result<(), SecurityError> {
        if !self.env_key_pattern.is_match(key) {
            return Err(SecurityError::InputValidationFailed {
                message: format!("invalid environment variable name: {key}"),
            });
        }

        if value.contains('\0') {
            return Err(SecurityError::InputValidationFailed {
                message: "value contains a NUL byte".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_secret_name() {
        let validator = InputValidator::default();

        for name in ["cosign-creds", "team_a", "signing.key", "x"] {
            assert!(
                validator.validate_secret_name(name).is_ok(),
                "Expected {} to be valid",
                name
            );
        }

        let long_name = "a".repeat(254);
        for name in ["", ".", "..", "a/b", "a\\b", "bad\nname", long_name.as_str()] {
            assert!(
                validator.validate_secret_name(name).is_err(),
                "Expected {:?} to be invalid",
                name
            );
        }
    }

    #[test]
    fn test_validate_repository() {
        let validator = InputValidator::default();

        let valid = [
            "registry.example.com/team/signatures",
            "localhost:5000/sigs",
            "gcr.io/project/app-signatures",
            "signatures",
        ];
        for repo in valid {
            assert!(
                validator.validate_repository(repo).is_ok(),
                "Expected {} to be valid",
                repo
            );
        }

        let invalid = [
            "",
            "Bad Repo",
            "registry.example.com/Team/sigs",
            "registry.example.com/sigs:tag",
            "registry.example.com//sigs",
        ];
        for repo in invalid {
            assert!(
                validator.validate_repository(repo).is_err(),
                "Expected {} to be invalid",
                repo
            );
        }
    }

    #[test]
    fn test_validate_docker_media_types() {
        let validator = InputValidator::default();

        assert!(validator.validate_docker_media_types("1").is_ok());
        assert!(validator.validate_docker_media_types("true").is_ok());
        assert!(validator.validate_docker_media_types("False").is_ok());
        assert!(validator.validate_docker_media_types("yes").is_err());
        assert!(validator.validate_docker_media_types("").is_err());
    }

    #[test]
    fn test_validate_env() {
        let validator = InputValidator::default();

        assert!(validator.validate_env("COSIGN_REPOSITORY", "gcr.io/x").is_ok());
        assert!(validator.validate_env("COSIGN_REPOSITORY", "").is_ok());
        assert!(validator.validate_env("BAD=KEY", "value").is_err());
        assert!(validator.validate_env("", "value").is_err());
        assert!(validator.validate_env("COSIGN_REPOSITORY", "a\0b").is_err());
    }
}
