use crate::config::SignerConfig;
use crate::cosign::env::{ScopedEnv, COSIGN_DOCKER_MEDIA_TYPES_ENV, COSIGN_REPOSITORY_ENV};
use crate::cosign::options::{SignFn, SignOptions};
use crate::error::SignError;
use crate::report::ExportReport;
use crate::secrets::{CosignSecret, SecretStore};
use std::collections::BTreeMap;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Annotations and per-secret overrides applied while signing
#[derive(Debug, Clone, Default)]
pub struct SignRequest {
    pub annotations: BTreeMap<String, String>,
    /// Destination repository keyed by secret name
    pub repositories: BTreeMap<String, String>,
    /// Docker media types switch keyed by secret name
    pub docker_media_types: BTreeMap<String, String>,
}

impl From<&SignerConfig> for SignRequest {
    fn from(config: &SignerConfig) -> Self {
        Self {
            annotations: config.annotations.clone(),
            repositories: config.repositories.clone(),
            docker_media_types: config.docker_media_types.clone(),
        }
    }
}

/// Signs a built image once per mounted cosign secret
pub struct ImageSigner<S> {
    sign_fn: S,
    export_environment: bool,
}

impl<S: SignFn> ImageSigner<S> {
    pub fn new(sign_fn: S) -> Self {
        Self {
            sign_fn,
            export_environment: false,
        }
    }

    /// Additionally export the per-secret overrides as `COSIGN_REPOSITORY` and
    /// `COSIGN_DOCKER_MEDIA_TYPES` for the duration of each delegated call, for
    /// delegates that only read the process environment. Signing is sequential,
    /// so the variables of one secret never leak into another call.
    pub fn with_export_environment(mut self, export_environment: bool) -> Self {
        self.export_environment = export_environment;
        self
    }

    /// Sign the first tag of an export report with every secret under `secrets_root`
    pub async fn sign(
        &self,
        cancel: &CancellationToken,
        report: &ExportReport,
        secrets_root: &Path,
        request: &SignRequest,
    ) -> Result<(), SignError> {
        let secrets = find_cosign_secrets(secrets_root)?;

        let image_ref = report.image_ref().ok_or(SignError::NoImage)?;

        self.sign_all(cancel, image_ref, &secrets, request).await
    }

    /// Sign a bare image reference with every secret under `secrets_root`
    pub async fn sign_image(
        &self,
        cancel: &CancellationToken,
        image_ref: &str,
        secrets_root: &Path,
        request: &SignRequest,
    ) -> Result<(), SignError> {
        let secrets = find_cosign_secrets(secrets_root)?;
        self.sign_all(cancel, image_ref, &secrets, request).await
    }

    async fn sign_all(
        &self,
        cancel: &CancellationToken,
        image_ref: &str,
        secrets: &[CosignSecret],
        request: &SignRequest,
    ) -> Result<(), SignError> {
        info!(
            "Signing {} with {} cosign secret(s)",
            image_ref,
            secrets.len()
        );

        for secret in secrets {
            self.sign_secret(cancel, image_ref, secret, request).await?;
        }

        Ok(())
    }

    /// Sign `image_ref` with a single secret. Delegate failures are wrapped
    /// with the secret's key path.
    pub async fn sign_secret(
        &self,
        cancel: &CancellationToken,
        image_ref: &str,
        secret: &CosignSecret,
        request: &SignRequest,
    ) -> Result<(), SignError> {
        let repository = secret
            .override_key()
            .and_then(|name| request.repositories.get(name))
            .cloned();
        let docker_media_types = secret
            .override_key()
            .and_then(|name| request.docker_media_types.get(name))
            .cloned();

        let options = SignOptions::for_secret(secret, image_ref, &request.annotations)
            .with_repository(repository)
            .with_docker_media_types(docker_media_types);

        let guards = if self.export_environment {
            export_overrides(&options)?
        } else {
            Vec::new()
        };

        debug!(
            "Signing {} with {} (repository override: {:?}, docker media types: {:?})",
            image_ref,
            secret.key_path.display(),
            options.repository,
            options.docker_media_types
        );

        let result = self.sign_fn.sign(cancel.clone(), options).await;
        drop(guards);

        result.map_err(|source| {
            warn!(
                "Signing with {} failed: {}",
                secret.key_path.display(),
                source
            );
            SignError::Delegate {
                key_path: secret.key_path.clone(),
                source,
            }
        })?;

        info!("Signed {} with secret {}", image_ref, secret.display_name());
        Ok(())
    }
}

/// Enumerate candidate secrets, failing when none are mounted
pub fn find_cosign_secrets(secrets_root: &Path) -> Result<Vec<CosignSecret>, SignError> {
    let secrets = SecretStore::new(secrets_root)
        .secrets()
        .map_err(SignError::Enumerate)?;

    if secrets.is_empty() {
        return Err(SignError::NoKeys);
    }

    Ok(secrets)
}

fn export_overrides(options: &SignOptions) -> Result<Vec<ScopedEnv>, SignError> {
    let mut guards = Vec::new();

    if let Some(repository) = &options.repository {
        guards.push(ScopedEnv::set(COSIGN_REPOSITORY_ENV, repository)?);
    }

    if let Some(docker_media_types) = &options.docker_media_types {
        guards.push(ScopedEnv::set(COSIGN_DOCKER_MEDIA_TYPES_ENV, docker_media_types)?);
    }

    Ok(guards)
}
