use crate::cosign::env::{COSIGN_DOCKER_MEDIA_TYPES_ENV, COSIGN_PASSWORD_ENV, COSIGN_REPOSITORY_ENV};
use crate::cosign::options::{SignFn, SignOptions};
use crate::error::{BoxError, CosignCliError};
use crate::security::SecureBytes;
use std::ffi::{OsStr, OsString};
use std::future::Future;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Signing delegate that runs the `cosign` binary.
///
/// Overrides and the passphrase are passed to the child process only, so the
/// parent environment is never touched.
#[derive(Debug, Clone)]
pub struct CosignCli {
    binary: String,
}

impl CosignCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Arguments of `cosign sign` for the given options
    pub fn args(options: &SignOptions) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["sign".into(), "--key".into()];
        args.push(options.key.key_ref.clone().into_os_string());
        args.push(format!("--upload={}", options.upload).into());

        if options.registry.kubernetes_keychain {
            args.push("--k8s-keychain".into());
        }

        // Never prompt; the build pod has no terminal
        args.push("--yes".into());

        for (key, value) in &options.annotations {
            args.push("-a".into());
            args.push(format!("{key}={value}").into());
        }

        if let Some(path) = &options.cert_path {
            args.push("--cert".into());
            args.push(path.clone().into_os_string());
        }
        if let Some(path) = &options.output_signature {
            args.push("--output-signature".into());
            args.push(path.clone().into_os_string());
        }
        if let Some(path) = &options.output_certificate {
            args.push("--output-certificate".into());
            args.push(path.clone().into_os_string());
        }
        if let Some(path) = &options.payload_path {
            args.push("--payload".into());
            args.push(path.clone().into_os_string());
        }
        if options.recursive {
            args.push("--recursive".into());
        }
        if let Some(attachment) = &options.attachment {
            args.push("--attachment".into());
            args.push(attachment.into());
        }

        args.extend(options.image_refs.iter().map(OsString::from));
        args
    }

    /// Environment variables set on the child process, excluding the passphrase
    pub fn override_envs(options: &SignOptions) -> Vec<(&'static str, String)> {
        let mut envs = Vec::new();
        if let Some(repository) = &options.repository {
            envs.push((COSIGN_REPOSITORY_ENV, repository.clone()));
        }
        if let Some(docker_media_types) = &options.docker_media_types {
            envs.push((COSIGN_DOCKER_MEDIA_TYPES_ENV, docker_media_types.clone()));
        }
        envs
    }

    async fn run(
        &self,
        cancel: CancellationToken,
        options: SignOptions,
    ) -> Result<(), CosignCliError> {
        let passphrase = options.key.passphrase();

        let mut command = Command::new(&self.binary);
        command
            .args(Self::args(&options))
            .envs(Self::override_envs(&options))
            .env(COSIGN_PASSWORD_ENV, passphrase_value(&passphrase)?)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        drop(passphrase);

        debug!(
            "Running {} sign for {}",
            self.binary,
            options.image_refs.join(", ")
        );

        if cancel.is_cancelled() {
            return Err(CosignCliError::Cancelled);
        }

        let child = command.spawn().map_err(|source| CosignCliError::Spawn {
            binary: self.binary.clone(),
            source,
        })?;

        // Dropping the wait future on cancellation kills the child
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CosignCliError::Cancelled),
            output = child.wait_with_output() => output?,
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(CosignCliError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }

        if !stderr.is_empty() {
            debug!("cosign: {}", stderr);
        }
        info!(
            "cosign signed {} with {}",
            options.image_refs.join(", "),
            options.key.key_ref.display()
        );
        Ok(())
    }
}

/// The passphrase as an environment value, byte for byte
#[cfg(unix)]
fn passphrase_value(passphrase: &SecureBytes) -> Result<&OsStr, CosignCliError> {
    use std::os::unix::ffi::OsStrExt;
    Ok(OsStr::from_bytes(passphrase.as_bytes()))
}

#[cfg(not(unix))]
fn passphrase_value(passphrase: &SecureBytes) -> Result<&OsStr, CosignCliError> {
    std::str::from_utf8(passphrase.as_bytes())
        .map(OsStr::new)
        .map_err(|_| CosignCliError::InvalidPassphrase)
}

impl Default for CosignCli {
    fn default() -> Self {
        Self::new("cosign")
    }
}

impl SignFn for CosignCli {
    fn sign(
        &self,
        cancel: CancellationToken,
        options: SignOptions,
    ) -> impl Future<Output = Result<(), BoxError>> {
        async move { self.run(cancel, options).await.map_err(BoxError::from) }
    }
}
