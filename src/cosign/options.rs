use crate::error::BoxError;
use crate::secrets::{read_passphrase, CosignSecret};
use crate::security::SecureBytes;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Key material handed to the signing delegate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOpts {
    pub key_ref: PathBuf,
    pub password_path: PathBuf,
}

impl KeyOpts {
    /// Read the key passphrase on demand. A missing password file yields an
    /// empty passphrase.
    pub fn passphrase(&self) -> SecureBytes {
        read_passphrase(&self.password_path)
    }
}

/// Registry authentication settings for the delegate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Resolve registry credentials through the Kubernetes keychain
    pub kubernetes_keychain: bool,
}

/// Everything one delegated signing call receives
#[derive(Debug, Clone)]
pub struct SignOptions {
    pub key: KeyOpts,
    pub registry: RegistryOptions,
    pub annotations: BTreeMap<String, String>,
    pub image_refs: Vec<String>,
    pub cert_path: Option<PathBuf>,
    pub upload: bool,
    pub output_signature: Option<PathBuf>,
    pub output_certificate: Option<PathBuf>,
    pub payload_path: Option<PathBuf>,
    pub force: bool,
    pub recursive: bool,
    pub attachment: Option<String>,
    /// Destination repository for the signature, replacing `COSIGN_REPOSITORY`
    pub repository: Option<String>,
    /// Docker media types switch, replacing `COSIGN_DOCKER_MEDIA_TYPES`
    pub docker_media_types: Option<String>,
}

impl SignOptions {
    /// The fixed option set used for every mounted secret: a single image
    /// reference, upload enabled, no output files, Kubernetes keychain lookup.
    pub fn for_secret(
        secret: &CosignSecret,
        image_ref: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            key: KeyOpts {
                key_ref: secret.key_path.clone(),
                password_path: secret.password_path.clone(),
            },
            registry: RegistryOptions {
                kubernetes_keychain: true,
            },
            annotations: annotations.clone(),
            image_refs: vec![image_ref.to_string()],
            cert_path: None,
            upload: true,
            output_signature: None,
            output_certificate: None,
            payload_path: None,
            force: false,
            recursive: false,
            attachment: None,
            repository: None,
            docker_media_types: None,
        }
    }

    pub fn with_repository(mut self, repository: Option<String>) -> Self {
        self.repository = repository;
        self
    }

    pub fn with_docker_media_types(mut self, docker_media_types: Option<String>) -> Self {
        self.docker_media_types = docker_media_types;
        self
    }
}

/// The external signing capability.
///
/// Implemented by [`crate::cosign::CosignCli`] and by any closure of the form
/// `Fn(CancellationToken, SignOptions) -> impl Future<Output = Result<(), BoxError>>`.
pub trait SignFn {
    fn sign(
        &self,
        cancel: CancellationToken,
        options: SignOptions,
    ) -> impl Future<Output = Result<(), BoxError>>;
}

impl<F, Fut> SignFn for F
where
    F: Fn(CancellationToken, SignOptions) -> Fut,
    Fut: Future<Output = Result<(), BoxError>>,
{
    fn sign(
        &self,
        cancel: CancellationToken,
        options: SignOptions,
    ) -> impl Future<Output = Result<(), BoxError>> {
        self(cancel, options)
    }
}
