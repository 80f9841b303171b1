use cosign_image_signer::cosign::{SignOptions, COSIGN_REPOSITORY_ENV};
use cosign_image_signer::error::BoxError;
use std::fs;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub type SignFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>>>>;

/// One observed delegated call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub key_ref: String,
    pub passphrase: Vec<u8>,
    pub image_refs: Vec<String>,
    pub repository: Option<String>,
    pub docker_media_types: Option<String>,
    /// `COSIGN_REPOSITORY` as seen in the process environment during the call
    pub repository_env: Option<String>,
}

/// Create a secrets root with one directory per `(name, password)` entry
pub fn secrets_root(secrets: &[(&str, Option<&str>)]) -> TempDir {
    let root = TempDir::new().unwrap();
    for (name, password) in secrets {
        let dir = root.path().join(name);
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("cosign.key"), format!("private key for {name}")).unwrap();
        if let Some(password) = password {
            fs::write(dir.join("cosign.password"), password).unwrap();
        }
    }
    root
}

/// A signing delegate that records every call and fails for key paths
/// containing `fail_for`
pub fn recording_sign_fn(
    fail_for: Option<&str>,
) -> (
    Arc<Mutex<Vec<RecordedCall>>>,
    impl Fn(CancellationToken, SignOptions) -> SignFuture,
) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&calls);
    let fail_for = fail_for.map(str::to_string);

    let sign_fn = move |_cancel: CancellationToken, options: SignOptions| {
        let key_ref = options.key.key_ref.display().to_string();
        recorder.lock().unwrap().push(RecordedCall {
            key_ref: key_ref.clone(),
            passphrase: options.key.passphrase().as_bytes().to_vec(),
            image_refs: options.image_refs.clone(),
            repository: options.repository.clone(),
            docker_media_types: options.docker_media_types.clone(),
            repository_env: std::env::var(COSIGN_REPOSITORY_ENV).ok(),
        });

        let fail = fail_for
            .as_deref()
            .map(|pattern| key_ref.contains(pattern))
            .unwrap_or(false);

        Box::pin(async move {
            if fail {
                Err::<(), BoxError>("signing rejected by registry".into())
            } else {
                Ok(())
            }
        }) as SignFuture
    };

    (calls, sign_fn)
}
