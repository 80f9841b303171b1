//! Signing of a built image with every mounted cosign secret.
//!
//! [`ImageSigner`] enumerates the secrets and hands one [`SignOptions`] per
//! secret to a [`SignFn`]. [`CosignCli`] is the delegate used in production.

pub mod cli;
pub mod env;
pub mod options;
pub mod signer;

pub use cli::CosignCli;
pub use env::{ScopedEnv, COSIGN_DOCKER_MEDIA_TYPES_ENV, COSIGN_PASSWORD_ENV, COSIGN_REPOSITORY_ENV};
pub use options::{KeyOpts, RegistryOptions, SignFn, SignOptions};
pub use signer::{find_cosign_secrets, ImageSigner, SignRequest};
