pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{CosignConfig, SignerConfig, DEFAULT_SECRETS_DIR};
