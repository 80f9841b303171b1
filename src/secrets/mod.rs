pub mod store;

pub use store::{read_passphrase, CosignSecret, SecretStore, KEY_FILE, PASSWORD_FILE};
