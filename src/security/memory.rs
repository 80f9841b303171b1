use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secure memory container for passphrases that zeroizes on drop.
///
/// Holds raw bytes: a cosign passphrase is whatever the password file
/// contains, valid UTF-8 or not.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureBytes {
    inner: Vec<u8>,
}

impl SecureBytes {
    /// Create a new secure buffer, taking ownership of `value`
    pub fn new(value: Vec<u8>) -> Self {
        Self { inner: value }
    }

    /// Get the raw bytes, as handed to the cosign child process
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// Never print the passphrase itself
impl fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureBytes")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl From<Vec<u8>> for SecureBytes {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureBytes {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes().to_vec())
    }
}
