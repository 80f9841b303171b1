use crate::security::SecureBytes;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File holding the cosign private key inside a secret directory
pub const KEY_FILE: &str = "cosign.key";
/// File holding the optional key passphrase inside a secret directory
pub const PASSWORD_FILE: &str = "cosign.password";

/// Mounted cosign secrets, one directory per signing identity
#[derive(Debug, Clone)]
pub struct SecretStore {
    root: PathBuf,
}

impl SecretStore {
    /// Create a store over a secrets root such as `/var/build-secrets`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// List the names of the immediate subdirectories of the secrets root.
    ///
    /// Plain files and symlinks are skipped. Names are kept as the filesystem
    /// returns them, so a directory whose name is not UTF-8 is still listed.
    /// Names are sorted so that signing order is stable across runs.
    pub fn list(&self) -> io::Result<Vec<OsString>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name());
            }
        }

        names.sort();
        debug!(
            "Found {} candidate secrets under {}",
            names.len(),
            self.root.display()
        );

        Ok(names)
    }

    /// Resolve the file paths of a named secret. The directory is not checked.
    pub fn secret(&self, name: impl AsRef<OsStr>) -> CosignSecret {
        let name = name.as_ref();
        let dir = self.root.join(name);
        CosignSecret {
            name: name.to_os_string(),
            key_path: dir.join(KEY_FILE),
            password_path: dir.join(PASSWORD_FILE),
        }
    }

    /// Enumerate the secrets root and resolve every candidate
    pub fn secrets(&self) -> io::Result<Vec<CosignSecret>> {
        Ok(self
            .list()?
            .iter()
            .map(|name| self.secret(name))
            .collect())
    }
}

/// A signing identity derived from one secret directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosignSecret {
    pub name: OsString,
    pub key_path: PathBuf,
    pub password_path: PathBuf,
}

impl CosignSecret {
    /// Name used to look up per-secret overrides. `None` when the directory
    /// name is not UTF-8, in which case no override can apply.
    pub fn override_key(&self) -> Option<&str> {
        self.name.to_str()
    }

    /// Name for logs and listings, with invalid UTF-8 replaced
    pub fn display_name(&self) -> Cow<'_, str> {
        self.name.to_string_lossy()
    }

    /// Whether the secret directory holds a password file
    pub fn has_password(&self) -> bool {
        self.password_path.is_file()
    }

    /// Read the key passphrase. A missing password file yields an empty one.
    pub fn passphrase(&self) -> SecureBytes {
        read_passphrase(&self.password_path)
    }
}

/// Read a passphrase file as raw bytes, falling back to an empty passphrase
/// when the file cannot be read
pub fn read_passphrase(path: &Path) -> SecureBytes {
    match fs::read(path) {
        Ok(bytes) => SecureBytes::new(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No password file at {}, using empty passphrase", path.display());
            SecureBytes::default()
        }
        Err(e) => {
            warn!(
                "Failed to read password file {}: {}, using empty passphrase",
                path.display(),
                e
            );
            SecureBytes::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn secrets_root(dirs: &[&str]) -> TempDir {
        let root = TempDir::new().unwrap();
        for dir in dirs {
            fs::create_dir(root.path().join(dir)).unwrap();
        }
        root
    }

    #[test]
    fn test_list_empty_root() {
        let root = secrets_root(&[]);
        let store = SecretStore::new(root.path());

        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_only_directories() {
        let root = secrets_root(&["beta", "alpha"]);
        fs::write(root.path().join("README"), "not a secret").unwrap();

        let store = SecretStore::new(root.path());
        assert_eq!(store.list().unwrap(), vec!["alpha", "beta"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_list_skips_symlinks() {
        let root = secrets_root(&["real"]);
        std::os::unix::fs::symlink(root.path().join("real"), root.path().join("link")).unwrap();

        let store = SecretStore::new(root.path());
        assert_eq!(store.list().unwrap(), vec!["real"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_list_keeps_non_utf8_names() {
        use std::os::unix::ffi::OsStrExt;

        let root = secrets_root(&["ok"]);
        let raw = OsStr::from_bytes(b"team\xff");
        fs::create_dir(root.path().join(raw)).unwrap();

        let store = SecretStore::new(root.path());
        assert_eq!(store.list().unwrap(), vec![OsString::from("ok"), raw.to_os_string()]);

        let secret = store.secret(raw);
        assert!(secret.override_key().is_none());
        assert_eq!(secret.display_name(), "team\u{fffd}");
        assert_eq!(secret.key_path, root.path().join(raw).join(KEY_FILE));
    }

    #[test]
    fn test_list_missing_root_fails() {
        let root = TempDir::new().unwrap();
        let store = SecretStore::new(root.path().join("does-not-exist"));

        let err = store.list().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_secret_paths() {
        let store = SecretStore::new("/var/build-secrets");
        let secret = store.secret("team-a");

        assert_eq!(secret.name, "team-a");
        assert_eq!(secret.override_key(), Some("team-a"));
        assert_eq!(
            secret.key_path,
            PathBuf::from("/var/build-secrets/team-a/cosign.key")
        );
        assert_eq!(
            secret.password_path,
            PathBuf::from("/var/build-secrets/team-a/cosign.password")
        );
    }

    #[test]
    fn test_passphrase_present() {
        let root = secrets_root(&["team-a"]);
        fs::write(root.path().join("team-a").join(PASSWORD_FILE), "s3cret").unwrap();

        let secret = SecretStore::new(root.path()).secret("team-a");
        assert!(secret.has_password());
        assert_eq!(secret.passphrase().as_bytes(), b"s3cret");
    }

    #[test]
    fn test_passphrase_keeps_non_utf8_bytes() {
        let root = secrets_root(&["team-a"]);
        fs::write(root.path().join("team-a").join(PASSWORD_FILE), b"pa\xffss\n").unwrap();

        let secret = SecretStore::new(root.path()).secret("team-a");
        assert_eq!(secret.passphrase().as_bytes(), b"pa\xffss\n");
    }

    #[test]
    fn test_passphrase_missing_is_empty() {
        let root = secrets_root(&["team-a"]);

        let secret = SecretStore::new(root.path()).secret("team-a");
        assert!(!secret.has_password());
        assert!(secret.passphrase().is_empty());
    }

    #[test]
    fn test_secrets_resolves_each_directory() {
        let root = secrets_root(&["one", "two"]);
        let store = SecretStore::new(root.path());

        let secrets = store.secrets().unwrap();
        assert_eq!(secrets.len(), 2);
        assert_eq!(secrets[0].key_path, root.path().join("one").join(KEY_FILE));
        assert_eq!(secrets[1].key_path, root.path().join("two").join(KEY_FILE));
    }
}
