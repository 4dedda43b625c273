//! # Key Store
//!
//! Persistence for the local identity's DM key pair.
//!
//! ## File format
//!
//! `<config root>/keys/dm_key.json`, owner read/write only:
//!
//! ```json
//! {
//!   "private_key": "<base64, exactly 32 bytes>",
//!   "public_key":  "<base64, exactly 32 bytes>"
//! }
//! ```
//!
//! ## Lifecycle
//!
//! Two states per identity: **NoKey** and **HasKey**.
//!
//! - NoKey → HasKey: automatic on first send ([`KeyStore::load_or_generate`])
//!   or explicit `mesh dm key init`.
//! - HasKey → HasKey: regeneration, only through the explicit force path
//!   ([`KeyStore::save_overwrite`]) — it makes every previously received
//!   envelope permanently undecryptable.
//! - There is no exposed HasKey → NoKey transition.
//!
//! ## Write discipline
//!
//! All writes go to a temp file first. First-time creation publishes the
//! temp file with `hard_link`, which fails if the key file already exists:
//! two processes racing on `load_or_generate` cannot clobber each other,
//! the loser loads the winner's key. Forced regeneration publishes with
//! `rename`, so an interrupted write never leaves a truncated key file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::{KeyPair, KEY_SIZE};
use crate::error::{Error, Result};
use crate::paths::ensure_private_dir;

const KEYS_SUBDIR: &str = "keys";
const KEY_FILE: &str = "dm_key.json";

/// Persisted key document. Both fields decode to exactly 32 bytes.
#[derive(Serialize, Deserialize)]
struct KeyFile {
    private_key: String,
    public_key: String,
}

/// Store for the local identity's DM key pair.
///
/// One instance per command invocation, passed by reference to whatever
/// needs keys — there is no process-global key cache.
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    /// Open the store rooted at the per-identity config directory.
    ///
    /// Nothing is read or created until an operation runs.
    pub fn open(config_root: &Path) -> Self {
        Self {
            path: config_root.join(KEYS_SUBDIR).join(KEY_FILE),
        }
    }

    /// Path of the key file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a key file is present (it may still be corrupt).
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the persisted key pair.
    ///
    /// Fails with [`Error::KeyNotFound`] if the file is absent, and with
    /// [`Error::KeyCorrupt`] if it is present but does not decode to a
    /// structurally valid key pair.
    pub fn load(&self) -> Result<KeyPair> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(Error::KeyNotFound),
            Err(e) => return Err(Error::Io(e)),
        };

        let doc: KeyFile = serde_json::from_slice(&data)
            .map_err(|e| Error::KeyCorrupt(format!("not a valid key document: {e}")))?;

        let mut secret = decode_key_field("private_key", &doc.private_key)?;
        let keypair = KeyPair::from_secret_bytes(secret);
        secret.zeroize();

        // The stored public key must match the one the private key derives;
        // anything else means the file was damaged or hand-edited.
        let public = decode_key_field("public_key", &doc.public_key)?;
        if public != keypair.public_bytes() {
            return Err(Error::KeyCorrupt(
                "public key does not match private key".into(),
            ));
        }

        Ok(keypair)
    }

    /// Load the key pair, generating and persisting one if none exists.
    ///
    /// A corrupt key file is surfaced, never silently regenerated. If a
    /// concurrent invocation creates the file between our load and save,
    /// that process's key wins and is loaded instead.
    pub fn load_or_generate(&self) -> Result<KeyPair> {
        match self.load() {
            Ok(keypair) => Ok(keypair),
            Err(Error::KeyNotFound) => {
                let keypair = KeyPair::generate()?;
                match self.save_new(&keypair) {
                    Ok(()) => Ok(keypair),
                    Err(Error::KeyExists) => {
                        tracing::debug!("key file appeared concurrently, loading it");
                        self.load()
                    }
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Persist a key pair only if no key file exists yet (atomic
    /// create-if-absent). Fails with [`Error::KeyExists`] otherwise.
    pub fn save_new(&self, keypair: &KeyPair) -> Result<()> {
        let tmp = self.write_temp(keypair)?;
        match fs::hard_link(&tmp, &self.path) {
            Ok(()) => {
                let _ = fs::remove_file(&tmp);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let _ = fs::remove_file(&tmp);
                Err(Error::KeyExists)
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                Err(Error::Io(e))
            }
        }
    }

    /// Persist a key pair, replacing any existing file.
    ///
    /// This is the forced-regeneration path: the command layer must have
    /// confirmed `--force`, because the previous key (and with it every
    /// previously received envelope) is gone after this.
    pub fn save_overwrite(&self, keypair: &KeyPair) -> Result<()> {
        let tmp = self.write_temp(keypair)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Write the key document to an owner-only temp file next to the
    /// final path, returning the temp path.
    fn write_temp(&self, keypair: &KeyPair) -> Result<PathBuf> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| Error::Config("key path has no parent directory".into()))?;
        ensure_private_dir(dir)?;

        let doc = KeyFile {
            private_key: BASE64.encode(keypair.secret_bytes()),
            public_key: keypair.public_base64(),
        };
        let data = serde_json::to_vec_pretty(&doc)?;

        let tmp = dir.join(format!("{KEY_FILE}.{}.tmp", std::process::id()));
        let mut file = create_private_file(&tmp)?;
        io::Write::write_all(&mut file, &data)?;
        file.sync_all()?;
        Ok(tmp)
    }
}

fn decode_key_field(name: &str, encoded: &str) -> Result<[u8; KEY_SIZE]> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| Error::KeyCorrupt(format!("{name}: base64 decode failed: {e}")))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::KeyCorrupt(format!("{name}: expected {KEY_SIZE} bytes, got {}", bytes.len())))
}

fn create_private_file(path: &Path) -> Result<fs::File> {
    let mut opts = fs::OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    Ok(opts.open(path)?)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_without_file_is_key_not_found() {
        let dir = tempdir().unwrap();
        let store = KeyStore::open(dir.path());
        assert!(matches!(store.load(), Err(Error::KeyNotFound)));
        assert!(!store.exists());
    }

    #[test]
    fn load_or_generate_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = KeyStore::open(dir.path());

        let first = store.load_or_generate().unwrap();
        assert!(store.exists());
        let second = store.load_or_generate().unwrap();

        assert_eq!(first.secret_bytes(), second.secret_bytes());
        assert_eq!(first.public_bytes(), second.public_bytes());
    }

    #[test]
    fn save_new_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let store = KeyStore::open(dir.path());

        let first = store.load_or_generate().unwrap();
        let other = KeyPair::generate().unwrap();
        assert!(matches!(store.save_new(&other), Err(Error::KeyExists)));

        // The original key survives.
        let loaded = store.load().unwrap();
        assert_eq!(loaded.secret_bytes(), first.secret_bytes());
    }

    #[test]
    fn save_overwrite_replaces_the_key() {
        let dir = tempdir().unwrap();
        let store = KeyStore::open(dir.path());

        let first = store.load_or_generate().unwrap();
        let replacement = KeyPair::generate().unwrap();
        store.save_overwrite(&replacement).unwrap();

        let loaded = store.load().unwrap();
        assert_ne!(loaded.secret_bytes(), first.secret_bytes());
        assert_eq!(loaded.secret_bytes(), replacement.secret_bytes());
    }

    #[test]
    fn corrupt_json_is_key_corrupt_and_not_repaired() {
        let dir = tempdir().unwrap();
        let store = KeyStore::open(dir.path());

        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), b"{ not json").unwrap();

        assert!(matches!(store.load(), Err(Error::KeyCorrupt(_))));
        // load_or_generate must surface the corruption, not regenerate.
        assert!(matches!(store.load_or_generate(), Err(Error::KeyCorrupt(_))));
        assert_eq!(fs::read(store.path()).unwrap(), b"{ not json");
    }

    #[test]
    fn wrong_length_key_is_key_corrupt() {
        let dir = tempdir().unwrap();
        let store = KeyStore::open(dir.path());

        let doc = serde_json::json!({
            "private_key": BASE64.encode([1u8; 16]),
            "public_key": BASE64.encode([2u8; 32]),
        });
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), serde_json::to_vec(&doc).unwrap()).unwrap();

        assert!(matches!(store.load(), Err(Error::KeyCorrupt(_))));
    }

    #[test]
    fn mismatched_public_key_is_key_corrupt() {
        let dir = tempdir().unwrap();
        let store = KeyStore::open(dir.path());

        let keypair = KeyPair::generate().unwrap();
        let doc = serde_json::json!({
            "private_key": BASE64.encode(keypair.secret_bytes()),
            "public_key": BASE64.encode([9u8; 32]),
        });
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), serde_json::to_vec(&doc).unwrap()).unwrap();

        assert!(matches!(store.load(), Err(Error::KeyCorrupt(_))));
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = KeyStore::open(dir.path());
        store.load_or_generate().unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let dir_mode = fs::metadata(store.path().parent().unwrap())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let store = KeyStore::open(dir.path());
        store.load_or_generate().unwrap();
        store
            .save_overwrite(&KeyPair::generate().unwrap())
            .unwrap();

        let leftovers: Vec<_> = fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
