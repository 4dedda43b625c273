//! X25519 key pairs for DM encryption.
//!
//! A single key pair per local identity. Regenerating it permanently
//! invalidates the ability to open anything sealed to the old key — there
//! is no key rotation or versioning in the DM protocol.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use crypto_box::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Size of public and private keys in bytes
pub const KEY_SIZE: usize = 32;

/// X25519 key pair for DM encryption
///
/// ## Security
///
/// - The private key never crosses the trust boundary: it is persisted to
///   an owner-only file and used locally, nothing else. Only the public
///   key is registered with the directory service.
/// - Key material is zeroized on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct KeyPair {
    /// Private key (secret)
    #[zeroize(skip)] // crypto_box::SecretKey zeroizes its own material
    secret: SecretKey,
    /// Public key (derived from secret, shared freely)
    #[zeroize(skip)]
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair from the OS secure random source.
    ///
    /// Fails with [`Error::RngFailed`] if the random source is
    /// unavailable — a zero or predictable key is never returned.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| Error::RngFailed)?;
        let secret = SecretKey::from(bytes);
        bytes.zeroize();
        let public = secret.public_key();
        Ok(Self { secret, public })
    }

    /// Reconstruct a key pair from raw private-key bytes.
    pub fn from_secret_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        let secret = SecretKey::from(bytes);
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Raw private-key bytes, for persistence only. Never log or transmit.
    pub fn secret_bytes(&self) -> [u8; KEY_SIZE] {
        self.secret.to_bytes()
    }

    /// Raw public-key bytes.
    pub fn public_bytes(&self) -> [u8; KEY_SIZE] {
        *self.public.as_bytes()
    }

    /// Public key, base64-encoded, as registered with the directory.
    pub fn public_base64(&self) -> String {
        BASE64.encode(self.public_bytes())
    }

    /// The private key, for seal/open operations.
    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    /// The public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }
}

impl std::fmt::Debug for KeyPair {
    // Debug must not leak the private key.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public_base64())
            .finish_non_exhaustive()
    }
}

/// Decode a base64 public key, requiring exactly 32 bytes.
pub fn decode_public_key(encoded: &str) -> Result<PublicKey> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| Error::InvalidKey(format!("base64 decode failed: {e}")))?;
    let bytes: [u8; KEY_SIZE] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::InvalidKey(format!("expected {KEY_SIZE} bytes, got {}", bytes.len())))?;
    Ok(PublicKey::from(bytes))
}

/// Encode a public key as base64.
pub fn encode_public_key(key: &PublicKey) -> String {
    BASE64.encode(key.as_bytes())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keypairs_are_distinct() {
        let a = KeyPair::generate().unwrap();
        let b = KeyPair::generate().unwrap();
        assert_ne!(a.public_bytes(), b.public_bytes());
        assert_ne!(a.secret_bytes(), b.secret_bytes());
    }

    #[test]
    fn from_secret_bytes_round_trips() {
        let kp = KeyPair::generate().unwrap();
        let restored = KeyPair::from_secret_bytes(kp.secret_bytes());
        assert_eq!(kp.public_bytes(), restored.public_bytes());
    }

    #[test]
    fn public_key_base64_round_trips() {
        let kp = KeyPair::generate().unwrap();
        let decoded = decode_public_key(&kp.public_base64()).unwrap();
        assert_eq!(decoded.as_bytes(), &kp.public_bytes());
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let short = BASE64.encode([1u8; 16]);
        assert!(matches!(
            decode_public_key(&short),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn decode_rejects_bad_base64() {
        assert!(matches!(
            decode_public_key("not valid base64!!!"),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = KeyPair::generate().unwrap();
        let rendered = format!("{kp:?}");
        let secret_b64 = BASE64.encode(kp.secret_bytes());
        assert!(!rendered.contains(&secret_b64));
    }
}
