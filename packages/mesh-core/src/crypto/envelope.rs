//! Sealing and opening of DM envelopes.
//!
//! An envelope is `base64( nonce[24] ‖ ciphertext+tag )`, produced by the
//! NaCl `box` construction. The byte layout is the DM wire contract: any
//! peer implementation must produce and accept exactly this shape.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use crypto_box::aead::Aead;
use crypto_box::{Nonce, PublicKey, SalsaBox, SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Error, Result};

/// Size of the box nonce in bytes (192 bits)
pub const NONCE_SIZE: usize = 24;

/// Size of the Poly1305 authentication tag in bytes, appended to the
/// ciphertext by the seal operation (never handled separately here)
pub const TAG_SIZE: usize = 16;

/// Seal plaintext for a recipient, producing a transport envelope.
///
/// A fresh random nonce is drawn per call. Nonce reuse under the same key
/// pair breaks the construction's confidentiality, so an exhausted random
/// source is a fatal [`Error::RngFailed`] — never a fixed fallback.
pub fn seal(
    plaintext: &[u8],
    sender_secret: &SecretKey,
    recipient_public: &PublicKey,
) -> Result<String> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|_| Error::RngFailed)?;
    let nonce = Nonce::from(nonce_bytes);

    let cipher = SalsaBox::new(recipient_public, sender_secret);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| Error::EncryptionFailed("box seal failed".into()))?;

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(combined))
}

/// Open a transport envelope from a sender.
///
/// Structural problems (bad base64, envelope shorter than the nonce) are
/// reported as [`Error::InvalidEnvelope`]. A tag that does not verify is
/// [`Error::AuthenticationFailure`] — tampering, a wrong key, or
/// corruption — and never yields partial plaintext.
pub fn open(
    envelope: &str,
    recipient_secret: &SecretKey,
    sender_public: &PublicKey,
) -> Result<Vec<u8>> {
    let data = BASE64
        .decode(envelope.trim())
        .map_err(|e| Error::InvalidEnvelope(format!("base64 decode failed: {e}")))?;

    if data.len() < NONCE_SIZE {
        return Err(Error::InvalidEnvelope(format!(
            "envelope is {} bytes, shorter than the {NONCE_SIZE}-byte nonce",
            data.len()
        )));
    }

    let nonce_bytes: [u8; NONCE_SIZE] = data[..NONCE_SIZE]
        .try_into()
        .map_err(|_| Error::InvalidEnvelope("nonce split failed".into()))?;
    let nonce = Nonce::from(nonce_bytes);

    let cipher = SalsaBox::new(sender_public, recipient_secret);
    cipher
        .decrypt(&nonce, &data[NONCE_SIZE..])
        .map_err(|_| Error::AuthenticationFailure)
}

// ============================================================================
// TESTS
// ============================================================================
