//! # Cryptography Module
//!
//! Authenticated public-key encryption for direct messages.
//!
//! ## Construction
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     DM ENCRYPTION (NaCl box)                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  SENDER (Alice)                                                         │
//! │  ──────────────                                                         │
//! │                                                                         │
//! │  1. Fresh random nonce (24 bytes, never reused)                         │
//! │                                                                         │
//! │  2. box.Seal(                                                           │
//! │       nonce,                                                            │
//! │       plaintext,                                                        │
//! │       recipient_public_key (X25519, 32 bytes),                          │
//! │       sender_private_key   (X25519, 32 bytes),                          │
//! │     )  →  ciphertext ‖ 16-byte Poly1305 tag                             │
//! │                                                                         │
//! │  3. envelope = base64( nonce ‖ ciphertext )                             │
//! │                                                                         │
//! │  RECIPIENT (Bob)                                                        │
//! │  ───────────────                                                        │
//! │                                                                         │
//! │  1. base64-decode, split nonce (first 24 bytes) / ciphertext            │
//! │                                                                         │
//! │  2. box.Open(nonce, ciphertext, sender_public, recipient_private)       │
//! │     → plaintext, or an authentication error on any tampering            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The construction binds both identities: only the holder of the
//! recipient's private key, checking against the sender's public key, can
//! open the envelope. The relay stores the envelope as an opaque blob.
//!
//! ## Security Properties
//!
//! | Property        | Guarantee                                          |
//! |-----------------|----------------------------------------------------|
//! | Confidentiality | Only sender and recipient can read the message     |
//! | Integrity       | Any modification fails authentication              |
//! | Authenticity    | Ciphertext is bound to the sender's key pair       |

mod envelope;
mod keys;

pub use envelope::{open, seal, NONCE_SIZE, TAG_SIZE};
pub use keys::{decode_public_key, encode_public_key, KeyPair, KEY_SIZE};

pub use crypto_box::{PublicKey, SecretKey};
