//! # Direct Messages
//!
//! The end-to-end encrypted DM subsystem.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          DM SEND PIPELINE                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  command ──► KeyStore.load_or_generate()                                │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │          KeyDirectory.fetch_public_key(recipient)   (fatal on miss)     │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │          crypto::seal(plaintext, our_secret, their_public)              │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │          DmApi.send_dm(envelope)  ──►  relay (stores ciphertext only)   │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │          KeyDirectory.register_best_effort(our_public)   (soft)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On the list path decryption is opportunistic: the counterparty is the
//! other participant in the conversation, their key is looked up in the
//! directory, and anything that cannot be opened is surfaced as an
//! explicit placeholder — one unreadable message never fails the listing.

mod directory;
mod service;

pub use directory::{KeyDirectory, Registration};
pub use service::{DmService, InboxEntry, ENCRYPTED_PLACEHOLDER};
