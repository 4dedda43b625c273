//! # Mesh Core
//!
//! Client library for the Mesh social network: API client, local state
//! (config, session, context), and the end-to-end encrypted direct
//! message subsystem the `mesh` CLI is built on.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          MESH CORE MODULES                          │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                                                                     │
//! │  ┌─────────────┐   ┌─────────────┐   ┌──────────────────────────┐  │
//! │  │     dm      │   │     api     │   │       local state        │  │
//! │  │             │   │             │   │                          │  │
//! │  │ - Service   │──►│ - Client    │   │ - config   (config.rs)   │  │
//! │  │ - Directory │   │ - DmApi     │   │ - session  (session.rs)  │  │
//! │  │ - Inbox     │   │ - Types     │   │ - context  (context.rs)  │  │
//! │  └──────┬──────┘   └─────────────┘   │ - paths    (paths.rs)    │  │
//! │         │                            └──────────────────────────┘  │
//! │         ▼                                                          │
//! │  ┌─────────────┐   ┌─────────────┐                                 │
//! │  │   crypto    │   │  keystore   │                                 │
//! │  │             │   │             │                                 │
//! │  │ - KeyPair   │◄──│ - Load/Save │                                 │
//! │  │ - seal/open │   │ - Atomic    │                                 │
//! │  └─────────────┘   └─────────────┘                                 │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Key pairs and authenticated message envelopes
//! - [`keystore`] - Durable, owner-only storage of the local key pair
//! - [`api`] - Blocking HTTP client for the Mesh server API
//! - [`dm`] - DM orchestration (send pipeline, inbox decryption, key directory)
//! - [`config`] - Local CLI configuration
//! - [`session`] - Bearer-token session storage
//! - [`context`] - `this` target resolution
//! - [`paths`] - Per-identity filesystem locations
//!
//! ## Security Model
//!
//! Message confidentiality and integrity come from public-key
//! authenticated encryption (X25519 + XSalsa20-Poly1305). The server
//! stores only opaque envelopes and base64 public keys; plaintext and
//! secret keys never leave the client. The key pair is not derived from
//! the account credential, so losing it (or regenerating with `--force`)
//! permanently orphans previously received ciphertexts. That loss is
//! surfaced, never silently repaired.

#![warn(missing_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod api;
pub mod config;
pub mod context;
pub mod crypto;
pub mod dm;
pub mod error;
pub mod keystore;
pub mod paths;
pub mod session;

// Re-export the error types at the crate root
pub use error::{Error, Result};
