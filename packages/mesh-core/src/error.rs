//! # Error Handling
//!
//! Every failure the library can produce is a variant of [`Error`], grouped
//! by the subsystem it originates from. The grouping matters for the CLI:
//! cryptographic and key-storage errors are terminal for the current command
//! (encryption is all-or-nothing, there is no fallback to plaintext), while
//! listing operations degrade per item and never surface decryption misses
//! as command failures.
//!
//! Each variant carries a stable machine-readable code (see [`Error::code`])
//! so that JSON consumers can distinguish, say, an authentication failure
//! from a transport failure without parsing the human message. Collapsing
//! those two would mask tampering, so the mapping is exhaustive and tested.

use thiserror::Error;

/// Result type alias for mesh-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mesh-core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Key Storage
    // ========================================================================

    /// No local key pair exists. Recoverable: generate one (automatic on
    /// first send) or run `mesh dm key init`.
    #[error("no DM key pair found; run 'mesh dm key init' or send a DM to create one")]
    KeyNotFound,

    /// The key file exists but does not decode to two 32-byte keys.
    /// Never auto-repaired: silently regenerating would be destructive.
    #[error("DM key file is corrupt: {0}; re-initialize explicitly with 'mesh dm key init --force'")]
    KeyCorrupt(String),

    /// A key file already exists where a new one was to be created.
    #[error("a DM key pair already exists; use --force to regenerate (previous DMs become unreadable)")]
    KeyExists,

    // ========================================================================
    // Cryptography
    // ========================================================================

    /// The counterparty has never registered a public key, so nothing can
    /// be encrypted to them. Fatal to a send.
    #[error("@{0} has no registered DM key; they must initialize DM encryption first")]
    RecipientKeyUnavailable(String),

    /// The ciphertext authentication tag did not verify: tampering, a wrong
    /// key, or corruption. Reported distinctly from structural errors and
    /// never returns partial plaintext.
    #[error("message authentication failed: wrong key or tampered ciphertext")]
    AuthenticationFailure,

    /// The envelope is structurally invalid (bad base64, or shorter than
    /// the nonce) before any cryptography is attempted.
    #[error("invalid message envelope: {0}")]
    InvalidEnvelope(String),

    /// A public key did not decode to exactly 32 bytes.
    #[error("invalid public key: {0}")]
    InvalidKey(String),

    /// The OS random source failed. Fatal: a weak or fixed nonce is never
    /// an acceptable fallback.
    #[error("secure random source unavailable")]
    RngFailed,

    /// The seal operation itself failed (should not happen with valid keys).
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    // ========================================================================
    // Transport
    // ========================================================================

    /// The server could not be reached or the connection broke.
    #[error("{op}: transport error: {message}")]
    Transport {
        /// Operation that was being performed
        op: &'static str,
        /// Underlying failure description
        message: String,
    },

    /// The fixed 30-second request deadline elapsed.
    #[error("{0}: request timed out")]
    Timeout(&'static str),

    /// The server answered with a non-2xx status and a typed error body.
    #[error("{op}: server rejected request ({code}): {message}")]
    Api {
        /// Operation that was being performed
        op: &'static str,
        /// HTTP status
        status: u16,
        /// Server error code, e.g. `not_found`
        code: String,
        /// Human-readable server message
        message: String,
    },

    /// The response body did not match the endpoint's expected shape.
    #[error("{op}: unexpected response shape: {message}")]
    UnexpectedResponse {
        /// Operation that was being performed
        op: &'static str,
        /// What failed to parse
        message: String,
    },

    // ========================================================================
    // Local state
    // ========================================================================

    /// No session file, or no token available.
    #[error("not authenticated: no session found and $MESH_TOKEN is not set")]
    NotAuthenticated,

    /// The stored session has passed its expiry.
    #[error("session expired: sign in again to obtain a fresh token")]
    SessionExpired,

    /// `this` was used but no (unexpired) context is available.
    #[error("no context available: use an explicit ID or handle")]
    ContextUnavailable,

    /// Configuration problem (unknown key, missing home directory, ...).
    #[error("config error: {0}")]
    Config(String),

    /// Filesystem failure outside the specific key-storage cases above.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted JSON document failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Stable machine-readable code for this error kind.
    ///
    /// These codes are part of the CLI's JSON output contract; renaming one
    /// is a breaking change for script and agent consumers.
    pub fn code(&self) -> &'static str {
        match self {
            Error::KeyNotFound => "key_not_found",
            Error::KeyCorrupt(_) => "key_corrupt",
            Error::KeyExists => "key_exists",
            Error::RecipientKeyUnavailable(_) => "recipient_key_unavailable",
            Error::AuthenticationFailure => "authentication_failure",
            Error::InvalidEnvelope(_) => "invalid_envelope",
            Error::InvalidKey(_) => "invalid_key",
            Error::RngFailed => "rng_failed",
            Error::EncryptionFailed(_) => "encryption_failed",
            Error::Transport { .. } => "transport_error",
            Error::Timeout(_) => "timeout",
            Error::Api { .. } => "api_error",
            Error::UnexpectedResponse { .. } => "unexpected_response",
            Error::NotAuthenticated => "not_authenticated",
            Error::SessionExpired => "session_expired",
            Error::ContextUnavailable => "context_unavailable",
            Error::Config(_) => "config_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }

    /// Whether retrying the whole command might succeed without user action.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::Timeout(_))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_for_auth_and_transport() {
        // AuthenticationFailure must never be collapsed into a generic
        // transport/decrypt code: it is the tamper signal.
        let auth = Error::AuthenticationFailure;
        let transport = Error::Transport {
            op: "send_dm",
            message: "connection refused".into(),
        };
        assert_ne!(auth.code(), transport.code());
        assert_eq!(auth.code(), "authentication_failure");
    }

    #[test]
    fn structural_and_auth_errors_are_distinct() {
        let structural = Error::InvalidEnvelope("too short".into());
        assert_ne!(structural.code(), Error::AuthenticationFailure.code());
    }

    #[test]
    fn recoverable_errors() {
        assert!(Error::Timeout("list_dms").is_recoverable());
        assert!(!Error::KeyCorrupt("bad length".into()).is_recoverable());
        assert!(!Error::AuthenticationFailure.is_recoverable());
    }
}
