//! Wire types for the Mesh API.
//!
//! Response shapes are explicit structs per endpoint; a body that does not
//! match its endpoint's shape is a typed parse error, never probed as a
//! loose map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Canonical user id
    pub id: String,
    /// Unique handle (without the `@`)
    pub handle: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Profile bio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Account creation time
    pub created_at: DateTime<Utc>,
}

/// A direct message record, owned by the server.
///
/// `content` is the encrypted envelope — opaque to the transport and to
/// the server, only ever constructed and read by the crypto layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectMessage {
    /// Message id
    pub id: String,
    /// Sender user id
    pub sender_id: String,
    /// Recipient user id
    pub recipient_id: String,
    /// base64(nonce ‖ ciphertext), opaque here
    pub content: String,
    /// Attached asset ids
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub asset_ids: Vec<String>,
    /// Server-side creation time
    pub created_at: DateTime<Utc>,
}

/// Remote projection of a registered DM public key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredKey {
    /// Owning user id
    pub user_id: String,
    /// base64-encoded 32-byte public key
    pub public_key: String,
    /// Registration (or last re-registration) time
    pub created_at: DateTime<Utc>,
}

/// Request body for sending a DM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendDmRequest {
    /// Recipient handle (without the `@`)
    pub recipient_handle: String,
    /// Encrypted envelope — the client encrypts before this is built
    pub content: String,
    /// Attached asset ids
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub asset_ids: Vec<String>,
}

/// Request body for registering a DM public key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterKeyRequest {
    /// base64-encoded 32-byte public key
    pub public_key: String,
}

/// Cursor pagination for list endpoints.
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    /// Maximum number of items to return
    pub limit: Option<u32>,
    /// Return items before this cursor
    pub before: Option<String>,
    /// Return items after this cursor
    pub after: Option<String>,
}

/// One page of direct messages.
#[derive(Debug, Clone, Deserialize)]
pub struct DmPage {
    /// Messages, newest first
    pub dms: Vec<DirectMessage>,
    /// Cursor for the next page, if any
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Error body the server sends with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    /// Machine-readable error code, e.g. `not_found`
    pub error: String,
    /// Optional human-readable elaboration
    #[serde(default)]
    pub reason: Option<String>,
}
