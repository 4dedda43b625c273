//! # API Module
//!
//! Typed HTTP access to the Mesh backend.
//!
//! The DM subsystem consumes the backend through the [`DmApi`] trait
//! rather than the concrete client, so its orchestration logic can be
//! exercised against in-memory fakes. [`ApiClient`] is the production
//! implementation: blocking reqwest, bearer-token auth, fixed 30-second
//! timeout, typed error bodies.

mod client;
mod types;

pub use client::{ApiClient, REQUEST_TIMEOUT};
pub use types::{
    DirectMessage, DmPage, Pagination, RegisterKeyRequest, RegisteredKey, SendDmRequest, User,
};

use crate::error::Result;

/// The slice of the backend the DM subsystem depends on.
///
/// `register_dm_key` is an idempotent upsert: safe to call on every send.
/// `get_dm_key` takes a handle or canonical user id — the directory
/// service resolves either.
pub trait DmApi {
    /// Create a direct message (content is an opaque encrypted envelope).
    fn send_dm(&self, req: &SendDmRequest) -> Result<DirectMessage>;

    /// Fetch a page of direct messages.
    fn list_dms(&self, page: &Pagination) -> Result<DmPage>;

    /// Publish the local public key to the directory service.
    fn register_dm_key(&self, req: &RegisterKeyRequest) -> Result<RegisteredKey>;

    /// Fetch a counterparty's registered public key.
    fn get_dm_key(&self, ident: &str) -> Result<RegisteredKey>;
}
