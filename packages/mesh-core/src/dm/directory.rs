//! Key exchange against the remote directory service.

use crate::api::{DmApi, RegisterKeyRequest, RegisteredKey};
use crate::crypto::{decode_public_key, KeyPair, PublicKey};
use crate::error::{Error, Result};

/// Client for the directory service mapping identities to registered
/// DM public keys.
pub struct KeyDirectory<'a, A: DmApi> {
    api: &'a A,
}

/// Outcome of a best-effort key registration.
///
/// A failed refresh is deliberately not an error: the key was presumably
/// registered on an earlier run, so the in-progress send can proceed. The
/// caller may log the soft failure but must not propagate it.
#[derive(Debug)]
pub enum Registration {
    /// The directory accepted (or refreshed) the registration.
    Registered(RegisteredKey),
    /// The upsert failed; logged, not propagated.
    SoftFailed(Error),
}

impl<'a, A: DmApi> KeyDirectory<'a, A> {
    /// Wrap an API handle.
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Fetch and decode a counterparty's public key.
    ///
    /// A counterparty who never registered a key is reported as the
    /// distinct [`Error::RecipientKeyUnavailable`] — encryption cannot
    /// proceed without their key, and the caller needs to tell that apart
    /// from a transport failure.
    pub fn fetch_public_key(&self, ident: &str) -> Result<PublicKey> {
        match self.api.get_dm_key(ident) {
            Ok(registered) => decode_public_key(&registered.public_key),
            Err(Error::Api { status, ref code, .. })
                if status == 404 || code == "not_found" =>
            {
                Err(Error::RecipientKeyUnavailable(ident.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Publish the local public key; failure aborts the caller.
    ///
    /// This is the `dm key init` path, where an unregistered key would
    /// leave the identity unable to receive encrypted DMs.
    pub fn register(&self, keypair: &KeyPair) -> Result<RegisteredKey> {
        self.api.register_dm_key(&RegisterKeyRequest {
            public_key: keypair.public_base64(),
        })
    }

    /// Publish the local public key, swallowing failure into
    /// [`Registration::SoftFailed`].
    pub fn register_best_effort(&self, keypair: &KeyPair) -> Registration {
        match self.register(keypair) {
            Ok(registered) => Registration::Registered(registered),
            Err(e) => {
                tracing::warn!(error = %e, "best-effort DM key registration failed");
                Registration::SoftFailed(e)
            }
        }
    }
}
