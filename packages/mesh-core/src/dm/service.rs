//! Orchestration of the DM send and list flows.

use std::collections::HashMap;

use super::directory::KeyDirectory;
use crate::api::{DirectMessage, DmApi, Pagination, SendDmRequest};
use crate::crypto::{self, KeyPair, PublicKey};
use crate::error::{Error, Result};
use crate::keystore::KeyStore;

/// What a message renders as when it cannot be decrypted.
pub const ENCRYPTED_PLACEHOLDER: &str = "[encrypted]";

/// A listed message together with its opportunistic decryption.
#[derive(Debug)]
pub struct InboxEntry {
    /// The raw message record
    pub message: DirectMessage,
    /// Decrypted content, when the local key and the counterparty's key
    /// could both be resolved and the envelope authenticated
    pub plaintext: Option<String>,
}

impl InboxEntry {
    /// The decrypted content, or the encrypted placeholder.
    pub fn display_text(&self) -> &str {
        self.plaintext.as_deref().unwrap_or(ENCRYPTED_PLACEHOLDER)
    }
}

/// Bridges the message cipher to the remote delivery mechanism.
///
/// Instantiated once per command invocation; decrypted plaintext is never
/// cached locally.
pub struct DmService<'a, A: DmApi> {
    api: &'a A,
    keystore: &'a KeyStore,
    /// Our own user id, when a session identifies one. Needed to decide
    /// which side of a message is the counterparty.
    self_id: Option<String>,
}

impl<'a, A: DmApi> DmService<'a, A> {
    /// Create a service over an API handle and a key store.
    pub fn new(api: &'a A, keystore: &'a KeyStore, self_id: Option<String>) -> Self {
        Self {
            api,
            keystore,
            self_id,
        }
    }

    /// Send an end-to-end encrypted DM.
    ///
    /// Loads (or transparently creates) the local key pair, fetches the
    /// recipient's registered key, seals the plaintext and hands the
    /// envelope to the transport. Afterwards the local public key is
    /// re-registered best-effort; that refresh failing does not fail the
    /// send.
    pub fn send(
        &self,
        recipient_handle: &str,
        plaintext: &str,
        asset_ids: Vec<String>,
    ) -> Result<DirectMessage> {
        let keypair = self.keystore.load_or_generate()?;
        let directory = KeyDirectory::new(self.api);

        let recipient_key = directory.fetch_public_key(recipient_handle)?;
        let content = crypto::seal(plaintext.as_bytes(), keypair.secret_key(), &recipient_key)?;

        let message = self.api.send_dm(&SendDmRequest {
            recipient_handle: recipient_handle.to_string(),
            content,
            asset_ids,
        })?;
        tracing::debug!(id = %message.id, to = recipient_handle, "DM sent");

        // Soft failure by contract: logged inside register_best_effort,
        // never propagated as the send's failure.
        let _ = directory.register_best_effort(&keypair);

        Ok(message)
    }

    /// Fetch a page of DMs, decrypting each opportunistically.
    ///
    /// Returns every message the server handed back; entries that cannot
    /// be decrypted (no local key, unresolvable counterparty key, failed
    /// authentication) carry `plaintext: None` instead of failing the
    /// whole listing. A corrupt key file is the one local-state problem
    /// that does fail the listing: its error carries the re-initialize
    /// guidance, and hiding it behind placeholders would mask it.
    pub fn list(&self, page: &Pagination) -> Result<(Vec<InboxEntry>, Option<String>)> {
        let page_data = self.api.list_dms(page)?;

        let keypair = match self.keystore.load() {
            Ok(kp) => Some(kp),
            Err(Error::KeyNotFound) => None,
            Err(e) => return Err(e),
        };

        let directory = KeyDirectory::new(self.api);
        let mut key_memo: HashMap<String, Option<PublicKey>> = HashMap::new();

        let entries = page_data
            .dms
            .into_iter()
            .map(|message| {
                let plaintext = keypair
                    .as_ref()
                    .and_then(|kp| self.try_decrypt(&directory, &mut key_memo, kp, &message));
                InboxEntry { message, plaintext }
            })
            .collect();

        Ok((entries, page_data.cursor))
    }

    /// The other participant in the conversation: the recipient for
    /// messages we sent, the sender for messages we received.
    fn counterparty_id<'m>(&self, message: &'m DirectMessage) -> &'m str {
        match &self.self_id {
            Some(id) if *id == message.sender_id => &message.recipient_id,
            _ => &message.sender_id,
        }
    }

    fn try_decrypt(
        &self,
        directory: &KeyDirectory<'a, A>,
        key_memo: &mut HashMap<String, Option<PublicKey>>,
        keypair: &KeyPair,
        message: &DirectMessage,
    ) -> Option<String> {
        let counterparty = self.counterparty_id(message).to_string();

        // One directory lookup per counterparty per invocation. This memo
        // holds public keys only, never plaintext.
        let key = key_memo
            .entry(counterparty.clone())
            .or_insert_with(|| match directory.fetch_public_key(&counterparty) {
                Ok(key) => Some(key),
                Err(e) => {
                    tracing::debug!(user = %counterparty, error = %e, "counterparty key unavailable");
                    None
                }
            })
            .clone()?;

        match crypto::open(&message.content, keypair.secret_key(), &key) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Some(text),
                Err(_) => {
                    tracing::debug!(id = %message.id, "decrypted content is not valid UTF-8");
                    None
                }
            },
            Err(e) => {
                tracing::debug!(id = %message.id, error = %e, "decryption failed");
                None
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
