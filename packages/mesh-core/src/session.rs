//! Authentication session storage.
//!
//! The session file holds the bearer token the identity/session provider
//! issued, plus the authenticated user for local display. The DM core
//! never manages credentials itself; it only consumes the token through
//! [`bearer_token`].

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::User;
use crate::error::{Error, Result};
use crate::paths::write_private_file;

/// Environment variable supplying a static token, bypassing the session
/// file (for scripts and agents).
pub const TOKEN_ENV: &str = "MESH_TOKEN";

const SESSION_FILE: &str = "session.json";

/// An authenticated user session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for API calls
    pub token: String,
    /// The authenticated user, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Expiry, when the server issued one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// When the session was established
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Load the stored session.
    ///
    /// Fails with [`Error::NotAuthenticated`] when no session file exists
    /// and [`Error::SessionExpired`] when it has passed its expiry.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(SESSION_FILE);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotAuthenticated)
            }
            Err(e) => return Err(Error::Io(e)),
        };
        let session: Session = serde_json::from_slice(&data)?;
        if session.is_expired() {
            return Err(Error::SessionExpired);
        }
        Ok(session)
    }

    /// Persist the session, owner-only.
    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        write_private_file(&root.join(SESSION_FILE), &data)
    }

    /// Remove any stored session.
    pub fn clear(root: &Path) -> Result<()> {
        match fs::remove_file(root.join(SESSION_FILE)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Whether the session has passed its expiry.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() > at)
    }
}

/// Resolve the bearer token: `$MESH_TOKEN` wins, otherwise the session
/// file. Also returns the session's user when one is stored.
pub fn bearer_token(root: &Path) -> Result<(String, Option<User>)> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.is_empty() {
            return Ok((token, None));
        }
    }
    let session = Session::load(root)?;
    Ok((session.token, session.user))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn session(token: &str, expires_at: Option<DateTime<Utc>>) -> Session {
        Session {
            token: token.into(),
            user: None,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn missing_session_is_not_authenticated() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Session::load(dir.path()),
            Err(Error::NotAuthenticated)
        ));
    }

    #[test]
    fn save_and_load_round_trips() {
        let dir = tempdir().unwrap();
        session("tok_abc", None).save(dir.path()).unwrap();
        let loaded = Session::load(dir.path()).unwrap();
        assert_eq!(loaded.token, "tok_abc");
    }

    #[test]
    fn expired_session_is_rejected() {
        let dir = tempdir().unwrap();
        session("tok_old", Some(Utc::now() - Duration::hours(1)))
            .save(dir.path())
            .unwrap();
        assert!(matches!(
            Session::load(dir.path()),
            Err(Error::SessionExpired)
        ));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempdir().unwrap();
        Session::clear(dir.path()).unwrap();
        session("tok", None).save(dir.path()).unwrap();
        Session::clear(dir.path()).unwrap();
        assert!(matches!(
            Session::load(dir.path()),
            Err(Error::NotAuthenticated)
        ));
    }
}
