//! `this` resolution for CLI commands.
//!
//! Commands that act on "the thing I just looked at" resolve the literal
//! target `this` against a short-lived context file recording the last
//! object a command touched. Entries expire after an hour.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paths::write_private_file;

const CONTEXT_FILE: &str = "context.json";

fn context_ttl() -> Duration {
    Duration::hours(1)
}

/// The current CLI context: the last object a command touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// Identifier of the last object
    pub last_id: String,
    /// Object kind: `user`, `post`, `asset`, ...
    pub last_type: String,
    /// When the context was recorded
    pub updated_at: DateTime<Utc>,
}

impl Context {
    /// Load the context, failing with [`Error::ContextUnavailable`] when
    /// missing or expired.
    pub fn load(root: &Path) -> Result<Self> {
        let data = match fs::read(root.join(CONTEXT_FILE)) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::ContextUnavailable)
            }
            Err(e) => return Err(Error::Io(e)),
        };
        let context: Context = serde_json::from_slice(&data)?;
        if Utc::now() - context.updated_at > context_ttl() {
            return Err(Error::ContextUnavailable);
        }
        Ok(context)
    }

    /// Record an object as the current context.
    pub fn set(root: &Path, id: &str, kind: &str) -> Result<()> {
        let context = Context {
            last_id: id.to_string(),
            last_type: kind.to_string(),
            updated_at: Utc::now(),
        };
        write_private_file(&root.join(CONTEXT_FILE), &serde_json::to_vec_pretty(&context)?)
    }

    /// Remove any stored context.
    pub fn clear(root: &Path) -> Result<()> {
        match fs::remove_file(root.join(CONTEXT_FILE)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// Resolve a command target: the literal `this` resolves through the
/// context, anything else passes through unchanged. The bool reports
/// whether context resolution happened.
pub fn resolve_target(root: &Path, target: &str) -> Result<(String, bool)> {
    if target == "this" {
        let context = Context::load(root)?;
        Ok((context.last_id, true))
    } else {
        Ok((target.to_string(), false))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn set_then_resolve_this() {
        let dir = tempdir().unwrap();
        Context::set(dir.path(), "u_123", "user").unwrap();
        let (id, from_context) = resolve_target(dir.path(), "this").unwrap();
        assert_eq!(id, "u_123");
        assert!(from_context);
    }

    #[test]
    fn explicit_target_passes_through() {
        let dir = tempdir().unwrap();
        let (id, from_context) = resolve_target(dir.path(), "bob").unwrap();
        assert_eq!(id, "bob");
        assert!(!from_context);
    }

    #[test]
    fn missing_context_is_unavailable() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            resolve_target(dir.path(), "this"),
            Err(Error::ContextUnavailable)
        ));
    }

    #[test]
    fn expired_context_is_unavailable() {
        let dir = tempdir().unwrap();
        let stale = Context {
            last_id: "u_old".into(),
            last_type: "user".into(),
            updated_at: Utc::now() - Duration::hours(2),
        };
        write_private_file(
            &dir.path().join(CONTEXT_FILE),
            &serde_json::to_vec(&stale).unwrap(),
        )
        .unwrap();
        assert!(matches!(
            Context::load(dir.path()),
            Err(Error::ContextUnavailable)
        ));
    }

    #[test]
    fn clear_removes_context() {
        let dir = tempdir().unwrap();
        Context::set(dir.path(), "p_1", "post").unwrap();
        Context::clear(dir.path()).unwrap();
        assert!(matches!(
            Context::load(dir.path()),
            Err(Error::ContextUnavailable)
        ));
    }
}
