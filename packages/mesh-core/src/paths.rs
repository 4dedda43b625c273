//! Filesystem locations for per-identity state.
//!
//! Everything the CLI persists (config, session, context, DM keys) lives
//! under a single per-identity directory: `$MESH_CONFIG_DIR` if set,
//! otherwise `~/.mesh`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable overriding the config root directory.
pub const CONFIG_DIR_ENV: &str = "MESH_CONFIG_DIR";

/// Resolve the per-identity config root without creating it.
pub fn config_root() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".mesh"))
        .ok_or_else(|| Error::Config("cannot determine home directory".into()))
}

/// Create a directory (and parents) restricted to the owning user.
pub fn ensure_private_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}

/// Write a small state document readable only by the owning user,
/// creating the parent directory if needed.
pub fn write_private_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        ensure_private_dir(dir)?;
    }
    fs::write(path, data)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
