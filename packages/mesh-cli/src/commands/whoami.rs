//! The `mesh whoami` command.

use serde_json::json;

use mesh_core::api::{ApiClient, User};
use mesh_core::config::Config;
use mesh_core::context::Context;
use mesh_core::paths::config_root;
use mesh_core::session::bearer_token;
use mesh_core::Result;

use crate::output::{Format, Printer};

/// Ask the server who the current token belongs to.
pub fn run(printer: &Printer) -> Result<()> {
    let root = config_root()?;
    let config = Config::load(&root)?;
    let (token, _) = bearer_token(&root)?;
    let api = ApiClient::new(config.api_url(), Some(token))?;

    let user = api.get_status()?;
    if let Err(e) = Context::set(&root, &user.id, "user") {
        tracing::debug!(error = %e, "context update failed");
    }

    match printer.format() {
        Format::Json => printer.ok(&json!({
            "id": user.id,
            "handle": user.handle,
            "name": user.name,
        })),
        Format::Raw => printer.line(&user.handle),
        Format::Human => printer.line(render_user(&user)),
    }
    Ok(())
}

fn render_user(user: &User) -> String {
    match &user.name {
        Some(name) => format!("{name} (@{}, {})", user.handle, user.id),
        None => format!("@{} ({})", user.handle, user.id),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(name: Option<&str>) -> User {
        User {
            id: "u_123".into(),
            handle: "bob".into(),
            name: name.map(String::from),
            bio: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn renders_handle_and_id() {
        assert_eq!(render_user(&user(None)), "@bob (u_123)");
    }

    #[test]
    fn renders_display_name_when_present() {
        assert_eq!(render_user(&user(Some("Bob"))), "Bob (@bob, u_123)");
    }
}
