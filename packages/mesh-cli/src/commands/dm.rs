//! The `mesh dm` command family.
//!
//! `mesh dm <user> [text]` sends an encrypted message, `mesh dm ls`
//! reads the inbox, `mesh dm key` manages the local key pair. The bare
//! send form and the subcommands share the `dm` namespace, so the
//! positional arguments conflict with the subcommand names.

use std::io::Read;

use clap::{Args, Subcommand};
use serde_json::json;

use mesh_core::api::{ApiClient, Pagination};
use mesh_core::config::Config;
use mesh_core::context::{self, Context};
use mesh_core::crypto::KeyPair;
use mesh_core::dm::{DmService, InboxEntry, KeyDirectory};
use mesh_core::keystore::KeyStore;
use mesh_core::paths::config_root;
use mesh_core::session::bearer_token;
use mesh_core::{Error, Result};

use crate::output::{Format, Printer};

/// Arguments for `mesh dm`.
#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct DmArgs {
    #[command(subcommand)]
    command: Option<DmCommand>,

    /// Recipient handle (`@` optional), or `this`
    #[arg(value_name = "USER")]
    recipient: Option<String>,

    /// Message text; omit or pass `-` to read stdin
    #[arg(value_name = "TEXT")]
    text: Option<String>,

    /// Attach a previously uploaded asset (repeatable)
    #[arg(long = "attach", value_name = "ASSET_ID")]
    attach: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum DmCommand {
    /// List direct messages, newest first
    Ls(LsArgs),
    /// Manage the local DM key pair
    Key {
        #[command(subcommand)]
        command: KeyCommand,
    },
}

#[derive(Args, Debug)]
struct LsArgs {
    /// Maximum number of messages to fetch
    #[arg(short = 'n', long)]
    limit: Option<u32>,

    /// Fetch messages older than this cursor
    #[arg(long, value_name = "CURSOR")]
    before: Option<String>,

    /// Fetch messages newer than this cursor
    #[arg(long, value_name = "CURSOR")]
    after: Option<String>,
}

#[derive(Subcommand, Debug)]
enum KeyCommand {
    /// Generate a key pair and register its public half
    Init {
        /// Replace an existing key pair (previous DMs become unreadable)
        #[arg(long)]
        force: bool,
    },
    /// Print the registered public key
    Show,
}

/// Dispatch `mesh dm`.
pub fn run(args: DmArgs, yes: bool, printer: &Printer) -> Result<()> {
    match args.command {
        Some(DmCommand::Ls(ls)) => list(ls, printer),
        Some(DmCommand::Key { command }) => match command {
            KeyCommand::Init { force } => key_init(force, yes, printer),
            KeyCommand::Show => key_show(printer),
        },
        None => {
            let recipient = args.recipient.ok_or_else(|| {
                Error::Config("usage: mesh dm <user> [text]".into())
            })?;
            send(&recipient, args.text, args.attach, printer)
        }
    }
}

fn send(
    recipient: &str,
    text: Option<String>,
    attach: Vec<String>,
    printer: &Printer,
) -> Result<()> {
    let root = config_root()?;
    let target = normalize_recipient(recipient);
    let (target, _) = context::resolve_target(&root, &target)?;
    let plaintext = resolve_text(text, std::io::stdin().lock())?;

    let config = Config::load(&root)?;
    let (token, user) = bearer_token(&root)?;
    let api = ApiClient::new(config.api_url(), Some(token))?;
    let keystore = KeyStore::open(&root);
    let service = DmService::new(&api, &keystore, user.map(|u| u.id));

    let message = service.send(&target, &plaintext, attach)?;
    if let Err(e) = Context::set(&root, &message.id, "dm") {
        tracing::debug!(error = %e, "context update failed");
    }

    match printer.format() {
        Format::Json => printer.ok(&json!({
            "id": message.id,
            "recipient_id": message.recipient_id,
            "created_at": message.created_at.to_rfc3339(),
        })),
        Format::Raw => printer.line(&message.id),
        Format::Human => printer.note(format!("✓ Sent DM to @{target}")),
    }
    Ok(())
}

fn list(args: LsArgs, printer: &Printer) -> Result<()> {
    let root = config_root()?;
    let config = Config::load(&root)?;
    let (token, user) = bearer_token(&root)?;
    let api = ApiClient::new(config.api_url(), Some(token))?;
    let keystore = KeyStore::open(&root);
    let self_id = user.map(|u| u.id);
    let service = DmService::new(&api, &keystore, self_id.clone());

    let page = Pagination {
        limit: args.limit,
        before: args.before,
        after: args.after,
    };
    let (entries, cursor) = service.list(&page)?;

    match printer.format() {
        Format::Json => {
            let dms: Vec<_> = entries.iter().map(entry_json).collect();
            printer.ok(&json!({ "dms": dms, "cursor": cursor }));
        }
        Format::Raw => {
            for entry in &entries {
                printer.line(entry.display_text());
            }
        }
        Format::Human => {
            if entries.is_empty() {
                printer.note("no messages");
            }
            for entry in &entries {
                printer.line(render_entry(entry, self_id.as_deref()));
            }
            if let Some(cursor) = cursor {
                printer.note(format!("more: mesh dm ls --before {cursor}"));
            }
        }
    }
    Ok(())
}

fn key_init(force: bool, yes: bool, printer: &Printer) -> Result<()> {
    let root = config_root()?;
    let keystore = KeyStore::open(&root);
    if keystore.exists() {
        if !force {
            return Err(Error::KeyExists);
        }
        // Destructive: the old key (and every envelope sealed to it) is
        // unrecoverable after this.
        if !yes {
            eprint!("Replace the existing DM key pair? Previously received DMs become unreadable. [y/N] ");
            let mut answer = String::new();
            std::io::stdin().read_line(&mut answer)?;
            if !is_affirmative(&answer) {
                printer.note("aborted");
                return Ok(());
            }
        }
    }

    let keypair = KeyPair::generate()?;
    if force {
        keystore.save_overwrite(&keypair)?;
    } else {
        keystore.save_new(&keypair)?;
    }

    // Registration is the point of explicit init: a failure here must
    // surface, unlike the best-effort refresh after a send.
    let config = Config::load(&root)?;
    let (token, _) = bearer_token(&root)?;
    let api = ApiClient::new(config.api_url(), Some(token))?;
    KeyDirectory::new(&api).register(&keypair)?;

    let public_key = keypair.public_base64();
    match printer.format() {
        Format::Json => printer.ok(&json!({ "public_key": public_key })),
        Format::Raw => printer.line(&public_key),
        Format::Human => {
            printer.note("✓ DM key pair initialized and registered");
            printer.note(format!("  public key: {}", truncate_key(&public_key)));
            if force {
                printer.note("  previously received DMs can no longer be decrypted");
            }
        }
    }
    Ok(())
}

fn key_show(printer: &Printer) -> Result<()> {
    let root = config_root()?;
    let keypair = KeyStore::open(&root).load()?;
    let public_key = keypair.public_base64();

    match printer.format() {
        Format::Json => printer.ok(&json!({ "public_key": public_key })),
        _ => printer.line(&public_key),
    }
    Ok(())
}

/// Whether a confirmation prompt answer means yes.
fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// Shorten a base64 public key for human display.
fn truncate_key(key: &str) -> String {
    if key.len() > 20 {
        format!("{}...{}", &key[..8], &key[key.len() - 8..])
    } else {
        key.to_string()
    }
}

/// Strip the conventional `@` prefix off a handle.
fn normalize_recipient(recipient: &str) -> String {
    recipient.strip_prefix('@').unwrap_or(recipient).to_string()
}

/// Resolve the message text from the argument or stdin, rejecting
/// whitespace-only messages.
fn resolve_text(arg: Option<String>, mut stdin: impl Read) -> Result<String> {
    let raw = match arg {
        Some(text) if text != "-" => text,
        _ => {
            let mut buf = String::new();
            stdin.read_to_string(&mut buf)?;
            buf
        }
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::Config("message is empty; nothing to send".into()));
    }
    Ok(trimmed.to_string())
}

fn render_entry(entry: &InboxEntry, self_id: Option<&str>) -> String {
    let stamp = entry.message.created_at.format("%Y-%m-%d %H:%M");
    let direction = if self_id == Some(entry.message.sender_id.as_str()) {
        format!("→ {}", entry.message.recipient_id)
    } else {
        format!("← {}", entry.message.sender_id)
    };
    let mut line = format!("[{stamp}] {direction}: {}", entry.display_text());
    if !entry.message.asset_ids.is_empty() {
        line.push_str(&format!(" (+{} attachment(s))", entry.message.asset_ids.len()));
    }
    line
}

fn entry_json(entry: &InboxEntry) -> serde_json::Value {
    json!({
        "id": entry.message.id,
        "sender_id": entry.message.sender_id,
        "recipient_id": entry.message.recipient_id,
        "content": entry.message.content,
        "text": entry.plaintext,
        "asset_ids": entry.message.asset_ids,
        "created_at": entry.message.created_at.to_rfc3339(),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mesh_core::api::DirectMessage;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn entry(sender: &str, recipient: &str, plaintext: Option<&str>) -> InboxEntry {
        InboxEntry {
            message: DirectMessage {
                id: "dm_1".into(),
                sender_id: sender.into(),
                recipient_id: recipient.into(),
                content: "b64".into(),
                asset_ids: vec![],
                created_at: Utc.with_ymd_and_hms(2026, 8, 25, 14, 2, 0).unwrap(),
            },
            plaintext: plaintext.map(String::from),
        }
    }

    #[test]
    fn confirmation_accepts_y_and_yes_only() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative("YES\n"));
        assert!(!is_affirmative("\n"));
        assert!(!is_affirmative("no\n"));
    }

    #[test]
    fn at_prefix_is_stripped() {
        assert_eq!(normalize_recipient("@bob"), "bob");
        assert_eq!(normalize_recipient("bob"), "bob");
    }

    #[test]
    fn text_argument_is_trimmed() {
        let text = resolve_text(Some("  hi there \n".into()), Cursor::new("")).unwrap();
        assert_eq!(text, "hi there");
    }

    #[test]
    fn dash_reads_stdin() {
        let text = resolve_text(Some("-".into()), Cursor::new("from a pipe\n")).unwrap();
        assert_eq!(text, "from a pipe");
    }

    #[test]
    fn missing_argument_reads_stdin() {
        let text = resolve_text(None, Cursor::new("piped\n")).unwrap();
        assert_eq!(text, "piped");
    }

    #[test]
    fn whitespace_only_message_is_rejected() {
        assert!(matches!(
            resolve_text(Some("   \n".into()), Cursor::new("")),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            resolve_text(None, Cursor::new("")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn sent_and_received_render_with_direction() {
        let received = entry("u_bob", "u_self", Some("hello"));
        let rendered = render_entry(&received, Some("u_self"));
        assert!(rendered.contains("← u_bob"));
        assert!(rendered.contains("hello"));
        assert!(rendered.starts_with("[2026-08-25 14:02]"));

        let sent = entry("u_self", "u_bob", Some("hi back"));
        assert!(render_entry(&sent, Some("u_self")).contains("→ u_bob"));
    }

    #[test]
    fn undecryptable_entry_renders_placeholder() {
        let rendered = render_entry(&entry("u_bob", "u_self", None), Some("u_self"));
        assert!(rendered.contains("[encrypted]"));
    }

    // The one test in this crate that touches MESH_CONFIG_DIR; keep it
    // that way, env vars are process-global.
    #[test]
    fn key_show_reads_the_store_under_the_config_dir_override() {
        let dir = tempdir().unwrap();
        std::env::set_var("MESH_CONFIG_DIR", dir.path());

        let printer = Printer::new(false, true, false);
        assert!(matches!(key_show(&printer), Err(Error::KeyNotFound)));

        KeyStore::open(dir.path()).load_or_generate().unwrap();
        key_show(&printer).unwrap();

        std::env::remove_var("MESH_CONFIG_DIR");
    }

    #[test]
    fn entry_json_exposes_text_and_ciphertext() {
        let value = entry_json(&entry("u_bob", "u_self", Some("hello")));
        assert_eq!(value["text"], "hello");
        assert_eq!(value["content"], "b64");

        let opaque = entry_json(&entry("u_bob", "u_self", None));
        assert!(opaque["text"].is_null());
    }
}
