//! The `mesh config` command family.

use clap::{Args, Subcommand};
use serde_json::json;

use mesh_core::config::Config;
use mesh_core::paths::config_root;
use mesh_core::Result;

use crate::output::{Format, Printer};

/// Arguments for `mesh config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print a config value
    Get {
        /// Config key, e.g. `api_url`
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key, e.g. `api_url`
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    Ls,
}

/// Dispatch `mesh config`.
pub fn run(args: ConfigArgs, printer: &Printer) -> Result<()> {
    let root = config_root()?;
    match args.command {
        ConfigCommand::Get { key } => {
            let value = Config::load(&root)?.get(&key)?;
            match printer.format() {
                Format::Json => printer.ok(&json!({ "key": key, "value": value })),
                _ => printer.line(&value),
            }
        }
        ConfigCommand::Set { key, value } => {
            let mut config = Config::load(&root)?;
            config.set(&key, &value);
            config.save(&root)?;
            match printer.format() {
                Format::Json => printer.ok(&json!({ "key": key, "value": value })),
                _ => printer.note(format!("✓ {key} = {value}")),
            }
        }
        ConfigCommand::Ls => {
            let entries = Config::load(&root)?.entries();
            match printer.format() {
                Format::Json => {
                    let map: serde_json::Map<String, serde_json::Value> = entries
                        .into_iter()
                        .map(|(k, v)| (k, serde_json::Value::String(v)))
                        .collect();
                    printer.ok(&map);
                }
                _ => {
                    for (key, value) in entries {
                        printer.line(format!("{key} = {value}"));
                    }
                }
            }
        }
    }
    Ok(())
}
