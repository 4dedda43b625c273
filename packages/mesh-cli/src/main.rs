//! Mesh CLI
//!
//! Command-line client for the Mesh social network. The flagship
//! subsystem is `mesh dm`: end-to-end encrypted direct messages where
//! the server only ever sees opaque envelopes. All encryption happens
//! client-side with a locally stored key pair.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use output::Printer;

/// Environment variable selecting the log filter, e.g. `mesh_core=debug`.
const LOG_ENV: &str = "MESH_LOG";

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "mesh", version, about = "Command-line client for the Mesh social network")]
struct Cli {
    /// Emit machine-readable JSON envelopes
    #[arg(long, global = true)]
    json: bool,

    /// Emit bare values for shell pipelines
    #[arg(long, global = true)]
    raw: bool,

    /// Suppress status output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Assume yes for confirmation prompts
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send and read end-to-end encrypted direct messages
    Dm(commands::dm::DmArgs),
    /// Show the authenticated user
    Whoami,
    /// Read and write local configuration
    Config(commands::config::ConfigArgs),
}

// ── Entry Point ───────────────────────────────────────────────────────────────

fn main() {
    // Diagnostics go to stderr so stdout stays parseable in --json/--raw.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let printer = Printer::new(cli.json, cli.raw, cli.quiet);

    let outcome = match cli.command {
        Commands::Dm(args) => commands::dm::run(args, cli.yes, &printer),
        Commands::Whoami => commands::whoami::run(&printer),
        Commands::Config(args) => commands::config::run(args, &printer),
    };

    if let Err(e) = outcome {
        tracing::debug!(code = e.code(), recoverable = e.is_recoverable(), "command failed");
        printer.error(&e);
        std::process::exit(1);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_dm_parses_as_send() {
        let cli = Cli::parse_from(["mesh", "dm", "@bob", "hello there"]);
        assert!(matches!(cli.command, Commands::Dm(_)));
    }

    #[test]
    fn dm_ls_parses_as_subcommand() {
        Cli::parse_from(["mesh", "dm", "ls", "--limit", "10"]);
        Cli::parse_from(["mesh", "dm", "key", "init", "--force"]);
        Cli::parse_from(["mesh", "dm", "key", "show"]);
    }

    #[test]
    fn global_flags_apply_after_subcommand() {
        let cli = Cli::parse_from(["mesh", "whoami", "--json"]);
        assert!(cli.json);

        let cli = Cli::parse_from(["mesh", "dm", "key", "init", "--force", "--yes"]);
        assert!(cli.yes);
    }
}
