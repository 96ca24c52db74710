//! # Guichet Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! This file serves as the main entry point for the Guichet CLI, a terminal
//! client for the administrative-procedures assistant. It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to appropriate command handlers
//!
//! ## Architecture
//!
//! - `chat`: formatting, transcript, backend client and session lifecycle
//! - `commands`: one module per top-level command (`ask`, `chat`, `backend`)
//! - `core`: configuration, errors and HTML templates
//!
//! All errors are propagated to this level for consistent handling.
//!
//! ## Examples
//!
//! ```bash
//! # Get help
//! guichet --help
//!
//! # Ask a question with increased verbosity
//! guichet -vv ask "Comment obtenir un passeport ?"
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod chat; // Chat engine (formatter, conversation, backend, session, render)
mod commands; // Command handlers (ask, chat, backend)
mod core; // Core infrastructure (errors, config, templating)

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "guichet",
    about = "💬 Guichet: assistant des démarches administratives",
    long_about = "Ask questions to the administrative-procedures assistant from the terminal.\n\
                  Answers are formatted into labeled fields and printed as text, HTML or JSON.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Enum defining all available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    #[command(alias = "a")]
    Ask(commands::ask::AskArgs),
    #[command(alias = "c")]
    Chat(commands::chat::ChatArgs),
    #[command(alias = "b")]
    Backend(commands::backend::BackendArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Ask(args) => commands::ask::handle_ask(args).await,
        Commands::Chat(args) => commands::chat::handle_chat(args).await,
        Commands::Backend(args) => commands::backend::handle_backend(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    fn guichet_cmd() -> Command {
        Command::cargo_bin("guichet").expect("Failed to find guichet binary for testing")
    }
    #[test]
    fn test_main_help_flag() {
        guichet_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("ask"))
            .stdout(predicate::str::contains("chat"))
            .stdout(predicate::str::contains("backend"));
    }
    #[test]
    fn test_main_version_flag() {
        guichet_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }
}
