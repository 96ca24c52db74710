//! # Guichet Backend Command Group
//!
//! File: cli/src/commands/backend/mod.rs
//!
//! ## Overview
//!
//! Entry point and router for `guichet backend`, which checks the assistant
//! API without asking it anything:
//!
//! - `health`: `GET /health`, exits non-zero if the API is unreachable
//! - `status`: `GET /model/status`, shows which pipeline parts are loaded
//!
//! Unlike `ask` and `chat`, a failed call here fails the command.
//!
//! ## Examples
//!
//! ```bash
//! guichet backend health --url http://localhost:8000
//! guichet backend status
//! ```
//!
use crate::core::error::Result;
use clap::{Parser, Subcommand};

/// Implements `guichet backend health`.
mod health;
/// Implements `guichet backend status`.
mod status;

/// # Backend Command Group Arguments (`BackendArgs`)
#[derive(Parser, Debug)]
pub struct BackendArgs {
    #[command(subcommand)]
    command: BackendCommand,
}

#[derive(Subcommand, Debug)]
enum BackendCommand {
    /// Checks that the assistant API answers on `/health`.
    Health(health::HealthArgs),
    /// Shows the retriever, generator and indexer state reported by `/model/status`.
    Status(status::StatusArgs),
}

/// # Handle Backend Command (`handle_backend`)
///
/// Dispatches to the handler of the selected subcommand and propagates its
/// result unchanged.
pub async fn handle_backend(args: BackendArgs) -> Result<()> {
    match args.command {
        BackendCommand::Health(health_args) => health::handle_health(health_args).await,
        BackendCommand::Status(status_args) => status::handle_status(status_args).await,
    }
}
