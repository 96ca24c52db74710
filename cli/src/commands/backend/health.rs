//! # Guichet Backend Health Handler
//!
//! File: cli/src/commands/backend/health.rs
//!
//! ## Overview
//!
//! Implements `guichet backend health`: one `GET /health` against the
//! configured base URL, printing the reported status.
//!
use crate::chat::backend::HttpBackend;
use crate::commands::{effective_config, ConnectionArgs};
use crate::core::error::{GuichetError, Result};
use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Check that the assistant API is reachable")]
pub struct HealthArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
}

/// # Handle Health Command (`handle_health`)
///
/// ## Errors
///
/// Returns `GuichetError::Backend` (exit code 1) when the API cannot be
/// reached, answers with a non-2xx status or returns an unexpected body.
pub async fn handle_health(args: HealthArgs) -> Result<()> {
    let cfg = effective_config(&args.connection, None)?;
    let backend = HttpBackend::new(&cfg.backend)?;
    info!("Checking health of {}", backend.base_url());

    let report = backend
        .health()
        .await
        .map_err(|e| anyhow!(GuichetError::from(e)))
        .with_context(|| format!("Health check against {} failed", backend.base_url()))?;

    println!("✅ {} : {}", backend.base_url(), report.status);
    Ok(())
}
