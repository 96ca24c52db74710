//! # Guichet Backend Status Handler
//!
//! File: cli/src/commands/backend/status.rs
//!
//! ## Overview
//!
//! Implements `guichet backend status`, a short report of the retrieval
//! pipeline state as returned by `GET /model/status`.
//!
//! ```text
//! --- Assistant Status: http://localhost:8000 ---
//!   Retriever:   ready
//!   Generator:   not loaded
//!   Model:       models/mistral-7b.gguf
//!   Indexer:     available
//! ```
//!
use crate::chat::backend::{HttpBackend, ModelStatus};
use crate::commands::{effective_config, ConnectionArgs};
use crate::core::error::{GuichetError, Result};
use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(about = "Show the model and retriever status of the assistant API")]
pub struct StatusArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
}

pub async fn handle_status(args: StatusArgs) -> Result<()> {
    let cfg = effective_config(&args.connection, None)?;
    let backend = HttpBackend::new(&cfg.backend)?;
    info!("Fetching model status from {}", backend.base_url());

    let status = backend
        .model_status()
        .await
        .map_err(|e| anyhow!(GuichetError::from(e)))
        .with_context(|| format!("Status query against {} failed", backend.base_url()))?;

    if !(status.retriever_initialized && status.generator_initialized) {
        warn!("The assistant pipeline is not fully initialized.");
    }
    print!("{}", status_report(backend.base_url(), &status));
    Ok(())
}

fn status_report(base_url: &str, status: &ModelStatus) -> String {
    let state = |ready: bool, yes: &'static str, no: &'static str| if ready { yes } else { no };
    format!(
        "--- Assistant Status: {} ---\n  Retriever:   {}\n  Generator:   {}\n  Model:       {}\n  Indexer:     {}\n",
        base_url,
        state(status.retriever_initialized, "ready", "not loaded"),
        state(status.generator_initialized, "ready", "not loaded"),
        status.model_path.as_deref().unwrap_or("N/A"),
        state(status.indexer_available, "available", "unavailable"),
    )
}
