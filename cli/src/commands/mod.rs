//! # Guichet Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the top-level commands of the Guichet CLI and the
//! argument groups they share.
//!
//! ## Command Groups
//!
//! - `ask`: One-shot questions, printed as a transcript
//! - `chat`: Interactive conversation on stdin/stdout
//! - `backend`: Health and model status of the assistant API
//!
//! ## Shared Arguments
//!
//! Every command that talks to the backend flattens [`ConnectionArgs`]. The
//! commands that print transcripts also flatten [`OutputArgs`]. Flags given
//! on the command line override the merged configuration files, and the
//! result is validated once, by [`effective_config`].
//!

/// One-shot questions (`guichet ask`).
pub mod ask;
/// Queries against the backend's maintenance endpoints (`guichet backend health|status`).
pub mod backend;
/// Interactive conversation (`guichet chat`).
pub mod chat;

use crate::core::config::{self, CompletionOrder, Config, OutputFormat};
use crate::core::error::Result;
use anyhow::Context;
use clap::Args;
use tracing::debug;

/// Flags that override the `[backend]` configuration table.
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Base URL of the assistant API (e.g. http://localhost:8000).
    #[arg(long, env = "GUICHET_API_URL", value_name = "URL")]
    pub url: Option<String>,

    /// Number of documents the backend retrieves for each question.
    #[arg(long, value_name = "N")]
    pub top_k: Option<u32>,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Restrict retrieval to one space (e.g. "Particuliers").
    #[arg(long, value_name = "ESPACE")]
    pub espace: Option<String>,

    /// Restrict retrieval to one theme (e.g. "État civil").
    #[arg(long, value_name = "THEME")]
    pub theme: Option<String>,
}

impl ConnectionArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.backend.base_url = url.clone();
        }
        if let Some(top_k) = self.top_k {
            config.backend.top_k = top_k;
        }
        if let Some(timeout) = self.timeout {
            config.backend.timeout_secs = timeout;
        }
        if let Some(espace) = &self.espace {
            config.backend.espace = Some(espace.clone());
        }
        if let Some(theme) = &self.theme {
            config.backend.theme = Some(theme.clone());
        }
    }
}

/// Flags that override the `[render]` configuration table.
#[derive(Args, Debug, Default, Clone)]
pub struct OutputArgs {
    /// Output format of the transcript.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Do not list the sources under answers.
    #[arg(long)]
    pub no_sources: bool,

    /// Order in which answers are applied and printed when several questions are pending.
    #[arg(long, value_enum, value_name = "ORDER")]
    pub order: Option<CompletionOrder>,
}

impl OutputArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(format) = self.format {
            config.render.format = format;
        }
        if self.no_sources {
            config.render.show_sources = Some(false);
        }
        if let Some(order) = self.order {
            config.render.order = order;
        }
    }
}

/// # Effective Configuration (`effective_config`)
///
/// Loads the layered configuration files, applies the command-line overrides
/// on top and validates the final result.
///
/// ## Errors
///
/// Returns `GuichetError::Config` if a file cannot be parsed or if the final
/// value of a setting is invalid (e.g. `--url ftp://...`, or `top_k = 0` in a
/// file with no `--top-k` to replace it).
pub fn effective_config(connection: &ConnectionArgs, output: Option<&OutputArgs>) -> Result<Config> {
    let mut cfg = config::load_config().context("Failed to load Guichet configuration")?;
    connection.apply(&mut cfg);
    if let Some(output) = output {
        output.apply(&mut cfg);
    }
    config::validate_config(&cfg).context("Configuration validation failed")?;
    debug!("Effective configuration: {:?}", cfg);
    Ok(cfg)
}
