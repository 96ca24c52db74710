//! # Guichet Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module implements the configuration system for Guichet, handling loading,
//! merging, validation, and access to configuration data. It supports a multi-level
//! configuration approach that combines defaults, user settings, project-specific
//! overrides and, finally, command-line flags.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Command-line flags (`ConnectionArgs`, applied by the commands)
//! 2. Project-specific `.guichet.toml` in current directory or ancestors
//! 3. User-specific `<config dir>/guichet/config.toml`
//! 4. Default values defined in the code
//!
//! ## Examples
//!
//! ```toml
//! [backend]
//! base_url = "http://${GUICHET_HOST}:8000"
//! top_k = 3
//! espace = "Particuliers"
//!
//! [render]
//! format = "html"
//! order = "arrival"
//! ```
//!
//! ```rust
//! let cfg = config::load_config()?;
//! let backend = HttpBackend::new(&cfg.backend)?;
//! ```
//!
use crate::core::error::{GuichetError, Result};
use anyhow::{anyhow, Context};
use clap::ValueEnum;
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Where and how to reach the assistant backend.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the API; `/generate` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Number of documents the backend should retrieve.
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Restrict retrieval to one space ("Particuliers", "Entreprises").
    #[serde(default)]
    pub espace: Option<String>,
    /// Restrict retrieval to one theme ("État civil", ...).
    #[serde(default)]
    pub theme: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            top_k: default_top_k(),
            timeout_secs: default_timeout_secs(),
            espace: None,
            theme: None,
        }
    }
}

/// How transcripts are printed.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Unset means "show". Kept optional so an explicit `true` in the project
    /// file still overrides a user `false`.
    #[serde(default)]
    pub show_sources: Option<bool>,
    #[serde(default)]
    pub order: CompletionOrder,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            show_sources: None,
            order: CompletionOrder::default(),
        }
    }
}

impl RenderConfig {
    pub fn show_sources(&self) -> bool {
        self.show_sources.unwrap_or(true)
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Html,
    Json,
}

/// Order in which finished backend calls are applied to the transcript.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CompletionOrder {
    /// Submission order, even if a later question is answered first.
    #[default]
    Fifo,
    /// Whichever response arrives first.
    Arrival,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_top_k() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

const PROJECT_CONFIG_FILENAME: &str = ".guichet.toml";

/// # Load Configuration (`load_config`)
///
/// Merges the user and project files over the defaults and expands `${VAR}`
/// references. The result is not validated here: command-line overrides are
/// applied first by the caller (see `commands::effective_config`), which then
/// calls [`validate_config`].
pub fn load_config() -> Result<Config> {
    let user_config = load_user_config()?;
    let project_config = load_project_config()?;
    let mut merged_config = merge_configs(user_config.unwrap_or_default(), project_config);
    expand_config_values(&mut merged_config)
        .context("Failed to expand variables in configuration")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "Guichet", "guichet") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<Config>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    if let Some(project_config_path) = find_project_config_path(&current_dir) {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file (.guichet.toml) found in current directory or ancestors.");
        Ok(None)
    }
}

/// Walks up from `start` looking for `.guichet.toml`, stopping at a `.git` directory.
fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Project values win wherever they differ from the built-in defaults.
/// `show_sources` is optional in both files, so the project wins whenever it sets it.
fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project_cfg = match project {
        Some(p) => p,
        None => return user,
    };
    let defaults = Config::default();

    let mut merged = Config::default();
    merged.backend.base_url = if project_cfg.backend.base_url != defaults.backend.base_url {
        project_cfg.backend.base_url
    } else {
        user.backend.base_url
    };
    merged.backend.top_k = if project_cfg.backend.top_k != defaults.backend.top_k {
        project_cfg.backend.top_k
    } else {
        user.backend.top_k
    };
    merged.backend.timeout_secs =
        if project_cfg.backend.timeout_secs != defaults.backend.timeout_secs {
            project_cfg.backend.timeout_secs
        } else {
            user.backend.timeout_secs
        };
    merged.backend.espace = project_cfg.backend.espace.or(user.backend.espace);
    merged.backend.theme = project_cfg.backend.theme.or(user.backend.theme);
    merged.render.format = if project_cfg.render.format != defaults.render.format {
        project_cfg.render.format
    } else {
        user.render.format
    };
    merged.render.show_sources = project_cfg.render.show_sources.or(user.render.show_sources);
    merged.render.order = if project_cfg.render.order != defaults.render.order {
        project_cfg.render.order
    } else {
        user.render.order
    };
    merged
}

fn expand_config_values(config: &mut Config) -> Result<()> {
    let expanded = shellexpand::env(&config.backend.base_url)
        .map_err(|e| anyhow!(GuichetError::Config(format!("base_url: {}", e))))?;
    config.backend.base_url = expanded.into_owned();
    debug!("Expanded backend URL: {}", config.backend.base_url);
    Ok(())
}

/// Checks the effective configuration before any request is made.
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("Validating configuration...");
    let url = reqwest::Url::parse(&config.backend.base_url).map_err(|e| {
        anyhow!(GuichetError::Config(format!(
            "Invalid backend URL '{}': {}",
            config.backend.base_url, e
        )))
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!(GuichetError::Config(format!(
            "Backend URL '{}' must use http or https.",
            config.backend.base_url
        ))));
    }
    if config.backend.top_k == 0 {
        return Err(anyhow!(GuichetError::Config(
            "top_k must be at least 1.".to_string()
        )));
    }
    if config.backend.timeout_secs == 0 {
        return Err(anyhow!(GuichetError::Config(
            "timeout_secs must be at least 1.".to_string()
        )));
    }
    debug!("Configuration validation successful.");
    Ok(())
}
