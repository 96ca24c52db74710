//! # Backend Boundary
//!
//! File: cli/src/chat/backend.rs
//!
//! ## Overview
//!
//! The assistant backend is an opaque HTTP service. This module holds its wire
//! types, the [`Backend`] trait the chat session depends on, and
//! [`HttpBackend`], the `reqwest` implementation used by the CLI.
//!
//! ## Endpoints
//!
//! - `POST /generate` with `{ question, top_k, espace_filter?, theme_filter? }`,
//!   answering `{ answer, sources: [{ titre, url }] }`
//! - `GET /health`, answering `{ "status": "ok" }`
//! - `GET /model/status`, describing which backend components are loaded
//!
//! ## Errors
//!
//! Every failure maps to a [`BackendError`] variant whose `Display` text is the
//! detail shown to the user in the apology turn.
//!
use crate::chat::conversation::Source;
use crate::core::config::BackendConfig;
use crate::core::error::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Body of `POST /generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub question: String,
    pub top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub espace_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_filter: Option<String>,
}

/// Successful `POST /generate` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerateResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// `GET /health` response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthReport {
    pub status: String,
}

/// `GET /model/status` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelStatus {
    #[serde(default)]
    pub retriever_initialized: bool,
    #[serde(default)]
    pub generator_initialized: bool,
    #[serde(default)]
    pub model_path: Option<String>,
    #[serde(default)]
    pub indexer_available: bool,
}

/// Errors raised at the backend boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The TCP connection could not be established or broke mid-request.
    #[error("connection to {url} failed: {detail}")]
    Connect { url: String, detail: String },

    /// No response within the configured timeout.
    #[error("no response from {url} within {secs}s")]
    Timeout { url: String, secs: u64 },

    /// The server replied with a non-2xx status.
    #[error("HTTP error! status: {status}. Response: {body}")]
    Http { status: u16, body: String },

    /// The body was not the expected JSON shape.
    #[error("unexpected response body: {detail}")]
    Decode { detail: String },

    /// The request task ended before producing a response.
    #[error("request interrupted: {detail}")]
    Interrupted { detail: String },
}

/// The seam between the chat session and the assistant service.
///
/// Implementations must be shareable across tasks: each submitted question is
/// answered on its own tokio task holding an `Arc` of the backend.
pub trait Backend: Send + Sync + 'static {
    fn generate(
        &self,
        request: GenerateRequest,
    ) -> impl Future<Output = std::result::Result<GenerateResponse, BackendError>> + Send;
}

/// `reqwest`-based client for the assistant HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Builds a client from the effective backend configuration.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Queries `GET /health`.
    pub async fn health(&self) -> std::result::Result<HealthReport, BackendError> {
        self.get_json("/health").await
    }

    /// Queries `GET /model/status`.
    pub async fn model_status(&self) -> std::result::Result<ModelStatus, BackendError> {
        self.get_json("/model/status").await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> std::result::Result<T, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;
        Self::decode(&url, response).await
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            }
        } else {
            BackendError::Connect {
                url: url.to_string(),
                detail: err.to_string(),
            }
        }
    }

    /// Turns a response into `T`, surfacing the body text of non-2xx replies.
    async fn decode<T: serde::de::DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> std::result::Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("{} answered with HTTP {}", url, status.as_u16());
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await.map_err(|e| BackendError::Decode {
            detail: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode {
            detail: e.to_string(),
        })
    }
}

impl Backend for HttpBackend {
    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> std::result::Result<GenerateResponse, BackendError> {
        let url = format!("{}/generate", self.base_url);
        info!("POST {} (top_k={})", url, request.top_k);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;
        let parsed: GenerateResponse = Self::decode(&url, response).await?;
        debug!(
            "Answer received: {} chars, {} sources",
            parsed.answer.chars().count(),
            parsed.sources.len()
        );
        Ok(parsed)
    }
}
