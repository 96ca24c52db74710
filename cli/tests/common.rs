//! # Guichet CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration test crates in `cli/tests/`:
//!
//! - [`Sandbox`] runs the `guichet` binary in an empty temporary directory
//!   with its own home, so no user or project configuration leaks in.
//! - [`spawn_stub_backend`] serves an axum router on an ephemeral local port,
//!   standing in for the assistant API.
//!

// Different test crates use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tempfile::TempDir;

/// An isolated working directory and home for one test.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create sandbox dir"),
        }
    }

    /// # Get Guichet Command (`cmd`)
    ///
    /// An `assert_cmd::Command` for the compiled `guichet` binary, running in
    /// the sandbox with configuration-related environment variables cleared.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("guichet").expect("Failed to find guichet binary for testing");
        cmd.current_dir(self.dir.path())
            .env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path().join(".config"))
            .env_remove("GUICHET_API_URL")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Writes a `.guichet.toml` project file into the sandbox.
    pub fn write_project_config(&self, contents: &str) {
        std::fs::write(self.dir.path().join(".guichet.toml"), contents)
            .expect("Failed to write project config");
    }
}

/// # Spawn Stub Backend (`spawn_stub_backend`)
///
/// Serves `router` on `127.0.0.1:<ephemeral>` from a background thread with
/// its own tokio runtime and returns the bound address. The server lives
/// until the test process exits.
pub fn spawn_stub_backend(router: Router) -> SocketAddr {
    let listener =
        std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind stub backend");
    listener
        .set_nonblocking(true)
        .expect("Failed to set stub listener non-blocking");
    let addr = listener.local_addr().expect("Stub backend has no local address");

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to build stub runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener)
                .expect("Failed to adopt stub listener");
            axum::serve(listener, router)
                .await
                .expect("Stub backend stopped");
        });
    });
    addr
}

/// A well-behaved assistant: structured answers echoing the question, one
/// linked source and one with a placeholder URL.
pub fn assistant_router() -> Router {
    Router::new()
        .route(
            "/generate",
            post(|Json(body): Json<Value>| async move {
                let question = body["question"].as_str().unwrap_or_default().to_string();
                Json(json!({
                    "answer": format!("Pièces à fournir: CNI\nCoût: 50 000 FCFA\nQuestion: {}", question),
                    "sources": [
                        { "titre": "Passeport ordinaire", "url": "https://servicepublic.gov.bf/passeport", "score": 0.91 },
                        { "titre": "Guide interne", "url": "Non spécifié" }
                    ]
                }))
            }),
        )
        .route("/health", get(|| async { Json(json!({ "status": "healthy" })) }))
        .route(
            "/model/status",
            get(|| async {
                Json(json!({
                    "retriever_initialized": true,
                    "generator_initialized": true,
                    "model_path": "models/mistral.gguf",
                    "indexer_available": false
                }))
            }),
        )
}

pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}
