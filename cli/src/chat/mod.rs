//! # Guichet Chat Core
//!
//! File: cli/src/chat/mod.rs
//!
//! ## Overview
//!
//! Everything needed to hold a conversation with the assistant backend,
//! independent of how the command-line front end reads input:
//!
//! - `formatter`: turns a raw answer string into display blocks
//! - `conversation`: the append-only transcript of turns
//! - `backend`: the `/generate` boundary (trait + HTTP client)
//! - `session`: the turn lifecycle (submit, resolve, feedback)
//! - `render`: text, HTML and JSON presentation of turns
//!
pub mod backend;
pub mod conversation;
pub mod formatter;
pub mod render;
pub mod session;
