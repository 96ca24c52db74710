//! # Guichet Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the core infrastructure components shared by the
//! chat engine and the command handlers.
//!
//! ## Architecture
//!
//! - `config`: Configuration loading, merging, and validation
//! - `error`: Error types and error handling utilities
//! - `templating`: Tera templates for the HTML chat markup
//!
//! ## Usage
//!
//! ```rust
//! use crate::core::config; // For loading configuration
//! use crate::core::error::{GuichetError, Result}; // For error handling
//! use crate::core::templating::ChatTemplates; // For HTML rendering
//! ```
//!
pub mod config;
pub mod error;
pub mod templating;
