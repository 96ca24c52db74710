//! # Guichet Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout the Guichet client.
//! It provides a consistent approach to error management with detailed error
//! information and context.
//!
//! ## Architecture
//!
//! The error system consists of two main components:
//! - `GuichetError`: A custom error enum using `thiserror` for specific error types
//! - `Result<T>`: A type alias for `anyhow::Result<T>` for flexible error handling
//!
//! The error types cover various domains:
//! - Configuration errors
//! - Conversation lifecycle violations (unknown turn, double settlement, bad feedback target)
//! - Template rendering errors
//! - Backend boundary errors (wrapped `BackendError`)
//!
//! Backend failures that happen *inside* a conversation never surface here: the
//! session turns them into apology turns. `GuichetError::Backend` is only used by
//! commands that talk to the backend directly (`guichet backend health`).
//!
//! ## Examples
//!
//! ```rust
//! // Return a specific error type
//! if top_k == 0 {
//!     return Err(anyhow!(GuichetError::Config("top_k must be at least 1".into())));
//! }
//!
//! // Add context to errors using anyhow
//! let content = fs::read_to_string(&path)
//!     .with_context(|| format!("Failed to read file: {}", path.display()))?;
//! ```
//!
use crate::chat::backend::BackendError;
use crate::chat::conversation::TurnId;
use thiserror::Error;

/// Custom error type for the Guichet application.
#[derive(Error, Debug)]
pub enum GuichetError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Turn #{id} does not exist in this conversation.")]
    TurnNotFound { id: TurnId },

    #[error("Turn #{id} is already settled and cannot change again.")]
    TurnAlreadySettled { id: TurnId },

    #[error("Turn #{id} does not accept feedback (only answered bot turns do).")]
    InvalidFeedbackTarget { id: TurnId },

    #[error("Template rendering error: {source}")]
    Template {
        #[from]
        source: tera::Error,
    },

    #[error("Backend request failed: {source}")]
    Backend {
        #[from]
        source: BackendError,
    },
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_err = GuichetError::Config("Missing setting 'foo'".to_string());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: Missing setting 'foo'"
        );

        let settled = GuichetError::TurnAlreadySettled { id: 3 };
        assert_eq!(
            settled.to_string(),
            "Turn #3 is already settled and cannot change again."
        );

        let feedback = GuichetError::InvalidFeedbackTarget { id: 0 };
        assert!(feedback.to_string().contains("does not accept feedback"));
    }

    #[test]
    fn test_backend_error_wraps() {
        let err: GuichetError = BackendError::Http {
            status: 503,
            body: "Retriever non initialisé".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Backend request failed: HTTP error! status: 503. Response: Retriever non initialisé"
        );
    }
}
