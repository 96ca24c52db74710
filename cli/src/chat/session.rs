//! # Chat Session
//!
//! File: cli/src/chat/session.rs
//!
//! ## Overview
//!
//! Drives the lifecycle of every turn in a [`Conversation`]:
//!
//! 1. `submit` appends the user turn and a pending bot turn, then spawns the
//!    backend call on its own tokio task and returns right away.
//! 2. `resolve_next` / `resolve_all` await finished calls and settle the
//!    matching pending turns, either with the formatted answer and its sources
//!    or with the failure detail.
//! 3. `feedback` appends an acknowledgement turn after an answer.
//!
//! ## Ordering
//!
//! With [`CompletionOrder::Fifo`] outcomes are applied in submission order: a
//! fast answer to a later question waits for the earlier ones. With
//! [`CompletionOrder::Arrival`] each outcome is applied as soon as its call
//! finishes.
//!
//! ## Cancellation
//!
//! `abort_all` aborts every in-flight task and settles the affected turns as
//! errors. Dropping the session aborts whatever is still running.
//!
use crate::chat::backend::{Backend, BackendError, GenerateRequest, GenerateResponse};
use crate::chat::conversation::{Conversation, Role, Sentiment, Settlement, TurnId};
use crate::chat::formatter;
use crate::core::config::{BackendConfig, CompletionOrder};
use crate::core::error::{GuichetError, Result};
use anyhow::anyhow;
use futures_util::future::select_all;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

type CallOutcome = std::result::Result<GenerateResponse, BackendError>;

/// Request parameters shared by every question of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub top_k: u32,
    pub espace: Option<String>,
    pub theme: Option<String>,
}

impl From<&BackendConfig> for RequestOptions {
    fn from(config: &BackendConfig) -> Self {
        Self {
            top_k: config.top_k,
            espace: config.espace.clone(),
            theme: config.theme.clone(),
        }
    }
}

/// The applied outcome of one backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Answered { turn: TurnId, sources: usize },
    Failed { turn: TurnId, detail: String },
}

impl Resolution {
    pub fn turn(&self) -> TurnId {
        match self {
            Resolution::Answered { turn, .. } | Resolution::Failed { turn, .. } => *turn,
        }
    }
}

struct InFlight {
    turn: TurnId,
    handle: JoinHandle<CallOutcome>,
}

pub struct ChatSession<B: Backend> {
    conversation: Conversation,
    backend: Arc<B>,
    options: RequestOptions,
    order: CompletionOrder,
    in_flight: VecDeque<InFlight>,
}

impl<B: Backend> ChatSession<B> {
    pub fn new(backend: B, options: RequestOptions, order: CompletionOrder) -> Self {
        Self {
            conversation: Conversation::new(),
            backend: Arc::new(backend),
            options,
            order,
            in_flight: VecDeque::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Number of backend calls not yet applied to the transcript.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// # Submit Question (`submit`)
    ///
    /// Appends the user turn and a pending bot turn, then starts the backend
    /// call in the background. Returns the pending turn's id, or `None` when the
    /// question is blank (nothing is appended in that case).
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, question: &str) -> Option<TurnId> {
        let question = question.trim();
        if question.is_empty() {
            debug!("Ignoring empty question.");
            return None;
        }

        self.conversation.push_user(question);
        let turn = self.conversation.push_pending();

        let request = GenerateRequest {
            question: question.to_string(),
            top_k: self.options.top_k,
            espace_filter: self.options.espace.clone(),
            theme_filter: self.options.theme.clone(),
        };
        let backend = Arc::clone(&self.backend);
        let handle = tokio::spawn(async move { backend.generate(request).await });
        info!("Question submitted (pending turn #{}).", turn);
        self.in_flight.push_back(InFlight { turn, handle });
        Some(turn)
    }

    /// # Resolve Next Outcome (`resolve_next`)
    ///
    /// Waits for the next backend call according to the session's
    /// [`CompletionOrder`] and settles its turn. Returns `None` when nothing is
    /// in flight.
    ///
    /// Cancel safe: if the returned future is dropped before completion, no
    /// outcome is lost and the turn stays pending.
    pub async fn resolve_next(&mut self) -> Option<Resolution> {
        let (turn, joined) = match self.order {
            CompletionOrder::Fifo => {
                // The entry is only removed once its call is done, so dropping
                // this future early leaves the turn for `abort_all`.
                let front = self.in_flight.front_mut()?;
                let joined = (&mut front.handle).await;
                let finished = self.in_flight.pop_front()?;
                (finished.turn, joined)
            }
            CompletionOrder::Arrival => {
                if self.in_flight.is_empty() {
                    return None;
                }
                let (joined, index, _) =
                    select_all(self.in_flight.iter_mut().map(|f| &mut f.handle)).await;
                let finished = self.in_flight.remove(index)?;
                (finished.turn, joined)
            }
        };
        Some(self.apply(turn, joined))
    }

    /// Resolves every in-flight call, returning the resolutions in the order
    /// they were applied.
    pub async fn resolve_all(&mut self) -> Vec<Resolution> {
        let mut resolutions = Vec::with_capacity(self.in_flight.len());
        while let Some(resolution) = self.resolve_next().await {
            resolutions.push(resolution);
        }
        resolutions
    }

    /// Aborts every in-flight call; each pending turn becomes an error turn.
    pub fn abort_all(&mut self) -> Vec<Resolution> {
        let mut resolutions = Vec::with_capacity(self.in_flight.len());
        while let Some(InFlight { turn, handle }) = self.in_flight.pop_front() {
            handle.abort();
            warn!("Aborting pending turn #{}.", turn);
            let detail = BackendError::Interrupted {
                detail: "cancelled by user".to_string(),
            }
            .to_string();
            resolutions.push(self.settle_failure(turn, detail));
        }
        resolutions
    }

    /// # Record Feedback (`feedback`)
    ///
    /// Appends the acknowledgement turn for `sentiment`. Feedback is only logged;
    /// nothing is sent to the backend.
    ///
    /// ## Errors
    ///
    /// * `GuichetError::TurnNotFound` if `turn` does not exist.
    /// * `GuichetError::InvalidFeedbackTarget` if `turn` is not an answered bot turn.
    pub fn feedback(&mut self, turn: TurnId, sentiment: Sentiment) -> Result<TurnId> {
        let target = self
            .conversation
            .get(turn)
            .ok_or_else(|| anyhow!(GuichetError::TurnNotFound { id: turn }))?;
        if target.role != Role::Bot || !target.accepts_feedback {
            return Err(anyhow!(GuichetError::InvalidFeedbackTarget { id: turn }));
        }
        info!("Feedback received for turn #{}: {}", turn, sentiment);
        Ok(self.conversation.push_bot_text(sentiment.acknowledgement()))
    }

    fn apply(
        &mut self,
        turn: TurnId,
        joined: std::result::Result<CallOutcome, JoinError>,
    ) -> Resolution {
        let outcome = joined.unwrap_or_else(|e| {
            Err(BackendError::Interrupted {
                detail: e.to_string(),
            })
        });
        match outcome {
            Ok(response) => {
                let sources = response.sources.len();
                let settlement = Settlement::Answer {
                    content: formatter::format(&response.answer),
                    sources: response.sources,
                };
                match self.conversation.settle(turn, settlement) {
                    Ok(()) => {
                        debug!("Turn #{} answered with {} sources.", turn, sources);
                        Resolution::Answered { turn, sources }
                    }
                    Err(e) => {
                        warn!("Could not settle turn #{}: {}", turn, e);
                        Resolution::Failed {
                            turn,
                            detail: e.to_string(),
                        }
                    }
                }
            }
            Err(err) => {
                warn!("Backend call for turn #{} failed: {}", turn, err);
                self.settle_failure(turn, err.to_string())
            }
        }
    }

    fn settle_failure(&mut self, turn: TurnId, detail: String) -> Resolution {
        if let Err(e) = self.conversation.settle(
            turn,
            Settlement::Failure {
                detail: detail.clone(),
            },
        ) {
            warn!("Could not settle turn #{}: {}", turn, e);
        }
        Resolution::Failed { turn, detail }
    }
}

impl<B: Backend> Drop for ChatSession<B> {
    fn drop(&mut self) {
        for in_flight in &self.in_flight {
            in_flight.handle.abort();
        }
    }
}
