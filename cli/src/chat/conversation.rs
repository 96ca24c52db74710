//! # Conversation Transcript
//!
//! File: cli/src/chat/conversation.rs
//!
//! ## Overview
//!
//! Data model of a chat transcript: turns, their content, and the sources
//! attached to answers. The [`Conversation`] is append-only. A pending bot turn
//! is settled exactly once, either to a final answer or to an error; no turn is
//! ever removed or settled twice.
//!
//! Mutation goes through `&mut Conversation`, so a single owner (the
//! `ChatSession`) serializes every change.
//!
use crate::chat::formatter::FormattedContent;
use crate::core::error::{GuichetError, Result};
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of a turn in the transcript. Stable because turns are never removed.
pub type TurnId = usize;

/// Source `url` values that mean "no link".
const NO_LINK_SENTINELS: [&str; 2] = ["#", "Non spécifié"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

/// Title shown for a source the backend sent without one.
pub const UNKNOWN_SOURCE_TITLE: &str = "Source inconnue";

/// A citation attached to an answer.
///
/// The backend names the title field `titre`; both spellings are accepted. A
/// null or missing title becomes [`UNKNOWN_SOURCE_TITLE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(
        alias = "titre",
        default = "unknown_title",
        deserialize_with = "title_or_unknown"
    )]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

fn unknown_title() -> String {
    UNKNOWN_SOURCE_TITLE.to_string()
}

fn title_or_unknown<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let title = Option::<String>::deserialize(deserializer)?;
    Ok(title.unwrap_or_else(unknown_title))
}

impl Source {
    /// Returns the URL to link to, or `None` when the source is title-only.
    pub fn link(&self) -> Option<&str> {
        self.url
            .as_deref()
            .filter(|url| !url.is_empty() && !NO_LINK_SENTINELS.contains(url))
    }
}

/// What a turn currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnContent {
    /// Literal text (user questions, feedback acknowledgements).
    Text { text: String },
    /// A formatted backend answer.
    Formatted { content: FormattedContent },
    /// Waiting for the backend.
    Pending,
    /// The backend call failed; `detail` is surfaced to the user.
    Error { detail: String },
}

/// Lifecycle state derived from [`TurnContent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Pending,
    Final,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub id: TurnId,
    pub role: Role,
    pub status: TurnStatus,
    pub content: TurnContent,
    pub sources: Vec<Source>,
    /// Set once an answer lands; drives the feedback affordance.
    pub accepts_feedback: bool,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    fn new(id: TurnId, role: Role, content: TurnContent) -> Self {
        let status = match content {
            TurnContent::Pending => TurnStatus::Pending,
            TurnContent::Error { .. } => TurnStatus::Error,
            TurnContent::Text { .. } | TurnContent::Formatted { .. } => TurnStatus::Final,
        };
        Self {
            id,
            role,
            status,
            content,
            sources: Vec::new(),
            accepts_feedback: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TurnStatus::Pending
    }
}

/// How a pending turn ends.
#[derive(Debug, Clone)]
pub enum Settlement {
    Answer {
        content: FormattedContent,
        sources: Vec<Source>,
    },
    Failure {
        detail: String,
    },
}

/// User feedback on an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    /// The acknowledgement shown after feedback is given.
    pub fn acknowledgement(self) -> &'static str {
        match self {
            Sentiment::Positive => "Merci pour votre feedback positif !",
            Sentiment::Negative => {
                "Merci pour votre feedback. Nous allons essayer de nous améliorer."
            }
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
        }
    }
}

/// Append-only transcript.
#[derive(Debug, Default, Serialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn get(&self, id: TurnId) -> Option<&Turn> {
        self.turns.get(id)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Ids of the turns still waiting for the backend, oldest first.
    pub fn pending_ids(&self) -> Vec<TurnId> {
        self.turns
            .iter()
            .filter(|t| t.is_pending())
            .map(|t| t.id)
            .collect()
    }

    /// The most recent bot turn that can receive feedback.
    pub fn latest_answer(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.accepts_feedback)
    }

    /// The user turn that bot turn `answer` replies to: the turn right before it.
    pub fn question_for(&self, answer: TurnId) -> Option<&Turn> {
        let id = answer.checked_sub(1)?;
        self.get(id).filter(|turn| turn.role == Role::User)
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> TurnId {
        self.push(Role::User, TurnContent::Text { text: text.into() })
    }

    pub fn push_pending(&mut self) -> TurnId {
        self.push(Role::Bot, TurnContent::Pending)
    }

    pub fn push_bot_text(&mut self, text: impl Into<String>) -> TurnId {
        self.push(Role::Bot, TurnContent::Text { text: text.into() })
    }

    fn push(&mut self, role: Role, content: TurnContent) -> TurnId {
        let id = self.turns.len();
        self.turns.push(Turn::new(id, role, content));
        id
    }

    /// # Settle Pending Turn (`settle`)
    ///
    /// Moves turn `id` from `Pending` to `Final` (answer) or `Error` (failure).
    ///
    /// ## Errors
    ///
    /// * `GuichetError::TurnNotFound` if `id` is not in the transcript.
    /// * `GuichetError::TurnAlreadySettled` if the turn is not pending. The turn
    ///   is left untouched in that case.
    pub fn settle(&mut self, id: TurnId, settlement: Settlement) -> Result<()> {
        let turn = self
            .turns
            .get_mut(id)
            .ok_or_else(|| anyhow!(GuichetError::TurnNotFound { id }))?;
        if !turn.is_pending() {
            return Err(anyhow!(GuichetError::TurnAlreadySettled { id }));
        }
        match settlement {
            Settlement::Answer { content, sources } => {
                turn.content = TurnContent::Formatted { content };
                turn.sources = sources;
                turn.status = TurnStatus::Final;
                turn.accepts_feedback = true;
            }
            Settlement::Failure { detail } => {
                turn.content = TurnContent::Error { detail };
                turn.status = TurnStatus::Error;
            }
        }
        Ok(())
    }
}
