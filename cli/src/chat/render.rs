//! # Turn Rendering
//!
//! File: cli/src/chat/render.rs
//!
//! ## Overview
//!
//! Presents conversation turns in one of three [`OutputFormat`]s:
//!
//! - `text`: terminal transcript (`Vous >` / `Assistant >` prefixes)
//! - `html`: chat widget markup, produced by `core::templating` with escaping
//! - `json`: the turns themselves, serialized with serde
//!
//! Rendering never mutates the conversation.
//!
use crate::chat::conversation::{Conversation, Role, Turn, TurnContent};
use crate::chat::formatter::{AnswerShape, Block, FormattedContent, LINE_BREAK};
use crate::core::config::OutputFormat;
use crate::core::error::Result;
use crate::core::templating::{BlockView, ChatTemplates, SourceView, TurnView};
use anyhow::Context;

const USER_PREFIX: &str = "Vous >";
const BOT_PREFIX: &str = "Assistant >";
const FEEDBACK_HINT: &str = "Cette réponse vous a-t-elle aidé ? (/utile ou /inutile)";

/// User-facing text for a failed backend call.
pub fn apology(detail: &str) -> String {
    format!(
        "Désolé, une erreur s'est produite lors de la connexion à l'API. (Détails: {})",
        detail
    )
}

pub struct Renderer {
    format: OutputFormat,
    show_sources: bool,
    feedback_hint: bool,
    templates: Option<ChatTemplates>,
}

impl Renderer {
    /// Builds a renderer. HTML templates are only compiled for `OutputFormat::Html`.
    pub fn new(format: OutputFormat, show_sources: bool) -> Result<Self> {
        let templates = match format {
            OutputFormat::Html => Some(ChatTemplates::new()?),
            OutputFormat::Text | OutputFormat::Json => None,
        };
        Ok(Self {
            format,
            show_sources,
            feedback_hint: false,
            templates,
        })
    }

    /// Shows the `/utile` `/inutile` hint under answers (interactive sessions only).
    pub fn with_feedback_hint(mut self, enabled: bool) -> Self {
        self.feedback_hint = enabled;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn render_turn(&self, turn: &Turn) -> Result<String> {
        match (&self.format, &self.templates) {
            (OutputFormat::Html, Some(templates)) => self.render_html(templates, turn),
            (OutputFormat::Json, _) => {
                serde_json::to_string_pretty(turn).context("Failed to serialize turn to JSON")
            }
            _ => Ok(self.render_text(turn)),
        }
    }

    pub fn render_transcript(&self, conversation: &Conversation) -> Result<String> {
        let turns: Vec<&Turn> = conversation.turns().iter().collect();
        self.render_turns(&turns)
    }

    /// Renders `turns` as one transcript, in the given order.
    pub fn render_turns(&self, turns: &[&Turn]) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(turns)
                .context("Failed to serialize transcript to JSON"),
            OutputFormat::Html => {
                let mut html = String::from("<div id=\"chat\">\n");
                for turn in turns {
                    html.push_str(&self.render_turn(turn)?);
                }
                html.push_str("</div>\n");
                Ok(html)
            }
            OutputFormat::Text => {
                let parts: Vec<String> = turns.iter().map(|turn| self.render_text(turn)).collect();
                Ok(parts.join("\n"))
            }
        }
    }

    fn render_text(&self, turn: &Turn) -> String {
        let prefix = match turn.role {
            Role::User => USER_PREFIX,
            Role::Bot => BOT_PREFIX,
        };
        let body = match &turn.content {
            TurnContent::Text { text } => text.clone(),
            TurnContent::Pending => "…".to_string(),
            TurnContent::Error { detail } => apology(detail),
            TurnContent::Formatted { content } => text_blocks(content),
        };

        let mut out = format!("{} {}\n", prefix, body);
        if self.show_sources && !turn.sources.is_empty() {
            out.push_str("Sources:\n");
            for source in &turn.sources {
                match source.link() {
                    Some(url) => out.push_str(&format!("  • {} ({})\n", source.title, url)),
                    None => out.push_str(&format!("  • {}\n", source.title)),
                }
            }
        }
        if self.feedback_hint && turn.accepts_feedback {
            out.push_str(FEEDBACK_HINT);
            out.push('\n');
        }
        out
    }

    fn render_html(&self, templates: &ChatTemplates, turn: &Turn) -> Result<String> {
        let view = self.turn_view(turn);
        match turn.role {
            Role::User => templates.render_user_turn(&view),
            Role::Bot => templates.render_bot_turn(&view),
        }
    }

    fn turn_view(&self, turn: &Turn) -> TurnView {
        let mut view = TurnView {
            id: turn.id,
            kind: "text",
            lines: Vec::new(),
            structured: false,
            blocks: Vec::new(),
            sources: Vec::new(),
            accepts_feedback: turn.accepts_feedback,
            apology: String::new(),
        };
        match &turn.content {
            TurnContent::Text { text } => {
                view.lines = text.lines().map(str::to_string).collect();
            }
            TurnContent::Pending => view.kind = "pending",
            TurnContent::Error { detail } => {
                view.kind = "error";
                view.apology = apology(detail);
            }
            TurnContent::Formatted { content } => {
                view.kind = "answer";
                view.structured = content.shape == AnswerShape::Structured;
                view.blocks = content.blocks.iter().map(block_view).collect();
            }
        }
        if self.show_sources {
            view.sources = turn
                .sources
                .iter()
                .map(|s| SourceView {
                    title: s.title.clone(),
                    link: s.link().map(str::to_string),
                })
                .collect();
        }
        view
    }
}

fn text_blocks(content: &FormattedContent) -> String {
    let lines: Vec<String> = content
        .blocks
        .iter()
        .map(|block| match block {
            Block::Labeled { label, value } => format!("{} : {}", label, value),
            Block::Plain { text } => text.replace(LINE_BREAK, "\n"),
        })
        .collect();
    match content.shape {
        // Structured answers start on their own line under the prefix.
        AnswerShape::Structured => format!("\n{}", lines.join("\n")),
        AnswerShape::Unstructured => lines.join("\n"),
    }
}

fn block_view(block: &Block) -> BlockView {
    match block {
        Block::Labeled { label, value } => BlockView {
            kind: "labeled",
            label: label.clone(),
            value: value.clone(),
            lines: Vec::new(),
        },
        Block::Plain { text } => BlockView {
            kind: "plain",
            label: String::new(),
            value: String::new(),
            lines: text.split(LINE_BREAK).map(str::to_string).collect(),
        },
    }
}
