//! # Guichet Template System
//!
//! File: cli/src/core/templating.rs
//!
//! ## Overview
//!
//! HTML rendering of chat turns through the Tera templating engine. The markup
//! reproduces the chat widget's structure (`message user` / `message bot`
//! containers, labeled paragraphs, sources list, feedback buttons) so the output
//! can be dropped into the existing stylesheet.
//!
//! ## Escaping
//!
//! Templates are registered under `.html` names, which turns on Tera's
//! auto-escaping. Every value coming from the user or the backend (questions,
//! answer text, labels, source titles and URLs) is therefore HTML-escaped. The
//! only raw markup emitted is the templates' own, including the `<br>` placed
//! between lines.
//!
//! ## Examples
//!
//! ```rust
//! let templates = ChatTemplates::new()?;
//! let html = templates.render_bot_turn(&view)?;
//! ```
//!
use crate::core::error::{GuichetError, Result};
use anyhow::anyhow;
use serde::Serialize;
use tera::Tera;
use tracing::debug;

const USER_TURN_TEMPLATE: &str = "user_turn.html";
const BOT_TURN_TEMPLATE: &str = "bot_turn.html";

const USER_TURN_SOURCE: &str = r#"<div class="message user" data-turn="{{ id }}">
  <div class="message-content"><div class="message-text">{% for line in lines %}{{ line }}{% if not loop.last %}<br>{% endif %}{% endfor %}</div></div>
</div>
"#;

const BOT_TURN_SOURCE: &str = r#"<div class="message bot" data-turn="{{ id }}">
  <div class="avatar"><i class="fas fa-robot"></i></div>
  <div class="message-content">
{%- if kind == "pending" %}
    <div class="typing-indicator"><span></span><span></span><span></span></div>
{%- elif kind == "error" %}
    <div class="message-text">{{ apology }}</div>
{%- elif kind == "text" %}
    <div class="message-text">{% for line in lines %}{{ line }}{% if not loop.last %}<br>{% endif %}{% endfor %}</div>
{%- else %}
    <div class="message-text">
{%- for block in blocks %}
{%- if block.kind == "labeled" %}<p style="margin-bottom: 8px;"><strong>{{ block.label }} :</strong> {{ block.value }}</p>
{%- elif structured %}<p>{{ block.lines | first }}</p>
{%- else %}{% for line in block.lines %}{{ line }}{% if not loop.last %}<br>{% endif %}{% endfor %}
{%- endif %}
{%- endfor -%}
    </div>
{%- if sources | length > 0 %}
    <div class="sources">
      <strong>Sources:</strong>
{%- for source in sources %}
{%- if source.link %}
      <div style="margin: 5px 0;">• <a href="{{ source.link }}" target="_blank">{{ source.title }}</a></div>
{%- else %}
      <div style="margin: 5px 0;">• {{ source.title }}</div>
{%- endif %}
{%- endfor %}
    </div>
{%- endif %}
{%- if accepts_feedback %}
    <div class="feedback">
      <span>Cette réponse vous a-t-elle aidé ?</span>
      <button class="feedback-btn" data-turn="{{ id }}" data-feedback="positive" title="Utile">👍</button>
      <button class="feedback-btn" data-turn="{{ id }}" data-feedback="negative" title="Pas utile">👎</button>
    </div>
{%- endif %}
{%- endif %}
  </div>
</div>
"#;

/// Template-facing view of one turn. Built by `chat::render`.
#[derive(Debug, Serialize)]
pub struct TurnView {
    pub id: usize,
    /// `text`, `answer`, `pending` or `error`.
    pub kind: &'static str,
    /// Literal text split on line breaks (user questions, acknowledgements).
    pub lines: Vec<String>,
    /// Whether `blocks` came from a structured answer.
    pub structured: bool,
    pub blocks: Vec<BlockView>,
    pub sources: Vec<SourceView>,
    pub accepts_feedback: bool,
    pub apology: String,
}

#[derive(Debug, Serialize)]
pub struct BlockView {
    /// `labeled` or `plain`.
    pub kind: &'static str,
    pub label: String,
    pub value: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SourceView {
    pub title: String,
    pub link: Option<String>,
}

/// Compiled chat templates.
pub struct ChatTemplates {
    tera: Tera,
}

impl ChatTemplates {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (USER_TURN_TEMPLATE, USER_TURN_SOURCE),
            (BOT_TURN_TEMPLATE, BOT_TURN_SOURCE),
        ])
        .map_err(|e| {
            anyhow!(GuichetError::Template { source: e }).context("Failed to compile chat templates")
        })?;
        debug!("Chat templates compiled.");
        Ok(Self { tera })
    }

    pub fn render_user_turn(&self, view: &TurnView) -> Result<String> {
        self.render(USER_TURN_TEMPLATE, view)
    }

    pub fn render_bot_turn(&self, view: &TurnView) -> Result<String> {
        self.render(BOT_TURN_TEMPLATE, view)
    }

    fn render(&self, template: &str, view: &TurnView) -> Result<String> {
        let context = tera::Context::from_serialize(view).map_err(|e| {
            anyhow!(GuichetError::Template { source: e })
                .context("Failed to create Tera context from turn")
        })?;
        self.tera.render(template, &context).map_err(|e| {
            anyhow!(GuichetError::Template { source: e })
                .context(format!("Tera rendering failed for template '{}'", template))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(kind: &'static str) -> TurnView {
        TurnView {
            id: 7,
            kind,
            lines: vec![],
            structured: false,
            blocks: vec![],
            sources: vec![],
            accepts_feedback: false,
            apology: String::new(),
        }
    }

    #[test]
    fn test_templates_compile() {
        assert!(ChatTemplates::new().is_ok());
    }

    #[test]
    fn test_pending_turn_shows_typing_indicator() -> Result<()> {
        let html = ChatTemplates::new()?.render_bot_turn(&view("pending"))?;
        assert!(html.contains(r#"<div class="typing-indicator">"#));
        assert!(html.contains(r#"data-turn="7""#));
        assert!(!html.contains("feedback"));
        Ok(())
    }

    #[test]
    fn test_user_lines_are_escaped_and_joined() -> Result<()> {
        let mut user = view("text");
        user.lines = vec!["<script>alert(1)</script>".into(), "ligne 2".into()];
        let html = ChatTemplates::new()?.render_user_turn(&user)?;
        assert!(html.contains("&lt;script&gt;alert(1)&lt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<br>ligne 2"));
        Ok(())
    }

    #[test]
    fn test_answer_blocks_sources_and_feedback() -> Result<()> {
        let mut answer = view("answer");
        answer.structured = true;
        answer.accepts_feedback = true;
        answer.blocks = vec![
            BlockView {
                kind: "labeled",
                label: "Nom".into(),
                value: "Jean & Marie".into(),
                lines: vec![],
            },
            BlockView {
                kind: "plain",
                label: String::new(),
                value: String::new(),
                lines: vec!["Âge".into()],
            },
        ];
        answer.sources = vec![
            SourceView {
                title: "Fiche".into(),
                link: Some("https://example.bf".into()),
            },
            SourceView {
                title: "Guide".into(),
                link: None,
            },
        ];

        let html = ChatTemplates::new()?.render_bot_turn(&answer)?;
        assert!(html.contains(
            r#"<p style="margin-bottom: 8px;"><strong>Nom :</strong> Jean &amp; Marie</p>"#
        ));
        assert!(html.contains("<p>Âge</p>"));
        assert!(html.contains(r#"target="_blank">Fiche</a>"#));
        assert!(html.contains("• Guide</div>"));
        assert!(html.contains(r#"data-feedback="negative""#));
        Ok(())
    }
}
