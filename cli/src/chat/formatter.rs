//! # Answer Formatter
//!
//! File: cli/src/chat/formatter.rs
//!
//! ## Overview
//!
//! Turns the raw `answer` string returned by the backend into a sequence of
//! display blocks. The backend emits procedure sheets as `Key: value` lines
//! whenever it lists the documents to bring ("Pièces à fournir"); anything else
//! is free text.
//!
//! The formatter is pure: it never escapes, never touches the transcript and
//! always yields the same blocks for the same input. Escaping belongs to the
//! renderers in `chat::render`.
//!
//! ## Examples
//!
//! ```rust
//! let content = formatter::format("Pièces à fournir: CNI\nNom: Jean\nÂge");
//! assert_eq!(content.shape, AnswerShape::Structured);
//! assert_eq!(content.blocks.len(), 3);
//! ```
//!
use serde::Serialize;

/// Substring whose presence marks an answer as a structured procedure sheet.
pub const STRUCTURED_MARKER: &str = "Pièces à fournir";

/// Line-break marker placed in unstructured text in place of `\n`.
///
/// U+2028 (LINE SEPARATOR) survives HTML escaping untouched, so the HTML
/// renderer can turn it into `<br>` after escaping the surrounding text.
pub const LINE_BREAK: char = '\u{2028}';

/// Result of the classification step that runs before formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerShape {
    /// Colon-delimited procedure sheet, formatted line by line.
    Structured,
    /// Free text, kept as a single block.
    Unstructured,
}

/// One display fragment of a formatted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// A `label: value` line.
    Labeled { label: String, value: String },
    /// Anything else. Unstructured text may contain [`LINE_BREAK`] markers.
    Plain { text: String },
}

/// Ordered blocks produced by [`format`], tagged with the shape that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedContent {
    pub shape: AnswerShape,
    pub blocks: Vec<Block>,
}

/// Decides whether `answer` is a structured procedure sheet.
pub fn classify(answer: &str) -> AnswerShape {
    if answer.contains(STRUCTURED_MARKER) {
        AnswerShape::Structured
    } else {
        AnswerShape::Unstructured
    }
}

/// # Format Answer (`format`)
///
/// Maps a raw backend answer to [`FormattedContent`].
///
/// - Unstructured answers become a single `Plain` block whose newlines are
///   replaced by [`LINE_BREAK`].
/// - Structured answers are split on `\n`; whitespace-only lines are dropped and
///   every remaining line becomes a block via [`format_line`], in input order.
pub fn format(answer: &str) -> FormattedContent {
    match classify(answer) {
        AnswerShape::Unstructured => FormattedContent {
            shape: AnswerShape::Unstructured,
            blocks: vec![Block::Plain {
                text: answer.replace('\n', &LINE_BREAK.to_string()),
            }],
        },
        AnswerShape::Structured => FormattedContent {
            shape: AnswerShape::Structured,
            blocks: answer
                .split('\n')
                .filter(|line| !line.trim().is_empty())
                .map(format_line)
                .collect(),
        },
    }
}

/// Splits one structured line at its first colon.
///
/// A colon only counts when at least one character follows it, so a trailing
/// `Pièces à fournir:` heading stays a plain line instead of producing a label
/// with an empty value. Later colons (URLs, times) stay inside the value.
fn format_line(line: &str) -> Block {
    match line.split_once(':') {
        Some((label, value)) if !value.is_empty() => Block::Labeled {
            label: label.trim().to_string(),
            value: value.trim().to_string(),
        },
        _ => Block::Plain {
            text: line.to_string(),
        },
    }
}
