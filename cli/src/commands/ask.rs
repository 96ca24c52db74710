//! # Guichet Ask Command
//!
//! File: cli/src/commands/ask.rs
//!
//! ## Overview
//!
//! Implements `guichet ask`, the non-interactive front end. Every question
//! given on the command line is submitted right away, so several questions
//! are in flight at once. Once all of them are settled the transcript is
//! printed in the configured format, each question followed by its answer.
//! Question/answer pairs appear in the order their answers were applied:
//! submission order with `--order fifo`, arrival order with `--order arrival`.
//!
//! A failed backend call does not fail the command: the answer turn becomes
//! an apology carrying the failure detail, as it would in the chat widget.
//!
//! ## Usage
//!
//! ```bash
//! # One question, text transcript
//! guichet ask "Comment obtenir un passeport ?"
//!
//! # Two questions, HTML markup, answers added as they arrive
//! guichet ask "Acte de naissance ?" "Casier judiciaire ?" --format html --order arrival
//! ```
//!
use crate::chat::backend::HttpBackend;
use crate::chat::render::Renderer;
use crate::chat::session::{ChatSession, RequestOptions, Resolution};
use crate::commands::{effective_config, ConnectionArgs, OutputArgs};
use crate::core::error::Result;
use clap::Parser;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    about = "Ask one or more questions and print the transcript",
    long_about = "Submits every QUESTION to the assistant backend concurrently, waits for\n\
                  all answers and prints the resulting conversation. Blank questions are\n\
                  ignored."
)]
pub struct AskArgs {
    /// The questions to ask, in order.
    #[arg(required = true, value_name = "QUESTION")]
    questions: Vec<String>,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    output: OutputArgs,
}

/// # Handle Ask Command (`handle_ask`)
///
/// ## Workflow
///
/// 1. Builds the effective configuration (files + flags).
/// 2. Submits every question to a fresh [`ChatSession`].
/// 3. Resolves all calls in the configured completion order.
/// 4. Prints each question/answer pair in the order the answers were applied.
///    Nothing is printed when every question was blank.
///
/// ## Errors
///
/// Configuration, client construction or rendering failures. Backend failures
/// end up in the transcript instead.
pub async fn handle_ask(args: AskArgs) -> Result<()> {
    let cfg = effective_config(&args.connection, Some(&args.output))?;
    info!(
        "Asking {} question(s) to {}",
        args.questions.len(),
        cfg.backend.base_url
    );

    let backend = HttpBackend::new(&cfg.backend)?;
    let mut session = ChatSession::new(
        backend,
        RequestOptions::from(&cfg.backend),
        cfg.render.order,
    );
    for question in &args.questions {
        session.submit(question);
    }
    if session.conversation().is_empty() {
        info!("No question to ask.");
        return Ok(());
    }

    let resolutions = session.resolve_all().await;
    let mut failures = 0;
    for resolution in &resolutions {
        if let Resolution::Failed { detail, .. } = resolution {
            debug!("Turn #{} failed: {}", resolution.turn(), detail);
            failures += 1;
        }
    }
    if failures > 0 {
        warn!("{} of {} question(s) failed.", failures, resolutions.len());
    }

    let conversation = session.conversation();
    let mut ordered = Vec::with_capacity(conversation.len());
    for resolution in &resolutions {
        ordered.extend(conversation.question_for(resolution.turn()));
        ordered.extend(conversation.get(resolution.turn()));
    }

    let renderer = Renderer::new(cfg.render.format, cfg.render.show_sources())?;
    let transcript = renderer.render_turns(&ordered)?;
    if transcript.ends_with('\n') {
        print!("{}", transcript);
    } else {
        println!("{}", transcript);
    }
    Ok(())
}
