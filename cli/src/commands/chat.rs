//! # Guichet Chat Command
//!
//! File: cli/src/commands/chat.rs
//!
//! ## Overview
//!
//! Implements `guichet chat`, an interactive conversation read line by line
//! from stdin. Each line is a question unless it starts with `/`:
//!
//! | Input                          | Effect                                   |
//! |--------------------------------|------------------------------------------|
//! | `/utile`, `/+`                 | positive feedback on the latest answer   |
//! | `/inutile`, `/-`               | negative feedback on the latest answer   |
//! | `/historique`                  | prints the whole transcript              |
//! | `/quitter`, `/quit`, `/exit`   | ends the session                         |
//!
//! Ctrl+C while a question is pending aborts it (the answer turn becomes an
//! apology). Ctrl+C at the prompt, like end of input, ends the session.
//!
//! New turns are written to stdout as soon as they settle. Prompts and notices
//! go to stderr so stdout stays a clean transcript in every format.
//!
use crate::chat::backend::{Backend, HttpBackend};
use crate::chat::conversation::{Role, Sentiment};
use crate::chat::render::Renderer;
use crate::chat::session::{ChatSession, RequestOptions};
use crate::commands::{effective_config, ConnectionArgs, OutputArgs};
use crate::core::config::OutputFormat;
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

const WELCOME: &str =
    "Bonjour ! Posez votre question sur les démarches administratives. (/quitter pour sortir)";
const NOTHING_TO_RATE: &str = "Aucune réponse à évaluer pour le moment.";

#[derive(Parser, Debug)]
#[command(
    about = "Start an interactive conversation with the assistant",
    long_about = "Reads questions from stdin and prints each answer as it settles.\n\
                  Type /utile or /inutile to rate the latest answer, /historique to\n\
                  print the transcript and /quitter to leave."
)]
pub struct ChatArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    output: OutputArgs,
}

/// A parsed input line.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Question(&'a str),
    Feedback(Sentiment),
    History,
    Quit,
    Unknown(&'a str),
    Blank,
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Input::Blank;
        }
        if !trimmed.starts_with('/') {
            return Input::Question(trimmed);
        }
        match trimmed {
            "/utile" | "/+" => Input::Feedback(Sentiment::Positive),
            "/inutile" | "/-" => Input::Feedback(Sentiment::Negative),
            "/historique" => Input::History,
            "/quitter" | "/quit" | "/exit" => Input::Quit,
            other => Input::Unknown(other),
        }
    }
}

/// # Handle Chat Command (`handle_chat`)
///
/// Builds the session from the effective configuration and runs the
/// read-answer loop on stdin until `/quitter`, Ctrl+C at the prompt or end of
/// input.
pub async fn handle_chat(args: ChatArgs) -> Result<()> {
    let cfg = effective_config(&args.connection, Some(&args.output))?;
    info!("Starting chat session against {}", cfg.backend.base_url);

    let backend = HttpBackend::new(&cfg.backend)?;
    let session = ChatSession::new(
        backend,
        RequestOptions::from(&cfg.backend),
        cfg.render.order,
    );
    let renderer =
        Renderer::new(cfg.render.format, cfg.render.show_sources())?.with_feedback_hint(true);

    eprintln!("{}", WELCOME);
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_loop(session, &renderer, stdin, &mut stdout).await
}

/// Drives one conversation over `input`, writing settled turns to `output`.
async fn run_loop<B, R, W>(
    mut session: ChatSession<B>,
    renderer: &Renderer,
    input: R,
    output: &mut W,
) -> Result<()>
where
    B: Backend,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    // Number of turns already written to `output`.
    let mut shown = 0;

    loop {
        eprint!("> ");
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            debug!("End of input.");
            break;
        };

        match Input::parse(&line) {
            Input::Blank => continue,
            Input::Quit => break,
            Input::Unknown(command) => {
                eprintln!("Commande inconnue : {}", command);
                continue;
            }
            Input::History => {
                let transcript = renderer.render_transcript(session.conversation())?;
                write_block(output, &transcript)?;
                continue;
            }
            Input::Feedback(sentiment) => {
                let target = session.conversation().latest_answer().map(|turn| turn.id);
                match target {
                    Some(turn) => {
                        session.feedback(turn, sentiment)?;
                    }
                    None => {
                        eprintln!("{}", NOTHING_TO_RATE);
                        continue;
                    }
                }
            }
            Input::Question(question) => {
                if session.submit(question).is_some() {
                    wait_for_answers(&mut session).await;
                }
            }
        }

        for turn in &session.conversation().turns()[shown..] {
            // The user already sees what they typed on a terminal transcript.
            if renderer.format() == OutputFormat::Text && turn.role == Role::User {
                continue;
            }
            write_block(output, &renderer.render_turn(turn)?)?;
        }
        shown = session.conversation().len();
    }

    let pending = session.conversation().pending_ids();
    if !pending.is_empty() {
        warn!("Leaving with unanswered turn(s) {:?}.", pending);
        session.abort_all();
    }
    info!("Chat session ended after {} turn(s).", session.conversation().len());
    Ok(())
}

/// Resolves every in-flight call; Ctrl+C aborts whatever is still pending.
async fn wait_for_answers<B: Backend>(session: &mut ChatSession<B>) {
    while session.in_flight() > 0 {
        let interrupted = tokio::select! {
            _ = session.resolve_next() => false,
            _ = tokio::signal::ctrl_c() => true,
        };
        if interrupted {
            warn!("Interrupted, aborting pending question(s).");
            session.abort_all();
        }
    }
}

fn write_block<W: Write>(output: &mut W, text: &str) -> Result<()> {
    output
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        output.write_all(b"\n").context("Failed to write to stdout")?;
    }
    output.flush().context("Failed to flush stdout")
}
