//! # Guichet CLI Ask Integration Tests
//!
//! File: cli/tests/ask.rs
//!
//! ## Overview
//!
//! Runs `guichet ask` against a stub assistant served by axum on a local
//! port, and against an address nobody listens on.
//!
mod common;
use axum::{http::StatusCode, routing::post, Json, Router};
use common::*;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::time::Duration;

/// Nothing listens on port 1 of the loopback interface.
const UNREACHABLE: &str = "http://127.0.0.1:1";

#[test]
fn test_ask_prints_structured_answer_and_sources() {
    let addr = spawn_stub_backend(assistant_router());
    Sandbox::new()
        .cmd()
        .args(["ask", "Comment obtenir un passeport ?", "--url", &base_url(addr)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Vous > Comment obtenir un passeport ?"))
        .stdout(predicate::str::contains(
            "Assistant > \nPièces à fournir : CNI\nCoût : 50 000 FCFA\nQuestion : Comment obtenir un passeport ?",
        ))
        .stdout(predicate::str::contains(
            "  • Passeport ordinaire (https://servicepublic.gov.bf/passeport)",
        ))
        .stdout(predicate::str::contains("  • Guide interne\n"));
}

#[test]
fn test_ask_url_from_environment() {
    let addr = spawn_stub_backend(assistant_router());
    Sandbox::new()
        .cmd()
        .env("GUICHET_API_URL", base_url(addr))
        .args(["ask", "Bonjour", "--no-sources"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Question : Bonjour"))
        .stdout(predicate::str::contains("Sources:").not());
}

#[test]
fn test_ask_url_from_project_config() {
    let addr = spawn_stub_backend(assistant_router());
    let sandbox = Sandbox::new();
    sandbox.write_project_config(&format!(
        "[backend]\nbase_url = \"{}\"\n\n[render]\nshow_sources = false\n",
        base_url(addr)
    ));
    sandbox
        .cmd()
        .args(["ask", "Bonjour"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Question : Bonjour"))
        .stdout(predicate::str::contains("Sources:").not());
}

#[test]
fn test_ask_forwards_filters_and_top_k() {
    let router = Router::new().route(
        "/generate",
        post(|Json(body): Json<Value>| async move {
            Json(json!({
                "answer": format!(
                    "top_k={} espace={} theme={}",
                    body["top_k"], body["espace_filter"], body["theme_filter"]
                ),
                "sources": []
            }))
        }),
    );
    let addr = spawn_stub_backend(router);
    Sandbox::new()
        .cmd()
        .args([
            "ask",
            "Bonjour",
            "--url",
            &base_url(addr),
            "--top-k",
            "2",
            "--espace",
            "Particuliers",
            "--theme",
            "État civil",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "top_k=2 espace=\"Particuliers\" theme=\"État civil\"",
        ));
}

#[test]
fn test_ask_unreachable_backend_prints_apology() {
    Sandbox::new()
        .cmd()
        .args(["ask", "Bonjour", "--url", UNREACHABLE])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Assistant > Désolé, une erreur s'est produite lors de la connexion à l'API. (Détails:",
        ));
}

#[test]
fn test_ask_http_error_detail_in_apology() {
    let router = Router::new().route(
        "/generate",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "index manquant") }),
    );
    let addr = spawn_stub_backend(router);
    Sandbox::new()
        .cmd()
        .args(["ask", "Bonjour", "--url", &base_url(addr)])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "(Détails: HTTP error! status: 500. Response: index manquant)",
        ));
}

#[test]
fn test_ask_blank_question_prints_nothing() {
    Sandbox::new()
        .cmd()
        .args(["ask", "   ", "--url", UNREACHABLE])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_ask_html_is_escaped() {
    let addr = spawn_stub_backend(assistant_router());
    Sandbox::new()
        .cmd()
        .args([
            "ask",
            "<script>alert(1)</script>",
            "--url",
            &base_url(addr),
            "--format",
            "html",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<div id=\"chat\">"))
        .stdout(predicate::str::contains("&lt;script&gt;alert(1)&lt;"))
        .stdout(predicate::str::contains("<strong>Pièces à fournir :</strong> CNI"))
        .stdout(predicate::str::contains("<script>").not());
}

#[test]
fn test_ask_json_transcript() {
    let addr = spawn_stub_backend(assistant_router());
    let output = Sandbox::new()
        .cmd()
        .args(["ask", "Un", "Deux", "--url", &base_url(addr), "--format", "json"])
        .output()
        .expect("Failed to run guichet");
    assert!(output.status.success());

    let turns: Value = serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    let turns = turns.as_array().expect("transcript is not an array");
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[0]["content"]["text"], "Un");
    assert_eq!(turns[1]["status"], "final");
    assert_eq!(turns[2]["content"]["text"], "Deux");
    assert_eq!(turns[3]["content"]["content"]["blocks"][2]["value"], "Deux");
}

/// Answers "lente" 300 ms after "rapide".
fn slow_first_router() -> Router {
    Router::new().route(
        "/generate",
        post(|Json(body): Json<Value>| async move {
            let question = body["question"].as_str().unwrap_or_default().to_string();
            if question == "lente" {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            Json(json!({ "answer": format!("réponse {}", question), "sources": [] }))
        }),
    )
}

fn ask_slow_then_fast(order: &str) -> String {
    let addr = spawn_stub_backend(slow_first_router());
    let output = Sandbox::new()
        .cmd()
        .args(["ask", "lente", "rapide", "--url", &base_url(addr), "--order", order])
        .output()
        .expect("Failed to run guichet");
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_ask_fifo_keeps_submission_order() {
    let stdout = ask_slow_then_fast("fifo");
    assert!(stdout.starts_with("Vous > lente\n\nAssistant > réponse lente\n"));
    let slow = stdout.find("réponse lente").expect("slow answer missing");
    let fast = stdout.find("réponse rapide").expect("fast answer missing");
    assert!(slow < fast);
}

#[test]
fn test_ask_arrival_prints_fastest_answer_first() {
    let stdout = ask_slow_then_fast("arrival");
    assert!(stdout.starts_with("Vous > rapide\n\nAssistant > réponse rapide\n"));
    let slow = stdout.find("réponse lente").expect("slow answer missing");
    let fast = stdout.find("réponse rapide").expect("fast answer missing");
    assert!(fast < slow);
    assert_ne!(stdout, ask_slow_then_fast("fifo"));
}

#[test]
fn test_ask_source_without_title_is_still_an_answer() {
    let router = Router::new().route(
        "/generate",
        post(|| async {
            Json(json!({
                "answer": "Pièces à fournir: CNI",
                "sources": [{ "titre": null, "url": "#" }]
            }))
        }),
    );
    let addr = spawn_stub_backend(router);
    Sandbox::new()
        .cmd()
        .args(["ask", "Passeport ?", "--url", &base_url(addr)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pièces à fournir : CNI"))
        .stdout(predicate::str::contains("  • Source inconnue\n"))
        .stdout(predicate::str::contains("Désolé").not());
}

#[test]
fn test_ask_trims_question() {
    let addr = spawn_stub_backend(assistant_router());
    Sandbox::new()
        .cmd()
        .args(["ask", "   Bonjour  ", "--url", &base_url(addr)])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Vous > Bonjour\n"));
}

#[test]
fn test_ask_flags_rescue_invalid_project_config() {
    let addr = spawn_stub_backend(assistant_router());
    let sandbox = Sandbox::new();
    sandbox.write_project_config("[backend]\nbase_url = \"ftp://old-host\"\ntop_k = 0\n");

    sandbox
        .cmd()
        .args(["ask", "Bonjour", "--url", &base_url(addr), "--top-k", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Question : Bonjour"));

    sandbox
        .cmd()
        .args(["ask", "Bonjour", "--url", &base_url(addr)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("top_k must be at least 1"));
}

#[test]
fn test_ask_invalid_url_override_fails() {
    Sandbox::new()
        .cmd()
        .args(["ask", "Bonjour", "--url", "ftp://example.bf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must use http or https"));
}
