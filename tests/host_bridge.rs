//! In-process tests for the newline-delimited JSON host bridge.
//!
//! Drives `run_bridge` over in-memory buffers with scripted model
//! collaborators, so no subprocess or network access is needed.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use solace::emotion::LexiconClassifier;
use solace::host::{HostHandler, run_bridge};
use solace::llm::message::Message;
use solace::llm::provider::{LabelGenerator, ReplyGenerator};
use solace::store::MemoryConversationStore;
use solace::{Collaborators, ServiceError, SolaceConfig, TurnOrchestrator};

struct Canned;

#[async_trait]
impl ReplyGenerator for Canned {
    fn name(&self) -> &str {
        "canned"
    }

    async fn generate_reply(
        &self,
        _instructions: &str,
        history: &[Message],
        _temperature: f64,
    ) -> Result<String, ServiceError> {
        Ok(format!("reply to {} messages\n\n\n\nbye", history.len()))
    }
}

#[async_trait]
impl LabelGenerator for Canned {
    async fn generate_short_label(&self, _prompt: &str) -> Result<String, ServiceError> {
        Ok("Title: \"Rainy Day Thoughts\"".into())
    }
}

fn handler() -> HostHandler {
    let canned = Arc::new(Canned);
    let reply_generator: Arc<dyn ReplyGenerator> = canned.clone();
    let label_generator: Arc<dyn LabelGenerator> = canned;
    HostHandler::new(TurnOrchestrator::new(
        Collaborators {
            text_classifier: Arc::new(LexiconClassifier::new()),
            audio_classifier: None,
            reply_generator,
            label_generator,
            store: Arc::new(MemoryConversationStore::new()),
        },
        &SolaceConfig::default(),
    ))
}

async fn exchange(lines: &[Value]) -> Vec<Value> {
    let mut input = String::new();
    for line in lines {
        input.push_str(&line.to_string());
        input.push('\n');
    }
    let mut output = Vec::new();
    run_bridge(&handler(), input.as_bytes(), &mut output)
        .await
        .unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[tokio::test]
async fn turn_then_history_round_trip() {
    let responses = exchange(&[
        json!({"request_id": "1", "op": "turn", "payload": {
            "user_id": "u1", "session_id": "s-bridge", "text": "it's raining again"
        }}),
        json!({"request_id": "2", "op": "turn", "payload": {
            "user_id": "u1", "session_id": "s-bridge", "text": "and I'm tired"
        }}),
        json!({"request_id": "3", "op": "history", "payload": {
            "user_id": "u1", "session_id": "s-bridge"
        }}),
        json!({"request_id": "4", "op": "list_sessions", "payload": {"user_id": "u1"}}),
    ])
    .await;

    assert_eq!(responses.len(), 4);
    for resp in &responses {
        assert_eq!(resp["ok"], true, "{resp}");
        assert_eq!(resp["v"], 1);
    }

    let first = &responses[0]["payload"];
    assert_eq!(first["reply"], "reply to 1 messages\n\nbye");
    assert_eq!(first["title"], "Rainy Day Thoughts");
    assert_eq!(first["crisis"], false);
    assert_eq!(responses[1]["payload"]["reply"], "reply to 3 messages\n\nbye");

    let interactions = responses[2]["payload"]["interactions"].as_array().unwrap();
    assert_eq!(interactions.len(), 2);
    assert_eq!(interactions[0]["user_input"], "it's raining again");
    assert_eq!(interactions[1]["user_input"], "and I'm tired");

    let sessions = responses[3]["payload"]["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["title"], "Rainy Day Thoughts");
}

#[tokio::test]
async fn crisis_turn_over_bridge() {
    let responses = exchange(&[json!({"request_id": "c", "op": "turn", "payload": {
        "user_id": "u1", "session_id": "s1", "text": "I want to end my life"
    }})])
    .await;
    let payload = &responses[0]["payload"];
    assert_eq!(payload["crisis"], true);
    assert_eq!(payload["reply"], solace::crisis::CRISIS_REPLY);
    assert!(payload["title"].is_null());
}

#[tokio::test]
async fn errors_keep_request_id() {
    let responses = exchange(&[json!({
        "request_id": "bad",
        "op": "list_sessions",
        "payload": {"user_id": ""}
    })])
    .await;
    assert_eq!(responses[0]["ok"], false);
    assert_eq!(responses[0]["request_id"], "bad");
    assert!(responses[0]["error"].as_str().unwrap().contains("user_id"));
}
