//! Integration tests for the chat REST API.
//!
//! Each test spins up an Axum server on a random port and talks to it over
//! real HTTP with reqwest.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use feature_assist::session::{ChatResponse, SessionStore, feature_routes};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Start an Axum server on a random port, return (base_url, store).
async fn start_server() -> (String, Arc<SessionStore>) {
    let store = SessionStore::new();
    let app = feature_routes(Arc::clone(&store));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), store)
}

async fn chat(client: &reqwest::Client, base: &str, body: Value) -> ChatResponse {
    client
        .post(format!("{base}/chat"))
        .json(&body)
        .send()
        .await
        .expect("chat request failed")
        .json()
        .await
        .expect("invalid chat response")
}

#[tokio::test]
async fn metric_conversation_produces_yaml() {
    timeout(TEST_TIMEOUT, async {
        let (base, store) = start_server().await;
        let client = reqwest::Client::new();

        let inputs = ["metric", "Revenue", "sales_table", "SUM", "amount"];
        for input in inputs {
            let resp = chat(&client, &base, json!({"message": input})).await;
            assert!(resp.yaml.is_none(), "unexpected yaml after {input:?}");
            assert_eq!(resp.session_id, "default");
        }

        let resp = chat(&client, &base, json!({"message": "skip"})).await;
        assert_eq!(resp.reply, "Here is the generated YAML for your feature:");
        let yaml = resp.yaml.expect("yaml missing on final turn");

        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        let keys: Vec<&str> = doc
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap())
            .collect();
        assert_eq!(keys, ["name", "type", "asset_id", "metric_spec"]);
        assert_eq!(doc["metric_spec"]["field"].as_str(), Some("amount"));
        assert!(doc["metric_spec"].get("filter_clause").is_none());

        let status = store.status("default").await.unwrap();
        assert!(status.feature_type.is_none(), "session should be reset");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn sessions_are_isolated_over_http() {
    timeout(TEST_TIMEOUT, async {
        let (base, _store) = start_server().await;
        let client = reqwest::Client::new();

        let created: Value = client
            .post(format!("{base}/api/sessions"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let session_id = created["session_id"].as_str().unwrap().to_string();
        assert!(created["reply"].as_str().unwrap().starts_with("Hello!"));

        chat(&client, &base, json!({"message": "formula", "session_id": session_id})).await;
        let other = chat(&client, &base, json!({"message": "Margin"})).await;
        assert!(other.reply.starts_with("I didn't catch that."));

        let resp = chat(
            &client,
            &base,
            json!({"message": "Margin", "session_id": session_id}),
        )
        .await;
        assert_eq!(resp.reply, "Please provide the SQL for the formula:");
        assert_eq!(resp.session_id, session_id);

        let status: Value = client
            .get(format!("{base}/api/sessions/{session_id}/status"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["phase"]["phase"], "collecting");
        assert_eq!(status["phase"]["field"], "formula_spec.sql");
        assert_eq!(status["feature_type"], "FORMULA");
        assert_eq!(status["collected"]["name"], "Margin");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn reset_mid_conversation_starts_over() {
    timeout(TEST_TIMEOUT, async {
        let (base, _store) = start_server().await;
        let client = reqwest::Client::new();

        chat(&client, &base, json!({"message": "first-last", "session_id": "s1"})).await;
        chat(&client, &base, json!({"message": "Latest order", "session_id": "s1"})).await;

        let reset: ChatResponse = client
            .post(format!("{base}/reset"))
            .json(&json!({"session_id": "s1"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(reset.reply.starts_with("Ok, let's start over."));
        assert!(reset.yaml.is_none());

        let resp = chat(&client, &base, json!({"message": "first-last", "session_id": "s1"})).await;
        assert_eq!(
            resp.reply,
            "Great! Let's create a FIRST_LAST feature. What is 'name'?"
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn validation_failure_is_reported_and_resets() {
    timeout(TEST_TIMEOUT, async {
        let (base, store) = start_server().await;
        let client = reqwest::Client::new();

        let answers = [
            "first-last",
            "Latest order",
            "orders",
            "sideways",
            "status",
            "created_at",
            "DESC",
        ];
        for answer in answers {
            chat(&client, &base, json!({"message": answer, "session_id": "v"})).await;
        }
        let resp = chat(&client, &base, json!({"message": "skip", "session_id": "v"})).await;

        assert!(resp.yaml.is_none());
        assert!(resp.reply.contains("first_last_spec.operation"));
        assert!(resp.reply.contains("State has been reset."));
        assert!(store.status("v").await.unwrap().feature_type.is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn malformed_chat_body_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let (base, store) = start_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/chat"))
            .json(&json!({"text": "metric"}))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
        assert!(store.is_empty().await);
    })
    .await
    .expect("test timed out");
}
