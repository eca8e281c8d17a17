//! The public assistant endpoint against a mocked Claude API.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use folio_integration_tests::{TestApp, draft};
use folio_server::services::FALLBACK_ANSWER;
use folio_server::store::{MemoryStore, ProjectStore};
use mockito::Matcher;
use serde_json::json;

#[tokio::test]
async fn test_tool_round_trip_includes_stored_projects() {
    let store = MemoryStore::new();
    store.create(draft("DevCard")).await.unwrap();
    let mut app = TestApp::with_store(store).await;

    // Answer round: the tool result must carry the stored project.
    let answer = app
        .server
        .mock("POST", "/v1/messages")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""tool_use_id":"toolu_01""#.to_string()),
            Matcher::Regex("DevCard description".to_string()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "id": "msg_2",
                "model": "claude-test",
                "stop_reason": "end_turn",
                "content": [{"type": "text", "text": "Aditya built DevCard."}],
                "usage": {"input_tokens": 1, "output_tokens": 1}
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    // First round asks for the tool.
    let ask = app
        .server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(
            json!({
                "id": "msg_1",
                "model": "claude-test",
                "stop_reason": "tool_use",
                "content": [
                    {"type": "tool_use", "id": "toolu_01", "name": "list_projects", "input": {}}
                ],
                "usage": {"input_tokens": 1, "output_tokens": 1}
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let response = app
        .post_json(
            "/api/ask",
            &json!({"question": "What has Aditya built?"}),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["answer"], "Aditya built DevCard.");
    ask.assert_async().await;
    answer.assert_async().await;
}

#[tokio::test]
async fn test_plain_answer() {
    let mut app = TestApp::new().await;
    app.mock_claude_text("I'm AdiBot.").await;

    let response = app
        .post_json("/api/ask", &json!({"question": "Who are you?"}), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["answer"], "I'm AdiBot.");
}

#[tokio::test]
async fn test_upstream_failure_yields_fallback() {
    let mut app = TestApp::new().await;
    app.server
        .mock("POST", "/v1/messages")
        .with_status(529)
        .with_body(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#)
        .create_async()
        .await;

    let response = app
        .post_json("/api/ask", &json!({"question": "Hi"}), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["answer"], FALLBACK_ANSWER);
}

#[tokio::test]
async fn test_blank_question_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .post_json("/api/ask", &json!({"question": "   "}), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
