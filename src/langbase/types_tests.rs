//! Unit tests for Langbase API types.
//!
//! Tests request/response serialization and builder patterns for
//! pipe communication.

use super::*;
use serde_json::json;

#[test]
fn test_message_constructors() {
    let msg = Message::system("You are a rigorous critique assistant");
    assert!(matches!(msg.role, MessageRole::System));
    assert_eq!(msg.content, "You are a rigorous critique assistant");

    let msg = Message::user("Critique this idea");
    assert!(matches!(msg.role, MessageRole::User));
}

#[test]
fn test_message_role_serializes_lowercase() {
    let value = serde_json::to_value(Message::system("x")).unwrap();
    assert_eq!(value["role"], "system");
}

#[test]
fn test_pipe_request_new_is_not_streaming() {
    let req = PipeRequest::new("hardener-critique-v1", vec![Message::user("test")]);
    assert_eq!(req.name, "hardener-critique-v1");
    assert_eq!(req.messages.len(), 1);
    assert!(!req.stream);

    let value = serde_json::to_value(&req).unwrap();
    assert_eq!(value["stream"], false);
    assert_eq!(value["messages"][0]["role"], "user");
    assert!(value.get("temperature").is_none());
}

#[test]
fn test_pipe_request_with_temperature() {
    let req = PipeRequest::new("pipe", vec![Message::user("x")]).with_temperature(0.2);
    let value = serde_json::to_value(&req).unwrap();
    assert_eq!(value["temperature"], 0.2);
}

#[test]
fn test_pipe_response_total_tokens() {
    let response: PipeResponse = serde_json::from_value(json!({
        "success": true,
        "completion": "done",
        "threadId": null,
        "raw": {"model": "gpt-4.1-mini", "usage": {"total_tokens": 150}}
    }))
    .unwrap();
    assert_eq!(response.total_tokens(), Some(150));

    let response: PipeResponse = serde_json::from_value(json!({
        "success": true,
        "completion": "done",
        "threadId": "t-1"
    }))
    .unwrap();
    assert_eq!(response.total_tokens(), None);
    assert_eq!(response.thread_id.as_deref(), Some("t-1"));
}

#[test]
fn test_create_pipe_request_builder() {
    let req = CreatePipeRequest::new("hardener-mitigation-v1")
        .with_description("Mitigation stage")
        .with_model("openai:gpt-4.1-mini")
        .with_upsert(true)
        .with_temperature(0.55)
        .with_max_tokens(4000)
        .with_messages(vec![Message::system("sys")]);

    assert_eq!(req.description.as_deref(), Some("Mitigation stage"));
    assert_eq!(req.model.as_deref(), Some("openai:gpt-4.1-mini"));
    assert_eq!(req.upsert, Some(true));
    assert_eq!(req.temperature, Some(0.55));
    assert_eq!(req.max_tokens, Some(4000));
    assert_eq!(req.messages.as_ref().map(|m| m.len()), Some(1));
}

#[test]
fn test_create_pipe_request_skips_unset_fields() {
    let value = serde_json::to_value(CreatePipeRequest::new("pipe")).unwrap();
    assert_eq!(value, json!({"name": "pipe"}));
}

#[test]
fn test_create_pipe_response_tolerates_missing_fields() {
    let response: CreatePipeResponse = serde_json::from_value(json!({"name": "pipe"})).unwrap();
    assert_eq!(response.name, "pipe");
    assert!(response.url.is_none());
}
