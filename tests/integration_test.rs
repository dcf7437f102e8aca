//! Integration tests for the full MCP → Workflow → Langbase → Storage flow
//!
//! The Langbase API is mocked with wiremock and sessions live in a temporary
//! SQLite file, so a second server instance can rehydrate them.

use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

use idea_hardener::config::{
    Config, DatabaseConfig, FrameworksConfig, LangbaseConfig, LogFormat, LoggingConfig,
    PipeConfig, RequestConfig,
};
use idea_hardener::frameworks::FrameworkCatalog;
use idea_hardener::langbase::LangbaseClient;
use idea_hardener::server::{AppState, McpServer};
use idea_hardener::storage::SqliteStorage;

const CLARIFY_REPLY: &str = "Reframed Understanding:\nYou want X via Y.\n\nClarifying Questions:\n1. Who?\n2. What?\n3. When?\n4. Where?\n5. Why?";

/// Create test configuration with mock server URL
fn create_test_config(mock_url: &str, dir: &TempDir) -> Config {
    Config {
        langbase: LangbaseConfig {
            api_key: "test-api-key".to_string(),
            base_url: mock_url.to_string(),
        },
        database: DatabaseConfig {
            path: dir.path().join("hardener.db"),
            max_connections: 1,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
        },
        request: RequestConfig {
            timeout_ms: 5000,
            max_retries: 0,
            retry_delay_ms: 10,
        },
        pipes: PipeConfig::default(),
        frameworks: FrameworksConfig {
            path: "frameworks/frameworks.json".into(),
        },
    }
}

async fn create_server(config: Config) -> McpServer {
    let catalog = Arc::new(FrameworkCatalog::load(&config.frameworks.path).unwrap());
    let storage = SqliteStorage::new(&config.database).await.unwrap();
    let langbase = LangbaseClient::new(
        &config.langbase,
        config.request.clone(),
        config.pipes.clone(),
    )
    .unwrap();
    McpServer::new(Arc::new(AppState::new(
        config,
        storage,
        Arc::new(langbase),
        catalog,
    )))
}

async fn mount_pipe(server: &MockServer, pipe: &str, completion: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/pipes/run"))
        .and(body_partial_json(json!({ "name": pipe })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "completion": completion
        })))
        .mount(server)
        .await;
}

fn tool_call(id: u64, tool: &str, arguments: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": tool, "arguments": arguments}
    })
    .to_string()
}

/// Send requests one per line and return the tool result bodies.
async fn exchange(server: &McpServer, requests: &[String]) -> Vec<Value> {
    let input = requests.join("\n") + "\n";
    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).await.unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| {
            let response: Value = serde_json::from_str(line).unwrap();
            let result = &response["result"];
            let text = result["content"][0]["text"].as_str().unwrap_or_default();
            if result["isError"] == json!(true) {
                json!({ "error": text })
            } else {
                serde_json::from_str(text).unwrap()
            }
        })
        .collect()
}

#[cfg(test)]
mod flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_session_through_summary_and_rehydration() {
        let mock_server = MockServer::start().await;
        mount_pipe(&mock_server, "hardener-clarify-v1", CLARIFY_REPLY).await;
        mount_pipe(&mock_server, "hardener-summary-v1", "The idea is X via Y.").await;
        let dir = tempdir().unwrap();

        let server = create_server(create_test_config(&mock_server.uri(), &dir)).await;
        let results = exchange(
            &server,
            &[
                tool_call(
                    1,
                    "hardener_action",
                    json!({
                        "session_id": "flow",
                        "action": "submit_idea",
                        "form": {"problem": "X", "approach": "Y", "abstraction": "8"}
                    }),
                ),
                tool_call(
                    2,
                    "hardener_action",
                    json!({
                        "session_id": "flow",
                        "action": "update_summary",
                        "form": {
                            "understanding_correction": "-",
                            "answer_1": "a", "answer_2": "b", "answer_3": "-",
                            "answer_4": "d", "answer_5": "e"
                        }
                    }),
                ),
            ],
        )
        .await;

        assert_eq!(results[0]["step"], 1);
        assert_eq!(results[1]["step"], 2);
        assert_eq!(results[1]["step_name"], "summary_ready");
        drop(server);

        // A fresh server over the same database sees the same session.
        let server = create_server(create_test_config(&mock_server.uri(), &dir)).await;
        let results = exchange(
            &server,
            &[tool_call(3, "hardener_state", json!({"session_id": "flow"}))],
        )
        .await;

        let view = &results[0];
        assert_eq!(view["step"], 2);
        assert_eq!(view["entries"]["context_summary"], "The idea is X via Y.");
        assert_eq!(view["entries"]["abstraction_level"], 8);
        assert_eq!(view["clarification_fields"][1]["label"], "Who?");
    }

    #[tokio::test]
    async fn test_validation_message_does_not_call_langbase() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&mock_server)
            .await;
        let dir = tempdir().unwrap();

        let server = create_server(create_test_config(&mock_server.uri(), &dir)).await;
        let results = exchange(
            &server,
            &[tool_call(
                1,
                "hardener_action",
                json!({"action": "submit_idea", "form": {"problem": "X"}}),
            )],
        )
        .await;

        assert_eq!(results[0]["step"], 0);
        assert_eq!(
            results[0]["message"],
            "Please fill in both the problem and the approach."
        );
    }

    #[tokio::test]
    async fn test_backend_failure_is_tool_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/pipes/run"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;
        let dir = tempdir().unwrap();

        let server = create_server(create_test_config(&mock_server.uri(), &dir)).await;
        let results = exchange(
            &server,
            &[
                tool_call(
                    1,
                    "hardener_action",
                    json!({
                        "session_id": "down",
                        "action": "submit_idea",
                        "form": {"problem": "X", "approach": "Y"}
                    }),
                ),
                tool_call(2, "hardener_state", json!({"session_id": "down"})),
            ],
        )
        .await;

        let error = results[0]["error"].as_str().unwrap();
        assert!(error.contains("Langbase unavailable"), "{}", error);
        assert!(results[1]["error"]
            .as_str()
            .unwrap()
            .contains("Session not found"));
    }

    #[tokio::test]
    async fn test_frameworks_tool_reads_catalog_file() {
        let mock_server = MockServer::start().await;
        let dir = tempdir().unwrap();

        let server = create_server(create_test_config(&mock_server.uri(), &dir)).await;
        let results = exchange(&server, &[tool_call(1, "hardener_frameworks", json!({}))]).await;

        let frameworks = results[0]["frameworks"].as_array().unwrap();
        assert_eq!(frameworks.len(), 8);
        assert_eq!(frameworks[0]["name"], "Pre-Mortem");
        assert!(frameworks.iter().all(|fw| fw["tooltip"].is_string()));
    }
}
