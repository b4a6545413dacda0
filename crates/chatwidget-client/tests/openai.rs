//! HTTP behavior of the OpenAI-compatible completion client.

use chatwidget_client::{CancellationToken, CompletionClient, CompletionError, OpenAiCompletionClient};
use chatwidget_config::ClientConfig;
use chatwidget_protocol::{ChatTurn, Role};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper: client pointed at the mock server with a test key.
fn test_client(server: &MockServer) -> OpenAiCompletionClient {
    let config = ClientConfig {
        endpoint: format!("{}/v1/chat/completions", server.uri()),
        api_key: Some("sk-test".to_string()),
        ..ClientConfig::default()
    };
    OpenAiCompletionClient::from_config(&config).expect("client")
}

fn hello() -> Vec<ChatTurn> {
    vec![ChatTurn::new(Role::User, "hello")]
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ]
    })
}

/// Helper: mount a single response for the completions path.
async fn mount_status(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "error": {} })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn returns_trimmed_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo",
            "max_tokens": 500,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a helpful assistant. Provide concise and helpful responses."
                },
                { "role": "user", "content": "hello" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("  world \n")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = test_client(&server)
        .complete(&hello(), &CancellationToken::new())
        .await
        .expect("reply");
    assert_eq!(reply, "world");
}

#[tokio::test]
async fn unauthorized_maps_to_credential_failure() {
    let server = MockServer::start().await;
    mount_status(&server, 401).await;
    let err = test_client(&server)
        .complete(&hello(), &CancellationToken::new())
        .await
        .expect_err("401");
    assert!(matches!(err, CompletionError::Unauthorized));
    assert_eq!(
        err.user_message(),
        "Invalid API key. Please check your API key."
    );
}

#[tokio::test]
async fn rate_limit_maps_to_retry_later() {
    let server = MockServer::start().await;
    mount_status(&server, 429).await;
    let err = test_client(&server)
        .complete(&hello(), &CancellationToken::new())
        .await
        .expect_err("429");
    assert!(matches!(err, CompletionError::RateLimited));
}

#[tokio::test]
async fn server_errors_map_to_unavailable() {
    let server = MockServer::start().await;
    mount_status(&server, 503).await;
    let err = test_client(&server)
        .complete(&hello(), &CancellationToken::new())
        .await
        .expect_err("503");
    assert!(matches!(err, CompletionError::ServiceUnavailable));
}

#[tokio::test]
async fn other_statuses_carry_the_code() {
    let server = MockServer::start().await;
    mount_status(&server, 404).await;
    let err = test_client(&server)
        .complete(&hello(), &CancellationToken::new())
        .await
        .expect_err("404");
    assert_eq!(err.user_message(), "API request failed with status 404");
}

#[tokio::test]
async fn malformed_body_is_a_format_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    let err = test_client(&server)
        .complete(&hello(), &CancellationToken::new())
        .await
        .expect_err("format");
    assert!(matches!(err, CompletionError::InvalidResponse));
}

#[tokio::test]
async fn missing_choices_is_a_format_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;
    let err = test_client(&server)
        .complete(&hello(), &CancellationToken::new())
        .await
        .expect_err("format");
    assert_eq!(
        err.user_message(),
        "Invalid response format from completion API"
    );
}

#[tokio::test]
async fn cancelled_token_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("late")))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = test_client(&server)
        .complete(&hello(), &cancel)
        .await
        .expect_err("canceled");
    assert!(err.is_canceled());
}

#[tokio::test]
async fn cancellation_interrupts_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("too late"))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = client.complete(&hello(), &cancel).await.expect_err("canceled");
    assert!(err.is_canceled());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn timeout_surfaces_as_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("slow"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = ClientConfig {
        endpoint: format!("{}/v1/chat/completions", server.uri()),
        api_key: Some("sk-test".to_string()),
        timeout_secs: Some(1),
        ..ClientConfig::default()
    };
    let client = OpenAiCompletionClient::from_config(&config).expect("client");
    let err = client
        .complete(&hello(), &CancellationToken::new())
        .await
        .expect_err("timeout");
    assert!(matches!(err, CompletionError::Transport(_)));
    assert_eq!(err.user_message(), "An unexpected error occurred");
}

#[tokio::test]
async fn missing_api_key_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("hi")))
        .expect(0)
        .mount(&server)
        .await;

    let config = ClientConfig {
        endpoint: format!("{}/v1/chat/completions", server.uri()),
        api_key: None,
        api_key_env: "CHATWIDGET_TEST_MISSING_KEY".to_string(),
        ..ClientConfig::default()
    };
    let client = OpenAiCompletionClient::from_config(&config).expect("client");
    let err = client
        .complete(&hello(), &CancellationToken::new())
        .await
        .expect_err("missing key");
    assert!(matches!(err, CompletionError::MissingApiKey(_)));
}
