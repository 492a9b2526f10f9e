//! Completion client integration tests.
//!
//! Drives `OpenAiClient` against a local mock server:
//! - Request shape (model, message, token bound, temperature, headers)
//! - Reply parsing and normalization
//! - API errors with and without a readable body
//! - Malformed success bodies
//! - Missing credential and transport failures
//!
//! The client is blocking, so it is built, used and dropped inside
//! `spawn_blocking` while the mock server runs on the test runtime.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use autotag::Error;
use autotag::llm::{LlmHttpConfig, OpenAiClient, SuggestionProvider};
use chrono::NaiveDate;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const KEY: &str = "sk-test-key";

fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// Runs `fetch_tags` against `server` on a blocking thread.
async fn fetch(
    server: &MockServer,
    key: &'static str,
    content: &'static str,
) -> autotag::Result<autotag::TagSet> {
    let endpoint = format!("{}/v1", server.uri());
    tokio::task::spawn_blocking(move || {
        OpenAiClient::new()
            .with_api_key(key)
            .with_endpoint(endpoint)
            .fetch_tags(content, reference_date())
    })
    .await
    .unwrap()
}

mod requests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_request_shape_and_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", format!("Bearer {KEY}").as_str()))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 150,
                "temperature": 0.2
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("AI, Tech, AI")))
            .expect(1)
            .mount(&server)
            .await;

        let tags = fetch(&server, KEY, "Notes on neural networks").await.unwrap();

        assert_eq!(tags.as_slice(), ["AI", "TECH"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_single_user_message_carries_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("\"RUST, 2025\"")))
            .expect(1)
            .mount(&server)
            .await;

        let tags = fetch(&server, KEY, "say \"hello\" to ownership").await.unwrap();
        assert_eq!(tags.as_slice(), ["RUST", "2025"]);

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");

        let prompt = messages[0]["content"].as_str().unwrap();
        assert!(prompt.contains(r#"say \"hello\" to ownership"#));
        assert!(prompt.contains("2025-06-10"));
        assert!(prompt.contains("JUIN 2025"));
        assert!(prompt.contains("T2 2025"));
        assert!(prompt.contains("Q2 2025"));
        assert!(prompt.contains("S1 2025"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_custom_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": "gpt-4o-mini" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("A")))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = format!("{}/v1/", server.uri());
        let result = tokio::task::spawn_blocking(move || {
            OpenAiClient::new()
                .with_api_key(KEY)
                .with_endpoint(endpoint)
                .with_model("gpt-4o-mini")
                .complete("prompt")
        })
        .await
        .unwrap();

        assert_eq!(result.unwrap(), "A");
    }
}

mod failures {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_api_error_message_from_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {
                    "message": "Incorrect API key provided",
                    "type": "invalid_request_error"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetch(&server, "sk-wrong", "text").await;

        match result {
            Err(Error::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            },
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_api_error_falls_back_to_status_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetch(&server, KEY, "text").await;

        assert!(matches!(
            result,
            Err(Error::Api { status: 500, ref message }) if message == "Internal Server Error"
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_no_retry_on_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "Rate limit reached" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetch(&server, KEY, "text").await;

        assert!(matches!(result, Err(Error::Api { status: 429, .. })));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_malformed_success_bodies() {
        for body in [
            json!({ "choices": [] }),
            json!({ "choices": [{ "message": { "role": "assistant" } }] }),
            json!({ "result": "AI, TECH" }),
        ] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
                .expect(1)
                .mount(&server)
                .await;

            let result = fetch(&server, KEY, "text").await;

            assert!(
                matches!(result, Err(Error::MalformedResponse(_))),
                "expected malformed for {body}"
            );
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_non_json_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("AI, TECH"))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetch(&server, KEY, "text").await;

        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_credential_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("A")))
            .expect(0)
            .mount(&server)
            .await;

        let result = fetch(&server, "", "text").await;

        assert!(matches!(result, Err(Error::MissingCredential)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("A"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let endpoint = format!("{}/v1", server.uri());
        let result = tokio::task::spawn_blocking(move || {
            OpenAiClient::new()
                .with_api_key(KEY)
                .with_endpoint(endpoint)
                .with_http_config(LlmHttpConfig {
                    timeout_ms: 100,
                    connect_timeout_ms: 100,
                })
                .complete("prompt")
        })
        .await
        .unwrap();

        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[test]
    fn test_connection_refused_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = OpenAiClient::new()
            .with_api_key(KEY)
            .with_endpoint(format!("http://127.0.0.1:{port}/v1"));

        assert!(matches!(
            client.fetch_tags("text", reference_date()),
            Err(Error::Transport(_))
        ));
    }
}
