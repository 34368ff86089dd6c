// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tests for the control API client against a mock control API.

use relay_runtime::{
    Acknowledgement, ErrorReport, HandlerError, REQUEST_ID_HEADER, RuntimeApi, RuntimeApiClient,
    RuntimeError,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NEXT_PATH: &str = "/2018-06-01/runtime/invocation/next";

async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

// ============================================================================
// fetch next invocation
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_next_event_extracts_id_payload_and_context() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(NEXT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("lambda-runtime-aws-request-id", "abc-123")
                .insert_header("Lambda-Runtime-Deadline-Ms", "1700000000000")
                .insert_header("Lambda-Runtime-Trace-Id", "Root=1-5e1b4151-43a0913a12345678")
                .set_body_json(json!({"name": "world"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let event = blocking(move || RuntimeApiClient::new(&uri).next_event())
        .await
        .unwrap();

    assert_eq!(event.request_id, "abc-123");
    assert_eq!(event.payload, json!({"name": "world"}));
    assert_eq!(event.context.deadline_ms, Some(1_700_000_000_000));
    assert_eq!(
        event.context.trace_id.as_deref(),
        Some("Root=1-5e1b4151-43a0913a12345678")
    );
    assert_eq!(event.context.invoked_function_arn, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bare_host_port_address() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(NEXT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(REQUEST_ID_HEADER, "id-1")
                .set_body_json(json!([1, 2, 3])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let address = server.address().to_string();
    let event = blocking(move || RuntimeApiClient::new(&address).next_event())
        .await
        .unwrap();

    assert_eq!(event.payload, json!([1, 2, 3]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_next_event_follows_redirects() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(NEXT_PATH))
        .respond_with(
            ResponseTemplate::new(307)
                .insert_header("Location", format!("{}/moved/next", server.uri()).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/moved/next"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(REQUEST_ID_HEADER, "redirected")
                .set_body_json(json!({"ok": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let event = blocking(move || RuntimeApiClient::new(&uri).next_event())
        .await
        .unwrap();

    assert_eq!(event.request_id, "redirected");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_id_header_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(NEXT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "world"})))
        .mount(&server)
        .await;

    let uri = server.uri();
    let err = blocking(move || RuntimeApiClient::new(&uri).next_event())
        .await
        .unwrap_err();

    assert!(matches!(err, RuntimeError::Protocol(_)));
    assert!(err.to_string().contains("invocation id"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_blank_id_header_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(NEXT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(REQUEST_ID_HEADER, " ")
                .set_body_json(json!({})),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let err = blocking(move || RuntimeApiClient::new(&uri).next_event())
        .await
        .unwrap_err();

    assert!(matches!(err, RuntimeError::Protocol(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_body_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(NEXT_PATH))
        .respond_with(ResponseTemplate::new(200).insert_header(REQUEST_ID_HEADER, "abc-123"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let err = blocking(move || RuntimeApiClient::new(&uri).next_event())
        .await
        .unwrap_err();

    assert!(matches!(err, RuntimeError::Protocol(_)));
    assert!(err.to_string().contains("empty runtime API response"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_json_body_keeps_the_invocation() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(NEXT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(REQUEST_ID_HEADER, "abc-123")
                .set_body_string("{not json"),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let event = blocking(move || RuntimeApiClient::new(&uri).next_event())
        .await
        .unwrap();

    assert_eq!(event.request_id, "abc-123");
    assert_eq!(event.payload, Value::Null);
    assert!(
        event
            .payload_error
            .unwrap()
            .contains("invocation payload is not valid JSON")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(NEXT_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let uri = server.uri();
    let err = blocking(move || RuntimeApiClient::new(&uri).next_event())
        .await
        .unwrap_err();

    assert!(matches!(err, RuntimeError::Protocol(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_api_is_protocol_error() {
    // Bind and drop to get a port nobody listens on
    let address = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let err = blocking(move || RuntimeApiClient::new(&address).next_event())
        .await
        .unwrap_err();

    assert!(matches!(err, RuntimeError::Protocol(_)));
}

// ============================================================================
// acknowledgements
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_invocation_success_posts_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(NEXT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(REQUEST_ID_HEADER, "abc-123")
                .set_body_json(json!({"name": "world"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/2018-06-01/runtime/invocation/abc-123/response"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"greeting": "hello world"})))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let ack = blocking(move || {
        let client = RuntimeApiClient::new(&uri);
        let invocation = client.next_invocation()?;
        let name = invocation.payload()["name"].as_str().unwrap_or_default().to_string();
        invocation.succeed(&json!({"greeting": format!("hello {name}")}))
    })
    .await
    .unwrap();

    assert_eq!(ack, Acknowledgement::Succeeded);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invocation_failure_posts_error_report() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(NEXT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(REQUEST_ID_HEADER, "abc-123")
                .set_body_json(json!({})),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/2018-06-01/runtime/invocation/abc-123/error"))
        .and(header("Lambda-Runtime-Function-Error-Type", "HandlerError"))
        .and(body_json(json!({"errorMessage": "boom", "errorType": "HandlerError"})))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let ack = blocking(move || {
        let client = RuntimeApiClient::new(&uri);
        client.next_invocation()?.fail(&HandlerError::msg("boom"))
    })
    .await
    .unwrap();

    assert_eq!(ack, Acknowledgement::Failed);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invocation_id_is_encoded_in_the_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2018-06-01/runtime/invocation/a%2Fb/response"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/2018-06-01/runtime/invocation/a%2Fb%3Fc/error"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    blocking(move || {
        let client = RuntimeApiClient::new(&uri);
        client.post_response("a/b", b"{}".to_vec())?;
        client.post_error("a/b?c", &ErrorReport::new("HandlerError", "boom"))
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nested_result_is_posted_without_loss() {
    let server = MockServer::start().await;

    let result = json!({
        "items": [1, 2.5, "three", null, true, {"deep": [[], {}]}],
        "meta": {"count": 6, "tags": ["a", "b"], "empty": ""}
    });

    Mock::given(method("POST"))
        .and(path("/2018-06-01/runtime/invocation/id-9/response"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let body = serde_json::to_vec(&result).unwrap();
    blocking(move || RuntimeApiClient::new(&uri).post_response("id-9", body))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let posted: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(posted, result);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_acknowledgement_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2018-06-01/runtime/invocation/abc-123/response"))
        .respond_with(ResponseTemplate::new(413))
        .mount(&server)
        .await;

    let uri = server.uri();
    let err = blocking(move || {
        RuntimeApiClient::new(&uri).post_response("abc-123", b"\"too big\"".to_vec())
    })
    .await
    .unwrap_err();

    assert!(matches!(err, RuntimeError::Protocol(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_init_error_report() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2018-06-01/runtime/init/error"))
        .and(header("Lambda-Runtime-Function-Error-Type", "InitializationError"))
        .and(body_json(json!({
            "errorMessage": "handler `index` doesn't exist",
            "errorType": "InitializationError"
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    blocking(move || {
        RuntimeApiClient::new(&uri).post_init_error(&ErrorReport::new(
            "InitializationError",
            "handler `index` doesn't exist",
        ))
    })
    .await
    .unwrap();
}
