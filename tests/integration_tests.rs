//! Integration tests for the aishim server
//!
//! These tests drive the full router, including the CORS and panic layers, against the REST
//! backend with a recording HTTP client standing in for the network.

use aishim::backend::WorkersAiBackend;
use aishim::test_utils::{MockBackend, MockHttpClient};
use aishim::{AppState, build_router};
use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for oneshot()

fn workers_ai_app(client: MockHttpClient) -> axum::Router {
    let backend = WorkersAiBackend::builder()
        .http_client(client)
        .base_url("https://api.example.com/client/v4/".parse().unwrap())
        .account_id("acct-42")
        .api_token("test-token")
        .build();
    build_router(AppState::new(backend))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: Method, uri: &str, body: Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_chat_completion_through_rest_backend() {
    let client = MockHttpClient::new(
        StatusCode::OK,
        r#"{"success": true, "result": {"response": "Hello from Workers AI"}, "errors": [], "messages": []}"#,
    );
    let app = workers_ai_app(client.clone());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/v1/chat/completions",
            json!({
                "model": "@cf/mistral/mistral-7b-instruct-v0.1",
                "messages": [
                    {"role": "system", "content": "You are terse."},
                    {"role": "user", "content": "Hello"}
                ],
                "max_tokens": 32
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );

    let body = body_json(response).await;
    assert_eq!(body["model"], "@cf/mistral/mistral-7b-instruct-v0.1");
    assert_eq!(
        body["choices"][0]["message"]["content"],
        "Hello from Workers AI"
    );
    assert_eq!(body["choices"][0]["finish_reason"], "stop");

    let requests = client.get_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].uri,
        "https://api.example.com/client/v4/accounts/acct-42/ai/run/@cf/mistral/mistral-7b-instruct-v0.1"
    );

    let forwarded: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(forwarded["messages"][1]["content"], "Hello");
    assert_eq!(forwarded["stream"], false);
    assert_eq!(forwarded["max_tokens"], 32);
    assert!(forwarded.get("model").is_none());
}

#[tokio::test]
async fn test_embeddings_through_rest_backend() {
    let client = MockHttpClient::new(
        StatusCode::OK,
        r#"{"success": true, "result": {"shape": [1, 3], "data": [[0.5, 0.25, 0.125]]}}"#,
    );
    let app = workers_ai_app(client.clone());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/v1/embeddings",
            json!({"input": ["first", "second"]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["model"], "@cf/baai/bge-large-en-v1.5");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][1]["index"], 1);
    assert_eq!(body["data"][1]["embedding"], json!([0.5, 0.25, 0.125]));

    let requests = client.get_requests();
    assert_eq!(requests.len(), 2);
    let texts: Vec<Value> = requests
        .iter()
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap()["text"].clone())
        .collect();
    assert_eq!(texts, vec![json!("first"), json!("second")]);
}

#[tokio::test]
async fn test_backend_api_error_becomes_500_envelope() {
    let client = MockHttpClient::new(
        StatusCode::UNAUTHORIZED,
        r#"{"success": false, "result": null, "errors": [{"code": 10000, "message": "Authentication error"}]}"#,
    );
    let app = workers_ai_app(client);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/v1/chat/completions",
            json!({"messages": [{"role": "user", "content": "Hi"}]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-methods")
    );
    let body = body_json(response).await;
    assert_eq!(body["error"], "Inference failed");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("Authentication error")
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let backend = MockBackend::returning(json!({"response": "unused"}));
    let app = build_router(AppState::new(backend.clone()));

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/v1/chat/completions")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"messages\": ["))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_preflight_returns_empty_body_with_cors_headers() {
    let app = build_router(AppState::new(MockBackend::returning(json!("unused"))));

    let request = axum::http::Request::builder()
        .method(Method::OPTIONS)
        .uri("/nowhere/at/all")
        .header("access-control-request-method", "POST")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    assert_eq!(
        headers.get("access-control-allow-methods").unwrap(),
        "GET, POST, PUT, DELETE, OPTIONS"
    );
    assert_eq!(
        headers.get("access-control-allow-headers").unwrap(),
        "Content-Type, Authorization"
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_put_on_embeddings_is_method_not_allowed() {
    let backend = MockBackend::returning(json!({"data": [[1.0]]}));
    let app = build_router(AppState::new(backend.clone()));

    let response = app
        .oneshot(json_request(
            Method::PUT,
            "/v1/embeddings",
            json!({"input": "hello"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Method not allowed");
    assert!(backend.calls().is_empty());
}
