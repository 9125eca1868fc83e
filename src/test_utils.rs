//! Test doubles for the outbound HTTP client and the inference backend.
use crate::backend::{BackendError, InferenceBackend};
use crate::client::HttpClient;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub struct MockHttpClient {
    pub requests: Arc<Mutex<Vec<MockRequest>>>,
    response_builder: Arc<dyn Fn() -> axum::response::Response + Send + Sync>,
}

#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MockHttpClient {
    pub fn new(status: StatusCode, body: &str) -> Self {
        let body = body.to_string();
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            response_builder: Arc::new(move || {
                axum::response::Response::builder()
                    .status(status)
                    .body(axum::body::Body::from(body.clone()))
                    .unwrap()
            }),
        }
    }

    pub fn get_requests(&self) -> Vec<MockRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl std::fmt::Debug for MockHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttpClient")
            .field("requests", &self.requests)
            .field("response_builder", &"<closure>")
            .finish()
    }
}

impl Clone for MockHttpClient {
    fn clone(&self) -> Self {
        Self {
            requests: Arc::clone(&self.requests),
            response_builder: Arc::clone(&self.response_builder),
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn request(
        &self,
        req: axum::extract::Request,
    ) -> Result<axum::response::Response, Box<dyn std::error::Error + Send + Sync>> {
        let method = req.method().to_string();
        let uri = req.uri().to_string();
        let headers = req
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body = axum::body::to_bytes(req.into_body(), usize::MAX)
            .await
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?
            .to_vec();

        self.requests.lock().unwrap().push(MockRequest {
            method,
            uri,
            headers,
            body,
        });

        Ok((self.response_builder)())
    }
}

/// A single recorded call to [`MockBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub model: String,
    pub params: Value,
}

type Responder = dyn Fn(&str, &Value) -> Result<Value, BackendError> + Send + Sync;

/// An in-memory inference backend that records every call.
pub struct MockBackend {
    calls: Arc<Mutex<Vec<MockCall>>>,
    responder: Arc<Responder>,
}

impl MockBackend {
    /// Always answers with `value`.
    pub fn returning(value: Value) -> Self {
        Self::with_responder(move |_, _| Ok(value.clone()))
    }

    /// Always fails with a 500 from the backend carrying `message`.
    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::with_responder(move |_, _| {
            Err(BackendError::Api {
                status: 500,
                message: message.clone(),
            })
        })
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<Value, BackendError> + Send + Sync + 'static,
    {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("calls", &self.calls)
            .field("responder", &"<closure>")
            .finish()
    }
}

impl Clone for MockBackend {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
            responder: Arc::clone(&self.responder),
        }
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn run(&self, model: &str, params: Value) -> Result<Value, BackendError> {
        self.calls.lock().unwrap().push(MockCall {
            model: model.to_string(),
            params: params.clone(),
        });
        (self.responder)(model, &params)
    }
}
