//! The inference capability the shim delegates to.
//!
//! Handlers only ever see [`InferenceBackend::run`]: a model id plus a JSON parameter object in,
//! a JSON value out. What comes back is not uniform. Text generation models answer with
//! `{"response": ...}`, embedding models with `{"shape": ..., "data": ...}`, and some answer with
//! a bare value. [`InferenceOutput`] absorbs that difference right after the call.
use crate::client::HttpClient;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, header};
use bon::Builder;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, instrument};
use url::Url;

#[async_trait]
pub trait InferenceBackend: std::fmt::Debug + Send + Sync {
    /// Run `model` against `params`, returning the backend's result unmodified.
    async fn run(&self, model: &str, params: Value) -> Result<Value, BackendError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to reach inference backend: {0}")]
    Transport(String),

    #[error("inference backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid response from inference backend: {0}")]
    InvalidResponse(String),
}

/// A backend result, either an object carrying named fields or a bare value.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutput {
    Wrapped(Map<String, Value>),
    Bare(Value),
}

impl From<Value> for InferenceOutput {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Wrapped(map),
            other => Self::Bare(other),
        }
    }
}

impl InferenceOutput {
    /// The named field when the result is wrapped and carries it, otherwise the whole result.
    fn select(self, field: &str) -> Value {
        match self {
            Self::Wrapped(mut map) => {
                if map.get(field).is_some_and(|v| !v.is_null()) {
                    map.remove(field).unwrap_or_default()
                } else {
                    Value::Object(map)
                }
            }
            Self::Bare(value) => value,
        }
    }

    /// Assistant reply text. Non-string replies are rendered as compact JSON.
    pub fn into_reply_text(self) -> String {
        match self.select("response") {
            Value::String(text) => text,
            other => other.to_string(),
        }
    }

    /// A single embedding vector.
    ///
    /// Embedding models answer per batch (`data: [[...]]`); the shim sends one text per call so
    /// the first row is the vector. A flat numeric array is taken as-is.
    pub fn into_embedding(self) -> Result<Vec<f32>, BackendError> {
        let row = match self.select("data") {
            Value::Array(mut rows) if rows.first().is_some_and(Value::is_array) => {
                rows.swap_remove(0)
            }
            other => other,
        };

        serde_json::from_value(row).map_err(|e| {
            BackendError::InvalidResponse(format!("expected an embedding vector: {e}"))
        })
    }
}

/// Envelope wrapped around every JSON answer of the REST API.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// Workers AI over its REST API: `POST {base_url}/accounts/{account_id}/ai/run/{model}`.
#[derive(Clone, Builder)]
pub struct WorkersAiBackend<T: HttpClient> {
    http_client: T,
    base_url: Url,
    #[builder(into)]
    account_id: String,
    #[builder(into)]
    api_token: String,
}

impl<T: HttpClient> std::fmt::Debug for WorkersAiBackend<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkersAiBackend")
            .field("http_client", &self.http_client)
            .field("base_url", &self.base_url.as_str())
            .field("account_id", &self.account_id)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

impl<T: HttpClient> WorkersAiBackend<T> {
    fn run_url(&self, model: &str) -> Result<Url, BackendError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&format!("accounts/{}/ai/run/{}", self.account_id, model))
            .map_err(|e| BackendError::Transport(format!("invalid backend url: {e}")))
    }
}

#[async_trait]
impl<T: HttpClient + Send + Sync> InferenceBackend for WorkersAiBackend<T> {
    #[instrument(skip(self, params))]
    async fn run(&self, model: &str, params: Value) -> Result<Value, BackendError> {
        let url = self.run_url(model)?;
        let body = serde_json::to_vec(&params)
            .map_err(|e| BackendError::Transport(format!("failed to encode parameters: {e}")))?;

        let req = axum::http::Request::builder()
            .method(Method::POST)
            .uri(url.as_str())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        debug!("Running inference at {}", url);
        let response = self.http_client.request(req).await.map_err(|e| {
            error!("Error calling inference backend at {}: {}", url, e);
            BackendError::Transport(e.to_string())
        })?;

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("failed to read body: {e}")))?;

        match serde_json::from_slice::<ApiEnvelope>(&bytes) {
            Ok(envelope) if status.is_success() && envelope.success != Some(false) => {
                Ok(envelope.result)
            }
            Ok(envelope) => {
                let message = envelope
                    .errors
                    .into_iter()
                    .next()
                    .map(|e| e.message)
                    .unwrap_or_else(|| {
                        status
                            .canonical_reason()
                            .unwrap_or("request failed")
                            .to_string()
                    });
                Err(BackendError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
            // Streamed results come back as an event stream rather than a JSON envelope.
            Err(_) if status.is_success() => String::from_utf8(bytes.to_vec())
                .map(Value::String)
                .map_err(|e| BackendError::InvalidResponse(e.to_string())),
            Err(_) => Err(BackendError::Api {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            }),
        }
    }
}
