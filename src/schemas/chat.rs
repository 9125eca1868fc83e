//! Chat Completions schemas
//!
//! Requests follow the OpenAI Chat Completions shape. Only `messages`, `model` and `stream` are
//! interpreted; every other field is carried to the backend untouched.
//! See: https://platform.openai.com/docs/api-reference/chat

use crate::errors::ShimError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_CHAT_MODEL: &str = "@cf/meta/llama-3.3-70b-instruct-fp8-fast";

/// The body as it arrives, before validation.
#[derive(Debug, Deserialize)]
struct RawChatCompletionRequest {
    messages: Option<Value>,
    model: Option<String>,
    stream: Option<bool>,
    #[serde(flatten)]
    passthrough: Map<String, Value>,
}

/// A validated request body for POST /v1/chat/completions
///
/// Messages are kept as the caller sent them. Roles and content shapes are for the backend to
/// judge.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletionRequest {
    pub messages: Vec<Value>,
    pub model: String,
    pub stream: bool,
    /// Fields the shim does not interpret, forwarded as-is.
    pub passthrough: Map<String, Value>,
}

impl ChatCompletionRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self, ShimError> {
        // An unparseable body is reported as the caller's fault (400) rather than falling
        // through to the generic 500 boundary.
        let raw: RawChatCompletionRequest = serde_json::from_slice(body)
            .map_err(|e| ShimError::BadRequest(format!("Invalid JSON body: {e}")))?;

        let messages = match raw.messages {
            Some(Value::Array(items)) if !items.is_empty() => items,
            Some(Value::Array(_)) => {
                return Err(ShimError::BadRequest(
                    "messages must not be empty".to_string(),
                ));
            }
            _ => {
                return Err(ShimError::BadRequest(
                    "messages is required and must be an array".to_string(),
                ));
            }
        };

        Ok(Self {
            messages,
            model: raw.model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            stream: raw.stream.unwrap_or(false),
            passthrough: raw.passthrough,
        })
    }

    /// Splits the request into the model id and the backend parameter object
    /// `{messages, stream, ...passthrough}`.
    pub fn into_backend_call(self) -> (String, Value) {
        let mut params = self.passthrough;
        params.insert("messages".to_string(), Value::Array(self.messages));
        params.insert("stream".to_string(), Value::Bool(self.stream));

        (self.model, Value::Object(params))
    }
}

/// Response from POST /v1/chat/completions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

/// Token accounting. Never computed, always zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl ChatCompletionResponse {
    /// A single-choice completion for `model`. The id comes from the current time, so two
    /// responses built in the same millisecond share it.
    pub fn new(model: String, content: String) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        Self {
            id: format!("chatcmpl-{}", now.as_millis()),
            object: "chat.completion".to_string(),
            created: now.as_secs(),
            model,
            choices: vec![Choice {
                index: 0,
                message: AssistantMessage {
                    role: "assistant".to_string(),
                    content,
                },
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::default(),
        }
    }
}
