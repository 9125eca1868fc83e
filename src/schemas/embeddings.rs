//! Embeddings API schemas
//!
//! These schemas match the OpenAI Embeddings API.
//! See: https://platform.openai.com/docs/api-reference/embeddings

use crate::errors::ShimError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EMBEDDING_MODEL: &str = "@cf/baai/bge-large-en-v1.5";

/// Input text to embed - a string or an array of strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingInput {
    Single(String),
    Multiple(Vec<String>),
}

impl EmbeddingInput {
    /// The texts in input order; a single string becomes a one-element batch.
    pub fn into_texts(self) -> Vec<String> {
        match self {
            Self::Single(text) => vec![text],
            Self::Multiple(texts) => texts,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Single(text) => text.is_empty(),
            Self::Multiple(texts) => texts.is_empty(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEmbeddingsRequest {
    #[serde(default)]
    input: Option<EmbeddingInput>,
    #[serde(default)]
    model: Option<String>,
}

/// A validated request body for POST /v1/embeddings
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingsRequest {
    pub input: EmbeddingInput,
    pub model: String,
}

impl EmbeddingsRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self, ShimError> {
        // An unparseable body is reported as the caller's fault (400) rather than falling
        // through to the generic 500 boundary.
        let raw: RawEmbeddingsRequest = serde_json::from_slice(body)
            .map_err(|e| ShimError::BadRequest(format!("Invalid JSON body: {e}")))?;

        let input = match raw.input {
            Some(input) if !input.is_empty() => input,
            _ => {
                return Err(ShimError::BadRequest(
                    "input is required and must not be empty".to_string(),
                ));
            }
        };

        Ok(Self {
            input,
            model: raw
                .model
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
        })
    }
}

/// Response from POST /v1/embeddings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingsResponse {
    pub object: String,
    pub data: Vec<EmbeddingData>,
    pub model: String,
    pub usage: EmbeddingsUsage,
}

/// A single embedding result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingData {
    pub object: String,
    pub embedding: Vec<f32>,
    pub index: usize,
}

impl EmbeddingData {
    pub fn new(embedding: Vec<f32>, index: usize) -> Self {
        Self {
            object: "embedding".to_string(),
            embedding,
            index,
        }
    }
}

/// Usage information for embeddings. Always zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingsUsage {
    pub prompt_tokens: u32,
    pub total_tokens: u32,
}

impl EmbeddingsResponse {
    pub fn new(model: String, data: Vec<EmbeddingData>) -> Self {
        Self {
            object: "list".to_string(),
            data,
            model,
            usage: EmbeddingsUsage::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_simple_request() {
        let json = r#"{
            "model": "@cf/baai/bge-small-en-v1.5",
            "input": "Hello, world!"
        }"#;

        let request = EmbeddingsRequest::from_slice(json.as_bytes()).unwrap();
        assert_eq!(request.model, "@cf/baai/bge-small-en-v1.5");
        assert_eq!(request.input.into_texts(), vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn test_deserialize_multiple_inputs_with_default_model() {
        let json = r#"{"input": ["Hello", "World"], "encoding_format": "float"}"#;

        let request = EmbeddingsRequest::from_slice(json.as_bytes()).unwrap();
        assert_eq!(request.model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(
            request.input.into_texts(),
            vec!["Hello".to_string(), "World".to_string()]
        );
    }

    #[test]
    fn test_missing_or_empty_input_rejected() {
        for body in [
            r#"{"model": "m"}"#,
            r#"{"input": null}"#,
            r#"{"input": ""}"#,
            r#"{"input": []}"#,
        ] {
            assert!(
                matches!(
                    EmbeddingsRequest::from_slice(body.as_bytes()),
                    Err(ShimError::BadRequest(_))
                ),
                "expected rejection for {body}"
            );
        }
    }

    #[test]
    fn test_non_text_input_rejected() {
        let result = EmbeddingsRequest::from_slice(br#"{"input": [[1, 2, 3]]}"#);
        assert!(matches!(result, Err(ShimError::BadRequest(_))));
    }

    #[test]
    fn test_serialize_response() {
        let response = EmbeddingsResponse::new(
            DEFAULT_EMBEDDING_MODEL.to_string(),
            vec![EmbeddingData::new(vec![0.5, 0.25], 0)],
        );

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["object"], "list");
        assert_eq!(value["data"][0]["object"], "embedding");
        assert_eq!(value["data"][0]["index"], 0);
        assert_eq!(value["usage"]["prompt_tokens"], 0);
        assert_eq!(value["usage"]["total_tokens"], 0);
    }
}
