/// Axum handlers for the shim
use crate::AppState;
use crate::backend::{InferenceBackend, InferenceOutput};
use crate::errors::ShimError;
use crate::models::ListModelResponse;
use crate::schemas::chat::{ChatCompletionRequest, ChatCompletionResponse};
use crate::schemas::embeddings::{EmbeddingData, EmbeddingsRequest, EmbeddingsResponse};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{Method, Uri},
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, instrument};

const DOCUMENTATION_URL: &str = "https://platform.openai.com/docs/api-reference";

/// Served at `/`.
#[derive(Debug, Serialize)]
pub struct InfoDocument {
    pub name: &'static str,
    pub version: &'static str,
    pub message: &'static str,
    pub endpoints: Endpoints,
    pub documentation: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub models: &'static str,
    pub chat: &'static str,
    pub embeddings: &'static str,
}

#[instrument]
pub async fn root() -> Json<InfoDocument> {
    Json(InfoDocument {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        message: "OpenAI-compatible API backed by Workers AI",
        endpoints: Endpoints {
            models: "/v1/models",
            chat: "/v1/chat/completions",
            embeddings: "/v1/embeddings",
        },
        documentation: DOCUMENTATION_URL,
    })
}

#[instrument]
pub async fn models() -> Json<ListModelResponse> {
    Json(ListModelResponse::catalog())
}

/// POST /v1/chat/completions
#[instrument(skip(state, body))]
pub async fn chat_completions<B: InferenceBackend + Clone + 'static>(
    State(state): State<AppState<B>>,
    body: Bytes,
) -> Result<Json<ChatCompletionResponse>, ShimError> {
    let request = ChatCompletionRequest::from_slice(&body).inspect_err(|e| {
        debug!("Rejected chat completion request: {}", e);
    })?;

    info!(
        model = %request.model,
        messages_count = request.messages.len(),
        stream = request.stream,
        "Chat completion request"
    );

    let (model, params) = request.into_backend_call();
    let result = state.backend.run(&model, params).await.map_err(|e| {
        error!(model = %model, error = %e, "Chat inference failed");
        ShimError::from(e)
    })?;

    let content = InferenceOutput::from(result).into_reply_text();
    Ok(Json(ChatCompletionResponse::new(model, content)))
}

/// POST /v1/embeddings
///
/// Texts are embedded one backend call at a time, in input order. The first failure aborts the
/// whole batch.
#[instrument(skip(state, body))]
pub async fn embeddings<B: InferenceBackend + Clone + 'static>(
    State(state): State<AppState<B>>,
    body: Bytes,
) -> Result<Json<EmbeddingsResponse>, ShimError> {
    let EmbeddingsRequest { input, model } = EmbeddingsRequest::from_slice(&body)
        .inspect_err(|e| {
            debug!("Rejected embeddings request: {}", e);
        })?;

    let texts = input.into_texts();
    info!(model = %model, inputs = texts.len(), "Embeddings request");

    let mut data = Vec::with_capacity(texts.len());
    for (index, text) in texts.into_iter().enumerate() {
        let result = state
            .backend
            .run(&model, json!({ "text": text }))
            .await
            .map_err(|e| {
                error!(model = %model, index, error = %e, "Embedding inference failed");
                ShimError::from(e)
            })?;

        let embedding = InferenceOutput::from(result).into_embedding().map_err(|e| {
            error!(model = %model, index, error = %e, "Unusable embedding result");
            ShimError::from(e)
        })?;
        data.push(EmbeddingData::new(embedding, index));
    }

    Ok(Json(EmbeddingsResponse::new(model, data)))
}

pub async fn method_not_allowed(method: Method, uri: Uri) -> ShimError {
    debug!("Method {} not allowed on {}", method, uri.path());
    ShimError::MethodNotAllowed
}

pub async fn not_found(uri: Uri) -> ShimError {
    debug!("No route for {}", uri.path());
    ShimError::NotFound
}
