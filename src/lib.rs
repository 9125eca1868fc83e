//! aishim - an OpenAI-compatible translation shim
//!
//! This library accepts requests shaped like the OpenAI chat completions, embeddings and models
//! APIs, runs them against a managed inference backend and reshapes the results into the
//! envelopes OpenAI clients expect.

use axum::Router;
use axum::routing::{any, get, post};
use axum_prometheus::{
    GenericMetricLayer, Handle, PrometheusMetricLayerBuilder,
    metrics_exporter_prometheus::PrometheusHandle,
};
use std::any::Any;
use std::borrow::Cow;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, info, instrument};

pub mod backend;
pub mod client;
pub mod cors;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod schemas;
pub mod test_utils;

use backend::InferenceBackend;
use cors::CorsLayer;
use errors::ShimError;

/// The main application state: the backend every handler delegates to
#[derive(Clone, Debug)]
pub struct AppState<B: InferenceBackend> {
    pub backend: B,
}

impl<B: InferenceBackend> AppState<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

/// Converts a handler panic into the generic internal error envelope.
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        Some(s.clone())
    } else {
        payload.downcast_ref::<&str>().map(|s| s.to_string())
    };

    error!(
        "Handler panicked: {}",
        message.as_deref().unwrap_or(errors::UNKNOWN_ERROR)
    );
    axum::response::IntoResponse::into_response(ShimError::Internal(message))
}

/// Build the main router for the shim
/// This creates routes for:
/// - `/` - Static service description
/// - `/v1/models` - Returns the model catalog
/// - `/v1/chat/completions` - Chat completions
/// - `/v1/embeddings` - Embeddings
///
/// Wrong verbs on known paths get a 405, unknown paths a 404, pre-flight requests on any path a
/// 204. Every response carries the CORS headers.
#[instrument(skip(state))]
pub fn build_router<B: InferenceBackend + Clone + 'static>(state: AppState<B>) -> Router {
    info!("Building router");
    Router::new()
        .route("/", any(handlers::root))
        .route(
            "/v1/models",
            get(handlers::models).fallback(handlers::method_not_allowed),
        )
        .route(
            "/v1/chat/completions",
            post(handlers::chat_completions::<B>).fallback(handlers::method_not_allowed),
        )
        .route(
            "/v1/embeddings",
            post(handlers::embeddings::<B>).fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer)
        .with_state(state)
}

/// Builds a router for the metrics endpoint.
#[instrument(skip(handle))]
pub fn build_metrics_router(handle: PrometheusHandle) -> Router {
    info!("Building metrics router");
    Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

type MetricsLayerAndHandle = (
    GenericMetricLayer<'static, PrometheusHandle, Handle>,
    PrometheusHandle,
);

/// Builds a layer and handle for prometheus metrics collection.
///
/// # Parameters
/// - `prefix`: A string prefix for the metrics, which can be either a string literal or an owned string.
pub fn build_metrics_layer_and_handle(
    prefix: impl Into<Cow<'static, str>>,
) -> MetricsLayerAndHandle {
    info!("Building metrics layer");
    PrometheusMetricLayerBuilder::new()
        .with_prefix(prefix)
        .enable_response_body_size(true)
        .with_endpoint_label_type(axum_prometheus::EndpointLabel::Exact)
        .with_default_metrics()
        .build_pair()
}
