//! CORS headers for every response.
//!
//! The header set is a constant. [`CorsLayer`] stamps it onto whatever the inner service returns
//! and answers pre-flight `OPTIONS` requests itself, for any path, without reaching a handler.
use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::trace;

/// `(name, value)` pairs attached to every response.
pub const CORS_HEADERS: &[(&str, &str)] = &[
    ("access-control-allow-origin", "*"),
    (
        "access-control-allow-methods",
        "GET, POST, PUT, DELETE, OPTIONS",
    ),
    ("access-control-allow-headers", "Content-Type, Authorization"),
];

fn apply_cors_headers(headers: &mut HeaderMap) {
    for &(name, value) in CORS_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
}

/// Layer that adds the CORS headers to a service
#[derive(Debug, Clone, Copy, Default)]
pub struct CorsLayer;

impl<S> Layer<S> for CorsLayer {
    type Service = CorsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorsService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct CorsService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for CorsService<S>
where
    S: Service<Request<Body>> + Send + 'static,
    S::Response: IntoResponse + 'static,
    S::Error: 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        if req.method() == Method::OPTIONS {
            trace!(path = %req.uri().path(), "Answering pre-flight request");
            let mut response = StatusCode::NO_CONTENT.into_response();
            apply_cors_headers(response.headers_mut());
            return Box::pin(async move { Ok(response) });
        }

        let future = self.inner.call(req);
        Box::pin(async move {
            let mut response = future.await?.into_response();
            apply_cors_headers(response.headers_mut());
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_cors_headers_sets_every_pair() {
        let mut headers = HeaderMap::new();
        headers.insert("access-control-allow-origin", HeaderValue::from_static("example.com"));

        apply_cors_headers(&mut headers);

        assert_eq!(headers.len(), CORS_HEADERS.len());
        for &(name, value) in CORS_HEADERS {
            assert_eq!(headers.get(name).unwrap(), value);
        }
    }
}
