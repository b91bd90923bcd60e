//! Per-request tracing span and completion log.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};

use axum::http::{Request, Response};
use tower::{Layer, Service};
use tracing::{field::Empty, info, info_span, warn, Instrument, Span};

use super::request_id::RequestId;

/// Layer that wraps each request in an `http_request` span.
///
/// The span carries method, URI and request id; status and latency are
/// recorded once the response is ready. Server errors are logged at `warn`.
#[derive(Clone, Default)]
pub struct TracingLayer;

impl TracingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService { inner }
    }
}

#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for TracingService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default();

        let span = info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
            status = Empty,
            latency_ms = Empty,
        );

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let started = Instant::now();

        Box::pin(
            async move {
                let response = inner.call(request).await?;
                let status = response.status();
                let latency_ms = started.elapsed().as_millis() as u64;

                let span = Span::current();
                span.record("status", status.as_u16());
                span.record("latency_ms", latency_ms);

                if status.is_server_error() {
                    warn!(status = status.as_u16(), latency_ms, "request failed");
                } else {
                    info!(status = status.as_u16(), latency_ms, "request completed");
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}
