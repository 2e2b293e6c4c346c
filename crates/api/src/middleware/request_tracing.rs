use axum::http::{header, Request};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::Span;

/// Request span that records the `Host` header, since it selects the tenant.
#[derive(Debug, Clone, Copy, Default)]
pub struct TenantSpan;

impl<B> MakeSpan<B> for TenantSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            host = %host,
        )
    }
}

/// Build the tracing layer for request/response logging.
pub fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, TenantSpan> {
    TraceLayer::new_for_http().make_span_with(TenantSpan)
}
