//! Request logging middleware
//!
//! Logs method, path, client address, status code and duration for each
//! request. `Engine::with_defaults` installs it as the first middleware.

use super::layer::Middleware;
use crate::proxy::ClientIp;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::{info_span, Instrument, Level};

/// Middleware that wraps each request in an `http_request` span and logs
/// its outcome
///
/// # Example
///
/// ```rust,ignore
/// use axoapi_core::middleware::TracingLayer;
///
/// let mut engine = Engine::new();
/// engine.use_middleware([TracingLayer::new().into()]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TracingLayer {
    level: Level,
}

impl TracingLayer {
    /// Create a new TracingLayer with default INFO level
    pub fn new() -> Self {
        Self { level: Level::INFO }
    }

    /// Create a TracingLayer that logs successful requests at `level`
    pub fn with_level(level: Level) -> Self {
        Self { level }
    }

    async fn call(self, req: Request, next: Next) -> Response {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let client = req
            .extensions()
            .get::<ClientIp>()
            .and_then(|ip| ip.0)
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let start = Instant::now();
        let span = info_span!(
            "http_request",
            method = %method,
            path = %path,
            client = %client,
            status = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
            error = tracing::field::Empty,
        );

        let response = next.run(req).instrument(span.clone()).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        let status = response.status();
        span.record("status", status.as_u16());
        span.record("duration_ms", duration_ms);

        let _enter = span.enter();
        if status.is_client_error() || status.is_server_error() {
            span.record("error", true);
            tracing::warn!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                duration_ms,
                "Request failed"
            );
            return response;
        }

        match self.level {
            Level::TRACE => tracing::trace!(method = %method, path = %path, status = status.as_u16(), duration_ms, "Request completed"),
            Level::DEBUG => tracing::debug!(method = %method, path = %path, status = status.as_u16(), duration_ms, "Request completed"),
            Level::INFO => tracing::info!(method = %method, path = %path, status = status.as_u16(), duration_ms, "Request completed"),
            Level::WARN => tracing::warn!(method = %method, path = %path, status = status.as_u16(), duration_ms, "Request completed"),
            Level::ERROR => tracing::error!(method = %method, path = %path, status = status.as_u16(), duration_ms, "Request completed"),
        }

        response
    }
}

impl Default for TracingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<TracingLayer> for Middleware {
    fn from(layer: TracingLayer) -> Self {
        Middleware::from_fn(move |req, next| layer.call(req, next))
    }
}
