//! Request logging middleware.
//!
//! One line per request with method, path, status and latency. Credentials
//! never reach the log: the query string is dropped and only the presence of
//! a bearer header is recorded.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info, warn};

pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if path == "/health" {
        return next.run(request).await;
    }

    let bearer = request.headers().contains_key(header::AUTHORIZATION);
    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_millis();
    let status = response.status();

    match status {
        s if s.is_server_error() => {
            warn!(%method, %path, status = s.as_u16(), latency_ms, "Request failed (5xx)")
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            debug!(%method, %path, status = status.as_u16(), bearer, latency_ms, "Access denied")
        }
        s => info!(%method, %path, status = s.as_u16(), latency_ms, "Request completed"),
    }

    response
}
