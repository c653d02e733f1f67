use std::time::Duration;

use tracing::{info, warn};

use super::Middleware;
use crate::server::{HttpRequest, HttpResponse};
use crate::validator::RequestValidationError;

/// Logs the outcome and latency of every request passing through a pipeline.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn after(&self, req: &HttpRequest, res: &mut HttpResponse, latency: Duration) {
        info!(
            method = %req.method,
            path = %req.path,
            route = req.route_template().unwrap_or("-"),
            status = res.status,
            latency_ms = latency.as_millis() as u64,
            "Request completed"
        );
    }

    fn on_error(&self, req: &HttpRequest, err: &RequestValidationError, latency: Duration) {
        warn!(
            method = %req.method,
            path = %req.path,
            kind = %err.kind(),
            location = %err.location(),
            error = %err.message(),
            latency_ms = latency.as_millis() as u64,
            "Request rejected"
        );
    }
}
