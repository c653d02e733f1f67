use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info_span};

use crate::server::{HttpRequest, HttpResponse};
use crate::validator::RequestValidationError;

/// Hooks run around the final handler of a [`MiddlewarePipeline`].
pub trait Middleware: Send + Sync {
    /// Inspect or enrich the request. An error stops the pipeline before the handler.
    fn before(&self, _req: &mut HttpRequest) -> Result<(), RequestValidationError> {
        Ok(())
    }

    /// Runs after the handler produced a response.
    fn after(&self, _req: &HttpRequest, _res: &mut HttpResponse, _latency: Duration) {}

    /// Runs when a `before` hook rejected the request.
    fn on_error(&self, _req: &HttpRequest, _err: &RequestValidationError, _latency: Duration) {}
}

/// An ordered chain of middlewares in front of a handler.
#[derive(Clone, Default)]
pub struct MiddlewarePipeline {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewarePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware. Middlewares run in the order they were added.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    /// Builder form of [`MiddlewarePipeline::add_middleware`].
    #[must_use]
    pub fn with(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.add_middleware(mw);
        self
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Run every `before` hook, then `handler`, then every `after` hook.
    ///
    /// The first rejecting `before` hook aborts the run: the handler is not
    /// called, every middleware's `on_error` hook sees the error, and the error
    /// is returned unchanged.
    pub fn run<F>(&self, mut request: HttpRequest, handler: F) -> Result<HttpResponse, RequestValidationError>
    where
        F: FnOnce(&HttpRequest) -> HttpResponse,
    {
        let span = info_span!("pipeline", method = %request.method, path = %request.path);
        let _entered = span.enter();
        let start = Instant::now();

        debug!(middleware_count = self.middlewares.len(), "Middleware before execution");
        for (idx, mw) in self.middlewares.iter().enumerate() {
            if let Err(err) = mw.before(&mut request) {
                debug!(
                    middleware_idx = idx,
                    middleware_name = std::any::type_name_of_val(mw.as_ref()),
                    kind = %err.kind(),
                    "Middleware rejected request"
                );
                let latency = start.elapsed();
                for mw in &self.middlewares {
                    mw.on_error(&request, &err, latency);
                }
                return Err(err);
            }
        }

        let mut response = handler(&request);
        let latency = start.elapsed();

        debug!(
            response_status = response.status,
            latency_ms = latency.as_millis() as u64,
            "Middleware after execution"
        );
        for mw in &self.middlewares {
            mw.after(&request, &mut response, latency);
        }
        Ok(response)
    }
}

impl std::fmt::Debug for MiddlewarePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewarePipeline")
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}
