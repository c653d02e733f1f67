mod core;
mod openapi;
mod tracing;

pub use core::{Middleware, MiddlewarePipeline};
pub use openapi::OpenApiMiddleware;
pub use tracing::TracingMiddleware;
