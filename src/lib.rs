#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]
//! # openapi-guard
//!
//! **openapi-guard** validates incoming HTTP requests against the contract in an
//! [OpenAPI 3.1.0](https://spec.openapis.org/oas/v3.1.0) document before they
//! reach application code.
//!
//! ## Overview
//!
//! Every operation in the document contributes up to five JSON Schemas, one per
//! parameter location: path, headers, cookies, query and body. A request is
//! resolved to its operation, its raw string data is coerced to the types the
//! schemas declare, and each location is checked in that fixed order. The
//! first failure wins and is returned as a [`RequestValidationError`] whose
//! [`ValidationErrorKind`] names the failing location. Requests that match no
//! operation pass through untouched.
//!
//! ## Architecture
//!
//! - **[`spec`]** - Loading OpenAPI documents and building operation definitions
//! - **[`router`]** - Path template matching with named parameter extraction
//! - **[`server`]** - The request/response types validators read from
//! - **[`validator`]** - Value coercion, location validators and the request validator
//! - **[`resolver`]** - `(method, template)` to operation lookup
//! - **[`validator_cache`]** - Per-operation validator cache with precompilation
//! - **[`middleware`]** - `OpenApiMiddleware`, `TracingMiddleware` and the pipeline
//! - **[`runtime_config`]** - Environment configuration
//! - **[`cli`]** / **[`logging`]** - The `openapi-guard` binary
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant MW as OpenApiMiddleware
//!     participant Res as OperationResolver
//!     participant Cache as ValidatorCache
//!     participant RV as RequestValidator
//!     participant Next as next handler
//!
//!     Caller->>MW: handle(request, next)
//!     MW->>Res: resolve / match_request
//!     alt no operation
//!         MW->>Next: next(request)
//!     else operation found
//!         MW->>Cache: get_or_build(operation)
//!         Cache-->>MW: Arc<RequestValidator>
//!         MW->>RV: validate(path, headers, cookies, query, body)
//!         alt valid
//!             MW->>Next: next(request)
//!             Next-->>Caller: response (unchanged)
//!         else invalid
//!             RV-->>Caller: RequestValidationError
//!         end
//!     end
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use openapi_guard::middleware::OpenApiMiddleware;
//! use openapi_guard::server::{HttpRequest, HttpResponse};
//! use openapi_guard::spec::DocumentFormat;
//! use openapi_guard::ValidationErrorKind;
//! use serde_json::json;
//!
//! let doc = r#"
//! openapi: 3.1.0
//! info: {title: Pets, version: "1.0"}
//! paths:
//!   /pets:
//!     post:
//!       requestBody:
//!         required: true
//!         content:
//!           application/json:
//!             schema:
//!               type: object
//!               required: [name]
//!               properties:
//!                 name: {type: string}
//!       responses:
//!         "201": {description: created}
//! "#;
//! let middleware = OpenApiMiddleware::from_document(doc, DocumentFormat::Yaml).unwrap();
//!
//! let ok = HttpRequest::new(Method::POST, "/pets")
//!     .with_header("content-type", "application/json")
//!     .with_body(r#"{"name": "Rex"}"#);
//! let res = middleware.handle(ok, |_| HttpResponse::json(201, json!({"id": 1}))).unwrap();
//! assert_eq!(res.status, 201);
//!
//! let bad = HttpRequest::new(Method::POST, "/pets")
//!     .with_header("content-type", "application/json")
//!     .with_body("{}");
//! let err = middleware.handle(bad, |_| HttpResponse::default()).unwrap_err();
//! assert_eq!(err.kind(), ValidationErrorKind::RequestBody);
//! ```

pub mod cli;
pub mod logging;
pub mod middleware;
pub mod resolver;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod spec;
pub mod validator;
pub mod validator_cache;

pub use middleware::{Middleware, MiddlewarePipeline, OpenApiMiddleware, TracingMiddleware};
pub use resolver::OperationResolver;
pub use spec::{load_spec, OperationDefinition, OperationKey, ParameterLocation};
pub use validator::{
    create_request_validator, RequestValidationError, RequestValidator, SchemaCompileError,
    ValidationErrorKind,
};
pub use validator_cache::ValidatorCache;
