//! # Validator Module
//!
//! Schema-driven request validation.
//!
//! - [`coerce`] turns raw request strings into schema-typed JSON.
//! - [`location`] holds one validator per parameter location (body, query,
//!   path, headers, cookies).
//! - [`create_request_validator`] maps a location tag to its validator.
//! - [`RequestValidator`] runs the validators of one operation, fail-fast.
//!
//! A failure is reported as a [`RequestValidationError`] whose
//! [`ValidationErrorKind`] is either the generic `Request` kind (the location
//! could not be validated at all) or the location-specific kind (the schema
//! rejected the data).
//!
//! ```rust
//! use http::Method;
//! use openapi_guard::server::HttpRequest;
//! use openapi_guard::spec::ParameterLocation;
//! use openapi_guard::validator::{create_request_validator, ValidateRequest, ValidationErrorKind};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {"name": {"type": "string"}},
//!     "required": ["name"]
//! });
//! let validator = create_request_validator(ParameterLocation::Query, &schema).unwrap();
//!
//! assert!(validator.validate(&HttpRequest::new(Method::GET, "/?name=Bob")).is_ok());
//! let err = validator.validate(&HttpRequest::new(Method::GET, "/")).unwrap_err();
//! assert_eq!(err.kind(), ValidationErrorKind::RequestQuery);
//! ```

pub mod coerce;
mod error;
mod factory;
pub mod location;
mod request;

pub use error::{RequestValidationError, SchemaCompileError, ValidationErrorKind};
pub use factory::{
    create_request_validator, create_request_validator_with, LocationValidator, ValidatorOptions,
};
pub use location::{
    RequestBodyValidator, RequestCookiesValidator, RequestHeadersValidator, RequestPathValidator,
    RequestQueryValidator, SchemaMatcher, ValidateRequest,
};
pub use request::RequestValidator;
