//! Per-location validators.
//!
//! Each validator is built once from its location's schema and reused for every
//! request. Validation extracts the location's raw data, coerces it to the
//! schema's types and runs the compiled schema against the result.

use super::coerce::{coerce_pairs, declared_type, property_schema};
use super::error::{RequestValidationError, SchemaCompileError};
use crate::server::HttpRequest;
use crate::spec::ParameterLocation;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Behaviour shared by all location validators.
pub trait ValidateRequest: Send + Sync {
    /// The location this validator reads from.
    fn location(&self) -> ParameterLocation;

    /// Check `request`; `Ok(())` when the location satisfies its schema.
    fn validate(&self, request: &HttpRequest) -> Result<(), RequestValidationError>;
}

/// A compiled schema bound to the location it guards.
#[derive(Clone)]
pub struct SchemaMatcher {
    location: ParameterLocation,
    schema: Arc<Value>,
    compiled: Arc<jsonschema::Validator>,
}

impl SchemaMatcher {
    /// Compile `schema`. With `validate_formats` off, `format` is an annotation only.
    pub fn compile(
        location: ParameterLocation,
        schema: &Value,
        validate_formats: bool,
    ) -> Result<Self, SchemaCompileError> {
        let compiled = jsonschema::options()
            .should_validate_formats(validate_formats)
            .build(schema)
            .map_err(|e| SchemaCompileError {
                location,
                message: e.to_string(),
            })?;
        Ok(Self {
            location,
            schema: Arc::new(schema.clone()),
            compiled: Arc::new(compiled),
        })
    }

    #[must_use]
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Run the schema against an already coerced instance.
    pub fn check(&self, instance: &Value) -> Result<(), RequestValidationError> {
        let details: Vec<String> = self
            .compiled
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect();
        if details.is_empty() {
            return Ok(());
        }
        debug!(
            location = %self.location,
            violations = details.len(),
            first = %details[0],
            "Schema violation"
        );
        Err(RequestValidationError::schema(self.location, details))
    }
}

impl fmt::Debug for SchemaMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaMatcher")
            .field("location", &self.location)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

fn is_json_media_type(media: &str) -> bool {
    media == "application/json" || (media.starts_with("application/") && media.ends_with("+json"))
}

/// Validates the JSON request body.
#[derive(Debug, Clone)]
pub struct RequestBodyValidator {
    matcher: SchemaMatcher,
    required: bool,
}

impl RequestBodyValidator {
    /// A validator for a required JSON body.
    pub fn new(schema: &Value) -> Result<Self, SchemaCompileError> {
        Self::with_options(schema, true, true)
    }

    pub fn with_options(
        schema: &Value,
        required: bool,
        validate_formats: bool,
    ) -> Result<Self, SchemaCompileError> {
        Ok(Self {
            matcher: SchemaMatcher::compile(ParameterLocation::Body, schema, validate_formats)?,
            required,
        })
    }

    /// Whether an empty body is rejected.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }
}

impl ValidateRequest for RequestBodyValidator {
    fn location(&self) -> ParameterLocation {
        ParameterLocation::Body
    }

    fn validate(&self, request: &HttpRequest) -> Result<(), RequestValidationError> {
        let is_empty = request.body.iter().all(u8::is_ascii_whitespace);
        if is_empty && !self.required {
            return Ok(());
        }

        let media = request.media_type().ok_or_else(|| {
            RequestValidationError::precondition(
                ParameterLocation::Body,
                "missing content-type header; expected application/json",
            )
        })?;
        if !is_json_media_type(&media) {
            return Err(RequestValidationError::precondition(
                ParameterLocation::Body,
                format!("unsupported content-type '{media}'; expected application/json"),
            ));
        }

        let body = if is_empty {
            Value::Null
        } else {
            serde_json::from_slice(&request.body).map_err(|e| {
                RequestValidationError::schema(
                    ParameterLocation::Body,
                    vec![format!("request body is not valid JSON: {e}")],
                )
            })?
        };
        self.matcher.check(&body)
    }
}

/// Validates query string parameters.
#[derive(Debug, Clone)]
pub struct RequestQueryValidator {
    matcher: SchemaMatcher,
}

impl RequestQueryValidator {
    pub fn new(schema: &Value) -> Result<Self, SchemaCompileError> {
        Self::with_options(schema, true)
    }

    pub fn with_options(schema: &Value, validate_formats: bool) -> Result<Self, SchemaCompileError> {
        Ok(Self {
            matcher: SchemaMatcher::compile(ParameterLocation::Query, schema, validate_formats)?,
        })
    }
}

impl ValidateRequest for RequestQueryValidator {
    fn location(&self) -> ParameterLocation {
        ParameterLocation::Query
    }

    fn validate(&self, request: &HttpRequest) -> Result<(), RequestValidationError> {
        let query = coerce_pairs(request.query_pairs(), self.matcher.schema());
        self.matcher.check(&query)
    }
}

/// Validates path parameters bound by route matching.
#[derive(Debug, Clone)]
pub struct RequestPathValidator {
    matcher: SchemaMatcher,
}

impl RequestPathValidator {
    pub fn new(schema: &Value) -> Result<Self, SchemaCompileError> {
        Self::with_options(schema, true)
    }

    pub fn with_options(schema: &Value, validate_formats: bool) -> Result<Self, SchemaCompileError> {
        Ok(Self {
            matcher: SchemaMatcher::compile(ParameterLocation::Path, schema, validate_formats)?,
        })
    }
}

impl ValidateRequest for RequestPathValidator {
    fn location(&self) -> ParameterLocation {
        ParameterLocation::Path
    }

    fn validate(&self, request: &HttpRequest) -> Result<(), RequestValidationError> {
        if request.route.is_none() {
            return Err(RequestValidationError::precondition(
                ParameterLocation::Path,
                format!("request path '{}' has not been matched to a route", request.path),
            ));
        }
        let params = request
            .path_params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()));
        let path = coerce_pairs(params, self.matcher.schema());
        self.matcher.check(&path)
    }
}

/// Validates request headers. Header names are matched case-insensitively
/// against the schema's property names.
#[derive(Debug, Clone)]
pub struct RequestHeadersValidator {
    matcher: SchemaMatcher,
}

impl RequestHeadersValidator {
    pub fn new(schema: &Value) -> Result<Self, SchemaCompileError> {
        Self::with_options(schema, true)
    }

    pub fn with_options(schema: &Value, validate_formats: bool) -> Result<Self, SchemaCompileError> {
        Ok(Self {
            matcher: SchemaMatcher::compile(ParameterLocation::Header, schema, validate_formats)?,
        })
    }

    /// Name the schema uses for a (lowercase) header name.
    fn property_name(&self, header: &str) -> String {
        self.matcher
            .schema()
            .get("properties")
            .and_then(Value::as_object)
            .and_then(|props| props.keys().find(|k| k.eq_ignore_ascii_case(header)))
            .cloned()
            .unwrap_or_else(|| header.to_string())
    }

    fn header_pairs(&self, request: &HttpRequest) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for name in request.headers.keys() {
            let key = self.property_name(name.as_str());
            let values: Vec<String> = request
                .headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            let prop = property_schema(self.matcher.schema(), &key);
            if declared_type(prop) == Some("array") {
                // HTTP list syntax: each occurrence may itself be comma separated
                pairs.extend(
                    values
                        .iter()
                        .flat_map(|v| v.split(','))
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(|v| (key.clone(), v.to_string())),
                );
            } else {
                pairs.push((key, values.join(", ")));
            }
        }
        pairs
    }
}

impl ValidateRequest for RequestHeadersValidator {
    fn location(&self) -> ParameterLocation {
        ParameterLocation::Header
    }

    fn validate(&self, request: &HttpRequest) -> Result<(), RequestValidationError> {
        let headers = coerce_pairs(self.header_pairs(request), self.matcher.schema());
        self.matcher.check(&headers)
    }
}

/// Validates cookies from the `cookie` header; an absent header is an empty mapping.
#[derive(Debug, Clone)]
pub struct RequestCookiesValidator {
    matcher: SchemaMatcher,
}

impl RequestCookiesValidator {
    pub fn new(schema: &Value) -> Result<Self, SchemaCompileError> {
        Self::with_options(schema, true)
    }

    pub fn with_options(schema: &Value, validate_formats: bool) -> Result<Self, SchemaCompileError> {
        Ok(Self {
            matcher: SchemaMatcher::compile(ParameterLocation::Cookie, schema, validate_formats)?,
        })
    }
}

impl ValidateRequest for RequestCookiesValidator {
    fn location(&self) -> ParameterLocation {
        ParameterLocation::Cookie
    }

    fn validate(&self, request: &HttpRequest) -> Result<(), RequestValidationError> {
        let cookies = coerce_pairs(request.cookies(), self.matcher.schema());
        self.matcher.check(&cookies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Route;
    use crate::validator::ValidationErrorKind;
    use http::Method;
    use serde_json::json;

    fn person_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "dob": {"type": "string", "format": "date"},
                "age": {"type": "integer"}
            },
            "required": ["name"]
        })
    }

    #[test]
    fn test_json_media_types() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("application/problem+json"));
        assert!(!is_json_media_type("text/plain"));
        assert!(!is_json_media_type("application/xml"));
    }

    #[test]
    fn test_body_rejects_wrong_content_type_generically() {
        let validator = RequestBodyValidator::new(&person_schema()).unwrap();
        let req = HttpRequest::new(Method::POST, "/")
            .with_header("content-type", "text/plain")
            .with_body(r#"{"name": "Bob"}"#);
        let err = validator.validate(&req).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::Request);
    }

    #[test]
    fn test_body_malformed_json_is_body_error() {
        let validator = RequestBodyValidator::new(&person_schema()).unwrap();
        let req = HttpRequest::new(Method::POST, "/")
            .with_header("content-type", "application/json")
            .with_body("{\"name\": ");
        let err = validator.validate(&req).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::RequestBody);
        assert!(err.message().contains("not valid JSON"));
    }

    #[test]
    fn test_body_empty_required_vs_optional() {
        let required = RequestBodyValidator::new(&person_schema()).unwrap();
        let optional = RequestBodyValidator::with_options(&person_schema(), false, true).unwrap();
        let req = HttpRequest::new(Method::POST, "/").with_header("content-type", "application/json");
        assert_eq!(
            required.validate(&req).unwrap_err().kind(),
            ValidationErrorKind::RequestBody
        );
        assert!(optional.validate(&req).is_ok());
        assert!(optional.validate(&HttpRequest::new(Method::POST, "/")).is_ok());
    }

    #[test]
    fn test_query_type_mismatch() {
        let validator = RequestQueryValidator::new(&person_schema()).unwrap();
        let ok = HttpRequest::new(Method::GET, "/?name=Bob&age=42");
        assert!(validator.validate(&ok).is_ok());
        let bad = HttpRequest::new(Method::GET, "/?name=Bob&age=old");
        assert_eq!(
            validator.validate(&bad).unwrap_err().kind(),
            ValidationErrorKind::RequestQuery
        );
    }

    #[test]
    fn test_path_requires_bound_route() {
        let validator = RequestPathValidator::new(&person_schema()).unwrap();
        let req = HttpRequest::new(Method::GET, "/users/bob");
        let err = validator.validate(&req).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::Request);
        assert_eq!(err.location(), ParameterLocation::Path);

        let route = Route::new("/users/{name}").unwrap();
        assert!(validator.validate(&req.with_route(&route)).is_ok());
    }

    #[test]
    fn test_headers_match_schema_case_insensitively() {
        let schema = json!({
            "type": "object",
            "properties": {"X-Request-Count": {"type": "integer"}},
            "required": ["X-Request-Count"]
        });
        let validator = RequestHeadersValidator::new(&schema).unwrap();
        let ok = HttpRequest::new(Method::GET, "/").with_header("x-request-count", "3");
        assert!(validator.validate(&ok).is_ok());
        let bad = HttpRequest::new(Method::GET, "/").with_header("X-REQUEST-COUNT", "three");
        assert_eq!(
            validator.validate(&bad).unwrap_err().kind(),
            ValidationErrorKind::RequestHeaders
        );
    }

    #[test]
    fn test_headers_array_property_collects_repeats() {
        let schema = json!({
            "type": "object",
            "properties": {"x-tag": {"type": "array", "items": {"type": "string"}, "minItems": 2}}
        });
        let validator = RequestHeadersValidator::new(&schema).unwrap();
        let req = HttpRequest::new(Method::GET, "/")
            .with_header("x-tag", "a")
            .with_header("x-tag", "b");
        assert!(validator.validate(&req).is_ok());
    }

    #[test]
    fn test_headers_array_property_splits_list_syntax() {
        let schema = json!({
            "type": "object",
            "properties": {"x-tag": {"type": "array", "items": {"type": "integer"}, "minItems": 2}}
        });
        let validator = RequestHeadersValidator::new(&schema).unwrap();
        let req = HttpRequest::new(Method::GET, "/").with_header("x-tag", "1, 2");
        assert!(validator.validate(&req).is_ok());
        let single = HttpRequest::new(Method::GET, "/").with_header("x-tag", "1");
        assert_eq!(
            validator.validate(&single).unwrap_err().kind(),
            ValidationErrorKind::RequestHeaders
        );
    }

    #[test]
    fn test_query_composite_parameter_schemas() {
        let schema = json!({
            "type": "object",
            "properties": {
                "limit": {"oneOf": [{"type": "integer"}, {"type": "null"}]},
                "page": {"allOf": [{"type": "integer", "minimum": 1}]}
            }
        });
        let validator = RequestQueryValidator::new(&schema).unwrap();
        assert!(validator.validate(&HttpRequest::new(Method::GET, "/?limit=10")).is_ok());
        assert!(validator.validate(&HttpRequest::new(Method::GET, "/?page=2")).is_ok());
        let bad = HttpRequest::new(Method::GET, "/?page=0");
        assert_eq!(
            validator.validate(&bad).unwrap_err().kind(),
            ValidationErrorKind::RequestQuery
        );
    }

    #[test]
    fn test_query_single_array_value_is_not_split() {
        let schema = json!({
            "type": "object",
            "properties": {"tags": {"type": "array", "items": {"type": "string"}, "maxItems": 1}}
        });
        let validator = RequestQueryValidator::new(&schema).unwrap();
        assert!(validator
            .validate(&HttpRequest::new(Method::GET, "/?tags%5B%5D=rock%2Croll"))
            .is_ok());
        assert!(validator
            .validate(&HttpRequest::new(Method::GET, "/?tags=rock%2Croll"))
            .is_ok());
        let two = HttpRequest::new(Method::GET, "/?tags=rock&tags=roll");
        assert_eq!(
            validator.validate(&two).unwrap_err().kind(),
            ValidationErrorKind::RequestQuery
        );
    }

    #[test]
    fn test_query_integer_beyond_i64() {
        let schema = json!({"type": "object", "properties": {"id": {"type": "integer"}}});
        let validator = RequestQueryValidator::new(&schema).unwrap();
        let req = HttpRequest::new(Method::GET, "/?id=18446744073709551615");
        assert!(validator.validate(&req).is_ok());
    }

    #[test]
    fn test_cookies_absent_header_is_empty_mapping() {
        let validator = RequestCookiesValidator::new(&json!({"type": "object"})).unwrap();
        assert!(validator.validate(&HttpRequest::new(Method::GET, "/")).is_ok());

        let strict = RequestCookiesValidator::new(&person_schema()).unwrap();
        let err = strict.validate(&HttpRequest::new(Method::GET, "/")).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::RequestCookies);
    }

    #[test]
    fn test_format_validation_can_be_disabled() {
        let lenient = RequestCookiesValidator::with_options(&person_schema(), false).unwrap();
        let req = HttpRequest::new(Method::GET, "/").with_header("cookie", "name=Bob;dob=1");
        assert!(lenient.validate(&req).is_ok());
    }

    #[test]
    fn test_invalid_schema_does_not_compile() {
        let err = RequestQueryValidator::new(&json!({"type": "invalid_type"})).unwrap_err();
        assert_eq!(err.location, ParameterLocation::Query);
    }
}
