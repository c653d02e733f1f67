use crate::spec::ParameterLocation;
use std::fmt;

/// Classification of a request validation failure.
///
/// `Request` is the generic kind: validation could not even be attempted for
/// the location (e.g. the body has no JSON content-type). Every other kind means
/// the extracted data was handed to the schema matcher and rejected. All kinds
/// are request validation errors; the location-specific ones refine it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    Request,
    RequestBody,
    RequestQuery,
    RequestPath,
    RequestHeaders,
    RequestCookies,
}

impl ValidationErrorKind {
    /// Location-specific kind for a schema mismatch at `location`.
    #[must_use]
    pub fn for_location(location: ParameterLocation) -> Self {
        match location {
            ParameterLocation::Body => ValidationErrorKind::RequestBody,
            ParameterLocation::Query => ValidationErrorKind::RequestQuery,
            ParameterLocation::Path => ValidationErrorKind::RequestPath,
            ParameterLocation::Header => ValidationErrorKind::RequestHeaders,
            ParameterLocation::Cookie => ValidationErrorKind::RequestCookies,
        }
    }

    /// Stable identifier, suitable for an error response `type` field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::Request => "request_validation_error",
            ValidationErrorKind::RequestBody => "request_body_validation_error",
            ValidationErrorKind::RequestQuery => "request_query_validation_error",
            ValidationErrorKind::RequestPath => "request_path_validation_error",
            ValidationErrorKind::RequestHeaders => "request_headers_validation_error",
            ValidationErrorKind::RequestCookies => "request_cookies_validation_error",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request failed validation at exactly one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestValidationError {
    kind: ValidationErrorKind,
    location: ParameterLocation,
    message: String,
    details: Vec<String>,
}

impl RequestValidationError {
    /// Validation could not be attempted for `location`.
    pub fn precondition(location: ParameterLocation, message: impl Into<String>) -> Self {
        Self {
            kind: ValidationErrorKind::Request,
            location,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// The schema matcher rejected the data extracted from `location`.
    ///
    /// `details` holds one message per violation; the first one becomes the
    /// headline message.
    pub fn schema(location: ParameterLocation, details: Vec<String>) -> Self {
        let message = details
            .first()
            .cloned()
            .unwrap_or_else(|| format!("{location} does not match its schema"));
        Self {
            kind: ValidationErrorKind::for_location(location),
            location,
            message,
            details,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ValidationErrorKind {
        self.kind
    }

    #[must_use]
    pub fn location(&self) -> ParameterLocation {
        self.location
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Every violation reported by the matcher (empty for precondition failures).
    #[must_use]
    pub fn details(&self) -> &[String] {
        &self.details
    }

    /// True when the data reached the schema matcher and was rejected.
    #[must_use]
    pub fn is_schema_violation(&self) -> bool {
        self.kind != ValidationErrorKind::Request
    }
}

impl fmt::Display for RequestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.location, self.message)?;
        if self.details.len() > 1 {
            write!(f, " (+{} more)", self.details.len() - 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for RequestValidationError {}

/// A schema from the document could not be compiled by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCompileError {
    pub location: ParameterLocation,
    pub message: String,
}

impl fmt::Display for SchemaCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} schema: {}", self.location, self.message)
    }
}

impl std::error::Error for SchemaCompileError {}
