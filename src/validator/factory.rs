use super::error::{RequestValidationError, SchemaCompileError};
use super::location::{
    RequestBodyValidator, RequestCookiesValidator, RequestHeadersValidator, RequestPathValidator,
    RequestQueryValidator, ValidateRequest,
};
use crate::server::HttpRequest;
use crate::spec::ParameterLocation;
use serde_json::Value;

/// One validator per parameter location.
#[derive(Debug, Clone)]
pub enum LocationValidator {
    Body(RequestBodyValidator),
    Query(RequestQueryValidator),
    Path(RequestPathValidator),
    Headers(RequestHeadersValidator),
    Cookies(RequestCookiesValidator),
}

impl ValidateRequest for LocationValidator {
    fn location(&self) -> ParameterLocation {
        match self {
            LocationValidator::Body(v) => v.location(),
            LocationValidator::Query(v) => v.location(),
            LocationValidator::Path(v) => v.location(),
            LocationValidator::Headers(v) => v.location(),
            LocationValidator::Cookies(v) => v.location(),
        }
    }

    fn validate(&self, request: &HttpRequest) -> Result<(), RequestValidationError> {
        match self {
            LocationValidator::Body(v) => v.validate(request),
            LocationValidator::Query(v) => v.validate(request),
            LocationValidator::Path(v) => v.validate(request),
            LocationValidator::Headers(v) => v.validate(request),
            LocationValidator::Cookies(v) => v.validate(request),
        }
    }
}

/// Options applied when building location validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Reject values that violate `format` (e.g. `date`).
    pub validate_formats: bool,
    /// Reject an empty body (body location only).
    pub body_required: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            validate_formats: true,
            body_required: true,
        }
    }
}

/// Build the validator for `location` with default options.
pub fn create_request_validator(
    location: ParameterLocation,
    schema: &Value,
) -> Result<LocationValidator, SchemaCompileError> {
    create_request_validator_with(location, schema, ValidatorOptions::default())
}

/// Build the validator for `location`.
///
/// The location set is closed, so every tag maps to exactly one validator type.
pub fn create_request_validator_with(
    location: ParameterLocation,
    schema: &Value,
    options: ValidatorOptions,
) -> Result<LocationValidator, SchemaCompileError> {
    let formats = options.validate_formats;
    Ok(match location {
        ParameterLocation::Body => LocationValidator::Body(RequestBodyValidator::with_options(
            schema,
            options.body_required,
            formats,
        )?),
        ParameterLocation::Query => {
            LocationValidator::Query(RequestQueryValidator::with_options(schema, formats)?)
        }
        ParameterLocation::Path => {
            LocationValidator::Path(RequestPathValidator::with_options(schema, formats)?)
        }
        ParameterLocation::Header => {
            LocationValidator::Headers(RequestHeadersValidator::with_options(schema, formats)?)
        }
        ParameterLocation::Cookie => {
            LocationValidator::Cookies(RequestCookiesValidator::with_options(schema, formats)?)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_factory_dispatches_on_location() {
        let schema = json!({"type": "object"});
        for location in ParameterLocation::ALL {
            let validator = create_request_validator(location, &schema).unwrap();
            assert_eq!(validator.location(), location);
        }
    }

    #[test]
    fn test_factory_passes_body_options() {
        let schema = json!({"type": "object"});
        let options = ValidatorOptions {
            body_required: false,
            ..ValidatorOptions::default()
        };
        match create_request_validator_with(ParameterLocation::Body, &schema, options).unwrap() {
            LocationValidator::Body(v) => assert!(!v.is_required()),
            other => panic!("expected body validator, got {other:?}"),
        }
    }
}
