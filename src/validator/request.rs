use super::error::{RequestValidationError, SchemaCompileError};
use super::factory::{create_request_validator_with, LocationValidator, ValidatorOptions};
use super::location::ValidateRequest;
use crate::server::HttpRequest;
use crate::spec::{OperationDefinition, ParameterLocation};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// All location validators for one operation.
///
/// Validators run in a fixed order (path, headers, cookies, query, body) and
/// the first failure is returned; later locations are not checked.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    validators: Vec<LocationValidator>,
}

impl RequestValidator {
    /// Build one validator per location present in `schemas`.
    pub fn from_schemas(
        schemas: &BTreeMap<ParameterLocation, Value>,
        options: ValidatorOptions,
    ) -> Result<Self, SchemaCompileError> {
        // BTreeMap iterates in ParameterLocation order, which is the run order.
        let validators = schemas
            .iter()
            .map(|(location, schema)| create_request_validator_with(*location, schema, options))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { validators })
    }

    /// Build the validator for an operation, honouring its `body_required` flag.
    pub fn for_operation(
        operation: &OperationDefinition,
        validate_formats: bool,
    ) -> Result<Self, SchemaCompileError> {
        Self::from_schemas(
            &operation.schemas,
            ValidatorOptions {
                validate_formats,
                body_required: operation.body_required,
            },
        )
    }

    /// Locations this validator checks, in run order.
    pub fn locations(&self) -> impl Iterator<Item = ParameterLocation> + '_ {
        self.validators.iter().map(ValidateRequest::location)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run every location validator; stop at the first failure.
    pub fn validate(&self, request: &HttpRequest) -> Result<(), RequestValidationError> {
        for validator in &self.validators {
            if let Err(err) = validator.validate(request) {
                warn!(
                    method = %request.method,
                    path = %request.path,
                    location = %err.location(),
                    kind = %err.kind(),
                    error = %err.message(),
                    "Request validation failed"
                );
                return Err(err);
            }
        }
        debug!(
            method = %request.method,
            path = %request.path,
            locations = self.validators.len(),
            "Request validated"
        );
        Ok(())
    }
}
