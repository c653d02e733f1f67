use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use super::Middleware;
use crate::resolver::OperationResolver;
use crate::runtime_config::RuntimeConfig;
use crate::server::HttpRequest;
use crate::spec::{load_spec, load_spec_from_str, DocumentFormat, OperationDefinition};
use crate::validator::RequestValidationError;
use crate::validator_cache::ValidatorCache;

/// Validates requests against the OpenAPI operation they resolve to.
///
/// A request with no matching operation passes through unvalidated. Otherwise
/// the operation's [`RequestValidator`](crate::validator::RequestValidator) is
/// fetched from the cache (built on first use) and must accept the request
/// before the next handler runs. Failures are returned to the caller; turning
/// them into an HTTP response is left to an outer layer.
#[derive(Debug, Clone)]
pub struct OpenApiMiddleware {
    resolver: Arc<OperationResolver>,
    cache: ValidatorCache,
    config: RuntimeConfig,
}

impl OpenApiMiddleware {
    /// Load a YAML or JSON document from disk, configured from the environment.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::with_config(load_spec(path)?, RuntimeConfig::from_env())
    }

    /// Build from an in-memory document, configured from the environment.
    pub fn from_document(content: &str, format: DocumentFormat) -> anyhow::Result<Self> {
        Self::with_config(load_spec_from_str(content, format)?, RuntimeConfig::from_env())
    }

    /// Build from operation definitions, configured from the environment.
    pub fn new(operations: Vec<OperationDefinition>) -> anyhow::Result<Self> {
        Self::with_config(operations, RuntimeConfig::from_env())
    }

    /// Build from operation definitions with an explicit configuration.
    ///
    /// With caching and precompilation on, every operation's validator is
    /// built here and an invalid schema fails construction.
    pub fn with_config(
        operations: Vec<OperationDefinition>,
        config: RuntimeConfig,
    ) -> anyhow::Result<Self> {
        let resolver =
            OperationResolver::new(operations).context("invalid path template in OpenAPI document")?;
        let cache = ValidatorCache::with_formats(config.validator_cache, config.validate_formats);
        if config.precompile {
            let compiled = cache
                .precompile(resolver.operations().map(|op| &**op))
                .context("invalid schema in OpenAPI document")?;
            debug!(compiled = compiled, "Validators precompiled");
        }
        info!(
            operations = resolver.len(),
            validator_cache = config.validator_cache,
            precompile = config.precompile,
            validate_formats = config.validate_formats,
            "OpenAPI middleware ready"
        );
        Ok(Self {
            resolver: Arc::new(resolver),
            cache,
            config,
        })
    }

    pub fn resolver(&self) -> &OperationResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &ValidatorCache {
        &self.cache
    }

    pub fn config(&self) -> RuntimeConfig {
        self.config
    }

    /// Resolve the request's operation and validate the request against it.
    ///
    /// An unrouted request is matched by path and, on success, bound to the
    /// operation's route. Returns `Ok(None)` when no operation applies.
    pub fn validate(
        &self,
        request: &mut HttpRequest,
    ) -> Result<Option<Arc<OperationDefinition>>, RequestValidationError> {
        let operation = match request.route_template() {
            Some(template) => self.resolver.resolve(&request.method, template),
            None => self
                .resolver
                .match_request(&request.method, &request.path)
                .map(|(op, matched)| {
                    request.bind_route(matched);
                    op
                }),
        };
        let Some(operation) = operation else {
            debug!(
                method = %request.method,
                path = %request.path,
                "No operation configured, skipping validation"
            );
            return Ok(None);
        };

        let validator = self.cache.get_or_build(&operation).map_err(|e| {
            RequestValidationError::precondition(e.location, format!("cannot validate request: {e}"))
        })?;
        validator.validate(request)?;
        debug!(operation = %operation.key(), "Request validated");
        Ok(Some(operation))
    }

    /// Validate `request`, then hand it to `next` and return its result unchanged.
    ///
    /// `next` is never called when validation fails.
    pub fn handle<R, F>(&self, mut request: HttpRequest, next: F) -> Result<R, RequestValidationError>
    where
        F: FnOnce(HttpRequest) -> R,
    {
        self.validate(&mut request)?;
        Ok(next(request))
    }
}

impl Middleware for OpenApiMiddleware {
    fn before(&self, req: &mut HttpRequest) -> Result<(), RequestValidationError> {
        self.validate(req).map(|_| ())
    }
}
