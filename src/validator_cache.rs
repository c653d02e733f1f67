//! # Request Validator Cache Module
//!
//! Thread-safe caching of per-operation [`RequestValidator`]s so that schemas
//! are compiled once instead of on every request.
//!
//! ## Overview
//!
//! Compiling a JSON Schema is far more expensive than running it. The cache
//! stores one compiled [`RequestValidator`] per operation, keyed by
//! [`OperationKey`] (method + path template), and hands out `Arc` clones.
//!
//! ## Features
//!
//! - **Startup Precompilation**: [`ValidatorCache::precompile`] builds every
//!   operation's validator up front, surfacing broken schemas at load time
//! - **Lazy Compilation**: operations not precompiled are built on first use
//! - **Thread-Safe Access**: concurrent readers, exclusive writers
//! - **Generations**: [`ValidatorCache::clear`] empties the cache and bumps a
//!   generation counter so a reload can be observed in logs
//!
//! ## Thread Safety
//!
//! The cache uses `Arc<RwLock<HashMap>>`. Two threads missing on the same key
//! may both build a validator; the write path re-checks the map and the first
//! insert wins, so callers always observe one shared instance afterwards.
//!
//! ## Configuration
//!
//! The cache can be disabled with `OAG_VALIDATOR_CACHE=off` (see
//! [`crate::runtime_config`]). A disabled cache builds a fresh validator on
//! every call and stores nothing.
//!
//! ## Usage Example
//!
//! ```rust
//! use http::Method;
//! use openapi_guard::spec::{OperationDefinition, ParameterLocation};
//! use openapi_guard::validator_cache::ValidatorCache;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let op = OperationDefinition::new(Method::POST, "/pets")
//!     .with_schema(ParameterLocation::Body, json!({"type": "object"}));
//!
//! let cache = ValidatorCache::new(true);
//! let first = cache.get_or_build(&op).unwrap();
//! let second = cache.get_or_build(&op).unwrap();
//! assert!(Arc::ptr_eq(&first, &second));
//! assert_eq!(cache.size(), 1);
//! ```

use crate::spec::{OperationDefinition, OperationKey};
use crate::validator::{RequestValidator, SchemaCompileError};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, info};

/// Thread-safe cache of compiled request validators.
///
/// Cloning is cheap and clones share storage.
#[derive(Clone)]
pub struct ValidatorCache {
    /// Internal cache storage: operation -> compiled validator
    cache: Arc<RwLock<HashMap<OperationKey, Arc<RequestValidator>>>>,
    /// Whether the cache is enabled (from `OAG_VALIDATOR_CACHE`)
    enabled: bool,
    /// Whether `format` keywords are asserted when compiling
    validate_formats: bool,
    /// Incremented on every [`ValidatorCache::clear`]
    generation: Arc<RwLock<u64>>,
}

impl ValidatorCache {
    /// Create a new validator cache with format validation on.
    ///
    /// # Arguments
    ///
    /// * `enabled` - Whether the cache should store validators (from RuntimeConfig)
    pub fn new(enabled: bool) -> Self {
        Self::with_formats(enabled, true)
    }

    /// Create a new validator cache.
    ///
    /// # Arguments
    ///
    /// * `enabled` - Whether the cache should store validators
    /// * `validate_formats` - Whether `format` keywords reject bad values
    pub fn with_formats(enabled: bool, validate_formats: bool) -> Self {
        info!(
            enabled = enabled,
            validate_formats = validate_formats,
            "Initializing request validator cache"
        );
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            enabled,
            validate_formats,
            generation: Arc::new(RwLock::new(1)),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get a cached validator or build and cache a new one
    ///
    /// This is the main entry point for validator access. It first checks the
    /// cache under a read lock; on a miss it compiles the operation's schemas
    /// and inserts the result unless another thread got there first.
    ///
    /// # Arguments
    ///
    /// * `operation` - The operation whose schemas the validator checks
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<RequestValidator>)` - Cached or newly built validator
    /// * `Err(SchemaCompileError)` - One of the operation's schemas is invalid
    ///
    /// # Performance
    ///
    /// - Cache hit: read lock + HashMap lookup
    /// - Cache miss: schema compilation + write lock
    pub fn get_or_build(
        &self,
        operation: &OperationDefinition,
    ) -> Result<Arc<RequestValidator>, SchemaCompileError> {
        if !self.enabled {
            return self.build(operation).map(Arc::new);
        }

        let key = operation.key();

        // Fast path: read lock only
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(validator) = cache.get(&key) {
                debug!(operation = %key, "Request validator cache hit");
                return Ok(Arc::clone(validator));
            }
        }

        // Slow path: compile outside the lock, then insert
        let validator = Arc::new(self.build(operation)?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);

        // Double-check pattern: another thread might have built it while we compiled
        if let Some(existing) = cache.get(&key) {
            debug!(operation = %key, "Request validator built by another thread");
            return Ok(Arc::clone(existing));
        }

        cache.insert(key.clone(), Arc::clone(&validator));
        info!(
            operation = %key,
            cache_size = cache.len(),
            "Request validator compiled and cached"
        );
        Ok(validator)
    }

    fn build(&self, operation: &OperationDefinition) -> Result<RequestValidator, SchemaCompileError> {
        RequestValidator::for_operation(operation, self.validate_formats).map_err(|e| {
            error!(
                operation = %operation.key(),
                location = %e.location,
                error = %e.message,
                "Failed to compile request schema"
            );
            e
        })
    }

    /// Number of validators currently cached
    pub fn size(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Current cache generation (starts at 1)
    pub fn generation(&self) -> u64 {
        *self.generation.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear all cached validators and increment the generation
    ///
    /// Call this after reloading the document so stale validators are rebuilt.
    pub fn clear(&self) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let mut generation = self.generation.write().unwrap_or_else(PoisonError::into_inner);
        let old_generation = *generation;
        *generation += 1;
        let evicted = cache.len();
        cache.clear();
        info!(
            old_generation = old_generation,
            new_generation = *generation,
            evicted = evicted,
            "Request validator cache cleared"
        );
    }

    /// Pre-compile and cache validators for every operation
    ///
    /// # Arguments
    ///
    /// * `operations` - Operations extracted from the OpenAPI document
    ///
    /// # Returns
    ///
    /// Number of validators built. Zero when the cache is disabled.
    ///
    /// # Errors
    ///
    /// Stops at the first operation whose schemas do not compile.
    pub fn precompile<'a, I>(&self, operations: I) -> Result<usize, SchemaCompileError>
    where
        I: IntoIterator<Item = &'a OperationDefinition>,
    {
        if !self.enabled {
            info!("Validator cache disabled, skipping precompilation");
            return Ok(0);
        }

        let mut compiled_count = 0;
        for operation in operations {
            self.get_or_build(operation)?;
            compiled_count += 1;
        }

        info!(
            compiled_count = compiled_count,
            cache_size = self.size(),
            "Precompiled request validators at startup"
        );
        Ok(compiled_count)
    }
}

impl std::fmt::Debug for ValidatorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorCache")
            .field("enabled", &self.enabled)
            .field("validate_formats", &self.validate_formats)
            .field("size", &self.size())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ParameterLocation;
    use http::Method;
    use serde_json::json;

    fn pets_op() -> OperationDefinition {
        OperationDefinition::new(Method::POST, "/pets").with_schema(
            ParameterLocation::Body,
            json!({
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "required": ["name"]
            }),
        )
    }

    #[test]
    fn test_cache_enabled() {
        let cache = ValidatorCache::new(true);

        // First access should compile
        let validator1 = cache.get_or_build(&pets_op()).unwrap();
        assert_eq!(cache.size(), 1);

        // Second access should use cache
        let validator2 = cache.get_or_build(&pets_op()).unwrap();
        assert_eq!(cache.size(), 1);

        // Validators should be the same Arc (same pointer)
        assert!(Arc::ptr_eq(&validator1, &validator2));
    }

    #[test]
    fn test_cache_disabled() {
        let cache = ValidatorCache::new(false);

        let validator1 = cache.get_or_build(&pets_op()).unwrap();
        let validator2 = cache.get_or_build(&pets_op()).unwrap();

        // Cache should remain empty and every call builds afresh
        assert_eq!(cache.size(), 0);
        assert!(!Arc::ptr_eq(&validator1, &validator2));
    }

    #[test]
    fn test_different_operations_get_different_entries() {
        let cache = ValidatorCache::new(true);
        let get = OperationDefinition::new(Method::GET, "/pets");
        cache.get_or_build(&pets_op()).unwrap();
        cache.get_or_build(&get).unwrap();
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn test_cache_clear() {
        let cache = ValidatorCache::new(true);
        let before = cache.get_or_build(&pets_op()).unwrap();
        assert_eq!(cache.generation(), 1);

        cache.clear();
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.generation(), 2);

        let after = cache.get_or_build(&pets_op()).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_invalid_schema_is_not_cached() {
        let cache = ValidatorCache::new(true);
        let bad = OperationDefinition::new(Method::GET, "/bad")
            .with_schema(ParameterLocation::Query, json!({"type": "invalid_type"}));
        let err = cache.get_or_build(&bad).unwrap_err();
        assert_eq!(err.location, ParameterLocation::Query);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_precompile() {
        let cache = ValidatorCache::new(true);
        let ops = vec![pets_op(), OperationDefinition::new(Method::GET, "/pets")];
        assert_eq!(cache.precompile(&ops).unwrap(), 2);
        assert_eq!(cache.size(), 2);

        let disabled = ValidatorCache::new(false);
        assert_eq!(disabled.precompile(&ops).unwrap(), 0);
    }

    #[test]
    fn test_format_flag_is_applied() {
        let op = OperationDefinition::new(Method::GET, "/users").with_schema(
            ParameterLocation::Query,
            json!({"type": "object", "properties": {"dob": {"type": "string", "format": "date"}}}),
        );
        let req = crate::server::HttpRequest::new(Method::GET, "/users?dob=nope");

        let strict = ValidatorCache::new(true);
        assert!(strict.get_or_build(&op).unwrap().validate(&req).is_err());

        let lenient = ValidatorCache::with_formats(true, false);
        assert!(lenient.get_or_build(&op).unwrap().validate(&req).is_ok());
    }
}
