//! # Operation Resolver
//!
//! Maps `(method, path template)` to the [`OperationDefinition`] built from the
//! OpenAPI document. The table is populated once and read-only afterwards.
//!
//! Requests that already carry a matched route are resolved by template. For
//! requests that have not been routed yet, [`OperationResolver::match_request`]
//! matches the concrete path against every template of the method.

use crate::router::{Route, RouteMatch};
use crate::spec::{OperationDefinition, OperationKey};
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Lookup table of operations.
#[derive(Debug, Clone, Default)]
pub struct OperationResolver {
    by_key: HashMap<OperationKey, Arc<OperationDefinition>>,
    /// Path matchers, literal templates first, then longest template first.
    routes: Vec<(Route, Arc<OperationDefinition>)>,
}

impl OperationResolver {
    /// Build the table. Fails if a path template cannot be compiled.
    ///
    /// When the same method and template appear twice the last definition wins.
    pub fn new(operations: Vec<OperationDefinition>) -> Result<Self, regex::Error> {
        let mut by_key = HashMap::with_capacity(operations.len());
        for op in operations {
            by_key.insert(op.key(), Arc::new(op));
        }

        let mut routes = Vec::with_capacity(by_key.len());
        for op in by_key.values() {
            routes.push((Route::new(&op.path_template)?, Arc::clone(op)));
        }
        // "/pets/mine" must win over "/pets/{id}"
        routes.sort_by(|(a, _), (b, _)| {
            a.param_names()
                .len()
                .cmp(&b.param_names().len())
                .then_with(|| b.template().len().cmp(&a.template().len()))
                .then_with(|| a.template().cmp(b.template()))
        });

        info!(operations = by_key.len(), "Operation resolver initialised");
        Ok(Self { by_key, routes })
    }

    /// Operation for a method and an already matched route template.
    #[must_use]
    pub fn resolve(&self, method: &Method, path_template: &str) -> Option<Arc<OperationDefinition>> {
        let found = self
            .by_key
            .get(&OperationKey::new(method.clone(), path_template))
            .cloned();
        if found.is_none() {
            debug!(method = %method, template = %path_template, "No operation for route");
        }
        found
    }

    /// Match a concrete request path against the operations of `method`.
    #[must_use]
    pub fn match_request(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(Arc<OperationDefinition>, RouteMatch)> {
        let found = self
            .routes
            .iter()
            .filter(|(_, op)| op.method == *method)
            .find_map(|(route, op)| route.match_path(path).map(|m| (Arc::clone(op), m)));
        match &found {
            Some((op, _)) => debug!(method = %method, path = %path, operation = %op.key(), "Operation matched"),
            None => debug!(method = %method, path = %path, "No operation matches path"),
        }
        found
    }

    /// All operations, in matching order.
    pub fn operations(&self) -> impl Iterator<Item = &Arc<OperationDefinition>> {
        self.routes.iter().map(|(_, op)| op)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
