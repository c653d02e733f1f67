use super::types::{OperationDefinition, ParameterLocation};
use oas3::spec::{ObjectOrReference, Parameter};
use oas3::OpenApiV3Spec;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// `$ref` chains deeper than this are left unexpanded (guards against cycles).
const MAX_REF_DEPTH: usize = 32;

/// Resolve a JSON Schema `$ref` to the actual schema definition
///
/// Looks up schema references like `#/components/schemas/User` in the OpenAPI spec
/// and returns the resolved schema object.
pub fn resolve_schema_ref<'a>(
    spec: &'a OpenApiV3Spec,
    ref_path: &str,
) -> Option<&'a oas3::spec::ObjectSchema> {
    let name = ref_path.strip_prefix("#/components/schemas/")?;
    spec.components
        .as_ref()?
        .schemas
        .get(name)
        .and_then(|schema_ref| match schema_ref {
            ObjectOrReference::Object(schema) => Some(schema),
            _ => None,
        })
}

/// Recursively replace every `$ref` object in `value` with the schema it points to.
pub fn expand_schema_refs(spec: &OpenApiV3Spec, value: &mut Value) {
    expand_refs_at_depth(spec, value, 0);
}

fn expand_refs_at_depth(spec: &OpenApiV3Spec, value: &mut Value, depth: usize) {
    if depth > MAX_REF_DEPTH {
        return;
    }
    match value {
        Value::Object(obj) => {
            if let Some(ref_path) = obj.get("$ref").and_then(|v| v.as_str()) {
                if let Some(mut resolved) =
                    resolve_schema_ref(spec, ref_path).and_then(|s| serde_json::to_value(s).ok())
                {
                    expand_refs_at_depth(spec, &mut resolved, depth + 1);
                    *value = resolved;
                    return;
                }
            }
            for v in obj.values_mut() {
                expand_refs_at_depth(spec, v, depth + 1);
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                expand_refs_at_depth(spec, v, depth + 1);
            }
        }
        _ => {}
    }
}

fn resolve_parameter_ref<'a>(spec: &'a OpenApiV3Spec, ref_path: &str) -> Option<&'a Parameter> {
    let name = ref_path.strip_prefix("#/components/parameters/")?;
    spec.components
        .as_ref()?
        .parameters
        .get(name)
        .and_then(|param_ref| match param_ref {
            ObjectOrReference::Object(param) => Some(param),
            _ => None,
        })
}

/// A single resolved parameter, before it is folded into its location's object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMeta {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Option<Value>,
}

/// Resolve parameter references and expand their schemas.
pub fn extract_parameters(
    spec: &OpenApiV3Spec,
    params: &[ObjectOrReference<Parameter>],
) -> Vec<ParameterMeta> {
    let mut out = Vec::new();
    for p in params {
        let param = match p {
            ObjectOrReference::Object(obj) => Some(obj),
            ObjectOrReference::Ref { ref_path, .. } => resolve_parameter_ref(spec, ref_path),
        };

        let Some(param) = param else {
            continue;
        };

        let mut schema = param.schema.as_ref().and_then(|s| match s {
            ObjectOrReference::Object(obj) => serde_json::to_value(obj).ok(),
            ObjectOrReference::Ref { ref_path, .. } => {
                resolve_schema_ref(spec, ref_path).and_then(|sch| serde_json::to_value(sch).ok())
            }
        });
        if let Some(ref mut val) = schema {
            expand_schema_refs(spec, val);
        }

        let location = ParameterLocation::from(param.location);
        out.push(ParameterMeta {
            name: param.name.clone(),
            required: location == ParameterLocation::Path || param.required.unwrap_or(false),
            location,
            schema,
        });
    }
    out
}

/// Merge path-item level parameters with operation level ones.
///
/// An operation parameter overrides a path-item parameter with the same name
/// and location.
#[must_use]
pub fn merge_parameters(item_params: Vec<ParameterMeta>, op_params: Vec<ParameterMeta>) -> Vec<ParameterMeta> {
    let mut merged: Vec<ParameterMeta> = item_params
        .into_iter()
        .filter(|p| {
            !op_params
                .iter()
                .any(|o| o.name == p.name && o.location == p.location)
        })
        .collect();
    merged.extend(op_params);
    merged
}

/// Header parameters OpenAPI says to ignore; they are described elsewhere in the operation.
const IGNORED_HEADER_PARAMETERS: [&str; 3] = ["accept", "content-type", "authorization"];

fn is_ignored_header(name: &str) -> bool {
    IGNORED_HEADER_PARAMETERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// Fold the parameters of one location into an object schema.
///
/// Returns `None` when the location declares no parameters. Header parameters
/// named `Accept`, `Content-Type` or `Authorization` are dropped.
#[must_use]
pub fn location_schema(params: &[ParameterMeta], location: ParameterLocation) -> Option<Value> {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for p in params.iter().filter(|p| {
        p.location == location
            && !(location == ParameterLocation::Header && is_ignored_header(&p.name))
    }) {
        properties.insert(
            p.name.clone(),
            p.schema.clone().unwrap_or_else(|| Value::Object(Map::new())),
        );
        if p.required {
            required.push(Value::String(p.name.clone()));
        }
    }
    if properties.is_empty() {
        return None;
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    Some(Value::Object(schema))
}

/// Extract the `application/json` request body schema and whether the body is required.
pub fn extract_request_schema(
    spec: &OpenApiV3Spec,
    operation: &oas3::spec::Operation,
) -> (Option<Value>, bool) {
    let mut required = false;
    let mut schema = operation.request_body.as_ref().and_then(|r| match r {
        ObjectOrReference::Object(req_body) => {
            required = req_body.required.unwrap_or(false);
            req_body.content.get("application/json").and_then(|media| {
                match media.schema.as_ref()? {
                    ObjectOrReference::Object(schema_obj) => serde_json::to_value(schema_obj).ok(),
                    ObjectOrReference::Ref { ref_path, .. } => resolve_schema_ref(spec, ref_path)
                        .and_then(|s| serde_json::to_value(s).ok()),
                }
            })
        }
        _ => None,
    });
    if let Some(ref mut val) = schema {
        expand_schema_refs(spec, val);
    }
    (schema, required)
}

/// Build an [`OperationDefinition`] for every operation in the document.
pub fn build_operations(spec: &OpenApiV3Spec) -> anyhow::Result<Vec<OperationDefinition>> {
    let mut operations = Vec::new();

    if let Some(paths_map) = spec.paths.as_ref() {
        for (path, item) in paths_map {
            let item_params = extract_parameters(spec, &item.parameters);

            for (method, operation) in item.methods() {
                let params = merge_parameters(
                    item_params.clone(),
                    extract_parameters(spec, &operation.parameters),
                );

                let mut schemas = BTreeMap::new();
                for location in ParameterLocation::ALL {
                    if location == ParameterLocation::Body {
                        continue;
                    }
                    if let Some(schema) = location_schema(&params, location) {
                        schemas.insert(location, schema);
                    }
                }

                let (body_schema, body_required) = extract_request_schema(spec, operation);
                if let Some(schema) = body_schema {
                    schemas.insert(ParameterLocation::Body, schema);
                }

                debug!(
                    method = %method,
                    path = %path,
                    locations = ?schemas.keys().collect::<Vec<_>>(),
                    body_required = body_required,
                    "Operation definition built"
                );

                operations.push(OperationDefinition {
                    method: method.clone(),
                    path_template: Arc::from(path.as_str()),
                    operation_id: operation.operation_id.clone(),
                    schemas,
                    body_required,
                });
            }
        }
    }

    info!(operations_count = operations.len(), "Operation definitions built");
    Ok(operations)
}
