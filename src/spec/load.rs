use super::build::build_operations;
use super::types::OperationDefinition;
use anyhow::Context;
use oas3::OpenApiV3Spec;
use std::path::Path;
use tracing::info;

/// Document formats accepted by the loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a file extension; anything but `.yml`/`.yaml` is JSON.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DocumentFormat::Yaml
            }
            _ => DocumentFormat::Json,
        }
    }
}

fn strip_unknown_verbs(val: &mut serde_json::Value) {
    const METHODS: [&str; 8] = ["get", "post", "put", "delete", "patch", "options", "head", "trace"];

    let Some(serde_json::Value::Object(paths_map)) = val.get_mut("paths") else {
        return;
    };
    for item in paths_map.values_mut() {
        if let serde_json::Value::Object(obj) = item {
            obj.retain(|k, _| {
                let lk = k.to_ascii_lowercase();
                match lk.as_str() {
                    "summary" | "description" | "servers" | "parameters" | "$ref" => true,
                    m if METHODS.contains(&m) => true,
                    _ => k.starts_with("x-"),
                }
            });
        }
    }
}

/// Parse an in-memory OpenAPI document.
pub fn parse_spec(content: &str, format: DocumentFormat) -> anyhow::Result<OpenApiV3Spec> {
    let mut value: serde_json::Value = match format {
        DocumentFormat::Yaml => serde_yaml::from_str(content).context("invalid YAML document")?,
        DocumentFormat::Json => serde_json::from_str(content).context("invalid JSON document")?,
    };

    strip_unknown_verbs(&mut value);
    let spec: OpenApiV3Spec =
        serde_json::from_value(value).context("document is not a valid OpenAPI 3 specification")?;
    Ok(spec)
}

/// Load an OpenAPI document from disk and build its operation definitions.
pub fn load_spec(file_path: impl AsRef<Path>) -> anyhow::Result<Vec<OperationDefinition>> {
    let path = file_path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read OpenAPI document {}", path.display()))?;
    let spec = parse_spec(&content, DocumentFormat::from_path(path))
        .with_context(|| format!("cannot parse OpenAPI document {}", path.display()))?;

    let operations = build_operations(&spec)?;
    info!(
        path = %path.display(),
        title = %spec.info.title,
        operations_count = operations.len(),
        "OpenAPI document loaded"
    );
    Ok(operations)
}

/// Build operation definitions from an in-memory document.
pub fn load_spec_from_str(
    content: &str,
    format: DocumentFormat,
) -> anyhow::Result<Vec<OperationDefinition>> {
    let spec = parse_spec(content, format)?;
    build_operations(&spec)
}

/// Build operation definitions from an already parsed [`OpenApiV3Spec`].
pub fn load_spec_from_spec(spec: &OpenApiV3Spec) -> anyhow::Result<Vec<OperationDefinition>> {
    build_operations(spec)
}
