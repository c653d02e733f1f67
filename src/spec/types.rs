use http::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Where a validated value originates in an HTTP request.
///
/// The set is closed: OpenAPI defines exactly four parameter locations plus the
/// request body. Ordering follows the order in which a [`RequestValidator`]
/// runs its checks, so a `BTreeMap<ParameterLocation, _>` iterates in
/// validation order.
///
/// [`RequestValidator`]: crate::validator::RequestValidator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterLocation {
    Path,
    Header,
    Cookie,
    Query,
    Body,
}

impl ParameterLocation {
    /// All locations in validation order.
    pub const ALL: [ParameterLocation; 5] = [
        ParameterLocation::Path,
        ParameterLocation::Header,
        ParameterLocation::Cookie,
        ParameterLocation::Query,
        ParameterLocation::Body,
    ];

    /// The tag used by OpenAPI documents (`in: query`, ...).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::Query => "query",
            ParameterLocation::Body => "body",
        }
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ParameterLocation {
    type Err = UnknownLocation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "path" => Ok(ParameterLocation::Path),
            "header" | "headers" => Ok(ParameterLocation::Header),
            "cookie" | "cookies" => Ok(ParameterLocation::Cookie),
            "query" => Ok(ParameterLocation::Query),
            "body" => Ok(ParameterLocation::Body),
            _ => Err(UnknownLocation(s.to_string())),
        }
    }
}

impl From<oas3::spec::ParameterIn> for ParameterLocation {
    fn from(loc: oas3::spec::ParameterIn) -> Self {
        match loc {
            oas3::spec::ParameterIn::Path => ParameterLocation::Path,
            oas3::spec::ParameterIn::Query => ParameterLocation::Query,
            oas3::spec::ParameterIn::Header => ParameterLocation::Header,
            oas3::spec::ParameterIn::Cookie => ParameterLocation::Cookie,
        }
    }
}

/// Returned when a location tag outside the closed set is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLocation(pub String);

impl std::fmt::Display for UnknownLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown parameter location '{}'", self.0)
    }
}

impl std::error::Error for UnknownLocation {}

/// Lookup key for an operation: HTTP method plus the path template as written
/// in the document (e.g. `/pets/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    pub method: Method,
    pub path_template: Arc<str>,
}

impl OperationKey {
    pub fn new(method: Method, path_template: impl AsRef<str>) -> Self {
        Self {
            method,
            path_template: Arc::from(path_template.as_ref()),
        }
    }
}

impl std::fmt::Display for OperationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path_template)
    }
}

/// One REST operation bound to the schemas of every location it declares.
///
/// Built once when the document is loaded and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct OperationDefinition {
    pub method: Method,
    pub path_template: Arc<str>,
    pub operation_id: Option<String>,
    /// Object schema per declared location. Locations without parameters are absent.
    pub schemas: BTreeMap<ParameterLocation, Value>,
    /// `requestBody.required` from the document.
    pub body_required: bool,
}

impl OperationDefinition {
    pub fn new(method: Method, path_template: impl AsRef<str>) -> Self {
        Self {
            method,
            path_template: Arc::from(path_template.as_ref()),
            operation_id: None,
            schemas: BTreeMap::new(),
            body_required: false,
        }
    }

    /// Attach a schema for `location`, replacing any previous one.
    #[must_use]
    pub fn with_schema(mut self, location: ParameterLocation, schema: Value) -> Self {
        self.schemas.insert(location, schema);
        self
    }

    #[must_use]
    pub fn with_body_required(mut self, required: bool) -> Self {
        self.body_required = required;
        self
    }

    #[must_use]
    pub fn key(&self) -> OperationKey {
        OperationKey {
            method: self.method.clone(),
            path_template: Arc::clone(&self.path_template),
        }
    }

    #[must_use]
    pub fn schema_for(&self, location: ParameterLocation) -> Option<&Value> {
        self.schemas.get(&location)
    }

    /// Declared locations in validation order.
    pub fn locations(&self) -> impl Iterator<Item = ParameterLocation> + '_ {
        self.schemas.keys().copied()
    }
}
