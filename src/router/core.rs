//! Route templates and path matching.

use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for matched paths.
///
/// Param names use `Arc<str>` because they come from the route template
/// (known at startup); values are per-request data from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A path template such as `/users/{name}/{dob}` compiled into a matcher.
#[derive(Debug, Clone)]
pub struct Route {
    template: Arc<str>,
    regex: Regex,
    param_names: Vec<Arc<str>>,
}

/// Result of matching a concrete request path against a [`Route`].
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Route,
    /// Path parameters extracted from the URL (e.g., `{id}` → `{"id": "123"}`),
    /// percent-decoded.
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics when a template repeats a parameter name.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to a HashMap.
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

impl Route {
    /// Compile a path template.
    ///
    /// Literal segments are matched exactly; `{name}` segments match one
    /// non-empty path segment and are captured under `name`.
    pub fn new(template: impl AsRef<str>) -> Result<Self, regex::Error> {
        let template = template.as_ref();
        let (regex, param_names) = Self::path_to_regex(template)?;
        Ok(Self {
            template: Arc::from(template),
            regex,
            param_names: param_names.into_iter().map(Arc::from).collect(),
        })
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn template_arc(&self) -> Arc<str> {
        Arc::clone(&self.template)
    }

    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.param_names
    }

    /// Match a concrete path (query string already removed) against this template.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        let path = path.split('?').next().unwrap_or(path);
        let caps = self.regex.captures(path)?;

        let mut path_params = ParamVec::new();
        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                let value = urlencoding::decode(m.as_str())
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| m.as_str().to_string());
                path_params.push((Arc::clone(name), value));
            }
        }

        debug!(
            template = %self.template,
            path = %path,
            path_params = ?path_params,
            "Route matched"
        );

        Some(RouteMatch {
            route: self.clone(),
            path_params,
        })
    }

    /// Convert an OpenAPI path pattern to a regex and extract parameter names
    ///
    /// Transforms path patterns like `/users/{id}` into regex patterns like
    /// `^/users/([^/]+)/?$` and extracts parameter names `["id"]`.
    pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<String>), regex::Error> {
        if path == "/" || path.is_empty() {
            return Ok((Regex::new(r"^/$")?, Vec::new()));
        }

        let mut pattern = String::with_capacity(path.len() + 8);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(path.matches('{').count());

        for segment in path.split('/') {
            if segment.starts_with('{') && segment.ends_with('}') && segment.len() > 2 {
                let param_name = segment
                    .trim_start_matches('{')
                    .trim_end_matches('}')
                    .to_string();
                pattern.push_str("/([^/]+)");
                param_names.push(param_name);
            } else if !segment.is_empty() {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }

        pattern.push_str("/?$");
        let regex = Regex::new(&pattern)?;

        Ok((regex, param_names))
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template
    }
}

impl Eq for Route {}
