use crate::router::{Route, RouteMatch};
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use http::Method;
use std::collections::HashMap;
use tracing::{debug, warn};

/// The request view consumed by the validators.
///
/// Holds the raw pieces of an incoming HTTP request: the query string is kept
/// unparsed and the body as raw bytes, so every location validator decides for
/// itself how to read its part. `route` and `path_params` are filled in once the
/// request has been matched against a path template.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Raw query string (everything after `?`, not decoded)
    pub query_string: String,
    /// HTTP headers; lookups are case-insensitive
    pub headers: HeaderMap,
    /// Raw request body
    pub body: Vec<u8>,
    /// Route the request was matched against, if any
    pub route: Option<Route>,
    /// Named path parameters bound by route matching
    pub path_params: HashMap<String, String>,
}

impl HttpRequest {
    /// Create a request for `method` and `uri`; a `?query` suffix on `uri`
    /// becomes the query string.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        let uri = uri.as_ref();
        let (path, query_string) = match uri.split_once('?') {
            Some((p, q)) => (p, q),
            None => (uri, ""),
        };
        let path = if path.is_empty() { "/" } else { path };
        Self {
            method,
            path: path.to_string(),
            query_string: query_string.to_string(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            route: None,
            path_params: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_query_string(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = query_string.into();
        self
    }

    /// Append a header. Names or values that are not valid HTTP are dropped.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => warn!(header = %name, "Ignoring invalid header"),
        }
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Match this request's path against `route` and bind the result.
    ///
    /// When the path does not fit the template the request is left unbound.
    #[must_use]
    pub fn with_route(mut self, route: &Route) -> Self {
        match route.match_path(&self.path) {
            Some(matched) => self.bind_route(matched),
            None => warn!(
                template = %route.template(),
                path = %self.path,
                "Request path does not match route template"
            ),
        }
        self
    }

    /// Bind an already matched route and its path parameters.
    pub fn bind_route(&mut self, matched: RouteMatch) {
        self.path_params = matched.path_params_map();
        self.route = Some(matched.route);
    }

    /// Template of the bound route, e.g. `/pets/{id}`.
    #[must_use]
    pub fn route_template(&self) -> Option<&str> {
        self.route.as_ref().map(Route::template)
    }

    /// First value of a header, lossily decoded.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    }

    /// Media type of the `content-type` header without parameters, lowercased.
    #[must_use]
    pub fn media_type(&self) -> Option<String> {
        let raw = self.headers.get(CONTENT_TYPE)?;
        let raw = String::from_utf8_lossy(raw.as_bytes());
        let media = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        if media.is_empty() {
            None
        } else {
            Some(media)
        }
    }

    /// Query string as ordered, decoded key/value pairs.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        parse_query_pairs(&self.query_string)
    }

    /// Cookies from every `cookie` header, in order.
    #[must_use]
    pub fn cookies(&self) -> Vec<(String, String)> {
        parse_cookies(&self.headers)
    }

    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Split `cookie` headers into `name=value` pairs.
///
/// Pairs are separated by `;` and trimmed. A missing header yields no pairs;
/// entries without a name are skipped.
#[must_use]
pub fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    let cookies: Vec<(String, String)> = headers
        .get_all(COOKIE)
        .iter()
        .flat_map(|raw| {
            let raw = String::from_utf8_lossy(raw.as_bytes()).into_owned();
            raw.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim().to_string();
                    if name.is_empty() {
                        return None;
                    }
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name, value))
                })
                .collect::<Vec<_>>()
        })
        .collect();
    debug!(
        cookie_count = cookies.len(),
        cookie_names = ?cookies.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
        "Cookies extracted"
    );
    cookies
}

/// Decode a raw query string into ordered pairs, keeping repeated keys.
#[must_use]
pub fn parse_query_pairs(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookies() {
        let mut h = HeaderMap::new();
        h.insert(COOKIE, HeaderValue::from_static("a=b; c=d;;"));
        let cookies = parse_cookies(&h);
        assert_eq!(
            cookies,
            vec![
                ("a".to_string(), "b".to_string()),
                ("c".to_string(), "d".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_cookies_absent_header() {
        assert!(parse_cookies(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn test_parse_query_pairs_keeps_repeats() {
        let q = parse_query_pairs("tags%5B%5D=good&tags[]=boi&x=1+2");
        assert_eq!(
            q,
            vec![
                ("tags[]".to_string(), "good".to_string()),
                ("tags[]".to_string(), "boi".to_string()),
                ("x".to_string(), "1 2".to_string())
            ]
        );
    }

    #[test]
    fn test_new_splits_query() {
        let req = HttpRequest::new(Method::GET, "/p?x=1&y=2");
        assert_eq!(req.path, "/p");
        assert_eq!(req.query_string, "x=1&y=2");
        assert_eq!(req.query_pairs().len(), 2);
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let req = HttpRequest::new(Method::GET, "/")
            .with_header("Content-Type", "Application/JSON; charset=utf-8")
            .with_header("X-Name", "Bob");
        assert_eq!(req.header("x-name").as_deref(), Some("Bob"));
        assert_eq!(req.media_type().as_deref(), Some("application/json"));
    }

    #[test]
    fn test_with_route_binds_params() {
        let route = Route::new("/users/{name}").unwrap();
        let req = HttpRequest::new(Method::GET, "/users/bob").with_route(&route);
        assert_eq!(req.route_template(), Some("/users/{name}"));
        assert_eq!(req.path_params.get("name").map(String::as_str), Some("bob"));

        let unbound = HttpRequest::new(Method::GET, "/pets").with_route(&route);
        assert!(unbound.route.is_none());
    }
}
