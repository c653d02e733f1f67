use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Response produced by the handler at the end of a middleware pipeline.
///
/// Validation never builds one of these itself; it only passes through what
/// the next handler returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpResponse {
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HashMap<String, String>,
    pub body: Value,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A response with `Content-Type: application/json`.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self::new(status, headers, body)
    }

    #[must_use]
    pub fn ok_json(body: Value) -> Self {
        Self::json(200, body)
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new(200, HashMap::new(), Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_response_sets_content_type() {
        let res = HttpResponse::ok_json(json!({"ok": true}));
        assert_eq!(res.status, 200);
        assert_eq!(
            res.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_serialize_skips_headers() {
        let res = HttpResponse::json(201, json!({"id": 1}));
        let v = serde_json::to_value(&res).unwrap();
        assert_eq!(v, json!({"status": 201, "body": {"id": 1}}));
    }
}
