//! End-to-end tests for `OpenApiMiddleware` driven by `tests/fixtures/openapi.yml`

use http::Method;
use openapi_guard::middleware::{MiddlewarePipeline, OpenApiMiddleware, TracingMiddleware};
use openapi_guard::runtime_config::RuntimeConfig;
use openapi_guard::server::{HttpRequest, HttpResponse};
use openapi_guard::spec::{load_spec, DocumentFormat, ParameterLocation};
use openapi_guard::ValidationErrorKind;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing_util::TestTracing;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/openapi.yml")
}

fn middleware() -> OpenApiMiddleware {
    let operations = load_spec(fixture_path()).unwrap();
    OpenApiMiddleware::with_config(operations, RuntimeConfig::default()).unwrap()
}

fn created() -> HttpResponse {
    HttpResponse::json(201, json!({"id": 1, "name": "Bobik"}))
}

#[test]
fn test_valid_post_delegates_and_returns_response_unchanged() {
    let req = HttpRequest::new(Method::POST, "/pets")
        .with_header("content-type", "application/json")
        .with_body(r#"{"name": "Bobik", "base_tag": "dog"}"#);
    let res = middleware().handle(req, |_| created()).unwrap();
    assert_eq!(res, created());
}

#[test]
fn test_invalid_post_raises_body_error_without_delegating() {
    let calls = AtomicUsize::new(0);
    let req = HttpRequest::new(Method::POST, "/pets")
        .with_header("content-type", "application/json")
        .with_body(r#"{"base_tag": "dog"}"#);
    let err = middleware()
        .handle(req, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            created()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ValidationErrorKind::RequestBody);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_post_without_content_type_is_generic_error() {
    let req = HttpRequest::new(Method::POST, "/pets").with_body(r#"{"name": "Bobik"}"#);
    let err = middleware().handle(req, |_| created()).unwrap_err();
    assert_eq!(err.kind(), ValidationErrorKind::Request);
    assert_eq!(err.location(), ParameterLocation::Body);
}

#[test]
fn test_query_sequences_and_types() {
    let mw = middleware();
    let ok = HttpRequest::new(Method::GET, "/pets?tags[]=good&tags[]=boi&limit=10");
    assert!(mw.handle(ok, |_| ()).is_ok());

    let too_many = HttpRequest::new(Method::GET, "/pets?limit=1000");
    assert_eq!(
        mw.handle(too_many, |_| ()).unwrap_err().kind(),
        ValidationErrorKind::RequestQuery
    );
}

#[test]
fn test_path_parameters_from_shared_ref() {
    let mw = middleware();
    assert!(mw.handle(HttpRequest::new(Method::GET, "/pets/3"), |_| ()).is_ok());

    let err = mw
        .handle(HttpRequest::new(Method::GET, "/pets/0"), |_| ())
        .unwrap_err();
    assert_eq!(err.kind(), ValidationErrorKind::RequestPath);
}

#[test]
fn test_literal_route_wins_over_template() {
    let mw = middleware();
    // /pets/mine requires a session cookie and is not an id lookup
    let err = mw
        .handle(HttpRequest::new(Method::GET, "/pets/mine"), |_| ())
        .unwrap_err();
    assert_eq!(err.kind(), ValidationErrorKind::RequestCookies);

    let req = HttpRequest::new(Method::GET, "/pets/mine").with_header("cookie", "session=abc");
    assert!(mw.handle(req, |_| ()).is_ok());
}

#[test]
fn test_path_date_format() {
    let mw = middleware();
    assert!(mw
        .handle(HttpRequest::new(Method::GET, "/users/bob/1970-12-01"), |_| ())
        .is_ok());
    let err = mw
        .handle(HttpRequest::new(Method::GET, "/users/bob/12"), |_| ())
        .unwrap_err();
    assert_eq!(err.kind(), ValidationErrorKind::RequestPath);
}

#[test]
fn test_headers_are_checked_before_body_and_query() {
    let mw = middleware();
    let err = mw
        .handle(HttpRequest::new(Method::DELETE, "/pets/-1"), |_| ())
        .unwrap_err();
    // path is checked first
    assert_eq!(err.kind(), ValidationErrorKind::RequestPath);

    let err = mw
        .handle(HttpRequest::new(Method::DELETE, "/pets/1"), |_| ())
        .unwrap_err();
    assert_eq!(err.kind(), ValidationErrorKind::RequestHeaders);

    let req = HttpRequest::new(Method::DELETE, "/pets/1").with_header("x-api-key", "secret");
    assert!(mw.handle(req, |_| ()).is_ok());
}

#[test]
fn test_cookie_formats() {
    let mw = middleware();
    let bad = HttpRequest::new(Method::GET, "/profile").with_header("cookie", "name=Bob;dob=1");
    assert_eq!(
        mw.handle(bad, |_| ()).unwrap_err().kind(),
        ValidationErrorKind::RequestCookies
    );
    let ok = HttpRequest::new(Method::GET, "/profile").with_header("cookie", "name=Bob;dob=1970-01-01");
    assert!(mw.handle(ok, |_| ()).is_ok());
}

#[test]
fn test_optional_body_may_be_omitted() {
    let mw = middleware();
    assert!(mw.handle(HttpRequest::new(Method::PUT, "/notes"), |_| ()).is_ok());

    let bad = HttpRequest::new(Method::PUT, "/notes")
        .with_header("content-type", "application/json")
        .with_body("{}");
    assert_eq!(
        mw.handle(bad, |_| ()).unwrap_err().kind(),
        ValidationErrorKind::RequestBody
    );
}

#[test]
fn test_unknown_route_is_delegated_unvalidated() {
    let mw = middleware();
    let req = HttpRequest::new(Method::POST, "/owners").with_body("not json");
    let out = mw.handle(req, |r| r.body_text()).unwrap();
    assert_eq!(out, "not json");

    // known path, undeclared method
    assert!(mw.handle(HttpRequest::new(Method::PATCH, "/pets"), |_| ()).is_ok());
}

#[test]
fn test_operation_without_parameters_passes() {
    let mw = middleware();
    assert!(mw.handle(HttpRequest::new(Method::GET, "/health"), |_| ()).is_ok());
}

#[test]
fn test_prebound_route_is_resolved_by_template() {
    let mw = middleware();
    let route = openapi_guard::router::Route::new("/pets/{id}").unwrap();
    let req = HttpRequest::new(Method::GET, "/pets/abc").with_route(&route);
    assert_eq!(req.route_template(), Some("/pets/{id}"));
    assert_eq!(
        mw.handle(req, |_| ()).unwrap_err().kind(),
        ValidationErrorKind::RequestPath
    );
}

#[test]
fn test_middleware_from_document_string() {
    let doc = std::fs::read_to_string(fixture_path()).unwrap();
    let mw = OpenApiMiddleware::from_document(&doc, DocumentFormat::Yaml).unwrap();
    assert_eq!(mw.resolver().len(), 9);
}

#[test]
fn test_pipeline_with_tracing_middleware() {
    let tracing = TestTracing::init();
    let pipeline = MiddlewarePipeline::new()
        .with(Arc::new(middleware()))
        .with(Arc::new(TracingMiddleware));

    let ok = HttpRequest::new(Method::POST, "/pets")
        .with_header("content-type", "application/json")
        .with_body(r#"{"name": "Bobik"}"#);
    let res = pipeline.run(ok, |_| created()).unwrap();
    assert_eq!(res.status, 201);

    let bad = HttpRequest::new(Method::POST, "/pets")
        .with_header("content-type", "application/json")
        .with_body("{}");
    let err = pipeline.run(bad, |_| created()).unwrap_err();
    assert_eq!(err.kind(), ValidationErrorKind::RequestBody);

    let logs = tracing.output();
    assert!(logs.contains("Request completed"), "logs: {logs}");
    assert!(logs.contains("Request rejected"), "logs: {logs}");
    assert!(logs.contains("request_body_validation_error"), "logs: {logs}");
}

#[test]
fn test_pipeline_binds_route_for_later_middlewares() {
    let pipeline = MiddlewarePipeline::new().with(Arc::new(middleware()));
    let res = pipeline
        .run(HttpRequest::new(Method::GET, "/pets/7"), |req| {
            HttpResponse::ok_json(json!({
                "route": req.route_template(),
                "id": req.path_params.get("id"),
            }))
        })
        .unwrap();
    assert_eq!(res.body, json!({"route": "/pets/{id}", "id": "7"}));
}
