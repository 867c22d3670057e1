//! End-to-end request/response behavior for representative policies, driven
//! against the `Policy`/`Handler` contract with an in-process fake request
//! and response (no sockets).

mod support;

use http::{HeaderValue, StatusCode};

use corsware::{build_anonymous, build_credentialed, CorsOption, Handler};
use support::{FakeRequest, FakeResponse};

fn inner_handler(status: u16) -> impl Fn(FakeRequest) -> FakeResponse {
    move |_req: FakeRequest| FakeResponse::with_status(status)
}

#[test]
fn normal_request_sets_right_headers() {
    let policy = build_anonymous(vec![
        CorsOption::FromOrigins(vec!["https://example.com".into()]),
        CorsOption::PreflightSuccessStatus(279),
        CorsOption::MaxAgeInSeconds(30),
    ])
    .unwrap();

    let middleware = policy.decorate(inner_handler(299));
    let response = middleware.handle(FakeRequest::get(None));

    assert_eq!(response.status, StatusCode::from_u16(299).unwrap());
    assert_eq!(
        response.headers.get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://example.com"
    );
    assert!(response.headers.get(http::header::VARY).is_none());
}

#[test]
fn preflight_with_allowed_origin_sets_all_headers() {
    let policy = build_anonymous(vec![
        CorsOption::FromOrigins(vec!["https://example.com".into()]),
        CorsOption::PreflightSuccessStatus(279),
        CorsOption::MaxAgeInSeconds(30),
    ])
    .unwrap();

    let middleware = policy.decorate(inner_handler(200));
    let response = middleware.handle(FakeRequest::preflight("https://example.com", "GET"));

    assert_eq!(response.status, StatusCode::from_u16(279).unwrap());
    assert_eq!(
        response.headers.get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://example.com"
    );
    assert_eq!(response.headers.get(http::header::ACCESS_CONTROL_MAX_AGE).unwrap(), "30");
    assert_eq!(
        response.headers.get(http::header::VARY).unwrap(),
        "Access-Control-Request-Headers, Access-Control-Request-Method, Access-Control-Request-Private-Network, Origin"
    );
}

#[test]
fn preflight_with_disallowed_origin_is_forbidden() {
    let policy = build_anonymous(vec![
        CorsOption::FromOrigins(vec!["https://example.com".into()]),
        CorsOption::PreflightSuccessStatus(279),
    ])
    .unwrap();

    let middleware = policy.decorate(inner_handler(200));
    let response = middleware.handle(FakeRequest::preflight("https://foo.example.com", "PUT"));

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response
        .headers
        .get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
    assert!(response.headers.get(http::header::VARY).is_some());
}

#[test]
fn subdomain_wildcard_echoes_matching_origin() {
    let policy = build_anonymous(vec![CorsOption::FromOrigins(vec!["https://*.example.com".into()])]).unwrap();
    let middleware = policy.decorate(inner_handler(200));
    let response = middleware.handle(FakeRequest::get(Some("https://foo.example.com")));

    assert_eq!(
        response.headers.get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://foo.example.com"
    );
    assert_eq!(response.headers.get(http::header::VARY).unwrap(), "Origin");
}

#[test]
fn subdomain_wildcard_matches_deeply_nested_subdomain() {
    let policy = build_anonymous(vec![CorsOption::FromOrigins(vec!["https://*.example.com".into()])]).unwrap();
    let middleware = policy.decorate(inner_handler(200));
    let response = middleware.handle(FakeRequest::get(Some("https://bar.foo.example.com")));

    assert_eq!(
        response.headers.get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://bar.foo.example.com"
    );
}

#[test]
fn different_subdomain_does_matter() {
    let policy = build_anonymous(vec![CorsOption::FromOrigins(vec![
        "https://foo.com".into(),
        "https://bar.com".into(),
    ])])
    .unwrap();
    let middleware = policy.decorate(inner_handler(200));
    let response = middleware.handle(FakeRequest::get(Some("https://barfoo.com")));

    assert!(response
        .headers
        .get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
    assert_eq!(response.headers.get(http::header::VARY).unwrap(), "Origin");
}

#[test]
fn credentialed_preflight_with_large_header_list_allows_and_echoes() {
    let policy = build_credentialed(vec![
        CorsOption::FromOrigins(vec!["https://example.com".into()]),
        CorsOption::WithAnyMethod,
        CorsOption::WithAnyRequestHeaders,
    ])
    .unwrap();
    let middleware = policy.decorate(inner_handler(200));

    let junk: Vec<String> = (0..10_000).map(|i| format!("x-junk-{i}")).collect();
    let acrh = junk.join(", ");
    let request = FakeRequest::preflight("https://example.com", "PUT")
        .with_header(http::header::ACCESS_CONTROL_REQUEST_HEADERS, &acrh);
    let response = middleware.handle(request);

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers.get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://example.com"
    );
    assert_eq!(
        response.headers.get(http::header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
    assert_eq!(response.headers.get(http::header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(), "PUT");
    assert_eq!(
        response.headers.get(http::header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "*,authorization"
    );
}

#[test]
fn upstream_vary_is_preserved_not_replaced() {
    let policy = build_anonymous(vec![CorsOption::FromOrigins(vec!["https://*.example.com".into()])]).unwrap();
    let middleware = policy.decorate(move |_req: FakeRequest| {
        let mut resp = FakeResponse::with_status(200);
        resp.headers
            .insert(http::header::VARY, HeaderValue::from_static("Accept-Encoding"));
        resp
    });
    let response = middleware.handle(FakeRequest::get(Some("https://foo.example.com")));

    assert_eq!(
        response.headers.get(http::header::VARY).unwrap(),
        "Accept-Encoding, Origin"
    );
}
